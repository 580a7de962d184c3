//! Project operations.

use reqwest::Method;

use crate::client::Client;
use crate::errors::{HexError, Result};
use crate::models::{ListProjectsParams, Project, ProjectList, RunHandle, RunProjectRequest};

impl Client {
    /// Fetch metadata about a single project.
    pub async fn get_project(&self, project_id: &str, include_sharing: bool) -> Result<Project> {
        let query = [("includeSharing", include_sharing.to_string())];
        self.request(
            Method::GET,
            &format!("/v1/projects/{project_id}"),
            &query,
            None::<&()>,
        )
        .await
    }

    /// List viewable projects, one page at a time.
    ///
    /// Pass [`ProjectList::pagination`]`.after` back as `params.after` to
    /// fetch the next page.
    pub async fn list_projects(&self, params: &ListProjectsParams) -> Result<ProjectList> {
        if !(1..=100).contains(&params.limit) {
            return Err(HexError::InvalidInput(format!(
                "limit must be between 1 and 100, got {}",
                params.limit
            )));
        }

        self.request(Method::GET, "/v1/projects", &params.to_query(), None::<&()>)
            .await
    }

    /// Walk every page of `list_projects` and keep the projects whose title or
    /// description contains `needle` (case-insensitive).
    ///
    /// `params.limit` is raised to 100 and `params.after` is ignored.
    pub async fn search_projects(
        &self,
        params: &ListProjectsParams,
        needle: &str,
    ) -> Result<Vec<Project>> {
        let mut page_params = ListProjectsParams {
            limit: 100,
            after: None,
            ..params.clone()
        };
        let mut matches = Vec::new();

        loop {
            let page = self.list_projects(&page_params).await?;
            let page_len = page.values.len();
            matches.extend(page.values.into_iter().filter(|p| p.matches(needle)));
            tracing::debug!(page_len, found = matches.len(), "searched project page");

            match page.pagination.after {
                Some(cursor) if page_len > 0 && page_params.after.as_ref() != Some(&cursor) => {
                    page_params.after = Some(cursor)
                }
                Some(cursor) if page_len > 0 => {
                    tracing::warn!(%cursor, "pagination cursor repeated, stopping search");
                    break;
                }
                _ => break,
            }
        }

        Ok(matches)
    }

    /// Trigger a run of the latest published version of a project.
    ///
    /// The returned [`RunHandle`] carries the run id to poll with
    /// [`wait_for_run`](Self::wait_for_run).
    pub async fn run_project(
        &self,
        project_id: &str,
        request: &RunProjectRequest,
    ) -> Result<RunHandle> {
        let handle: RunHandle = self
            .request(
                Method::POST,
                &format!("/v1/projects/{project_id}/runs"),
                &[],
                Some(request),
            )
            .await?;
        tracing::info!(project_id, run_id = %handle.run_id, "run started");
        Ok(handle)
    }
}
