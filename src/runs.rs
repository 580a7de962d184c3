//! Run status, listing, cancellation and waiting.

use reqwest::Method;

use crate::client::Client;
use crate::errors::{HexError, Result};
use crate::models::{ListRunsParams, RunList, RunStatusRecord};
use crate::poller::{poll_until_terminal, PollOptions, PollOutcome};

impl Client {
    /// Fetch the current status of a run.
    pub async fn get_run_status(&self, project_id: &str, run_id: &str) -> Result<RunStatusRecord> {
        self.request(
            Method::GET,
            &format!("/v1/projects/{project_id}/runs/{run_id}"),
            &[],
            None::<&()>,
        )
        .await
    }

    /// List API-triggered runs of a project.
    pub async fn list_runs(&self, project_id: &str, params: &ListRunsParams) -> Result<RunList> {
        if !(1..=100).contains(&params.limit) {
            return Err(HexError::InvalidInput(format!(
                "limit must be between 1 and 100, got {}",
                params.limit
            )));
        }

        self.request(
            Method::GET,
            &format!("/v1/projects/{project_id}/runs"),
            &params.to_query(),
            None::<&()>,
        )
        .await
    }

    /// Cancel a run that was started via the API.
    pub async fn cancel_run(&self, project_id: &str, run_id: &str) -> Result<()> {
        self.send(
            Method::DELETE,
            &format!("/v1/projects/{project_id}/runs/{run_id}"),
            &[],
            None::<&()>,
        )
        .await?;
        tracing::info!(project_id, run_id, "run cancelled");
        Ok(())
    }

    /// Poll [`get_run_status`](Self::get_run_status) until the run reaches a
    /// terminal state or `opts.cancel` fires.
    ///
    /// A run that ends `FAILED` or `ERRORED` is a successful wait and comes
    /// back as [`PollOutcome::Finished`]; only failures of the status calls
    /// themselves are errors.
    pub async fn wait_for_run(
        &self,
        project_id: &str,
        run_id: &str,
        opts: PollOptions,
    ) -> Result<PollOutcome> {
        poll_until_terminal(|| self.get_run_status(project_id, run_id), &opts).await
    }
}
