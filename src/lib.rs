//! # Hex SDK for Rust
//!
//! Async client for the [Hex](https://hex.tech) API: list and inspect
//! projects, trigger runs, wait for them to finish, and create embedding
//! URLs. Failed calls come back as a typed [`ApiError`] classified from the
//! HTTP status.
//!
//! ## Quick start
//!
//! ```no_run
//! use hex_toolkit::{Client, PollOptions, PollOutcome, RunProjectRequest};
//!
//! #[tokio::main]
//! async fn main() -> hex_toolkit::Result<()> {
//!     let client = Client::new("hxtw_your_api_key")?;
//!
//!     let run = client
//!         .run_project("5a8591dd-4039-49df-9202-96385ba3eff8", &RunProjectRequest::default())
//!         .await?;
//!
//!     let opts = PollOptions::default().on_status_change(|s| println!("  {}", s.status));
//!     if let PollOutcome::Finished(status) =
//!         client.wait_for_run(&run.project_id, &run.run_id, opts).await?
//!     {
//!         println!("finished: {}", status.status);
//!         if let Some(err) = status.error {
//!             println!("run error: {err}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error handling
//!
//! ```no_run
//! use hex_toolkit::{ApiError, Client, HexError};
//!
//! # async fn example(client: Client) {
//! match client.get_project("missing", false).await {
//!     Ok(project) => println!("{}", project.title),
//!     Err(HexError::Api(ApiError::NotFound(details))) => {
//!         println!("no such project (trace {:?})", details.trace_id)
//!     }
//!     Err(HexError::Api(ApiError::RateLimit { retry_after, .. })) => {
//!         println!("slow down, retry after {retry_after:?}s")
//!     }
//!     Err(e) => println!("{e}"),
//! }
//! # }
//! ```

pub mod cli;
mod client;
mod embedding;
mod errors;
mod models;
mod poller;
mod projects;
mod runs;

pub use client::{Client, ClientBuilder};
pub use errors::{classify_error, ApiError, ErrorDetails, HexError, InvalidParam, Result};
pub use models::{
    AccessEntry, AccessLevel, Analytics, AppViews, CategoryInfo, CollectionAccess,
    DisplayOptions, EmbeddingRequest, EmbeddingResponse, GroupAccess, ListProjectsParams,
    ListRunsParams, NamedRef, NotificationRecipient, NotificationRecipientType, Pagination,
    Project, ProjectList, ProjectType, ReviewsInfo, RunHandle, RunList, RunNotification,
    RunNotificationRecipient, RunNotificationType, RunProjectRequest, RunStatus,
    RunStatusRecord, Schedule, ScheduleCadence, ScheduleTime, ScreenshotFormat, Sharing, SortBy,
    SortDirection, StatusInfo, Theme, UserAccess, UserInfo, MAX_EMBED_EXPIRY_MS,
};
pub use poller::{poll_until_terminal, PollOptions, PollOutcome, StatusCallback, DEFAULT_POLL_INTERVAL};
pub use tokio_util::sync::CancellationToken;
