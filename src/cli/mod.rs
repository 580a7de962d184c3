//! The `hex` command-line front end.
//!
//! Argument definitions live here; [`commands::execute`] runs them and
//! [`display`] renders the results.

pub mod commands;
pub mod display;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};

use crate::errors::HexError;
use crate::models::{RunStatus, SortBy, SortDirection, Theme};

pub use commands::execute;

/// Errors surfaced by the CLI on top of the SDK's own.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Hex(#[from] HexError),
    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

#[derive(Parser, Debug)]
#[command(
    name = "hex",
    about = "Hex API CLI - manage projects and runs from the command line",
    version
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// API key used as the bearer token.
    #[arg(long, env = "HEX_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Base URL of the Hex API.
    #[arg(long, env = "HEX_API_BASE_URL", global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage Hex projects.
    #[command(subcommand)]
    Projects(ProjectsCommand),
    /// Manage project runs.
    #[command(subcommand)]
    Runs(RunsCommand),
    /// Create a presigned URL for embedding a project's app.
    Embed(EmbedArgs),
}

#[derive(Subcommand, Debug)]
pub enum ProjectsCommand {
    /// List all viewable projects.
    List(ListProjectsArgs),
    /// Show metadata about a single project.
    Get {
        /// Unique ID for the project.
        project_id: String,
        /// Include sharing information.
        #[arg(long)]
        include_sharing: bool,
    },
    /// Trigger a run of the latest published version of a project.
    Run(RunProjectArgs),
}

#[derive(Args, Debug)]
pub struct ListProjectsArgs {
    /// Number of results per page (1-100).
    #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub limit: u32,
    /// Include archived projects.
    #[arg(long)]
    pub include_archived: bool,
    /// Include trashed projects.
    #[arg(long)]
    pub include_trashed: bool,
    /// Filter by creator email.
    #[arg(long)]
    pub creator_email: Option<String>,
    /// Filter by owner email.
    #[arg(long)]
    pub owner_email: Option<String>,
    /// Sort field (created_at, last_edited_at, last_published_at); prefix with
    /// '-' for descending order, e.g. -created_at.
    #[arg(long, value_parser = parse_sort, allow_hyphen_values = true)]
    pub sort: Option<SortSpec>,
    /// Comma-separated columns to display.
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_value = "id,name,status,owner,created_at"
    )]
    pub columns: Vec<Column>,
    /// Search title or description (case-insensitive). Fetches every page.
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct RunProjectArgs {
    /// Unique ID for the project.
    pub project_id: String,
    /// Perform a dry run.
    #[arg(long)]
    pub dry_run: bool,
    /// Update the cached state of the published app.
    #[arg(long)]
    pub update_cache: bool,
    /// Don't use cached SQL results.
    #[arg(long)]
    pub no_sql_cache: bool,
    /// JSON object of input parameters.
    #[arg(long, value_parser = parse_json_object)]
    pub input_params: Option<Map<String, Value>>,
    /// Wait for the run to complete.
    #[arg(long)]
    pub wait: bool,
    /// Polling interval in seconds (with --wait).
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: u64,
}

#[derive(Subcommand, Debug)]
pub enum RunsCommand {
    /// Show the status of a project run.
    Status {
        /// Unique ID for the project.
        project_id: String,
        /// Unique ID for the run.
        run_id: String,
    },
    /// List API-triggered runs of a project.
    List {
        /// Unique ID for the project.
        project_id: String,
        /// Maximum number of runs to return.
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
        limit: u32,
        /// Number of runs to skip.
        #[arg(long, default_value_t = 0)]
        offset: u32,
        /// Filter by run status (PENDING, RUNNING, COMPLETED, FAILED, CANCELLED, KILLED).
        #[arg(long)]
        status: Option<RunStatus>,
    },
    /// Cancel a run that was started via the API.
    Cancel {
        /// Unique ID for the project.
        project_id: String,
        /// Unique ID for the run.
        run_id: String,
        /// Skip confirmation.
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct EmbedArgs {
    /// Unique ID for the project.
    pub project_id: String,
    /// URL lifetime in milliseconds (max 300000).
    #[arg(long)]
    pub expires_in: Option<u64>,
    /// Theme of the embedded app.
    #[arg(long, value_enum)]
    pub theme: Option<ThemeArg>,
    /// Additional permissions, e.g. EXPORT_PDF. Repeatable.
    #[arg(long)]
    pub scope: Vec<String>,
    /// Don't count towards embedding limits.
    #[arg(long)]
    pub test_mode: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

/// Columns available to `projects list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Column {
    Id,
    Name,
    Status,
    Owner,
    #[value(name = "created_at")]
    CreatedAt,
    Creator,
    #[value(name = "last_viewed_at")]
    LastViewedAt,
    #[value(name = "app_views")]
    AppViews,
}

impl Column {
    pub fn header(&self) -> &'static str {
        match self {
            Column::Id => "ID",
            Column::Name => "Name",
            Column::Status => "Status",
            Column::Owner => "Owner",
            Column::CreatedAt => "Created At",
            Column::Creator => "Creator",
            Column::LastViewedAt => "Last Viewed At",
            Column::AppViews => "App Views (All Time)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub by: SortBy,
    pub direction: SortDirection,
}

fn parse_sort(raw: &str) -> Result<SortSpec, String> {
    let (direction, field) = match raw.strip_prefix('-') {
        Some(field) => (SortDirection::Desc, field),
        None => (SortDirection::Asc, raw),
    };

    let by = match field {
        "created_at" => SortBy::CreatedAt,
        "last_edited_at" => SortBy::LastEditedAt,
        "last_published_at" => SortBy::LastPublishedAt,
        other => {
            return Err(format!(
                "invalid sort field '{other}'. Valid options are: \
                 created_at, last_edited_at, last_published_at"
            ))
        }
    };

    Ok(SortSpec { by, direction })
}

fn parse_json_object(raw: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("input parameters must be a JSON object".into()),
        Err(e) => Err(format!("invalid JSON for input parameters: {e}")),
    }
}
