//! Typed request and response bodies.
//!
//! Field names follow the API's camelCase JSON. Older responses spelled a few
//! run fields differently; those spellings are accepted here as serde aliases
//! and normalized into the one canonical field, so nothing past
//! deserialization has to look for alternatives.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectType {
    Project,
    Component,
    #[serde(other)]
    Unknown,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Project => "PROJECT",
            ProjectType::Component => "COMPONENT",
            ProjectType::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    None,
    AppOnly,
    CanView,
    CanEdit,
    FullAccess,
    #[serde(other)]
    Unknown,
}

impl AccessLevel {
    /// Human label, e.g. "Can View".
    pub fn label(&self) -> &'static str {
        match self {
            AccessLevel::None => "None",
            AccessLevel::AppOnly => "App Only",
            AccessLevel::CanView => "Can View",
            AccessLevel::CanEdit => "Can Edit",
            AccessLevel::FullAccess => "Full Access",
            AccessLevel::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleCadence {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Custom,
    #[serde(other)]
    Unknown,
}

/// Sort field for [`ListProjectsParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortBy {
    CreatedAt,
    LastEditedAt,
    LastPublishedAt,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::CreatedAt => "CREATED_AT",
            SortBy::LastEditedAt => "LAST_EDITED_AT",
            SortBy::LastPublishedAt => "LAST_PUBLISHED_AT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserInfo {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusInfo {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReviewsInfo {
    pub required: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppViews {
    #[serde(default)]
    pub last_thirty_days: u64,
    #[serde(default)]
    pub last_fourteen_days: u64,
    #[serde(default)]
    pub last_seven_days: u64,
    #[serde(default)]
    pub all_time: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    #[serde(default)]
    pub published_results_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_viewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub app_views: Option<AppViews>,
}

/// Time fields of one schedule cadence. Which fields are set depends on the
/// cadence: hourly has only `minute`, custom has only `cron`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTime {
    pub timezone: String,
    #[serde(default)]
    pub minute: Option<u8>,
    #[serde(default)]
    pub hour: Option<u8>,
    /// Weekly only, e.g. "MONDAY".
    #[serde(default)]
    pub day_of_week: Option<String>,
    /// Monthly only, 1-28.
    #[serde(default)]
    pub day: Option<u8>,
    #[serde(default)]
    pub cron: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Schedule {
    pub cadence: ScheduleCadence,
    pub enabled: bool,
    #[serde(default)]
    pub hourly: Option<ScheduleTime>,
    #[serde(default)]
    pub daily: Option<ScheduleTime>,
    #[serde(default)]
    pub weekly: Option<ScheduleTime>,
    #[serde(default)]
    pub monthly: Option<ScheduleTime>,
    #[serde(default)]
    pub custom: Option<ScheduleTime>,
}

impl Schedule {
    /// The time block matching `cadence`, if the API sent one.
    pub fn time(&self) -> Option<&ScheduleTime> {
        match self.cadence {
            ScheduleCadence::Hourly => self.hourly.as_ref(),
            ScheduleCadence::Daily => self.daily.as_ref(),
            ScheduleCadence::Weekly => self.weekly.as_ref(),
            ScheduleCadence::Monthly => self.monthly.as_ref(),
            ScheduleCadence::Custom => self.custom.as_ref(),
            ScheduleCadence::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserAccess {
    pub user: UserInfo,
    pub access: AccessLevel,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroupAccess {
    pub group: NamedRef,
    pub access: AccessLevel,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectionAccess {
    pub collection: NamedRef,
    pub access: AccessLevel,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccessEntry {
    pub access: AccessLevel,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sharing {
    #[serde(default)]
    pub users: Vec<UserAccess>,
    #[serde(default)]
    pub collections: Vec<CollectionAccess>,
    #[serde(default)]
    pub groups: Vec<GroupAccess>,
    #[serde(default)]
    pub workspace: Option<AccessEntry>,
    #[serde(default)]
    pub public_web: Option<AccessEntry>,
    #[serde(default)]
    pub support: Option<AccessEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    #[serde(default)]
    pub creator: Option<UserInfo>,
    #[serde(default)]
    pub owner: Option<UserInfo>,
    #[serde(default)]
    pub status: Option<StatusInfo>,
    #[serde(default)]
    pub categories: Vec<CategoryInfo>,
    #[serde(default)]
    pub reviews: Option<ReviewsInfo>,
    #[serde(default)]
    pub analytics: Option<Analytics>,
    #[serde(default)]
    pub last_edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trashed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    /// Only present when requested with `include_sharing`.
    #[serde(default)]
    pub sharing: Option<Sharing>,
}

impl Project {
    /// Case-insensitive substring match on title or description.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Pagination {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectList {
    pub values: Vec<Project>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl ProjectList {
    /// `true` if `pagination.after` is `Some`.
    pub fn has_more(&self) -> bool {
        self.pagination.after.is_some()
    }
}

/// Query filters for `list_projects`. `Default` matches the API defaults.
#[derive(Debug, Clone)]
pub struct ListProjectsParams {
    pub include_archived: bool,
    pub include_components: bool,
    pub include_trashed: bool,
    pub include_sharing: bool,
    pub statuses: Vec<String>,
    pub categories: Vec<String>,
    pub creator_email: Option<String>,
    pub owner_email: Option<String>,
    pub collection_id: Option<String>,
    /// 1-100.
    pub limit: u32,
    pub after: Option<String>,
    pub before: Option<String>,
    pub sort_by: Option<SortBy>,
    pub sort_direction: Option<SortDirection>,
}

impl Default for ListProjectsParams {
    fn default() -> Self {
        Self {
            include_archived: false,
            include_components: false,
            include_trashed: false,
            include_sharing: false,
            statuses: Vec::new(),
            categories: Vec::new(),
            creator_email: None,
            owner_email: None,
            collection_id: None,
            limit: 25,
            after: None,
            before: None,
            sort_by: None,
            sort_direction: None,
        }
    }
}

impl ListProjectsParams {
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("includeArchived", self.include_archived.to_string()),
            ("includeComponents", self.include_components.to_string()),
            ("includeTrashed", self.include_trashed.to_string()),
            ("includeSharing", self.include_sharing.to_string()),
            ("limit", self.limit.to_string()),
        ];

        query.extend(self.statuses.iter().map(|s| ("statuses", s.clone())));
        query.extend(self.categories.iter().map(|c| ("categories", c.clone())));

        let optional = [
            ("creatorEmail", self.creator_email.as_deref()),
            ("ownerEmail", self.owner_email.as_deref()),
            ("collectionId", self.collection_id.as_deref()),
            ("after", self.after.as_deref()),
            ("before", self.before.as_deref()),
            ("sortBy", self.sort_by.as_ref().map(SortBy::as_str)),
            ("sortDirection", self.sort_direction.as_ref().map(SortDirection::as_str)),
        ];
        query.extend(
            optional
                .into_iter()
                .filter_map(|(k, v)| v.map(|v| (k, v.to_string()))),
        );

        query
    }
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// Lifecycle state of a project run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Pending,
    Running,
    Errored,
    Failed,
    Completed,
    Killed,
    Cancelled,
    UnableToAllocateKernel,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Terminal = won't change anymore.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Errored
                | RunStatus::Failed
                | RunStatus::Killed
                | RunStatus::Cancelled
        )
    }

    /// Terminal and not `COMPLETED`.
    pub fn is_failure(&self) -> bool {
        self.is_terminal() && *self != RunStatus::Completed
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "PENDING",
            RunStatus::Running => "RUNNING",
            RunStatus::Errored => "ERRORED",
            RunStatus::Failed => "FAILED",
            RunStatus::Completed => "COMPLETED",
            RunStatus::Killed => "KILLED",
            RunStatus::Cancelled => "CANCELLED",
            RunStatus::UnableToAllocateKernel => "UNABLE_TO_ALLOCATE_KERNEL",
            RunStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    /// Case-insensitive; rejects values the API never sends.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let status = match upper.as_str() {
            "PENDING" => RunStatus::Pending,
            "RUNNING" => RunStatus::Running,
            "ERRORED" => RunStatus::Errored,
            "FAILED" => RunStatus::Failed,
            "COMPLETED" => RunStatus::Completed,
            "KILLED" => RunStatus::Killed,
            "CANCELLED" => RunStatus::Cancelled,
            "UNABLE_TO_ALLOCATE_KERNEL" => RunStatus::UnableToAllocateKernel,
            _ => return Err(format!("unknown run status '{s}'")),
        };
        Ok(status)
    }
}

/// Which run outcomes trigger a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunNotificationType {
    Success,
    Failure,
    All,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationRecipientType {
    User,
    Group,
    SlackChannel,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotFormat {
    Png,
    Pdf,
}

/// Notification to send when a triggered run ends.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunNotification {
    #[serde(rename = "type")]
    pub notification_type: RunNotificationType,
    pub include_success_screenshot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_format: Option<ScreenshotFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_channel_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecipient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_private: Option<bool>,
}

/// A resolved notification as echoed back by the API, one per recipient.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunNotificationRecipient {
    #[serde(rename = "type")]
    pub notification_type: RunNotificationType,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    pub recipient_type: NotificationRecipientType,
    pub include_success_screenshot: bool,
    #[serde(default)]
    pub screenshot_format: Option<Vec<ScreenshotFormat>>,
    pub recipient: NotificationRecipient,
}

/// Body for `run_project`. Optional fields left as `None` are omitted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_params: Option<serde_json::Map<String, Value>>,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Vec<RunNotification>>,
    pub update_published_results: bool,
    pub use_cached_sql_results: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_id: Option<String>,
}

impl Default for RunProjectRequest {
    fn default() -> Self {
        Self {
            input_params: None,
            dry_run: false,
            notifications: None,
            update_published_results: false,
            use_cached_sql_results: true,
            view_id: None,
        }
    }
}

/// Identifiers and links returned when a run is started.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunHandle {
    pub project_id: String,
    pub run_id: String,
    pub run_url: String,
    #[serde(alias = "statusUrl")]
    pub run_status_url: String,
    pub project_version: u64,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub notifications: Vec<RunNotificationRecipient>,
}

/// One observation of a run's state.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatusRecord {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub project_version: Option<u64>,
    #[serde(alias = "id")]
    pub run_id: String,
    #[serde(default)]
    pub run_url: Option<String>,
    pub status: RunStatus,
    #[serde(default, alias = "startedAt")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, alias = "endedAt")]
    pub end_time: Option<DateTime<Utc>>,
    /// Milliseconds.
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub trace_id: Option<String>,
    /// Failure payload for runs that ended in an error state.
    #[serde(default)]
    pub error: Option<Value>,
}

impl RunStatusRecord {
    /// Wall time between start and end, when both are known.
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.end_time? - self.start_time?)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunList {
    pub runs: Vec<RunStatusRecord>,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub previous_page: Option<String>,
    #[serde(default)]
    pub trace_id: Option<String>,
}

/// Query for `list_runs`.
#[derive(Debug, Clone)]
pub struct ListRunsParams {
    /// 1-100.
    pub limit: u32,
    pub offset: u32,
    pub status: Option<RunStatus>,
}

impl Default for ListRunsParams {
    fn default() -> Self {
        Self {
            limit: 25,
            offset: 0,
            status: None,
        }
    }
}

impl ListRunsParams {
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];
        if let Some(status) = self.status {
            query.push(("statusFilter", status.as_str().to_string()));
        }
        query
    }
}

// ---------------------------------------------------------------------------
// Embedding
// ---------------------------------------------------------------------------

/// Upper bound for [`EmbeddingRequest::expires_in`], in milliseconds.
pub const MAX_EMBED_EXPIRY_MS: u64 = 300_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_embed_base_padding: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_embed_outline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_embed_footer: Option<bool>,
}

/// Body for `create_presigned_url`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex_user_attributes: Option<HashMap<String, String>>,
    /// Extra permissions such as `EXPORT_PDF` or `EXPORT_CSV`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_parameters: Option<serde_json::Map<String, Value>>,
    /// Milliseconds, at most [`MAX_EMBED_EXPIRY_MS`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_options: Option<DisplayOptions>,
    /// Test mode embeds don't count towards limits.
    pub test_mode: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingResponse {
    pub url: String,
}
