//! Terminal rendering for CLI output.

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;

use crate::cli::Column;
use crate::errors::{ApiError, HexError};
use crate::models::{AccessLevel, Project, RunStatus, RunStatusRecord, Schedule, ScheduleCadence};

/// Longest description shown in the project detail view.
const MAX_DESCRIPTION_LEN: usize = 100;
/// Sharing users listed before collapsing into "... and N more".
const MAX_SHARED_USERS: usize = 5;

/// Run status with a colour per outcome.
pub fn format_status(status: RunStatus) -> String {
    let label = status.as_str();
    match status {
        RunStatus::Pending => label.yellow().to_string(),
        RunStatus::Running => label.blue().to_string(),
        RunStatus::Completed => label.green().to_string(),
        s if s.is_failure() => label.red().to_string(),
        _ => label.to_string(),
    }
}

pub fn format_access_level(access: AccessLevel) -> String {
    let label = access.label();
    match access {
        AccessLevel::None => label.red().to_string(),
        AccessLevel::AppOnly => label.yellow().to_string(),
        AccessLevel::CanView => label.cyan().to_string(),
        AccessLevel::CanEdit => label.green().to_string(),
        AccessLevel::FullAccess => label.green().bold().to_string(),
        AccessLevel::Unknown => label.to_string(),
    }
}

/// `YYYY-MM-DD HH:MM`, with a relative suffix for anything under a week old.
pub fn format_timestamp(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let base = ts.format("%Y-%m-%d %H:%M").to_string();
    let diff = now - ts;
    if diff < chrono::Duration::zero() {
        return base;
    }

    match diff.num_days() {
        0 if diff.num_seconds() < 3600 => format!("{base} ({}m ago)", diff.num_minutes()),
        0 => format!("{base} ({}h ago)", diff.num_hours()),
        1 => format!("{base} (yesterday)"),
        d if d < 7 => format!("{base} ({d}d ago)"),
        _ => base,
    }
}

fn format_optional_timestamp(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    ts.map_or_else(|| "N/A".to_string(), |t| format_timestamp(t, now))
}

/// `42s`, `17m`, `2h 5m`.
pub fn format_duration(d: chrono::Duration) -> String {
    let secs = d.num_seconds().max(0);
    if secs < 60 {
        return format!("{secs}s");
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// `1234567` -> `1,234,567`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Collapse whitespace and cut to `max_len` characters with an ellipsis.
pub fn truncate(s: &str, max_len: usize) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_len {
        collapsed
    } else {
        let kept: String = collapsed.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Plain left-aligned table. Cells must not contain colour codes, or the
/// padding will be off.
pub fn render_table(title: &str, headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<width$}", width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 3);
    out.push(title.to_string());
    out.push(line(headers.to_vec()));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        out.push(line(row.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}

pub fn project_cell(project: &Project, column: Column) -> String {
    let date = |ts: Option<DateTime<Utc>>| ts.map(|t| t.format("%Y-%m-%d").to_string());

    let cell = match column {
        Column::Id => Some(project.id.clone()),
        Column::Name => Some(project.title.trim().to_string()),
        Column::Status => project.status.as_ref().map(|s| s.name.clone()),
        Column::Owner => project.owner.as_ref().map(|u| u.email.clone()),
        Column::CreatedAt => date(project.created_at),
        Column::Creator => project.creator.as_ref().map(|u| u.email.clone()),
        Column::LastViewedAt => date(project.analytics.as_ref().and_then(|a| a.last_viewed_at)),
        Column::AppViews => project
            .analytics
            .as_ref()
            .and_then(|a| a.app_views.as_ref())
            .map(|v| v.all_time.to_string()),
    };
    cell.unwrap_or_default()
}

pub fn project_table(title: &str, projects: &[Project], columns: &[Column]) -> String {
    let headers: Vec<&str> = columns.iter().map(Column::header).collect();
    let rows: Vec<Vec<String>> = projects
        .iter()
        .map(|p| columns.iter().map(|c| project_cell(p, *c)).collect())
        .collect();
    render_table(title, &headers, &rows)
}

pub fn runs_table(project_id: &str, runs: &[RunStatusRecord], now: DateTime<Utc>) -> String {
    let rows: Vec<Vec<String>> = runs
        .iter()
        .map(|run| {
            vec![
                run.run_id.clone(),
                run.status.to_string(),
                format_optional_timestamp(run.start_time, now),
                format_optional_timestamp(run.end_time, now),
                run.duration().map_or_else(|| "N/A".to_string(), format_duration),
            ]
        })
        .collect();
    render_table(
        &format!("Runs for Project {project_id}"),
        &["Run ID", "Status", "Started", "Ended", "Duration"],
        &rows,
    )
}

fn describe_schedule(schedule: &Schedule) -> Vec<String> {
    let Some(t) = schedule.time() else {
        return Vec::new();
    };
    let hh_mm = || {
        format!(
            "{:02}:{:02}",
            t.hour.unwrap_or_default(),
            t.minute.unwrap_or_default()
        )
    };

    let mut lines = match schedule.cadence {
        ScheduleCadence::Hourly => vec![format!(
            "Runs at: {} minutes past each hour",
            t.minute.unwrap_or_default()
        )],
        ScheduleCadence::Daily => vec![format!("Runs at: {}", hh_mm())],
        ScheduleCadence::Weekly => vec![
            format!("Day: {}", t.day_of_week.as_deref().unwrap_or("N/A")),
            format!("Time: {}", hh_mm()),
        ],
        ScheduleCadence::Monthly => vec![
            format!("Day: {}", t.day.unwrap_or_default()),
            format!("Time: {}", hh_mm()),
        ],
        ScheduleCadence::Custom => {
            vec![format!("Cron: {}", t.cron.as_deref().unwrap_or("N/A"))]
        }
        ScheduleCadence::Unknown => Vec::new(),
    };
    lines.push(format!("Timezone: {}", t.timezone));
    lines
}

fn section(title: &str) {
    println!("\n{}", title.bold());
}

fn row(label: &str, value: impl std::fmt::Display) {
    println!("  {:<16}{value}", label.dimmed());
}

/// Sectioned detail view for `projects get`.
pub fn print_project(project: &Project, include_sharing: bool, now: DateTime<Utc>) {
    let name = if project.title.trim().is_empty() {
        "Untitled"
    } else {
        project.title.trim()
    };
    println!("\n{}", name.cyan().bold());

    section("Basic Information");
    row("ID", project.id.cyan());
    row("Type", project.project_type.as_str());
    if let Some(ref description) = project.description {
        row("Description", truncate(description, MAX_DESCRIPTION_LEN));
    }
    let status = project.status.as_ref().map_or("Unknown", |s| s.name.as_str());
    if status == "Published" {
        row("Status", status.green());
    } else {
        row("Status", status.yellow());
    }

    section("People");
    if let Some(ref creator) = project.creator {
        row("Creator", &creator.email);
    }
    if let Some(ref owner) = project.owner {
        row("Owner", &owner.email);
    }

    section("Timestamps");
    let stamps = [
        ("Created", project.created_at, false),
        ("Last Edited", project.last_edited_at, false),
        ("Last Published", project.last_published_at, false),
        ("Archived", project.archived_at, true),
        ("Trashed", project.trashed_at, true),
    ];
    for (label, ts, alarming) in stamps {
        if let Some(ts) = ts {
            let text = format_timestamp(ts, now);
            if alarming {
                row(label, text.red());
            } else {
                row(label, text);
            }
        }
    }

    if let Some(ref analytics) = project.analytics {
        section("Analytics");
        if let Some(ts) = analytics.last_viewed_at {
            row("Last Viewed", format_timestamp(ts, now));
        }
        if let Some(ts) = analytics.published_results_updated_at {
            row("Results Updated", format_timestamp(ts, now));
        }
        if let Some(ref views) = analytics.app_views {
            row(
                "App Views",
                format!(
                    "All time: {} | 30d: {} | 7d: {}",
                    group_thousands(views.all_time),
                    group_thousands(views.last_thirty_days),
                    group_thousands(views.last_seven_days)
                ),
            );
        }
    }

    if !project.categories.is_empty() {
        section("Categories");
        for cat in &project.categories {
            match cat.description {
                Some(ref d) => println!("  • {}: {}", cat.name, d.dimmed()),
                None => println!("  • {}", cat.name),
            }
        }
    }

    if let Some(ref reviews) = project.reviews {
        section("Reviews");
        println!(
            "  Reviews Required: {}",
            if reviews.required { "Yes" } else { "No" }
        );
    }

    let enabled: Vec<_> = project
        .schedules
        .iter()
        .enumerate()
        .filter(|(_, s)| s.enabled)
        .collect();
    if !enabled.is_empty() {
        section("Schedules");
        for (i, schedule) in enabled {
            println!(
                "\n  Schedule {}: {}",
                i + 1,
                format!("{:?}", schedule.cadence).to_uppercase().yellow()
            );
            for line in describe_schedule(schedule) {
                println!("    {line}");
            }
        }
    }

    if include_sharing {
        if let Some(ref sharing) = project.sharing {
            print_sharing(sharing);
        }
    }

    println!();
}

fn print_sharing(sharing: &crate::models::Sharing) {
    section("Sharing & Permissions");

    let scopes = [
        ("Workspace", &sharing.workspace),
        ("Public Web", &sharing.public_web),
        ("Support", &sharing.support),
    ];
    for (label, entry) in scopes {
        if let Some(entry) = entry {
            println!("\n  {}", label.bold());
            println!("    Access Level: {}", format_access_level(entry.access));
        }
    }

    if !sharing.users.is_empty() {
        println!("\n  {}", format!("Users ({})", sharing.users.len()).bold());
        for user in sharing.users.iter().take(MAX_SHARED_USERS) {
            println!("    • {}: {}", user.user.email, format_access_level(user.access));
        }
        if sharing.users.len() > MAX_SHARED_USERS {
            println!("    ... and {} more", sharing.users.len() - MAX_SHARED_USERS);
        }
    }

    if !sharing.groups.is_empty() {
        println!("\n  {}", format!("Groups ({})", sharing.groups.len()).bold());
        for group in &sharing.groups {
            println!("    • {}: {}", group.group.name, format_access_level(group.access));
        }
    }

    if !sharing.collections.is_empty() {
        println!(
            "\n  {}",
            format!("Collections ({})", sharing.collections.len()).bold()
        );
        for collection in &sharing.collections {
            println!(
                "    • {}: {}",
                collection.collection.name,
                format_access_level(collection.access)
            );
        }
    }
}

/// Detail view for `runs status` and the end of `projects run --wait`.
pub fn print_run_status(record: &RunStatusRecord, now: DateTime<Utc>) {
    println!("\n{}", "Run Status".bold());
    println!("Run ID: {}", record.run_id.cyan());
    if let Some(ref project_id) = record.project_id {
        println!("Project ID: {}", project_id.cyan());
    }
    println!("Status: {}", format_status(record.status));
    println!("Started: {}", format_optional_timestamp(record.start_time, now));
    println!("Ended: {}", format_optional_timestamp(record.end_time, now));
    if let Some(ms) = record.elapsed_time {
        println!("Elapsed: {:.1}s", ms / 1000.0);
    }
    if let Some(ref error) = record.error {
        let text = error
            .as_str()
            .map_or_else(|| error.to_string(), str::to_string);
        println!("\n{}", format!("Error: {text}").red());
    }
}

/// One-line description of a failure for stderr.
pub fn describe_error(err: &HexError) -> String {
    match err {
        HexError::Api(api) => {
            let mut text = format!("API Error: {api}");
            match api {
                ApiError::RateLimit {
                    retry_after: Some(secs),
                    ..
                } => text.push_str(&format!(" - retry after {secs}s")),
                ApiError::Validation {
                    invalid_params,
                    not_found_params,
                    ..
                } => {
                    for p in invalid_params {
                        text.push_str(&format!(
                            "\n  invalid parameter '{}' ({}): {}",
                            p.param_name, p.data_type, p.param_value
                        ));
                    }
                    if !not_found_params.is_empty() {
                        text.push_str(&format!(
                            "\n  unknown parameters: {}",
                            not_found_params.join(", ")
                        ));
                    }
                }
                _ => {}
            }
            text
        }
        other => format!("Error: {other}"),
    }
}
