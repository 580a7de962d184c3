//! Walk through the Hex SDK end to end.
//!
//! Run with:
//!   HEX_API_KEY=hxtw_... cargo run --example run_project -- <project-id>
//!
//! Set `HEX_API_BASE_URL` to point at a single-tenant or EU workspace.

use std::time::Duration;

use hex_toolkit::{
    ApiError, ClientBuilder, EmbeddingRequest, HexError, ListProjectsParams, ListRunsParams,
    PollOptions, PollOutcome, RunProjectRequest, RunStatus,
};

#[tokio::main]
async fn main() -> hex_toolkit::Result<()> {
    let project_id = std::env::args()
        .nth(1)
        .ok_or_else(|| HexError::InvalidInput("usage: run_project <project-id>".into()))?;

    // -----------------------------------------------------------------------
    // 1. Create a client (reads HEX_API_KEY from environment)
    // -----------------------------------------------------------------------
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(60))
        .build()?;

    // -----------------------------------------------------------------------
    // 2. Look at the project and its neighbours
    // -----------------------------------------------------------------------
    let project = client.get_project(&project_id, true).await?;
    println!("{} ({})", project.title, project.project_type.as_str());
    if let Some(ref owner) = project.owner {
        println!("Owner: {}", owner.email);
    }

    let page = client
        .list_projects(&ListProjectsParams {
            limit: 5,
            ..Default::default()
        })
        .await?;
    for p in &page.values {
        println!("  {} | {}", p.id, p.title);
    }
    println!();

    // -----------------------------------------------------------------------
    // 3. Validate inputs with a dry run
    // -----------------------------------------------------------------------
    let dry = RunProjectRequest {
        dry_run: true,
        ..Default::default()
    };
    match client.run_project(&project_id, &dry).await {
        Ok(run) => println!("Dry run accepted: {}", run.run_id),
        Err(HexError::Api(ApiError::Validation {
            invalid_params,
            not_found_params,
            ..
        })) => {
            for p in &invalid_params {
                println!("  invalid {}: {} ({})", p.param_name, p.param_value, p.data_type);
            }
            for name in &not_found_params {
                println!("  unknown input: {name}");
            }
            return Ok(());
        }
        Err(e) => return Err(e),
    }

    // -----------------------------------------------------------------------
    // 4. Run for real and wait, printing each status change
    // -----------------------------------------------------------------------
    let run = client
        .run_project(&project_id, &RunProjectRequest::default())
        .await?;
    println!("Started run {} -> {}", run.run_id, run.run_url);

    let opts = PollOptions::default()
        .with_interval(Duration::from_secs(3))
        .with_max_duration(Duration::from_secs(30 * 60))
        .on_status_change(|s| println!("  Status: {}", s.status));

    match client.wait_for_run(&project_id, &run.run_id, opts).await? {
        PollOutcome::Finished(status) => {
            println!("Run finished: {}", status.status);
            if let Some(d) = status.duration() {
                println!("Took {}s", d.num_seconds());
            }
            if let Some(ref err) = status.error {
                println!("Error: {err}");
            }
        }
        PollOutcome::Cancelled { last_status } => {
            println!("Stopped waiting (last status: {last_status:?})");
        }
    }
    println!();

    // -----------------------------------------------------------------------
    // 5. Recent completed runs
    // -----------------------------------------------------------------------
    let runs = client
        .list_runs(
            &project_id,
            &ListRunsParams {
                limit: 10,
                status: Some(RunStatus::Completed),
                ..Default::default()
            },
        )
        .await?;
    for r in &runs.runs {
        println!("  {} | {}", r.run_id, r.status);
    }
    println!();

    // -----------------------------------------------------------------------
    // 6. Start one more and cancel it straight away
    // -----------------------------------------------------------------------
    let extra = client
        .run_project(&project_id, &RunProjectRequest::default())
        .await?;
    client.cancel_run(&project_id, &extra.run_id).await?;
    println!("Cancelled run {}", extra.run_id);

    // -----------------------------------------------------------------------
    // 7. Embedding URL, valid for one minute
    // -----------------------------------------------------------------------
    let embed = client
        .create_presigned_url(
            &project_id,
            &EmbeddingRequest {
                expires_in: Some(60_000),
                test_mode: true,
                ..Default::default()
            },
        )
        .await?;
    println!("Embed URL: {}", embed.url);

    Ok(())
}
