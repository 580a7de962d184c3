//! Command dispatch for the `hex` binary.

use std::time::Duration;

use chrono::Utc;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use crate::cli::display;
use crate::cli::{
    Cli, CliError, Commands, ConnectionArgs, EmbedArgs, ListProjectsArgs, ProjectsCommand,
    RunProjectArgs, RunsCommand,
};
use crate::client::{Client, ClientBuilder};
use crate::models::{
    DisplayOptions, EmbeddingRequest, ListProjectsParams, ListRunsParams, RunProjectRequest,
};
use crate::poller::{PollOptions, PollOutcome};

const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Run one parsed invocation to completion.
pub async fn execute(cli: Cli) -> Result<(), CliError> {
    // `runs cancel` asks before it needs a client.
    if let Commands::Runs(RunsCommand::Cancel { ref run_id, yes, .. }) = cli.command {
        if !yes && !confirm_cancel(run_id)? {
            println!("{}", "Cancelled".yellow());
            return Ok(());
        }
    }

    let client = connect(&cli.connection)?;

    match cli.command {
        Commands::Projects(ProjectsCommand::List(args)) => list_projects(&client, args).await,
        Commands::Projects(ProjectsCommand::Get {
            project_id,
            include_sharing,
        }) => {
            let project = client.get_project(&project_id, include_sharing).await?;
            display::print_project(&project, include_sharing, Utc::now());
            Ok(())
        }
        Commands::Projects(ProjectsCommand::Run(args)) => run_project(&client, args).await,
        Commands::Runs(RunsCommand::Status { project_id, run_id }) => {
            let status = client.get_run_status(&project_id, &run_id).await?;
            display::print_run_status(&status, Utc::now());
            Ok(())
        }
        Commands::Runs(RunsCommand::List {
            project_id,
            limit,
            offset,
            status,
        }) => {
            let params = ListRunsParams {
                limit,
                offset,
                status,
            };
            let list = client.list_runs(&project_id, &params).await?;
            if list.runs.is_empty() {
                println!("{}", "No runs found".yellow());
                return Ok(());
            }
            println!("{}", display::runs_table(&project_id, &list.runs, Utc::now()));
            println!("\n{}", format!("Showing {} runs", list.runs.len()).dimmed());
            Ok(())
        }
        Commands::Runs(RunsCommand::Cancel {
            project_id, run_id, ..
        }) => {
            client.cancel_run(&project_id, &run_id).await?;
            println!("{} Run {run_id} cancelled successfully", "✓".green());
            Ok(())
        }
        Commands::Embed(args) => embed(&client, args).await,
    }
}

fn connect(conn: &ConnectionArgs) -> Result<Client, CliError> {
    let mut builder = ClientBuilder::new();
    if let Some(ref key) = conn.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref url) = conn.base_url {
        builder = builder.base_url(url);
    }
    Ok(builder.build()?)
}

fn confirm_cancel(run_id: &str) -> Result<bool, CliError> {
    Ok(Confirm::new()
        .with_prompt(format!("Are you sure you want to cancel run {run_id}?"))
        .default(false)
        .interact()?)
}

fn spinner(message: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.into());
    bar.enable_steady_tick(SPINNER_TICK);
    bar
}

async fn list_projects(client: &Client, args: ListProjectsArgs) -> Result<(), CliError> {
    let params = ListProjectsParams {
        limit: args.limit,
        include_archived: args.include_archived,
        include_trashed: args.include_trashed,
        creator_email: args.creator_email,
        owner_email: args.owner_email,
        sort_by: args.sort.map(|s| s.by),
        sort_direction: args.sort.map(|s| s.direction),
        ..Default::default()
    };

    let (projects, has_more, title) = match args.search {
        Some(ref needle) => {
            let bar = spinner("Searching projects...");
            let found = client.search_projects(&params, needle).await;
            bar.finish_and_clear();
            (found?, false, format!("Hex Projects (search: '{needle}')"))
        }
        None => {
            let bar = spinner("Fetching projects...");
            let page = client.list_projects(&params).await;
            bar.finish_and_clear();
            let page = page?;
            let has_more = page.has_more();
            (page.values, has_more, "Hex Projects".to_string())
        }
    };

    if projects.is_empty() {
        println!("{}", "No projects found".yellow());
        return Ok(());
    }

    println!("{}", display::project_table(&title, &projects, &args.columns));

    if let Some(ref needle) = args.search {
        println!(
            "\n{}",
            format!("Found {} project(s) matching '{needle}'", projects.len()).dimmed()
        );
    } else if has_more {
        println!(
            "\n{}",
            "More results available. Use --limit to see more.".dimmed()
        );
    }
    Ok(())
}

async fn run_project(client: &Client, args: RunProjectArgs) -> Result<(), CliError> {
    let request = RunProjectRequest {
        input_params: args.input_params,
        dry_run: args.dry_run,
        update_published_results: args.update_cache,
        use_cached_sql_results: !args.no_sql_cache,
        ..Default::default()
    };

    let bar = spinner("Starting project run...");
    let started = client.run_project(&args.project_id, &request).await;
    bar.finish_and_clear();
    let run = started?;

    println!("\n{} Run started successfully!", "✓".green());
    println!("Run ID: {}", run.run_id.cyan());
    println!("Run URL: {}", run.run_url.blue());
    println!("Status URL: {}", run.run_status_url.blue());

    if !args.wait {
        return Ok(());
    }

    println!(
        "\n{}",
        format!(
            "Waiting for run to complete (polling every {}s)...",
            args.poll_interval
        )
        .dimmed()
    );

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let bar = spinner("Waiting for run completion...");
    let progress = bar.clone();
    let opts = PollOptions::default()
        .with_interval(Duration::from_secs(args.poll_interval))
        .with_cancellation(cancel)
        .on_status_change(move |record| {
            progress.set_message(format!("Status: {}", record.status));
        });

    let outcome = client
        .wait_for_run(&args.project_id, &run.run_id, opts)
        .await;
    bar.finish_and_clear();
    ctrl_c.abort();

    match outcome? {
        PollOutcome::Finished(status) => {
            println!(
                "\nRun completed with status: {}",
                display::format_status(status.status)
            );
            display::print_run_status(&status, Utc::now());
        }
        PollOutcome::Cancelled { .. } => {
            println!("\n{}", "Polling cancelled by user".yellow());
        }
    }
    Ok(())
}

async fn embed(client: &Client, args: EmbedArgs) -> Result<(), CliError> {
    let request = EmbeddingRequest {
        scope: (!args.scope.is_empty()).then_some(args.scope),
        expires_in: args.expires_in,
        display_options: args.theme.map(|t| DisplayOptions {
            theme: Some(t.into()),
            ..Default::default()
        }),
        test_mode: args.test_mode,
        ..Default::default()
    };

    let resp = client.create_presigned_url(&args.project_id, &request).await?;
    println!("{}", resp.url);
    Ok(())
}
