use anyhow::Result;
use clap::Parser;
use std::path::Path;

use git_automerge::cli::orchestration::{run_reconcile_workflow, ReconcileWorkflowArgs};
use git_automerge::{config, telemetry, ui, AutomergeError};

#[derive(clap::Parser)]
#[command(
    name = "git-automerge",
    version,
    about = "Promote commits from the integration branch to the publish branch, keeping pinned infrastructure commits at the integration tip"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short = 'C', long, default_value = ".", help = "Repository to operate on")]
    repo: String,

    #[arg(long, help = "Integration branch (overrides config)")]
    integration: Option<String>,

    #[arg(long, help = "Publish branch (overrides config)")]
    publish: Option<String>,

    #[arg(short, long, help = "Remote to fetch from and push to (overrides config)")]
    remote: Option<String>,

    #[arg(long, help = "Do not fetch before reconciling")]
    no_fetch: bool,

    #[arg(long, help = "Do not push after reconciling")]
    no_push: bool,

    #[arg(long, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    telemetry::init_tracing(telemetry::level_for_verbosity(args.verbose));

    let config = match config::load_config(args.config.as_deref().map(Path::new)) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    let workflow_args = ReconcileWorkflowArgs {
        config_path: args.config,
        repo_path: args.repo,
        integration: args.integration,
        publish: args.publish,
        remote: args.remote,
        no_fetch: args.no_fetch,
        no_push: args.no_push,
        dry_run: args.dry_run,
    };

    if let Err(e) = run_reconcile_workflow(&workflow_args, &config) {
        ui::display_error(&format!("{:#}", e));

        if let Some(commit) = e
            .downcast_ref::<AutomergeError>()
            .and_then(AutomergeError::conflicting_commit)
        {
            ui::display_status(&format!(
                "Resolve commit {} by hand, then run git-automerge again",
                commit.short()
            ));
        }
        std::process::exit(1);
    }

    Ok(())
}
