//! Main workflow orchestration logic
//!
//! Separates CLI argument parsing from the fetch → reconcile → push
//! sequence so the workflow can be driven programmatically.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::domain::{BranchPair, CommitId, ReconcilePolicy};
use crate::git::Git2Graph;
use crate::reconcile::{self, ReconcileOutcome};
use crate::ui;
use crate::warning::ReconcileWarning;

/// Arguments for the reconcile workflow
///
/// Mirrors the CLI Args without depending on clap. `None` and `false`
/// fall back to the configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReconcileWorkflowArgs {
    /// Path to custom config file
    pub config_path: Option<String>,

    /// Path inside the repository to operate on
    pub repo_path: String,

    /// Override for the integration branch
    pub integration: Option<String>,

    /// Override for the publish branch
    pub publish: Option<String>,

    /// Override for the git remote
    pub remote: Option<String>,

    /// Skip fetching before the pass
    pub no_fetch: bool,

    /// Skip pushing after the pass
    pub no_push: bool,

    /// Print the plan without changing anything
    pub dry_run: bool,
}

/// Effective settings after applying CLI overrides to the configuration
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSettings {
    pub branches: BranchPair,
    pub policy: ReconcilePolicy,
    pub remote: String,
    pub fetch: bool,
    pub push: bool,
    pub update_worktree: bool,
}

/// Result of a completed workflow
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    /// `None` for a dry run
    pub outcome: Option<ReconcileOutcome>,

    /// Whether both branches were pushed to the remote
    pub pushed: bool,

    /// Whether the checked-out working copy was refreshed
    pub worktree_refreshed: bool,

    pub warnings: Vec<ReconcileWarning>,
}

/// Merge CLI overrides into the configuration and validate the result
pub fn resolve_settings(args: &ReconcileWorkflowArgs, config: &Config) -> Result<WorkflowSettings> {
    let mut config = config.clone();

    if let Some(integration) = &args.integration {
        config.branches.integration = integration.clone();
    }
    if let Some(publish) = &args.publish {
        config.branches.publish = publish.clone();
    }
    if let Some(remote) = &args.remote {
        config.behavior.remote = remote.clone();
    }
    config.validate()?;

    Ok(WorkflowSettings {
        branches: config.branch_pair()?,
        policy: config.policy()?,
        remote: config.behavior.remote.clone(),
        fetch: config.behavior.fetch && !args.no_fetch && !args.dry_run,
        push: config.behavior.push && !args.no_push,
        update_worktree: config.behavior.update_worktree,
    })
}

/// Local tips of `branches`, `None` for a missing branch
fn snapshot(graph: &Git2Graph, branches: &[&str]) -> Result<Vec<Option<CommitId>>> {
    let mut tips = Vec::with_capacity(branches.len());
    for branch in branches {
        tips.push(graph.branch_tip(branch)?);
    }
    Ok(tips)
}

/// Refresh the working copy if HEAD is a branch that moved since `before`
fn refresh_moved(graph: &Git2Graph, branches: &[&str], before: &[Option<CommitId>]) -> Result<bool> {
    let after = snapshot(graph, branches)?;
    let moved: Vec<&str> = branches
        .iter()
        .zip(before.iter().zip(after.iter()))
        .filter(|(_, (old, new))| old != new)
        .map(|(branch, _)| *branch)
        .collect();

    if moved.is_empty() {
        return Ok(false);
    }
    Ok(graph.refresh_worktree(&moved)?)
}

/// Main reconcile workflow
///
/// Orchestrates one pass:
/// 1. Resolve settings and open the repository
/// 2. Fetch and fast-forward both branches (optional)
/// 3. Plan the pass; stop here on a dry run
/// 4. Reconcile both branches atomically
/// 5. Refresh the working copy and push both branches (optional)
///
/// The working copy is refreshed whenever the checked-out branch moves,
/// whether by a fast-forward from the remote or by the pass itself.
pub fn run_reconcile_workflow(args: &ReconcileWorkflowArgs, config: &Config) -> Result<WorkflowResult> {
    let settings = resolve_settings(args, config)?;
    let branches = &settings.branches;
    let names = [branches.integration.as_str(), branches.publish.as_str()];

    let mut graph = Git2Graph::open(&args.repo_path)
        .with_context(|| format!("Cannot open repository at '{}'", args.repo_path))?;

    let mut warnings = Vec::new();
    let mut worktree_refreshed = false;

    if settings.fetch {
        ui::display_status(&format!("Fetching from '{}'...", settings.remote));
        let before = snapshot(&graph, &names)?;
        let fetched = graph.fetch_branches(&settings.remote, &names)?;
        warnings.extend(fetched);

        if settings.update_worktree {
            worktree_refreshed |= refresh_moved(&graph, &names, &before)?;
        }
    }

    let plan = reconcile::plan(&graph, branches, &settings.policy)?;
    warnings.extend(plan.warnings.iter().cloned());
    for warning in &warnings {
        ui::display_warning(warning);
    }

    if args.dry_run {
        ui::display_plan(&plan, branches);
        return Ok(WorkflowResult {
            outcome: None,
            pushed: false,
            worktree_refreshed,
            warnings,
        });
    }

    let before = snapshot(&graph, &names)?;
    let outcome = reconcile::execute(&mut graph, branches, &plan)?;
    ui::display_outcome(&outcome, branches);

    if settings.update_worktree {
        worktree_refreshed |= refresh_moved(&graph, &names, &before)?;
    }

    let mut result = WorkflowResult {
        outcome: Some(outcome.clone()),
        pushed: false,
        worktree_refreshed,
        warnings,
    };

    if outcome.is_noop() {
        return Ok(result);
    }

    if settings.push {
        ui::display_status(&format!("Pushing to '{}'...", settings.remote));
        graph.push_branches(
            &settings.remote,
            &branches.publish,
            &branches.integration,
            &plan.integration_tip.id,
        )?;
        ui::display_success(&format!(
            "Pushed '{}' and '{}' to '{}'",
            branches.publish, branches.integration, settings.remote
        ));
        result.pushed = true;
    }

    info!(
        promoted = outcome.promoted_count(),
        pushed = result.pushed,
        "workflow finished"
    );
    Ok(result)
}
