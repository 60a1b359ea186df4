// tests/cli_orchestration_test.rs
use git_automerge::cli::orchestration::{resolve_settings, ReconcileWorkflowArgs, WorkflowResult};
use git_automerge::config::Config;
use git_automerge::reconcile::{NoopReason, ReconcileOutcome};
use git_automerge::warning::ReconcileWarning;

fn args() -> ReconcileWorkflowArgs {
    ReconcileWorkflowArgs {
        repo_path: ".".to_string(),
        ..Default::default()
    }
}

#[test]
fn test_settings_follow_config() {
    let settings = resolve_settings(&args(), &Config::default()).unwrap();

    assert_eq!(settings.branches.integration, "default");
    assert_eq!(settings.branches.publish, "master");
    assert_eq!(settings.remote, "origin");
    assert!(settings.fetch);
    assert!(settings.push);
    assert!(settings.update_worktree);
    assert_eq!(
        settings.policy.automation_identity(),
        "Pantheon Automation <bot@getpantheon.com>"
    );
}

#[test]
fn test_cli_overrides_win() {
    let args = ReconcileWorkflowArgs {
        integration: Some("develop".to_string()),
        publish: Some("live".to_string()),
        remote: Some("upstream".to_string()),
        no_fetch: true,
        no_push: true,
        ..args()
    };

    let settings = resolve_settings(&args, &Config::default()).unwrap();
    assert_eq!(settings.branches.integration, "develop");
    assert_eq!(settings.branches.publish, "live");
    assert_eq!(settings.remote, "upstream");
    assert!(!settings.fetch);
    assert!(!settings.push);
}

#[test]
fn test_dry_run_disables_fetch() {
    let args = ReconcileWorkflowArgs {
        dry_run: true,
        ..args()
    };
    let settings = resolve_settings(&args, &Config::default()).unwrap();
    assert!(!settings.fetch);
}

#[test]
fn test_config_disabled_push_stays_disabled() {
    let mut config = Config::default();
    config.behavior.push = false;
    let settings = resolve_settings(&args(), &config).unwrap();
    assert!(!settings.push);
}

#[test]
fn test_empty_override_is_rejected() {
    let args = ReconcileWorkflowArgs {
        publish: Some("  ".to_string()),
        ..args()
    };
    assert!(resolve_settings(&args, &Config::default()).is_err());
}

#[test]
fn test_workflow_result_structure() {
    let result = WorkflowResult {
        outcome: Some(ReconcileOutcome::Noop(NoopReason::NothingToPromote)),
        pushed: false,
        worktree_refreshed: false,
        warnings: vec![ReconcileWarning::FetchAuthenticationFailed {
            remote: "origin".to_string(),
        }],
    };

    assert!(result.outcome.as_ref().map(ReconcileOutcome::is_noop).unwrap_or(false));
    assert!(!result.pushed);
    assert_eq!(result.warnings.len(), 1);
}
