//! Applies a plan: promotes onto the publish branch, then rebuilds the
//! integration branch with its pinned commits back on top.

use tracing::{debug, warn};

use crate::domain::{BranchPair, CommitId};
use crate::error::Result;
use crate::git::{BranchUpdate, CommitGraph};
use crate::reconcile::ReconcilePlan;

/// Branch tips after a successful rebuild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildResult {
    pub publish_tip: CommitId,
    pub integration_tip: CommitId,
    pub promoted: usize,
    pub replayed: usize,
}

/// Stage the new branch states and swap both pointers at once.
///
/// Staging refs are removed whether or not the swap happens, so a failure
/// leaves both branches at their pre-pass tips.
pub fn rebuild<G: CommitGraph + ?Sized>(
    graph: &mut G,
    branches: &BranchPair,
    plan: &ReconcilePlan,
) -> Result<RebuildResult> {
    let result = stage_and_swap(graph, branches, plan);
    let cleanup = graph.discard_staging();

    match (result, cleanup) {
        (Ok(rebuilt), cleanup) => {
            cleanup?;
            Ok(rebuilt)
        }
        (Err(e), Err(cleanup_err)) => {
            warn!(error = %cleanup_err, "failed to discard staging refs");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
    }
}

fn stage_and_swap<G: CommitGraph + ?Sized>(
    graph: &mut G,
    branches: &BranchPair,
    plan: &ReconcilePlan,
) -> Result<RebuildResult> {
    let publish_tip = graph.apply_commits(&branches.publish, &plan.promotion)?;
    debug!(branch = %branches.publish, tip = %publish_tip.short(), "staged publish tip");

    let integration_tip = graph.replay_commits(&publish_tip, &plan.pinned)?;
    debug!(branch = %branches.integration, tip = %integration_tip.short(), "staged integration tip");

    graph.update_branches(&[
        BranchUpdate {
            branch: branches.publish.clone(),
            expected: plan.publish_tip.clone(),
            target: publish_tip.clone(),
        },
        BranchUpdate {
            branch: branches.integration.clone(),
            expected: plan.integration_tip.id.clone(),
            target: integration_tip.clone(),
        },
    ])?;

    Ok(RebuildResult {
        publish_tip,
        integration_tip,
        promoted: plan.promotion.len(),
        replayed: plan.pinned.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReconcilePolicy;
    use crate::error::{AutomergeError, ConflictPhase};
    use crate::git::MockGraph;
    use crate::reconcile::plan;

    const BOT: &str = "Pantheon Automation <bot@getpantheon.com>";

    fn policy() -> ReconcilePolicy {
        ReconcilePolicy::new(BOT, [".circleci"]).unwrap()
    }

    fn branches() -> BranchPair {
        BranchPair::new("default", "master").unwrap()
    }

    #[test]
    fn test_rebuild_places_pinned_on_new_publish_tip() {
        let mut graph = MockGraph::new();
        let initial = graph.commit_on("master", BOT, "Initial commit", &[("README.md", Some("#"))]);
        graph.set_branch("default", &initial);
        graph.commit_on("default", BOT, "Add CircleCI configuration", &[(".circleci/config.yml", Some("ci"))]);
        graph.commit_on("default", BOT, "Add a test commit", &[("CHANGELOG.md", Some("release"))]);

        let plan = plan(&graph, &branches(), &policy()).unwrap();
        let result = rebuild(&mut graph, &branches(), &plan).unwrap();

        assert_eq!(result.promoted, 1);
        assert_eq!(result.replayed, 1);
        assert_eq!(graph.tip_id("master"), Some(&result.publish_tip));
        assert_eq!(graph.tip_id("default"), Some(&result.integration_tip));

        let replayed = graph.commit(&result.integration_tip).unwrap();
        assert_eq!(replayed.parents, vec![result.publish_tip.clone()]);
        assert_eq!(replayed.summary(), "Add CircleCI configuration");
        assert!(graph.staging_refs().is_empty());
    }

    #[test]
    fn test_promotion_conflict_leaves_branches_untouched() {
        let mut graph = MockGraph::new();
        let initial = graph.commit_on("master", BOT, "Initial commit", &[("CHANGELOG.md", Some("base"))]);
        graph.set_branch("default", &initial);
        let change = graph.commit_on("default", BOT, "Release", &[("CHANGELOG.md", Some("theirs"))]);
        let master_tip = graph.commit_on("master", BOT, "Hotfix", &[("CHANGELOG.md", Some("ours"))]);

        let plan = plan(&graph, &branches(), &policy()).unwrap();
        let err = rebuild(&mut graph, &branches(), &plan).unwrap_err();

        match err {
            AutomergeError::Conflict { commit, phase, paths } => {
                assert_eq!(commit, change);
                assert_eq!(phase, ConflictPhase::Promote);
                assert_eq!(paths, vec!["CHANGELOG.md"]);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(graph.tip_id("master"), Some(&master_tip));
        assert_eq!(graph.tip_id("default"), Some(&change));
        assert!(graph.staging_refs().is_empty());
    }

    #[test]
    fn test_replay_conflict_leaves_branches_untouched() {
        let mut graph = MockGraph::new();
        let initial = graph.commit_on("master", BOT, "Initial commit", &[(".circleci/config.yml", Some("v1"))]);
        graph.set_branch("default", &initial);
        graph.commit_on("default", BOT, "Bump CI", &[(".circleci/config.yml", Some("v2"))]);
        let default_tip = graph.commit_on("default", BOT, "Release", &[("CHANGELOG.md", Some("1"))]);
        let master_tip = graph.commit_on("master", BOT, "Edit CI on master", &[(".circleci/config.yml", Some("v3"))]);

        let plan = plan(&graph, &branches(), &policy()).unwrap();
        let err = rebuild(&mut graph, &branches(), &plan).unwrap_err();

        match err {
            AutomergeError::Conflict { phase, .. } => assert_eq!(phase, ConflictPhase::Replay),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(graph.tip_id("master"), Some(&master_tip));
        assert_eq!(graph.tip_id("default"), Some(&default_tip));
    }

    #[test]
    fn test_moved_branch_aborts_swap() {
        let mut graph = MockGraph::new();
        let initial = graph.commit_on("master", BOT, "Initial commit", &[("README.md", Some("#"))]);
        graph.set_branch("default", &initial);
        graph.commit_on("default", BOT, "Release", &[("CHANGELOG.md", Some("1"))]);

        let plan = plan(&graph, &branches(), &policy()).unwrap();
        let racing = graph.commit_on("default", "J. Doe <doe@example.com>", "Late", &[("late", Some("1"))]);

        let err = rebuild(&mut graph, &branches(), &plan).unwrap_err();
        assert!(matches!(err, AutomergeError::GraphIntegrity(_)));
        assert_eq!(graph.tip_id("master"), Some(&initial));
        assert_eq!(graph.tip_id("default"), Some(&racing));
    }
}
