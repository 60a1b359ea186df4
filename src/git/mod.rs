//! Commit graph abstraction layer
//!
//! This module provides a trait-based abstraction over the handful of
//! version-control operations the reconciler needs, allowing for a real
//! `git2`-backed implementation and an in-memory one for testing.
//!
//! # Overview
//!
//! The primary abstraction is the [CommitGraph] trait. The concrete
//! implementations include:
//!
//! - [repository::Git2Graph]: A real implementation using the `git2` crate
//! - [mock::MockGraph]: A content-addressed in-memory graph for tests
//!
//! Commits are created without moving any branch. Intermediate tips are
//! recorded as staging refs and both branches are swapped in one step with
//! [CommitGraph::update_branches], so a failed pass leaves the branches
//! where they were.
//!
//! ```rust
//! # use git_automerge::git::CommitGraph;
//! # fn example<G: CommitGraph>(graph: &G) -> git_automerge::Result<()> {
//! let tip = graph.resolve_tip("default")?;
//! let pending = graph.divergent_commits("default", "master")?;
//! println!("{} commits ahead of master, tip {}", pending.len(), tip.id.short());
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod remote;
pub mod repository;

pub use mock::MockGraph;
pub use repository::Git2Graph;

use tracing::debug;

use crate::domain::{Commit, CommitId};
use crate::error::{AutomergeError, ConflictPhase, Result};

/// Namespace holding intermediate tips while a pass is staged
pub const STAGING_REF_PREFIX: &str = "refs/automerge/staging/";

/// Staging name used for replayed pinned commits
pub const REPLAY_STAGING_NAME: &str = "replay";

/// Result of cherry-picking a single commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    /// The commit applied cleanly and produced this new commit
    Applied(CommitId),
    /// The commit conflicts on these paths
    Conflict(Vec<String>),
}

/// Compare-and-swap update of one branch pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchUpdate {
    pub branch: String,
    /// Tip the branch must still point at
    pub expected: CommitId,
    pub target: CommitId,
}

/// Version-control capability surface used by the reconciler
///
/// ## Error Handling
///
/// Missing branches or commits map to [AutomergeError::GraphIntegrity];
/// failures of the underlying store are propagated unchanged.
pub trait CommitGraph {
    /// Resolve the commit a branch points at
    fn resolve_tip(&self, branch: &str) -> Result<Commit>;

    /// Commits reachable from `from_branch` but not from `to_branch`, oldest first
    ///
    /// Fails with a graph integrity error when the branches share no history.
    fn divergent_commits(&self, from_branch: &str, to_branch: &str) -> Result<Vec<Commit>>;

    /// Apply the changes of `commit` on top of `onto` as a new commit
    ///
    /// Author, committer and message are copied verbatim. No branch moves.
    /// When `onto` already contains the change, `onto` itself is returned.
    fn cherry_pick(&mut self, commit: &Commit, onto: &CommitId) -> Result<PickOutcome>;

    /// Record `tip` under the staging ref `name`
    fn stage(&mut self, name: &str, tip: &CommitId) -> Result<()>;

    /// Remove every staging ref
    fn discard_staging(&mut self) -> Result<()>;

    /// Move all branches together, or none of them
    ///
    /// Fails with a graph integrity error if any branch no longer points at
    /// its `expected` tip. A branch that does not exist yet is created.
    fn update_branches(&mut self, updates: &[BranchUpdate]) -> Result<()>;

    /// Apply `commits` in order on top of `target_branch`'s tip
    ///
    /// Returns the staged tip; the branch itself does not move.
    fn apply_commits(&mut self, target_branch: &str, commits: &[Commit]) -> Result<CommitId> {
        let tip = self.resolve_tip(target_branch)?;
        pick_sequence(self, &tip.id, commits, ConflictPhase::Promote, target_branch)
    }

    /// Replay `commits` in order on top of `onto`, producing new commits
    fn replay_commits(&mut self, onto: &CommitId, commits: &[Commit]) -> Result<CommitId> {
        pick_sequence(self, onto, commits, ConflictPhase::Replay, REPLAY_STAGING_NAME)
    }

    /// Point `branch` at `to`
    fn reset_branch(&mut self, branch: &str, to: &CommitId) -> Result<()> {
        let current = self.resolve_tip(branch)?;
        self.update_branches(&[BranchUpdate {
            branch: branch.to_string(),
            expected: current.id,
            target: to.clone(),
        }])
    }
}

/// Cherry-pick `commits` one after another starting at `onto`.
///
/// A commit whose only parent is already the running tip is reused as is.
fn pick_sequence<G: CommitGraph + ?Sized>(
    graph: &mut G,
    onto: &CommitId,
    commits: &[Commit],
    phase: ConflictPhase,
    staging_name: &str,
) -> Result<CommitId> {
    let mut tip = onto.clone();

    for commit in commits {
        if commit.parents.len() == 1 && commit.parents[0] == tip {
            debug!(commit = %commit.id.short(), %phase, "fast-forward");
            tip = commit.id.clone();
        } else {
            match graph.cherry_pick(commit, &tip)? {
                PickOutcome::Applied(id) => {
                    debug!(commit = %commit.id.short(), new = %id.short(), %phase, "picked");
                    tip = id;
                }
                PickOutcome::Conflict(paths) => {
                    return Err(AutomergeError::Conflict {
                        commit: commit.id.clone(),
                        phase,
                        paths,
                    });
                }
            }
        }
        graph.stage(staging_name, &tip)?;
    }

    Ok(tip)
}
