//! Reconciliation of the integration and publish branches
//!
//! A pass runs three stages in order:
//!
//! 1. [gate] - proceed only if the integration tip is automation-authored
//! 2. [selector] - split the divergent set into promotion and pinned commits
//! 3. [rebuilder] - promote onto the publish branch, then rebuild the
//!    integration branch as the new publish tip plus the replayed pinned commits
//!
//! The divergent set is recomputed from the graph on every pass, so running
//! [reconcile] again right after a successful pass is a no-op.

pub mod gate;
pub mod rebuilder;
pub mod selector;

use tracing::{info, warn};

use crate::domain::{BranchPair, Commit, CommitId, Identity, ReconcilePolicy};
use crate::error::Result;
use crate::git::CommitGraph;
use crate::warning::ReconcileWarning;

pub use gate::GateDecision;
pub use rebuilder::RebuildResult;
pub use selector::Selection;

/// Everything a pass would do, computed without side effects
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilePlan {
    pub integration_tip: Commit,
    pub publish_tip: CommitId,
    pub gate: GateDecision,
    /// Commits on the integration branch missing from the publish branch, oldest first
    pub divergent: Vec<Commit>,
    pub promotion: Vec<Commit>,
    pub pinned: Vec<Commit>,
    pub warnings: Vec<ReconcileWarning>,
}

/// Why a pass changed nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoopReason {
    /// The integration tip is human-authored
    GateSkip { tip: CommitId, author: Identity },
    /// Every divergent commit is pinned (or there are none)
    NothingToPromote,
}

/// Result of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Noop(NoopReason),
    Promoted {
        count: usize,
        replayed: usize,
        publish_tip: CommitId,
        integration_tip: CommitId,
    },
}

impl ReconcileOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, ReconcileOutcome::Noop(_))
    }

    /// Number of commits promoted to the publish branch
    pub fn promoted_count(&self) -> usize {
        match self {
            ReconcileOutcome::Noop(_) => 0,
            ReconcileOutcome::Promoted { count, .. } => *count,
        }
    }
}

/// Compute what a pass would do without touching either branch.
pub fn plan<G: CommitGraph + ?Sized>(
    graph: &G,
    branches: &BranchPair,
    policy: &ReconcilePolicy,
) -> Result<ReconcilePlan> {
    let integration_tip = graph.resolve_tip(&branches.integration)?;
    let publish_tip = graph.resolve_tip(&branches.publish)?.id;
    let gate = gate::evaluate(&integration_tip, policy);

    let mut plan = ReconcilePlan {
        integration_tip,
        publish_tip,
        gate,
        divergent: Vec::new(),
        promotion: Vec::new(),
        pinned: Vec::new(),
        warnings: Vec::new(),
    };

    if !plan.gate.proceeds() {
        return Ok(plan);
    }

    plan.divergent = graph.divergent_commits(&branches.integration, &branches.publish)?;
    let selection = selector::select(&plan.divergent, policy);

    if !selection.pinned_contiguous {
        let warning = ReconcileWarning::InterleavedPinned {
            pinned: selection.pinned.len(),
        };
        warn!(branch = %branches.integration, "{}", warning);
        plan.warnings.push(warning);
    }

    plan.promotion = selection.promotion;
    plan.pinned = selection.pinned;
    Ok(plan)
}

/// Run one reconciliation pass.
///
/// On a conflict or any other failure both branches are left at their
/// pre-pass tips.
pub fn reconcile<G: CommitGraph + ?Sized>(
    graph: &mut G,
    branches: &BranchPair,
    policy: &ReconcilePolicy,
) -> Result<ReconcileOutcome> {
    let plan = plan(graph, branches, policy)?;
    execute(graph, branches, &plan)
}

/// Carry out a previously computed plan.
pub fn execute<G: CommitGraph + ?Sized>(
    graph: &mut G,
    branches: &BranchPair,
    plan: &ReconcilePlan,
) -> Result<ReconcileOutcome> {
    if let GateDecision::Skip { tip, author } = &plan.gate {
        info!(tip = %tip.short(), %author, "integration tip is human-authored, skipping");
        return Ok(ReconcileOutcome::Noop(NoopReason::GateSkip {
            tip: tip.clone(),
            author: author.clone(),
        }));
    }

    if plan.promotion.is_empty() {
        info!(
            divergent = plan.divergent.len(),
            "no commits to promote"
        );
        return Ok(ReconcileOutcome::Noop(NoopReason::NothingToPromote));
    }

    let rebuilt = rebuilder::rebuild(graph, branches, plan)?;
    info!(
        promoted = rebuilt.promoted,
        replayed = rebuilt.replayed,
        publish = %branches.publish,
        integration = %branches.integration,
        "reconciled branches"
    );

    Ok(ReconcileOutcome::Promoted {
        count: rebuilt.promoted,
        replayed: rebuilt.replayed,
        publish_tip: rebuilt.publish_tip,
        integration_tip: rebuilt.integration_tip,
    })
}
