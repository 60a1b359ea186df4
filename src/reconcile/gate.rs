//! Decides whether a reconciliation pass runs at all.

use crate::domain::{author_role, AuthorRole, Commit, CommitId, Identity, ReconcilePolicy};

/// Outcome of the gate check on the integration tip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    /// Tip was authored by a human; nothing may be published yet
    Skip { tip: CommitId, author: Identity },
}

impl GateDecision {
    pub fn proceeds(&self) -> bool {
        matches!(self, GateDecision::Proceed)
    }
}

/// Proceed only when the integration tip is automation-authored
pub fn evaluate(tip: &Commit, policy: &ReconcilePolicy) -> GateDecision {
    match author_role(tip, policy) {
        AuthorRole::Automation => GateDecision::Proceed,
        AuthorRole::Human => GateDecision::Skip {
            tip: tip.id.clone(),
            author: tip.author.clone(),
        },
    }
}
