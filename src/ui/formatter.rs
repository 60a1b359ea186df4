//! Pure formatting functions for UI output.
//!
//! `format_*` functions build the text so it can be tested; `display_*`
//! functions print it.

use console::style;

use crate::domain::{BranchPair, Commit};
use crate::reconcile::{GateDecision, NoopReason, ReconcileOutcome, ReconcilePlan};
use crate::warning::ReconcileWarning;

/// Longest commit summary shown before truncation
const SUMMARY_WIDTH: usize = 60;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a reconcile warning to the user.
pub fn display_warning(warning: &ReconcileWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// One commit as `short-id author: summary`
pub fn format_commit(commit: &Commit) -> String {
    let summary = commit.summary();
    let summary = if summary.chars().count() > SUMMARY_WIDTH {
        let cut: String = summary.chars().take(SUMMARY_WIDTH).collect();
        format!("{}…", cut)
    } else {
        summary.to_string()
    };

    format!("{} {}: {}", commit.id.short(), commit.author, summary)
}

/// Describe what a pass would do
pub fn format_plan(plan: &ReconcilePlan, branches: &BranchPair) -> String {
    let mut out = String::new();

    match &plan.gate {
        GateDecision::Skip { tip, author } => {
            out.push_str(&format!(
                "Tip {} of '{}' is authored by {}; nothing will be published.\n",
                tip.short(),
                branches.integration,
                author
            ));
            return out;
        }
        GateDecision::Proceed => {}
    }

    out.push_str(&format!(
        "{} commit(s) on '{}' are not on '{}'.\n",
        plan.divergent.len(),
        branches.integration,
        branches.publish
    ));

    out.push_str(&format!("Promote to '{}':\n", branches.publish));
    if plan.promotion.is_empty() {
        out.push_str("  (none)\n");
    }
    for (i, commit) in plan.promotion.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, format_commit(commit)));
    }

    out.push_str(&format!("Replay on top of '{}':\n", branches.integration));
    if plan.pinned.is_empty() {
        out.push_str("  (none)\n");
    }
    for (i, commit) in plan.pinned.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, format_commit(commit)));
    }

    out
}

/// One-line summary of a finished pass
pub fn format_outcome(outcome: &ReconcileOutcome, branches: &BranchPair) -> String {
    match outcome {
        ReconcileOutcome::Noop(NoopReason::GateSkip { tip, author }) => format!(
            "Skipped: tip {} of '{}' was committed by {}",
            tip.short(),
            branches.integration,
            author
        ),
        ReconcileOutcome::Noop(NoopReason::NothingToPromote) => format!(
            "Nothing to promote from '{}' to '{}'",
            branches.integration, branches.publish
        ),
        ReconcileOutcome::Promoted {
            count,
            replayed,
            publish_tip,
            integration_tip,
        } => format!(
            "Promoted {} commit(s) to '{}' ({}), replayed {} pinned commit(s) on '{}' ({})",
            count,
            branches.publish,
            publish_tip.short(),
            replayed,
            branches.integration,
            integration_tip.short()
        ),
    }
}

/// Print the plan with a bold heading
pub fn display_plan(plan: &ReconcilePlan, branches: &BranchPair) {
    println!("\n{}", style("Reconciliation plan").bold());
    print!("{}", format_plan(plan, branches));
}

/// Print the outcome of a pass
pub fn display_outcome(outcome: &ReconcileOutcome, branches: &BranchPair) {
    if outcome.is_noop() {
        display_status(&format_outcome(outcome, branches));
    } else {
        display_success(&format_outcome(outcome, branches));
    }
}
