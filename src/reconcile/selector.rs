//! Splits the divergent set into commits to promote and pinned commits to replay.

use crate::domain::{is_pinned, Commit, ReconcilePolicy};

/// Divergent set partitioned by pinned-ness, both halves oldest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub promotion: Vec<Commit>,
    pub pinned: Vec<Commit>,
    /// False when a non-pinned commit sits between two pinned ones
    pub pinned_contiguous: bool,
}

/// Partition `divergent` (oldest first) keeping relative order on both sides
pub fn select(divergent: &[Commit], policy: &ReconcilePolicy) -> Selection {
    let (pinned, promotion): (Vec<Commit>, Vec<Commit>) = divergent
        .iter()
        .cloned()
        .partition(|commit| is_pinned(commit, policy));

    let positions: Vec<usize> = divergent
        .iter()
        .enumerate()
        .filter(|(_, commit)| is_pinned(commit, policy))
        .map(|(i, _)| i)
        .collect();

    let pinned_contiguous = match (positions.first(), positions.last()) {
        (Some(first), Some(last)) => last - first + 1 == positions.len(),
        _ => true,
    };

    Selection {
        promotion,
        pinned,
        pinned_contiguous,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommitId, Identity};

    const BOT: &str = "Pantheon Automation <bot@getpantheon.com>";
    const USER: &str = "J. Doe <doe@example.com>";

    fn commit(id: &str, author: &str, paths: &[&str]) -> Commit {
        Commit {
            id: CommitId::new(id),
            parents: vec![],
            author: Identity::parse(author).unwrap(),
            message: id.to_string(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn policy() -> ReconcilePolicy {
        ReconcilePolicy::new(BOT, [".circleci", ".github"]).unwrap()
    }

    fn ids(commits: &[Commit]) -> Vec<&str> {
        commits.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_pinned_excluded_order_preserved() {
        let divergent = vec![
            commit("p", BOT, &[".circleci/config.yml"]),
            commit("u", USER, &["CUSTOMIZATIONS.md"]),
            commit("r", BOT, &["CHANGELOG.md"]),
        ];

        let selection = select(&divergent, &policy());
        assert_eq!(ids(&selection.promotion), vec!["u", "r"]);
        assert_eq!(ids(&selection.pinned), vec!["p"]);
        assert!(selection.pinned_contiguous);
    }

    #[test]
    fn test_interleaved_pinned_detected() {
        let divergent = vec![
            commit("p1", BOT, &[".circleci/config.yml"]),
            commit("r", BOT, &["CHANGELOG.md"]),
            commit("p2", BOT, &[".github/workflows/a.yml"]),
        ];

        let selection = select(&divergent, &policy());
        assert_eq!(ids(&selection.promotion), vec!["r"]);
        assert_eq!(ids(&selection.pinned), vec!["p1", "p2"]);
        assert!(!selection.pinned_contiguous);
    }

    #[test]
    fn test_pinned_run_at_tip() {
        let divergent = vec![
            commit("t", BOT, &["CHANGELOG.md"]),
            commit("p1", BOT, &[".circleci/config.yml"]),
            commit("p2", BOT, &[".github/workflows/a.yml"]),
        ];

        let selection = select(&divergent, &policy());
        assert_eq!(ids(&selection.promotion), vec!["t"]);
        assert_eq!(ids(&selection.pinned), vec!["p1", "p2"]);
        assert!(selection.pinned_contiguous);
    }

    #[test]
    fn test_all_pinned_gives_empty_promotion() {
        let divergent = vec![commit("p", BOT, &[".circleci/config.yml"])];
        let selection = select(&divergent, &policy());
        assert!(selection.promotion.is_empty());
        assert_eq!(selection.pinned.len(), 1);
    }

    #[test]
    fn test_empty_divergent_set() {
        let selection = select(&[], &policy());
        assert!(selection.promotion.is_empty());
        assert!(selection.pinned.is_empty());
        assert!(selection.pinned_contiguous);
    }
}
