use crate::domain::commit::{Commit, Identity};
use crate::error::{AutomergeError, Result};

/// Role of a commit author
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorRole {
    Automation,
    Human,
}

/// Classification inputs: who the bot is and which paths are infrastructure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePolicy {
    automation_identity: String,
    pinned_prefixes: Vec<String>,
}

impl ReconcilePolicy {
    /// Build a policy, rejecting an empty identity or empty prefixes.
    ///
    /// Trailing slashes on prefixes are dropped, so `.circleci/` and
    /// `.circleci` are the same prefix.
    pub fn new<I, S>(automation_identity: impl Into<String>, pinned_prefixes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let automation_identity = automation_identity.into().trim().to_string();
        if automation_identity.is_empty() {
            return Err(AutomergeError::config("automation identity must not be empty"));
        }

        let mut prefixes = Vec::new();
        for prefix in pinned_prefixes {
            let normalized = prefix.as_ref().trim().trim_end_matches('/');
            if normalized.is_empty() {
                return Err(AutomergeError::config("pinned path prefix must not be empty"));
            }
            prefixes.push(normalized.to_string());
        }

        if prefixes.is_empty() {
            return Err(AutomergeError::config(
                "at least one pinned path prefix is required",
            ));
        }

        Ok(ReconcilePolicy {
            automation_identity,
            pinned_prefixes: prefixes,
        })
    }

    pub fn automation_identity(&self) -> &str {
        &self.automation_identity
    }

    pub fn pinned_prefixes(&self) -> &[String] {
        &self.pinned_prefixes
    }

    /// Whether `identity` is the automation identity.
    ///
    /// A configured bare email (no `<...>`) matches on email alone.
    pub fn is_automation(&self, identity: &Identity) -> bool {
        if identity.to_string() == self.automation_identity {
            return true;
        }
        !self.automation_identity.contains('<') && identity.email == self.automation_identity
    }

    /// Whether `path` lies within one of the pinned prefixes
    pub fn is_infrastructure_path(&self, path: &str) -> bool {
        self.pinned_prefixes.iter().any(|prefix| {
            path == prefix
                || (path.starts_with(prefix.as_str())
                    && path.as_bytes().get(prefix.len()) == Some(&b'/'))
        })
    }
}

/// Classify the author of `commit`
pub fn author_role(commit: &Commit, policy: &ReconcilePolicy) -> AuthorRole {
    if policy.is_automation(&commit.author) {
        AuthorRole::Automation
    } else {
        AuthorRole::Human
    }
}

/// A pinned commit is automation-authored and touches only infrastructure paths.
///
/// A commit with no changed paths is never pinned.
pub fn is_pinned(commit: &Commit, policy: &ReconcilePolicy) -> bool {
    author_role(commit, policy) == AuthorRole::Automation
        && !commit.paths.is_empty()
        && commit
            .paths
            .iter()
            .all(|path| policy.is_infrastructure_path(path))
}
