use std::fmt;

use thiserror::Error;

use crate::domain::CommitId;

/// Stage of the pass in which a commit failed to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPhase {
    /// Applying a promoted commit onto the publish branch.
    Promote,
    /// Replaying a pinned commit onto the new publish tip.
    Replay,
}

impl fmt::Display for ConflictPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPhase::Promote => write!(f, "promote"),
            ConflictPhase::Replay => write!(f, "replay"),
        }
    }
}

/// Unified error type for automerge operations
#[derive(Error, Debug)]
pub enum AutomergeError {
    #[error("Conflict during {phase} of commit {commit}: {}", .paths.join(", "))]
    Conflict {
        commit: CommitId,
        phase: ConflictPhase,
        paths: Vec<String>,
    },

    #[error("Commit graph integrity error: {0}")]
    GraphIntegrity(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in git-automerge
pub type Result<T> = std::result::Result<T, AutomergeError>;

impl AutomergeError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        AutomergeError::Config(msg.into())
    }

    /// Create a graph integrity error with context
    pub fn graph(msg: impl Into<String>) -> Self {
        AutomergeError::GraphIntegrity(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        AutomergeError::Remote(msg.into())
    }

    /// The offending commit, when the error is a conflict.
    pub fn conflicting_commit(&self) -> Option<&CommitId> {
        match self {
            AutomergeError::Conflict { commit, .. } => Some(commit),
            _ => None,
        }
    }
}
