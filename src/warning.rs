use std::fmt;

/// Non-fatal conditions met during a pass that should be reported to the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileWarning {
    /// Pinned commits in the divergent set are interleaved with other commits
    InterleavedPinned {
        /// Pinned commits in the divergent set
        pinned: usize,
    },
    /// Fetch operation failed due to authentication issues
    FetchAuthenticationFailed { remote: String },
}

impl fmt::Display for ReconcileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileWarning::InterleavedPinned { pinned } => {
                write!(
                    f,
                    "{} pinned commit(s) are interleaved with other commits; all will be replayed to the tip in their original order",
                    pinned
                )
            }
            ReconcileWarning::FetchAuthenticationFailed { remote } => {
                write!(
                    f,
                    "Authentication failed when fetching from remote '{}'; using local branches",
                    remote
                )
            }
        }
    }
}
