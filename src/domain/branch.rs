use crate::error::{AutomergeError, Result};

/// The two branches a reconciliation pass operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPair {
    /// Branch accumulating new work, with pinned commits at its tip
    pub integration: String,
    /// Branch receiving promoted commits only
    pub publish: String,
}

impl BranchPair {
    /// Create a branch pair, rejecting empty or identical names
    pub fn new(integration: impl Into<String>, publish: impl Into<String>) -> Result<Self> {
        let integration = integration.into();
        let publish = publish.into();

        if integration.trim().is_empty() {
            return Err(AutomergeError::config("integration branch name must not be empty"));
        }
        if publish.trim().is_empty() {
            return Err(AutomergeError::config("publish branch name must not be empty"));
        }
        if integration == publish {
            return Err(AutomergeError::config(format!(
                "integration and publish branch are both '{}'",
                integration
            )));
        }

        Ok(BranchPair {
            integration,
            publish,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_pair() {
        let pair = BranchPair::new("default", "master").unwrap();
        assert_eq!(pair.integration, "default");
        assert_eq!(pair.publish, "master");
    }

    #[test]
    fn test_empty_integration_rejected() {
        let err = BranchPair::new("", "master").unwrap_err();
        assert!(err.to_string().contains("integration"));
    }

    #[test]
    fn test_blank_publish_rejected() {
        let err = BranchPair::new("default", "  ").unwrap_err();
        assert!(err.to_string().contains("publish"));
    }

    #[test]
    fn test_identical_branches_rejected() {
        let err = BranchPair::new("master", "master").unwrap_err();
        assert!(err.to_string().contains("both 'master'"));
    }
}
