use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::domain::{BranchPair, ReconcilePolicy};
use crate::error::{AutomergeError, Result};

/// File name looked up in the current directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "automerge.toml";

/// Represents the complete configuration for git-automerge.
///
/// Contains the branch pair, the automation identity with its pinned paths,
/// and behavior options for remote synchronization.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub branches: BranchesConfig,

    #[serde(default)]
    pub automation: AutomationConfig,

    #[serde(default)]
    pub behavior: BehaviorConfig,
}

fn default_integration_branch() -> String {
    "default".to_string()
}

fn default_publish_branch() -> String {
    "master".to_string()
}

/// Names of the integration and publish branches.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BranchesConfig {
    #[serde(default = "default_integration_branch")]
    pub integration: String,

    #[serde(default = "default_publish_branch")]
    pub publish: String,
}

impl Default for BranchesConfig {
    fn default() -> Self {
        BranchesConfig {
            integration: default_integration_branch(),
            publish: default_publish_branch(),
        }
    }
}

fn default_identity() -> String {
    "Pantheon Automation <bot@getpantheon.com>".to_string()
}

fn default_pinned_paths() -> Vec<String> {
    vec![".circleci".to_string(), ".github".to_string()]
}

/// Who the bot is and which paths hold its infrastructure commits.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AutomationConfig {
    /// `Name <email>`, or a bare email matched on email alone
    #[serde(default = "default_identity")]
    pub identity: String,

    #[serde(default = "default_pinned_paths")]
    pub pinned_paths: Vec<String>,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        AutomationConfig {
            identity: default_identity(),
            pinned_paths: default_pinned_paths(),
        }
    }
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_true() -> bool {
    true
}

/// Configuration for behavior customization.
///
/// Controls remote synchronization around a pass without affecting how
/// commits are classified.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BehaviorConfig {
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Fetch and fast-forward both branches before the pass
    #[serde(default = "default_true")]
    pub fetch: bool,

    /// Push both branches after a promotion
    #[serde(default = "default_true")]
    pub push: bool,

    /// Refresh the working copy when HEAD is a rewritten branch
    #[serde(default = "default_true")]
    pub update_worktree: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        BehaviorConfig {
            remote: default_remote(),
            fetch: true,
            push: true,
            update_worktree: true,
        }
    }
}

impl Config {
    /// Check that every required value is non-empty
    pub fn validate(&self) -> Result<()> {
        self.branch_pair()?;
        self.policy()?;
        if self.behavior.remote.trim().is_empty() {
            return Err(AutomergeError::config("remote name must not be empty"));
        }
        Ok(())
    }

    pub fn branch_pair(&self) -> Result<BranchPair> {
        BranchPair::new(&self.branches.integration, &self.branches.publish)
    }

    pub fn policy(&self) -> Result<ReconcilePolicy> {
        ReconcilePolicy::new(&self.automation.identity, &self.automation.pinned_paths)
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `automerge.toml` in current directory
/// 3. `automerge.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded and validated, or default configuration
/// * `Err` - If a file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path).map_err(|e| {
            AutomergeError::config(format!("Cannot read {}: {}", path.display(), e))
        })?
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        fs::read_to_string(CONFIG_FILE_NAME)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| AutomergeError::config(format!("Invalid configuration: {}", e)))?;
    config.validate()?;
    Ok(config)
}
