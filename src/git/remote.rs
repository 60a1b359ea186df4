//! Fetching and pushing the reconciled branches

use std::cell::RefCell;
use std::path::Path;

use git2::{BranchType, CredentialType, Direction, ErrorClass, ErrorCode, Oid};
use tracing::{debug, info, warn};

use crate::domain::CommitId;
use crate::error::{AutomergeError, Result};
use crate::git::repository::to_oid;
use crate::git::{CommitGraph, Git2Graph};
use crate::warning::ReconcileWarning;

/// Credential lookup: SSH keys in `~/.ssh`, then the SSH agent, then defaults
fn remote_callbacks<'a>() -> git2::RemoteCallbacks<'a> {
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(CredentialType::SSH_KEY) {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                let path = Path::new(&home).join(".ssh").join(key);
                if path.exists() {
                    if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                        return Ok(cred);
                    }
                }
            }

            if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        git2::Cred::default()
    });
    callbacks
}

fn is_auth_failure(err: &git2::Error) -> bool {
    err.code() == ErrorCode::Auth || err.class() == ErrorClass::Ssh
}

impl Git2Graph {
    /// Fetch `branches` from `remote_name` and fast-forward the local branches.
    ///
    /// An authentication failure is reported as a warning so the pass can
    /// continue on local data.
    pub fn fetch_branches(
        &mut self,
        remote_name: &str,
        branches: &[&str],
    ) -> Result<Vec<ReconcileWarning>> {
        let mut remote = self.find_remote(remote_name)?;

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks());

        let refspecs: Vec<String> = branches
            .iter()
            .map(|branch| format!("+refs/heads/{0}:refs/remotes/{1}/{0}", branch, remote_name))
            .collect();

        if let Err(e) = remote.fetch(&refspecs, Some(&mut fetch_options), None) {
            if is_auth_failure(&e) {
                warn!(remote = remote_name, error = %e, "fetch authentication failed");
                return Ok(vec![ReconcileWarning::FetchAuthenticationFailed {
                    remote: remote_name.to_string(),
                }]);
            }
            return Err(AutomergeError::remote(format!(
                "Failed to fetch from remote '{}': {}",
                remote_name, e
            )));
        }
        drop(remote);

        for branch in branches {
            self.update_branch_from_remote(branch, remote_name)?;
        }

        Ok(Vec::new())
    }

    /// Fast-forward a local branch to its remote-tracking branch.
    ///
    /// Creates the local branch when missing. A local branch that has
    /// diverged from the remote is an error: reconciling it would drop the
    /// remote-only commits on push.
    fn update_branch_from_remote(&mut self, branch_name: &str, remote_name: &str) -> Result<()> {
        let tracking = format!("refs/remotes/{}/{}", remote_name, branch_name);
        let remote_oid = match self.repo.find_reference(&tracking) {
            Ok(reference) => reference
                .target()
                .ok_or_else(|| AutomergeError::graph(format!("{} has no target", tracking)))?,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let local_oid = match self.repo.find_branch(branch_name, BranchType::Local) {
            Ok(_) => self.branch_oid(branch_name)?,
            Err(e) if e.code() == ErrorCode::NotFound => {
                let commit = self.repo.find_commit(remote_oid)?;
                self.repo.branch(branch_name, &commit, false)?;
                info!(branch = branch_name, remote = remote_name, "created local branch");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if local_oid == remote_oid || self.repo.graph_descendant_of(local_oid, remote_oid)? {
            return Ok(());
        }

        if !self.repo.graph_descendant_of(remote_oid, local_oid)? {
            warn!(branch = branch_name, remote = remote_name, "local branch diverged from remote");
            return Err(AutomergeError::remote(format!(
                "Branch '{0}' has diverged from '{1}/{0}'; reconcile it by hand before running again",
                branch_name, remote_name
            )));
        }

        self.reset_branch(branch_name, &CommitId::from(remote_oid))?;
        debug!(branch = branch_name, remote = remote_name, "fast-forwarded");
        Ok(())
    }

    fn find_remote(&self, remote_name: &str) -> Result<git2::Remote<'_>> {
        self.repo
            .find_remote(remote_name)
            .map_err(|_| AutomergeError::remote(format!("Remote '{}' not found", remote_name)))
    }

    /// Current tip of `branch` on the remote, if the remote has it
    fn remote_branch_tip(&self, remote_name: &str, branch: &str) -> Result<Option<Oid>> {
        let mut remote = self.find_remote(remote_name)?;
        let connection = remote
            .connect_auth(Direction::Fetch, Some(remote_callbacks()), None)
            .map_err(|e| {
                AutomergeError::remote(format!("Cannot connect to remote '{}': {}", remote_name, e))
            })?;

        let refname = format!("refs/heads/{}", branch);
        let tip = connection
            .list()?
            .iter()
            .find(|head| head.name() == refname)
            .map(|head| head.oid());
        Ok(tip)
    }

    /// Push the reconciled branches.
    ///
    /// `publish` is pushed as a fast-forward first. `integration` is then
    /// force-pushed, because its pinned commits were replayed, but only if
    /// the remote integration tip is still contained in `integration_base`,
    /// the tip the pass started from.
    pub fn push_branches(
        &self,
        remote_name: &str,
        publish: &str,
        integration: &str,
        integration_base: &CommitId,
    ) -> Result<()> {
        let base = to_oid(integration_base)?;
        if let Some(remote_tip) = self.remote_branch_tip(remote_name, integration)? {
            let contained = remote_tip == base
                || (self.repo.find_commit(remote_tip).is_ok()
                    && self.repo.graph_descendant_of(base, remote_tip)?);
            if !contained {
                return Err(AutomergeError::remote(format!(
                    "Remote '{0}' has commits on '{1}' that the pass did not include; fetch and run again",
                    remote_name, integration
                )));
            }
        }

        self.push_refspec(remote_name, &format!("refs/heads/{0}:refs/heads/{0}", publish))?;
        self.push_refspec(remote_name, &format!("+refs/heads/{0}:refs/heads/{0}", integration))?;

        info!(remote = remote_name, publish, integration, "pushed branches");
        Ok(())
    }

    fn push_refspec(&self, remote_name: &str, refspec: &str) -> Result<()> {
        let mut remote = self.find_remote(remote_name)?;

        let rejected: RefCell<Vec<String>> = RefCell::new(Vec::new());

        let mut callbacks = remote_callbacks();
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                rejected
                    .borrow_mut()
                    .push(format!("{} ({})", refname, status));
            }
            Ok(())
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        remote
            .push(&[refspec], Some(&mut push_options))
            .map_err(|e| {
                if e.class() == ErrorClass::Net {
                    AutomergeError::remote(format!("Network error during push: {}", e))
                } else {
                    AutomergeError::remote(format!(
                        "Failed to push to remote '{}': {}",
                        remote_name, e
                    ))
                }
            })?;
        drop(push_options);

        let rejected = rejected.into_inner();
        if !rejected.is_empty() {
            return Err(AutomergeError::remote(format!(
                "Remote '{}' rejected: {}",
                remote_name,
                rejected.join(", ")
            )));
        }

        debug!(remote = remote_name, refspec, "pushed");
        Ok(())
    }
}
