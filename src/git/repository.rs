use std::collections::BTreeSet;
use std::path::Path;

use git2::{BranchType, ErrorCode, Oid, Repository as Git2Repo, Sort};
use tracing::{debug, info};

use crate::domain::{Commit, CommitId, Identity};
use crate::error::{AutomergeError, Result};
use crate::git::{BranchUpdate, CommitGraph, PickOutcome, STAGING_REF_PREFIX};

/// Wrapper around git2::Repository with the commit graph interface
pub struct Git2Graph {
    pub(crate) repo: Git2Repo,
}

impl Git2Graph {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Graph { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Graph { repo }
    }

    /// Access the underlying repository
    pub fn repo(&self) -> &Git2Repo {
        &self.repo
    }

    pub(crate) fn branch_oid(&self, branch_name: &str) -> Result<Oid> {
        let branch = self
            .repo
            .find_branch(branch_name, BranchType::Local)
            .map_err(|e| {
                if e.code() == ErrorCode::NotFound {
                    AutomergeError::graph(format!("Cannot find branch '{}'", branch_name))
                } else {
                    AutomergeError::Git(e)
                }
            })?;

        branch.get().target().ok_or_else(|| {
            AutomergeError::graph(format!("Branch '{}' has no target", branch_name))
        })
    }

    /// Tip of a local branch, `None` when the branch does not exist
    pub fn branch_tip(&self, branch_name: &str) -> Result<Option<CommitId>> {
        match self.repo.find_branch(branch_name, BranchType::Local) {
            Ok(_) => Ok(Some(self.branch_oid(branch_name)?.into())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn load_commit(&self, oid: Oid) -> Result<Commit> {
        let commit = self.repo.find_commit(oid).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                AutomergeError::graph(format!("Cannot find commit {}", oid))
            } else {
                AutomergeError::Git(e)
            }
        })?;

        let author = commit.author();
        let identity = Identity::new(
            String::from_utf8_lossy(author.name_bytes()),
            String::from_utf8_lossy(author.email_bytes()),
        );

        Ok(Commit {
            id: oid.into(),
            parents: commit.parent_ids().map(CommitId::from).collect(),
            author: identity,
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            paths: self.changed_paths(&commit)?,
        })
    }

    /// Paths touched by `commit` relative to its first parent
    fn changed_paths(&self, commit: &git2::Commit<'_>) -> Result<Vec<String>> {
        let tree = commit.tree()?;
        let parent_tree = match commit.parent_count() {
            0 => None,
            _ => Some(commit.parent(0)?.tree()?),
        };

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let mut paths = BTreeSet::new();
        for delta in diff.deltas() {
            for file in [delta.old_file(), delta.new_file()] {
                if let Some(path) = file.path() {
                    paths.insert(path.to_string_lossy().into_owned());
                }
            }
        }

        Ok(paths.into_iter().collect())
    }

    /// Force checkout HEAD if it is one of `branches`.
    ///
    /// Returns whether the working copy was refreshed.
    pub fn refresh_worktree(&self, branches: &[&str]) -> Result<bool> {
        if self.repo.is_bare() {
            return Ok(false);
        }

        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let on_rewritten_branch = head.is_branch()
            && head
                .shorthand()
                .map(|name| branches.contains(&name))
                .unwrap_or(false);

        if !on_rewritten_branch {
            return Ok(false);
        }

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.force();
        self.repo.checkout_head(Some(&mut checkout))?;
        info!(branch = head.shorthand().unwrap_or_default(), "refreshed working copy");

        Ok(true)
    }
}

pub(crate) fn to_oid(id: &CommitId) -> Result<Oid> {
    Oid::from_str(id.as_str())
        .map_err(|_| AutomergeError::graph(format!("Invalid commit id '{}'", id)))
}

impl CommitGraph for Git2Graph {
    fn resolve_tip(&self, branch: &str) -> Result<Commit> {
        let oid = self.branch_oid(branch)?;
        self.load_commit(oid)
    }

    fn divergent_commits(&self, from_branch: &str, to_branch: &str) -> Result<Vec<Commit>> {
        let from_oid = self.branch_oid(from_branch)?;
        let to_oid = self.branch_oid(to_branch)?;

        match self.repo.merge_base(from_oid, to_oid) {
            Ok(_) => {}
            Err(e) if e.code() == ErrorCode::NotFound => {
                return Err(AutomergeError::graph(format!(
                    "Branches '{}' and '{}' share no history",
                    from_branch, to_branch
                )));
            }
            Err(e) => return Err(e.into()),
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        revwalk.push(from_oid)?;
        revwalk.hide(to_oid)?;

        let mut commits = Vec::new();
        for oid_result in revwalk {
            commits.push(self.load_commit(oid_result?)?);
        }

        debug!(
            from = from_branch,
            to = to_branch,
            count = commits.len(),
            "computed divergent set"
        );
        Ok(commits)
    }

    fn cherry_pick(&mut self, commit: &Commit, onto: &CommitId) -> Result<PickOutcome> {
        let picked = self.repo.find_commit(to_oid(&commit.id)?)?;
        let onto_commit = self.repo.find_commit(to_oid(onto)?)?;

        if picked.parent_count() == 0 {
            return Err(AutomergeError::graph(format!(
                "Cannot apply root commit {}",
                commit.id
            )));
        }
        let mainline = if picked.parent_count() > 1 { 1 } else { 0 };

        let mut index = self
            .repo
            .cherrypick_commit(&picked, &onto_commit, mainline, None)?;

        if index.has_conflicts() {
            let mut paths = BTreeSet::new();
            for conflict in index.conflicts()? {
                let conflict = conflict?;
                for entry in [conflict.ancestor, conflict.our, conflict.their]
                    .into_iter()
                    .flatten()
                {
                    paths.insert(String::from_utf8_lossy(&entry.path).into_owned());
                }
            }
            return Ok(PickOutcome::Conflict(paths.into_iter().collect()));
        }

        let tree_oid = index.write_tree_to(&self.repo)?;
        if tree_oid == onto_commit.tree_id() {
            debug!(commit = %commit.id.short(), onto = %onto.short(), "change already applied");
            return Ok(PickOutcome::Applied(onto.clone()));
        }
        let tree = self.repo.find_tree(tree_oid)?;
        let message = String::from_utf8_lossy(picked.message_bytes());

        let new_oid = self.repo.commit(
            None,
            &picked.author(),
            &picked.committer(),
            &message,
            &tree,
            &[&onto_commit],
        )?;

        Ok(PickOutcome::Applied(new_oid.into()))
    }

    fn stage(&mut self, name: &str, tip: &CommitId) -> Result<()> {
        let refname = format!("{}{}", STAGING_REF_PREFIX, name);
        self.repo
            .reference(&refname, to_oid(tip)?, true, "automerge: stage")?;
        Ok(())
    }

    fn discard_staging(&mut self) -> Result<()> {
        let mut names = Vec::new();
        for reference in self.repo.references_glob(&format!("{}*", STAGING_REF_PREFIX))? {
            if let Some(name) = reference?.name() {
                names.push(name.to_string());
            }
        }

        for name in names {
            self.repo.find_reference(&name)?.delete()?;
        }

        Ok(())
    }

    fn update_branches(&mut self, updates: &[BranchUpdate]) -> Result<()> {
        let mut transaction = self.repo.transaction()?;

        for update in updates {
            transaction.lock_ref(&format!("refs/heads/{}", update.branch))?;
        }

        for update in updates {
            let current = match self.branch_oid(&update.branch) {
                Ok(oid) => Some(CommitId::from(oid)),
                Err(AutomergeError::GraphIntegrity(_)) => None,
                Err(e) => return Err(e),
            };

            if let Some(current) = current {
                if current != update.expected {
                    return Err(AutomergeError::graph(format!(
                        "Branch '{}' moved from {} to {} during reconciliation",
                        update.branch,
                        update.expected.short(),
                        current.short()
                    )));
                }
            }
        }

        for update in updates {
            transaction.set_target(
                &format!("refs/heads/{}", update.branch),
                to_oid(&update.target)?,
                None,
                &format!(
                    "automerge: {} -> {}",
                    update.expected.short(),
                    update.target.short()
                ),
            )?;
        }

        transaction.commit()?;
        Ok(())
    }
}
