use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use sha2::{Digest, Sha256};

use crate::domain::{Commit, CommitId, Identity};
use crate::error::{AutomergeError, Result};
use crate::git::{BranchUpdate, CommitGraph, PickOutcome};

/// File contents keyed by path
type Tree = BTreeMap<String, String>;

struct MockObject {
    commit: Commit,
    tree: Tree,
}

/// In-memory content-addressed commit graph for testing without git
///
/// Ids are derived from parents, author, message and tree, so replaying the
/// same change onto the same parent yields the same id, as in git.
#[derive(Default)]
pub struct MockGraph {
    objects: HashMap<CommitId, MockObject>,
    branches: BTreeMap<String, CommitId>,
    staging: BTreeMap<String, CommitId>,
}

impl MockGraph {
    /// Create a new empty mock graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit `changes` on top of `branch` (creating the branch if missing).
    ///
    /// A change of `None` deletes the path.
    pub fn commit_on(
        &mut self,
        branch: &str,
        author: &str,
        message: &str,
        changes: &[(&str, Option<&str>)],
    ) -> CommitId {
        let parent = self.branches.get(branch).cloned();
        let mut tree = parent
            .as_ref()
            .and_then(|id| self.objects.get(id))
            .map(|object| object.tree.clone())
            .unwrap_or_default();

        for (path, content) in changes {
            match content {
                Some(content) => tree.insert(path.to_string(), content.to_string()),
                None => tree.remove(*path),
            };
        }

        let author = Identity::parse(author).unwrap_or_else(|| Identity::new(author, ""));
        let id = self.insert(parent.into_iter().collect(), author, message, tree);
        self.branches.insert(branch.to_string(), id.clone());
        id
    }

    /// Point `branch` at `id` unconditionally
    pub fn set_branch(&mut self, branch: impl Into<String>, id: &CommitId) {
        self.branches.insert(branch.into(), id.clone());
    }

    pub fn tip_id(&self, branch: &str) -> Option<&CommitId> {
        self.branches.get(branch)
    }

    pub fn staging_refs(&self) -> &BTreeMap<String, CommitId> {
        &self.staging
    }

    pub fn commit(&self, id: &CommitId) -> Option<&Commit> {
        self.objects.get(id).map(|object| &object.commit)
    }

    /// Contents of `path` at `id`
    pub fn file_at(&self, id: &CommitId, path: &str) -> Option<&str> {
        self.objects
            .get(id)
            .and_then(|object| object.tree.get(path))
            .map(String::as_str)
    }

    /// First-parent history of `branch`, newest first
    pub fn history(&self, branch: &str) -> Vec<&Commit> {
        let mut commits = Vec::new();
        let mut cursor = self.branches.get(branch);

        while let Some(id) = cursor {
            match self.objects.get(id) {
                Some(object) => {
                    commits.push(&object.commit);
                    cursor = object.commit.first_parent();
                }
                None => break,
            }
        }

        commits
    }

    /// `Name <email> summary` lines of `branch`, newest first
    pub fn log(&self, branch: &str) -> Vec<String> {
        self.history(branch)
            .into_iter()
            .map(|commit| format!("{} {}", commit.author, commit.summary()))
            .collect()
    }

    fn insert(&mut self, parents: Vec<CommitId>, author: Identity, message: &str, tree: Tree) -> CommitId {
        let mut hasher = Sha256::new();
        for parent in &parents {
            hasher.update(b"parent ");
            hasher.update(parent.as_str().as_bytes());
        }
        hasher.update(b"author ");
        hasher.update(author.to_string().as_bytes());
        hasher.update(b"message ");
        hasher.update(message.as_bytes());
        for (path, content) in &tree {
            hasher.update(b"entry ");
            hasher.update(path.as_bytes());
            hasher.update([0u8]);
            hasher.update(content.as_bytes());
        }
        let digest = hex::encode(hasher.finalize());
        let id = CommitId::new(&digest[..40]);

        let parent_tree = parents
            .first()
            .and_then(|parent| self.objects.get(parent))
            .map(|object| object.tree.clone())
            .unwrap_or_default();
        let paths = changed_paths(&parent_tree, &tree);

        let commit = Commit {
            id: id.clone(),
            parents,
            author,
            message: message.to_string(),
            paths,
        };
        self.objects.insert(id.clone(), MockObject { commit, tree });
        id
    }

    fn object(&self, id: &CommitId) -> Result<&MockObject> {
        self.objects
            .get(id)
            .ok_or_else(|| AutomergeError::graph(format!("Cannot find commit {}", id)))
    }

    fn branch_id(&self, branch: &str) -> Result<&CommitId> {
        self.branches
            .get(branch)
            .ok_or_else(|| AutomergeError::graph(format!("Cannot find branch '{}'", branch)))
    }

    fn ancestors(&self, start: &CommitId) -> HashSet<CommitId> {
        let mut seen = HashSet::new();
        let mut stack = vec![start.clone()];

        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(object) = self.objects.get(&id) {
                stack.extend(object.commit.parents.iter().cloned());
            }
        }

        seen
    }
}

fn changed_paths(before: &Tree, after: &Tree) -> Vec<String> {
    let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
    keys.into_iter()
        .filter(|path| before.get(*path) != after.get(*path))
        .cloned()
        .collect()
}

impl CommitGraph for MockGraph {
    fn resolve_tip(&self, branch: &str) -> Result<Commit> {
        let id = self.branch_id(branch)?;
        Ok(self.object(id)?.commit.clone())
    }

    fn divergent_commits(&self, from_branch: &str, to_branch: &str) -> Result<Vec<Commit>> {
        let from = self.branch_id(from_branch)?.clone();
        let to = self.branch_id(to_branch)?.clone();

        let hidden = self.ancestors(&to);
        if !self.ancestors(&from).iter().any(|id| hidden.contains(id)) {
            return Err(AutomergeError::graph(format!(
                "Branches '{}' and '{}' share no history",
                from_branch, to_branch
            )));
        }

        // Post-order walk so parents precede children
        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(from, false)];

        while let Some((id, expanded)) = stack.pop() {
            if hidden.contains(&id) {
                continue;
            }
            if expanded {
                ordered.push(self.object(&id)?.commit.clone());
                continue;
            }
            if !visited.insert(id.clone()) {
                continue;
            }
            stack.push((id.clone(), true));
            for parent in self.object(&id)?.commit.parents.iter().rev() {
                if !visited.contains(parent) {
                    stack.push((parent.clone(), false));
                }
            }
        }

        Ok(ordered)
    }

    fn cherry_pick(&mut self, commit: &Commit, onto: &CommitId) -> Result<PickOutcome> {
        let picked = self.object(&commit.id)?;
        let base = match picked.commit.first_parent() {
            Some(parent) => self.object(parent)?.tree.clone(),
            None => {
                return Err(AutomergeError::graph(format!(
                    "Cannot apply root commit {}",
                    commit.id
                )))
            }
        };
        let theirs = picked.tree.clone();
        let author = picked.commit.author.clone();
        let message = picked.commit.message.clone();
        let mut ours = self.object(onto)?.tree.clone();

        let mut conflicts = Vec::new();
        for path in changed_paths(&base, &theirs) {
            let before = base.get(&path);
            let after = theirs.get(&path);
            let current = ours.get(&path);

            if current == after {
                continue;
            }
            if current != before {
                conflicts.push(path);
                continue;
            }
            match after {
                Some(content) => ours.insert(path, content.clone()),
                None => ours.remove(&path),
            };
        }

        if !conflicts.is_empty() {
            return Ok(PickOutcome::Conflict(conflicts));
        }
        if ours == self.object(onto)?.tree {
            return Ok(PickOutcome::Applied(onto.clone()));
        }

        let id = self.insert(vec![onto.clone()], author, &message, ours);
        Ok(PickOutcome::Applied(id))
    }

    fn stage(&mut self, name: &str, tip: &CommitId) -> Result<()> {
        self.staging.insert(name.to_string(), tip.clone());
        Ok(())
    }

    fn discard_staging(&mut self) -> Result<()> {
        self.staging.clear();
        Ok(())
    }

    fn update_branches(&mut self, updates: &[BranchUpdate]) -> Result<()> {
        for update in updates {
            self.object(&update.target)?;
            if let Some(current) = self.branches.get(&update.branch) {
                if *current != update.expected {
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
            self.branches
                .insert(update.branch.clone(), update.target.clone());
        }
        Ok(())
    }
}
