//! Builds real git repositories for tests without touching a working copy.

#![allow(dead_code)]

use std::cell::Cell;

use git2::{BranchType, Index, IndexEntry, IndexTime, Oid, Repository, Signature, Sort, Time};
use tempfile::TempDir;

use git_automerge::domain::Identity;

pub const BOT: &str = "Pantheon Automation <bot@getpantheon.com>";
pub const USER: &str = "J. Doe <doe@example.com>";

pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
    clock: Cell<i64>,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Could not create temp dir");
        let repo = Repository::init(dir.path()).expect("Could not init git repo");
        TestRepo::wrap(dir, repo)
    }

    pub fn new_bare() -> Self {
        let dir = TempDir::new().expect("Could not create temp dir");
        let repo = Repository::init_bare(dir.path()).expect("Could not init bare repo");
        TestRepo::wrap(dir, repo)
    }

    /// Clone `origin` into a fresh working copy
    pub fn clone_from(origin: &TestRepo) -> Self {
        let dir = TempDir::new().expect("Could not create temp dir");
        let url = origin.dir.path().to_str().expect("utf-8 path").to_string();
        let repo = Repository::clone(&url, dir.path()).expect("Could not clone origin");
        TestRepo::wrap(dir, repo)
    }

    fn wrap(dir: TempDir, repo: Repository) -> Self {
        TestRepo {
            dir,
            repo,
            clock: Cell::new(1_600_000_000),
        }
    }

    /// Commit `files` on top of `branch`, creating the branch if needed
    pub fn commit(&self, branch: &str, author: &str, message: &str, files: &[(&str, &str)]) -> Oid {
        let parent = self
            .repo
            .find_branch(branch, BranchType::Local)
            .ok()
            .map(|b| b.get().peel_to_commit().expect("branch has no commit"));

        let mut index = Index::new().expect("Could not create index");
        if let Some(parent) = &parent {
            index
                .read_tree(&parent.tree().expect("parent has no tree"))
                .expect("Could not read tree");
        }

        for (path, content) in files {
            let blob = self.repo.blob(content.as_bytes()).expect("Could not write blob");
            let entry = IndexEntry {
                ctime: IndexTime::new(0, 0),
                mtime: IndexTime::new(0, 0),
                dev: 0,
                ino: 0,
                mode: 0o100644,
                uid: 0,
                gid: 0,
                file_size: content.len() as u32,
                id: blob,
                flags: 0,
                flags_extended: 0,
                path: path.as_bytes().to_vec(),
            };
            index.add(&entry).expect("Could not add file to index");
        }

        let tree_id = index.write_tree_to(&self.repo).expect("Could not write tree");
        let tree = self.repo.find_tree(tree_id).expect("Could not find tree");

        let identity = Identity::parse(author).expect("author must be 'Name <email>'");
        let time = self.clock.get() + 60;
        self.clock.set(time);
        let sig = Signature::new(&identity.name, &identity.email, &Time::new(time, 0))
            .expect("Could not create signature");

        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = self
            .repo
            .commit(None, &sig, &sig, message, &tree, &parents)
            .expect("Could not create commit");

        self.set_branch(branch, oid);
        oid
    }

    pub fn set_branch(&self, branch: &str, oid: Oid) {
        self.repo
            .reference(&format!("refs/heads/{}", branch), oid, true, "test")
            .expect("Could not set branch");
    }

    pub fn tip(&self, branch: &str) -> Oid {
        self.repo
            .find_branch(branch, BranchType::Local)
            .expect("branch exists")
            .get()
            .target()
            .expect("branch has target")
    }

    /// `Name <email> summary` per first-parent commit, newest first
    pub fn log(&self, branch: &str) -> Vec<String> {
        let mut walk = self.repo.revwalk().expect("revwalk");
        walk.push(self.tip(branch)).expect("push tip");
        walk.simplify_first_parent().expect("first parent");

        walk.map(|oid| {
            let commit = self.repo.find_commit(oid.expect("oid")).expect("commit");
            let author = commit.author();
            format!(
                "{} <{}> {}",
                author.name().unwrap_or_default(),
                author.email().unwrap_or_default(),
                commit.summary().unwrap_or_default()
            )
        })
        .collect()
    }

    /// Every commit reachable from `branch`
    pub fn reachable(&self, branch: &str) -> Vec<Oid> {
        let mut walk = self.repo.revwalk().expect("revwalk");
        walk.set_sorting(Sort::TOPOLOGICAL).expect("sorting");
        walk.push(self.tip(branch)).expect("push tip");
        walk.map(|oid| oid.expect("oid")).collect()
    }

    pub fn file_at(&self, branch: &str, path: &str) -> Option<String> {
        let tree = self
            .repo
            .find_commit(self.tip(branch))
            .expect("commit")
            .tree()
            .expect("tree");
        let entry = tree.get_path(std::path::Path::new(path)).ok()?;
        let blob = self.repo.find_blob(entry.id()).ok()?;
        Some(String::from_utf8_lossy(blob.content()).into_owned())
    }

    pub fn staging_refs(&self) -> usize {
        self.repo
            .references_glob("refs/automerge/staging/*")
            .expect("glob")
            .count()
    }
}

pub fn line(author: &str, summary: &str) -> String {
    format!("{} {}", author, summary)
}

/// master = [initial]; default = [CircleCI, initial]
pub fn seed(repo: &TestRepo) -> Oid {
    let initial = repo.commit("master", BOT, "Initial commit", &[("README.md", "# Test Repository")]);
    repo.set_branch("default", initial);
    repo.commit(
        "default",
        BOT,
        "Add CircleCI configuration",
        &[
            (".circleci/config.yml", "# Fake CircleCI configuration file"),
            (".github/workflows/update_tag1_d7es.yml", "# Fake GHA Workflow file"),
        ],
    );
    initial
}
