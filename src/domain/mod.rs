//! Domain logic - commit identity and classification rules independent of git operations

pub mod branch;
pub mod commit;
pub mod role;

pub use branch::BranchPair;
pub use commit::{Commit, CommitId, Identity};
pub use role::{author_role, is_pinned, AuthorRole, ReconcilePolicy};
