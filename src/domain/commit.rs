use std::fmt;

use regex::Regex;

/// Content-addressed commit identifier (hex object id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        CommitId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First seven characters, as git prints them
    pub fn short(&self) -> &str {
        if self.0.len() > 7 {
            &self.0[..7]
        } else {
            &self.0
        }
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<git2::Oid> for CommitId {
    fn from(oid: git2::Oid) -> Self {
        CommitId(oid.to_string())
    }
}

/// Author identity of a commit, rendered as `Name <email>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Identity {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Parse a `Name <email>` string.
    ///
    /// Returns `None` when the string has no `<email>` part.
    pub fn parse(value: &str) -> Option<Self> {
        let captures = Regex::new(r"^\s*(.*?)\s*<([^<>]*)>\s*$")
            .ok()
            .and_then(|re| re.captures(value))?;

        let name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        let email = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

        Some(Identity::new(name, email))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Immutable commit node as seen by the reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub id: CommitId,
    /// Parent ids, first parent first
    pub parents: Vec<CommitId>,
    pub author: Identity,
    pub message: String,
    /// Paths changed relative to the first parent, sorted
    pub paths: Vec<String>,
}

impl Commit {
    /// First line of the commit message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    pub fn first_parent(&self) -> Option<&CommitId> {
        self.parents.first()
    }
}
