//! Owned commit records and log options.

use git2::Oid;

/// An immutable snapshot of a commit, detached from the repository lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Full commit hash.
    pub id: Oid,
    /// Full commit message (subject and body).
    pub message: String,
    /// Author name.
    pub author_name: String,
    /// Author email.
    pub author_email: String,
    /// Author timestamp (seconds since the epoch).
    pub author_time: i64,
    /// Committer timestamp (seconds since the epoch).
    pub commit_time: i64,
    /// Number of parents; more than one means a merge commit.
    pub parent_count: usize,
}

impl Commit {
    /// First line of the message.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default().trim()
    }

    /// Whether this is a merge commit.
    #[must_use]
    pub const fn is_merge(&self) -> bool {
        self.parent_count > 1
    }

    /// Abbreviated hash for display.
    #[must_use]
    pub fn short_id(&self) -> String {
        let id = self.id.to_string();
        id[..id.len().min(12)].to_string()
    }
}

impl From<&git2::Commit<'_>> for Commit {
    fn from(commit: &git2::Commit<'_>) -> Self {
        let author = commit.author();
        Self {
            id: commit.id(),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            author_name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
            author_email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
            author_time: author.when().seconds(),
            commit_time: commit.time().seconds(),
            parent_count: commit.parent_count(),
        }
    }
}

/// Bounds for a commit log walk.
///
/// Commits are returned newest first. The walk starts at `from` (HEAD when
/// unset) and leaves out `hide` and every commit reachable from it, through
/// any parent, like `git log hide..from`.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Revision to start walking from.
    pub from: Option<String>,
    /// Exclude this commit and its ancestors.
    pub hide: Option<Oid>,
    /// Follow only the first parent of merge commits.
    pub first_parent: bool,
}
