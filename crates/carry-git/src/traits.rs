//! Capability traits for git operations.
//!
//! History queries and working-tree mutation are split into two traits so
//! the rebase engine can be driven by in-memory fakes in tests. Both are
//! synchronous since git2 and the git binary are.

use git2::Oid;

use crate::{Commit, LogOptions, Result};

/// Version-control queries and branch setup.
#[allow(clippy::missing_errors_doc)]
pub trait VersionControl {
    /// Get the commit HEAD points at.
    fn head(&self) -> Result<Commit>;

    /// Look up a single commit by hash or any revision git understands.
    fn find_commit(&self, rev: &str) -> Result<Commit>;

    /// Get the first fetch URL of a remote.
    fn remote_fetch_url(&self, remote: &str) -> Result<String>;

    /// Create a branch at `start` and check it out.
    ///
    /// Returns the OID of the new branch's tip.
    fn create_branch_from(&self, name: &str, start: &str) -> Result<Oid>;

    /// Merge `rev` into the current branch, optionally with a merge strategy.
    fn merge(&self, rev: &str, strategy: Option<&str>) -> Result<()>;

    /// Find the merge base of two revisions.
    fn merge_base(&self, one: &str, two: &str) -> Result<Oid>;

    /// Walk the commit log, newest first.
    fn log(&self, options: &LogOptions) -> Result<Vec<Commit>>;
}

/// Working-tree mutation: replay, abort, patch application.
#[allow(clippy::missing_errors_doc)]
pub trait WorkingTree {
    /// Cherry-pick a commit onto HEAD, allowing empty results.
    ///
    /// An error leaves the cherry-pick in progress when it was caused by a
    /// conflict; callers must [`abort_cherry_pick`](Self::abort_cherry_pick).
    fn cherry_pick(&self, commit: Oid) -> Result<()>;

    /// Abort an in-progress cherry-pick, restoring the pre-pick tree.
    fn abort_cherry_pick(&self) -> Result<()>;

    /// Apply a unified diff to the working tree and index.
    fn apply_patch(&self, patch: &[u8]) -> Result<()>;

    /// Commit the staged tree using the message and authorship of `original`.
    fn commit_applied(&self, original: &Commit) -> Result<Oid>;

    /// Human-readable working tree status.
    fn status(&self) -> Result<String>;

    /// Rewrite the HEAD commit message.
    ///
    /// `rewrite` receives the current message and returns the new message
    /// as paragraphs.
    fn amend_head_message(&self, rewrite: &dyn Fn(&str) -> Vec<String>) -> Result<()>;
}
