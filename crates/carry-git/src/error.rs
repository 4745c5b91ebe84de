//! Error types for carry-git.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not inside a git repository, or the repository has no working tree.
    #[error("not a git repository")]
    NotARepository,

    /// Reference or revision could not be resolved.
    #[error("reference not found: {0}")]
    RefNotFound(String),

    /// Remote not found.
    #[error("remote not found: {0}")]
    RemoteNotFound(String),

    /// Remote exists but has no fetch URL.
    #[error("no fetch URL configured for remote '{0}'")]
    NoFetchUrl(String),

    /// Remote fetch URL does not point where it should.
    #[error("fetch URL for remote '{remote}' does not match '{expected}' (got '{url}')")]
    RemoteMismatch {
        /// Remote name.
        remote: String,
        /// Fragment the URL must contain.
        expected: String,
        /// Actual fetch URL.
        url: String,
    },

    /// A git subprocess exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Captured standard error.
        stderr: String,
    },

    /// A git subprocess ran past its time limit and was killed.
    #[error("`{command}` timed out after {secs}s")]
    Timeout {
        /// The command line that was run.
        command: String,
        /// The limit that was exceeded.
        secs: u64,
    },

    /// Spawning or talking to a subprocess failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),
}
