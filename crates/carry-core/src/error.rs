//! Error types for carry-core.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in carry-core operations.
///
/// Per-commit failures that a run can report and move past (a carry that
/// needs manual intervention, an unclassified commit) are not errors; they
/// are recorded as [`Failure`](crate::Failure) outcomes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A version-control operation failed.
    #[error("failed to {context}: {source}")]
    Backend {
        /// What was being attempted.
        context: String,
        /// Underlying git error.
        #[source]
        source: carry_git::Error,
    },

    /// A stored resolution patch was found but could not be applied.
    #[error("failed to apply resolution patch {patch} for commit {commit}: {source}")]
    ResolutionFailed {
        /// Hash of the commit being carried.
        commit: String,
        /// Where the patch came from.
        patch: String,
        /// Underlying git error.
        #[source]
        source: carry_git::Error,
    },

    /// The resolution patch store could not be read.
    #[error("failed to read resolution patch for {key}: {source}")]
    PatchStore {
        /// Lookup key.
        key: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration is well-formed but unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Wrap a git error with the operation that produced it.
pub(crate) fn backend(context: impl Into<String>) -> impl FnOnce(carry_git::Error) -> Error {
    let context = context.into();
    move |source| Error::Backend { context, source }
}
