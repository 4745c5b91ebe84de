//! Per-commit results of a rebase session.

use std::fmt;

use serde::Serialize;

/// Terminal result for one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Marked as drop; the tree was not touched.
    Dropped,
    /// Cherry-picked cleanly.
    AppliedDirect,
    /// Conflicted, then applied from a stored resolution patch.
    AppliedViaResolution {
        /// Key of the patch that was applied.
        patch: String,
    },
    /// Unmarked or unrecognized commit passed over under the skip policy.
    Skipped {
        /// Raw tag, if the message had one.
        tag: Option<String>,
    },
    /// The commit could not be handled automatically.
    Failed(Failure),
}

impl Outcome {
    /// Whether the commit ended up on the rebase branch.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::AppliedDirect | Self::AppliedViaResolution { .. })
    }

    /// Whether the commit needs attention.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dropped => f.write_str("dropped"),
            Self::AppliedDirect => f.write_str("applied"),
            Self::AppliedViaResolution { patch } => {
                write!(f, "applied via resolution patch {patch}")
            }
            Self::Skipped { tag: Some(tag) } => write!(f, "skipped (tag {tag})"),
            Self::Skipped { tag: None } => f.write_str("skipped (no marker)"),
            Self::Failed(failure) => write!(f, "failed: {failure}"),
        }
    }
}

/// Why a commit could not be handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Failure {
    /// Replay conflicted and no resolution patch is stored for it.
    ManualInterventionRequired {
        /// Full hash of the commit, also the key a resolution must be stored under.
        commit: String,
        /// Link or hash an operator can follow up on.
        reference: String,
    },
    /// The commit has no usable marker.
    Unclassified {
        /// Raw tag, if the message had one.
        tag: Option<String>,
    },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManualInterventionRequired { reference, .. } => {
                write!(f, "carry {reference} requires manual intervention")
            }
            Self::Unclassified { tag: Some(tag) } => write!(f, "unrecognized marker {tag}"),
            Self::Unclassified { tag: None } => f.write_str("no rebase marker"),
        }
    }
}
