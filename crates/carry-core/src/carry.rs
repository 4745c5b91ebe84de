//! The carry flow: replay one commit with a stored-resolution fallback.

use carry_git::{Commit, WorkingTree};

use crate::error::{Error, Result, backend};
use crate::outcome::{Failure, Outcome};
use crate::traits::PatchStore;

/// Trailer added to commits applied from a resolution patch.
pub const RESOLUTION_TRAILER: &str = "Carry-Resolution";

/// Settings for [`CarryFlow`].
#[derive(Debug, Clone, Default)]
pub struct CarryOptions {
    /// Prefix for manual-intervention links; the commit hash is appended.
    pub commit_url: Option<String>,
    /// Append a resolution trailer to commits applied from a patch.
    pub resolution_trailer: bool,
}

/// Replays carried commits onto the current branch.
pub struct CarryFlow<'a, W: WorkingTree, P: PatchStore> {
    tree: &'a W,
    patches: &'a P,
    options: CarryOptions,
}

impl<'a, W: WorkingTree, P: PatchStore> CarryFlow<'a, W, P> {
    /// Create a carry flow over a working tree and patch store.
    #[must_use]
    pub const fn new(tree: &'a W, patches: &'a P, options: CarryOptions) -> Self {
        Self {
            tree,
            patches,
            options,
        }
    }

    /// Carry a single commit.
    ///
    /// A conflicting cherry-pick is always aborted before the patch store is
    /// consulted, so the tree is back at its pre-attempt state whether or
    /// not a resolution exists.
    ///
    /// # Errors
    /// Returns error if git timed out or could not be run during the pick
    /// (the tree state is then unknown), if the conflicted pick cannot be
    /// aborted, if the patch store cannot be read, or if a stored resolution
    /// fails to apply.
    pub fn carry(&self, commit: &Commit) -> Result<Outcome> {
        let hash = commit.id.to_string();
        tracing::debug!(commit = %hash, "initiating carry flow");

        let pick_error = match self.tree.cherry_pick(commit.id) {
            Ok(()) => {
                tracing::info!(commit = %hash, summary = commit.summary(), "carried");
                return Ok(Outcome::AppliedDirect);
            }
            Err(e @ (carry_git::Error::Timeout { .. } | carry_git::Error::Io(_))) => {
                return Err(Error::Backend {
                    context: format!("cherry-pick {hash}"),
                    source: e,
                });
            }
            Err(e) => e,
        };

        tracing::info!(commit = %hash, error = %pick_error, "encountered problems picking");
        self.log_status(&hash);
        self.tree
            .abort_cherry_pick()
            .map_err(backend(format!("abort cherry-pick of {hash}")))?;

        tracing::debug!(commit = %hash, "looking for a resolution patch");
        let Some(patch) = self.patches.lookup(&hash)? else {
            let reference = self.reference(&hash);
            tracing::error!(commit = %hash, %reference, "carry requires manual intervention");
            return Ok(Outcome::Failed(Failure::ManualInterventionRequired {
                commit: hash,
                reference,
            }));
        };

        tracing::info!(commit = %hash, patch = %patch.origin, "found resolution patch, applying");
        let resolution_failed = |source| Error::ResolutionFailed {
            commit: hash.clone(),
            patch: patch.origin.clone(),
            source,
        };
        self.tree
            .apply_patch(&patch.contents)
            .map_err(resolution_failed)?;
        self.tree
            .commit_applied(commit)
            .map_err(resolution_failed)?;

        if self.options.resolution_trailer {
            let trailer = format!("{RESOLUTION_TRAILER}: {}", patch.id);
            self.tree
                .amend_head_message(&|message: &str| {
                    vec![message.trim_end().to_string(), trailer.clone()]
                })
                .map_err(resolution_failed)?;
        }

        Ok(Outcome::AppliedViaResolution { patch: patch.id })
    }

    /// Log the conflicted tree. A failure here must not stop the abort.
    fn log_status(&self, hash: &str) {
        match self.tree.status() {
            Ok(status) => tracing::info!(commit = %hash, status = %status.trim_end(), "working tree status"),
            Err(e) => tracing::warn!(commit = %hash, error = %e, "could not read working tree status"),
        }
    }

    fn reference(&self, hash: &str) -> String {
        self.options
            .commit_url
            .as_deref()
            .map_or_else(|| hash.to_string(), |url| format!("{url}{hash}"))
    }
}
