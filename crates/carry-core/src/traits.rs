//! Trait abstraction for resolution patch lookup.
//!
//! The rebase engine only needs exact-key lookup, so the store can be a
//! directory on disk in production and a map in tests.

use crate::Result;
use crate::patches::ResolutionPatch;

/// Store of pre-recorded conflict resolutions, keyed by full commit hash.
pub trait PatchStore {
    /// Look up the resolution patch recorded for `key`.
    ///
    /// Returns `Ok(None)` when nothing is stored under exactly that key.
    ///
    /// # Errors
    /// Returns error if the store exists but cannot be read.
    fn lookup(&self, key: &str) -> Result<Option<ResolutionPatch>>;
}
