//! # carry-core
//!
//! Core library for carry: rebases a long-lived downstream fork onto a new
//! upstream release by replaying the commits it carries.
//!
//! - [`marker`] classifies commits by their `UPSTREAM: <tag>:` marker
//! - [`carry::CarryFlow`] replays one commit, falling back to a stored
//!   resolution patch on conflict
//! - [`rebase::Rebaser`] prepares the working branch and drives the session

pub mod carry;
pub mod config;
pub mod error;
pub mod marker;
pub mod outcome;
pub mod patches;
pub mod rebase;
pub mod traits;

#[cfg(test)]
mod test_mocks;

pub use carry::{CarryFlow, CarryOptions};
pub use config::{Config, UnknownPolicy};
pub use error::{Error, Result};
pub use marker::{Action, classify};
pub use outcome::{Failure, Outcome};
pub use patches::{DirPatchStore, MemoryPatchStore, ResolutionPatch};
pub use rebase::{RebaseOptions, RebaseReport, RebaseSession, Rebaser, SessionState};
pub use traits::PatchStore;
