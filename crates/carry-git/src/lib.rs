//! # carry-git
//!
//! Git backend for carry, built on git2-rs.
//! Provides read-only history queries (branches, merge bases, commit logs)
//! and working-tree mutation (cherry-pick, patch application, amend) behind
//! two narrow capability traits so the rebase engine can run against fakes.

mod command;
mod commit;
mod error;
mod repository;
mod traits;

pub use commit::{Commit, LogOptions};
pub use error::{Error, Result};
pub use git2::Oid;
pub use repository::Repository;
pub use traits::{VersionControl, WorkingTree};
