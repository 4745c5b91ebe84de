//! CLI definition and command implementations.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;

pub mod apply;
pub mod classify;
pub mod completions;

/// Rebase a downstream fork onto new upstream history by replaying its
/// carried commits.
#[derive(Debug, Parser)]
#[command(name = "carry", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults apply when it does not exist).
    #[arg(long, global = true, default_value = "carry.toml")]
    pub config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors and essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the dated rebase branch and replay carried commits onto it.
    Apply(ApplyArgs),

    /// Show the rebase action for commits.
    Classify {
        /// Commits to classify (hashes or any revision).
        #[arg(required = true)]
        revs: Vec<String>,

        /// Repository to read from.
        #[arg(short = 'C', long, default_value = ".")]
        repository: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Arguments for `carry apply`.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)] // CLI options map directly to flags
pub struct ApplyArgs {
    /// Upstream-side starting ref the fork last rebased onto (e.g. a release tag).
    pub from: String,

    /// Local repository to rebase.
    #[arg(default_value = ".")]
    pub repository: PathBuf,

    /// Upstream ref to build the rebase branch from.
    #[arg(long)]
    pub onto: Option<String>,

    /// The fork's default branch to merge and replay.
    #[arg(long)]
    pub downstream: Option<String>,

    /// Directory of resolution patches named by commit hash.
    #[arg(long)]
    pub carries: Option<PathBuf>,

    /// Consecutive manual-intervention failures before aborting.
    #[arg(long, value_name = "N")]
    pub max_failures: Option<usize>,

    /// Do not validate remote fetch URLs.
    #[arg(long)]
    pub skip_remote_check: bool,

    /// Classify commits without creating a branch or replaying anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Output the report as JSON.
    #[arg(long)]
    pub json: bool,
}
