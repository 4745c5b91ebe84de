//! Configuration management for carry.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Carry configuration, usually loaded from `carry.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Refs the rebase starts from.
    #[serde(default)]
    pub refs: RefsConfig,

    /// Remotes whose fetch URLs are checked before a run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remotes: Vec<RemoteExpectation>,
}

impl Config {
    /// Load config from a TOML file.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns error if file can't be read, parsed, or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a TOML file.
    ///
    /// # Errors
    /// Returns error if serialization or write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| std::io::Error::other(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings that would make a run meaningless.
    ///
    /// # Errors
    /// Returns `InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.general.max_consecutive_failures == 0 {
            return Err(Error::InvalidConfig(
                "general.max_consecutive_failures must be at least 1".into(),
            ));
        }
        if self.general.branch_prefix.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "general.branch_prefix must not be empty".into(),
            ));
        }
        if self.refs.upstream.trim().is_empty() || self.refs.downstream.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "refs.upstream and refs.downstream must be set".into(),
            ));
        }
        if let Some(remote) = self.remotes.iter().find(|r| r.name.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "remote expecting '{}' has no name",
                remote.url_contains
            )));
        }
        Ok(())
    }
}

/// What to do with commits that carry no usable marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPolicy {
    /// Record a failure so the commit shows up in the report.
    #[default]
    Fail,
    /// Record the commit as skipped.
    Skip,
}

/// General carry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding resolution patches named by commit hash.
    #[serde(default = "default_carries_dir")]
    pub carries_dir: PathBuf,

    /// Manual-intervention failures in a row before the run is aborted.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: usize,

    /// Handling of unmarked or unrecognized commits.
    #[serde(default)]
    pub unknown_policy: UnknownPolicy,

    /// Prefix used to build manual-intervention links; the hash is appended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_url: Option<String>,

    /// Append a `Carry-Resolution:` trailer to commits applied from a patch.
    #[serde(default)]
    pub resolution_trailer: bool,

    /// Time limit for each git subprocess, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_timeout_secs: Option<u64>,

    /// Prefix of the dated working branch.
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,
}

impl GeneralConfig {
    /// Subprocess time limit as a [`Duration`].
    #[must_use]
    pub fn git_timeout(&self) -> Option<Duration> {
        self.git_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            carries_dir: default_carries_dir(),
            max_consecutive_failures: default_max_consecutive_failures(),
            unknown_policy: UnknownPolicy::default(),
            commit_url: None,
            resolution_trailer: false,
            git_timeout_secs: None,
            branch_prefix: default_branch_prefix(),
        }
    }
}

fn default_carries_dir() -> PathBuf {
    PathBuf::from("carries")
}

const fn default_max_consecutive_failures() -> usize {
    1
}

fn default_branch_prefix() -> String {
    "rebase".into()
}

/// Refs used to build the rebase branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefsConfig {
    /// New upstream base the working branch is created from.
    #[serde(default = "default_upstream")]
    pub upstream: String,

    /// The fork's default branch, merged in and replayed.
    #[serde(default = "default_downstream")]
    pub downstream: String,

    /// Strategy for merging the downstream branch; empty uses git's default.
    #[serde(default = "default_merge_strategy")]
    pub merge_strategy: String,
}

impl RefsConfig {
    /// Merge strategy, if one is configured.
    #[must_use]
    pub fn merge_strategy(&self) -> Option<&str> {
        let strategy = self.merge_strategy.trim();
        (!strategy.is_empty()).then_some(strategy)
    }
}

impl Default for RefsConfig {
    fn default() -> Self {
        Self {
            upstream: default_upstream(),
            downstream: default_downstream(),
            merge_strategy: default_merge_strategy(),
        }
    }
}

fn default_upstream() -> String {
    "upstream/master".into()
}

fn default_downstream() -> String {
    "origin/master".into()
}

fn default_merge_strategy() -> String {
    "ours".into()
}

/// A remote that must exist and fetch from a known location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteExpectation {
    /// Remote name.
    pub name: String,
    /// Fragment the first fetch URL must contain, e.g. `github.com:org/repo.git`.
    pub url_contains: String,
}
