//! Rebase orchestration.
//!
//! A run creates a dated branch from the new upstream base, merges the
//! fork's default branch into it so history is preserved, then walks the
//! fork's own commits oldest first, dropping or carrying each according to
//! its marker. Every processed commit gets exactly one [`Outcome`] in the
//! session ledger.

use chrono::NaiveDate;
use serde::Serialize;

use carry_git::{Commit, LogOptions, VersionControl, WorkingTree};

use crate::carry::{CarryFlow, CarryOptions};
use crate::config::{Config, RemoteExpectation, UnknownPolicy};
use crate::error::{Error, Result, backend};
use crate::marker::{Action, classify};
use crate::outcome::{Failure, Outcome};
use crate::traits::PatchStore;

/// Lifecycle of a rebase session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Initializing,
    BranchPrepared,
    ProcessingCommits,
    Completed,
    Aborted,
}

/// Settings for a [`Rebaser`].
#[derive(Debug, Clone)]
pub struct RebaseOptions {
    /// Working branch to create.
    pub branch: String,
    /// Upstream ref the branch starts from.
    pub upstream: String,
    /// Downstream ref merged in and replayed.
    pub downstream: String,
    /// Merge strategy for the downstream merge.
    pub merge_strategy: Option<String>,
    /// Manual-intervention failures in a row before aborting.
    pub max_consecutive_failures: usize,
    /// Handling of commits without a usable marker.
    pub unknown_policy: UnknownPolicy,
    /// Remotes to validate before touching anything.
    pub remotes: Vec<RemoteExpectation>,
    /// Carry flow settings.
    pub carry: CarryOptions,
}

impl RebaseOptions {
    /// Build options from config, naming the branch after `date`.
    #[must_use]
    pub fn from_config(config: &Config, date: NaiveDate) -> Self {
        Self {
            branch: branch_name(&config.general.branch_prefix, date),
            upstream: config.refs.upstream.clone(),
            downstream: config.refs.downstream.clone(),
            merge_strategy: config.refs.merge_strategy().map(String::from),
            max_consecutive_failures: config.general.max_consecutive_failures.max(1),
            unknown_policy: config.general.unknown_policy,
            remotes: config.remotes.clone(),
            carry: CarryOptions {
                commit_url: config.general.commit_url.clone(),
                resolution_trailer: config.general.resolution_trailer,
            },
        }
    }
}

/// Name of the working branch for a run on `date`.
#[must_use]
pub fn branch_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}-{}", date.format("%Y-%m-%d"))
}

/// One processed commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub commit: String,
    pub summary: String,
    pub action: Action,
    pub outcome: Outcome,
}

/// A classified commit that has not been processed.
#[derive(Debug, Clone, Serialize)]
pub struct PlanEntry {
    pub commit: String,
    pub summary: String,
    pub action: Action,
}

/// Working state of one run.
#[derive(Debug)]
pub struct RebaseSession {
    branch: String,
    state: SessionState,
    queue: Vec<Commit>,
    next: usize,
    ledger: Vec<LedgerEntry>,
    consecutive_failures: usize,
    abort_reason: Option<String>,
    error: Option<String>,
}

impl RebaseSession {
    /// Start a session for `branch` over `queue`, oldest commit first.
    #[must_use]
    pub const fn new(branch: String, queue: Vec<Commit>) -> Self {
        Self {
            branch,
            state: SessionState::Initializing,
            queue,
            next: 0,
            ledger: Vec::new(),
            consecutive_failures: 0,
            abort_reason: None,
            error: None,
        }
    }

    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    /// Commits not yet processed.
    #[must_use]
    pub fn pending(&self) -> &[Commit] {
        &self.queue[self.next..]
    }

    fn abort(&mut self, reason: impl Into<String>) {
        self.state = SessionState::Aborted;
        self.abort_reason = Some(reason.into());
    }

    /// Abort on an error that leaves the run unable to continue.
    fn fail(&mut self, error: &Error) {
        self.state = SessionState::Aborted;
        self.error = Some(error.to_string());
    }

    /// Snapshot the session as a report.
    #[must_use]
    pub fn report(&self) -> RebaseReport {
        RebaseReport {
            branch: self.branch.clone(),
            state: self.state,
            entries: self.ledger.clone(),
            unprocessed: self.pending().iter().map(|c| c.id.to_string()).collect(),
            abort_reason: self.abort_reason.clone(),
            error: self.error.clone(),
        }
    }
}

/// Final, serializable account of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RebaseReport {
    pub branch: String,
    pub state: SessionState,
    pub entries: Vec<LedgerEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unprocessed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
    /// Fatal error that stopped processing; earlier entries are still on
    /// the branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RebaseReport {
    /// Entries whose outcome is a failure.
    pub fn failures(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(|e| e.outcome.is_failure())
    }

    /// Number of commits applied to the branch.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_applied()).count()
    }

    /// Completed with every commit handled automatically.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state == SessionState::Completed && self.failures().next().is_none()
    }
}

/// Drives a rebase session over a repository.
pub struct Rebaser<'a, V, W, P>
where
    V: VersionControl,
    W: WorkingTree,
    P: PatchStore,
{
    vcs: &'a V,
    tree: &'a W,
    patches: &'a P,
    options: RebaseOptions,
}

impl<'a, V, W, P> Rebaser<'a, V, W, P>
where
    V: VersionControl,
    W: WorkingTree,
    P: PatchStore,
{
    /// Create a rebaser. `vcs` and `tree` are usually the same repository.
    ///
    /// A failure threshold of zero is treated as one.
    #[must_use]
    pub fn new(vcs: &'a V, tree: &'a W, patches: &'a P, mut options: RebaseOptions) -> Self {
        options.max_consecutive_failures = options.max_consecutive_failures.max(1);
        Self {
            vcs,
            tree,
            patches,
            options,
        }
    }

    /// Settings in use.
    #[must_use]
    pub const fn options(&self) -> &RebaseOptions {
        &self.options
    }

    /// Check configured remotes fetch from where they should.
    ///
    /// # Errors
    /// Returns error if a remote is missing or points elsewhere.
    pub fn check_remotes(&self) -> Result<()> {
        for expected in &self.options.remotes {
            let url = self
                .vcs
                .remote_fetch_url(&expected.name)
                .map_err(backend(format!("read fetch URL of remote {}", expected.name)))?;
            if !url.contains(&expected.url_contains) {
                return Err(Error::Backend {
                    context: "validate remotes".into(),
                    source: carry_git::Error::RemoteMismatch {
                        remote: expected.name.clone(),
                        expected: expected.url_contains.clone(),
                        url,
                    },
                });
            }
            tracing::info!(remote = %expected.name, fetch_url = %url, "git remote set up properly");
        }
        Ok(())
    }

    /// Downstream commits to process, oldest first.
    ///
    /// Walks the downstream ref's first-parent history, leaving out its merge
    /// base with `from` and everything reachable from it, so upstream history
    /// brought in by earlier merges never enters the queue. Merge commits are
    /// skipped: their content is either
    /// upstream's or already covered by the commits they bring in.
    ///
    /// # Errors
    /// Returns error if either ref cannot be resolved or the log walk fails.
    pub fn collect_commits(&self, from: &str) -> Result<Vec<Commit>> {
        let downstream = &self.options.downstream;
        let base = self
            .vcs
            .merge_base(from, downstream)
            .map_err(backend(format!("find merge base of {from} and {downstream}")))?;

        let mut commits = self
            .vcs
            .log(&LogOptions {
                from: Some(downstream.clone()),
                hide: Some(base),
                first_parent: true,
            })
            .map_err(backend(format!("read commit log of {downstream}")))?;

        commits.retain(|c| {
            if c.is_merge() {
                tracing::debug!(commit = %c.id, summary = c.summary(), "skipping merge commit");
            }
            !c.is_merge()
        });
        commits.reverse();

        tracing::info!(count = commits.len(), %base, "collected downstream commits");
        Ok(commits)
    }

    /// Classify the commits a run would process, without touching anything.
    ///
    /// # Errors
    /// Returns error if commits cannot be collected.
    pub fn plan(&self, from: &str) -> Result<Vec<PlanEntry>> {
        Ok(self
            .collect_commits(from)?
            .into_iter()
            .map(|c| PlanEntry {
                commit: c.id.to_string(),
                summary: c.summary().to_string(),
                action: classify(&c.message),
            })
            .collect())
    }

    /// Create the working branch from upstream and merge downstream into it.
    ///
    /// # Errors
    /// Returns error if the branch cannot be created or the merge fails.
    pub fn prepare_branch(&self, session: &mut RebaseSession) -> Result<()> {
        let opts = &self.options;
        tracing::info!(branch = %session.branch, upstream = %opts.upstream, "creating rebase branch");

        if let Err(e) = self
            .vcs
            .create_branch_from(&session.branch, &opts.upstream)
            .map_err(backend(format!("create rebase branch {} from {}", session.branch, opts.upstream)))
        {
            session.fail(&e);
            return Err(e);
        }

        if let Err(e) = self
            .vcs
            .merge(&opts.downstream, opts.merge_strategy.as_deref())
            .map_err(backend(format!("merge {} into {}", opts.downstream, session.branch)))
        {
            session.fail(&e);
            return Err(e);
        }

        session.state = SessionState::BranchPrepared;
        Ok(())
    }

    /// Process every pending commit in order.
    ///
    /// Stops early, leaving the session `Aborted`, once the configured number
    /// of consecutive manual-intervention failures is reached.
    ///
    /// # Errors
    /// Returns error on any backend failure; the session is marked `Aborted`
    /// and the failing commit stays pending.
    pub fn process_commits(&self, session: &mut RebaseSession) -> Result<()> {
        session.state = SessionState::ProcessingCommits;
        let carry = CarryFlow::new(self.tree, self.patches, self.options.carry.clone());

        while session.next < session.queue.len() {
            let commit = session.queue[session.next].clone();
            let action = classify(&commit.message);
            tracing::debug!(commit = %commit.id, summary = commit.summary(), %action, "processing");

            let outcome = match self.dispatch(&carry, &commit, &action) {
                Ok(outcome) => outcome,
                Err(e) => {
                    session.fail(&e);
                    return Err(e);
                }
            };

            match &outcome {
                Outcome::Failed(Failure::ManualInterventionRequired { .. }) => {
                    session.consecutive_failures += 1;
                }
                o if o.is_applied() => session.consecutive_failures = 0,
                _ => {}
            }

            session.ledger.push(LedgerEntry {
                commit: commit.id.to_string(),
                summary: commit.summary().to_string(),
                action,
                outcome,
            });
            session.next += 1;

            if session.consecutive_failures >= self.options.max_consecutive_failures {
                let count = session.consecutive_failures;
                tracing::error!(count, "too many consecutive carry failures, aborting");
                session.abort(format!(
                    "{count} consecutive carry failure(s) require manual intervention"
                ));
                return Ok(());
            }
        }

        session.state = SessionState::Completed;
        Ok(())
    }

    fn dispatch(&self, carry: &CarryFlow<'_, W, P>, commit: &Commit, action: &Action) -> Result<Outcome> {
        match action {
            Action::Drop => {
                tracing::info!(commit = %commit.id, "dropping commit");
                Ok(Outcome::Dropped)
            }
            Action::Carry => carry.carry(commit),
            Action::UpstreamPick(pr) => {
                tracing::info!(commit = %commit.id, upstream_pr = pr, "upstream pick, replaying as carry");
                carry.carry(commit)
            }
            Action::Unknown(tag) => {
                tracing::warn!(commit = %commit.id, tag = tag.as_deref().unwrap_or(""), "unknown action on commit");
                Ok(match self.options.unknown_policy {
                    UnknownPolicy::Fail => Outcome::Failed(Failure::Unclassified { tag: tag.clone() }),
                    UnknownPolicy::Skip => Outcome::Skipped { tag: tag.clone() },
                })
            }
        }
    }

    /// Run a full rebase from `from`.
    ///
    /// A backend failure while processing commits does not discard the
    /// session: the report comes back `Aborted` with [`RebaseReport::error`]
    /// set, listing what was already applied and what is still pending.
    ///
    /// # Errors
    /// Returns error on remote validation, commit collection, or branch
    /// preparation, before anything has been replayed.
    pub fn run(&self, from: &str) -> Result<RebaseReport> {
        self.check_remotes()?;
        let queue = self.collect_commits(from)?;

        let mut session = RebaseSession::new(self.options.branch.clone(), queue);
        self.prepare_branch(&mut session)?;
        if let Err(e) = self.process_commits(&mut session) {
            tracing::error!(branch = %session.branch, error = %e, "rebase stopped on a fatal error");
        }

        let report = session.report();
        tracing::info!(
            branch = %report.branch,
            state = ?report.state,
            applied = report.applied_count(),
            failed = report.failures().count(),
            "rebase finished"
        );
        Ok(report)
    }
}
