//! In-memory fakes for the git capability traits.
//!
//! `FakeRepo` models a downstream history and a working tree as a list of
//! applied changes, so carry and rebase logic can be tested without a real
//! repository.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use carry_git::{Commit, Error as GitError, LogOptions, Oid, Result as GitResult};
use carry_git::{VersionControl, WorkingTree};

pub fn oid(n: u8) -> Oid {
    Oid::from_str(&format!("{n:040x}")).unwrap()
}

pub fn commit(n: u8, message: &str) -> Commit {
    Commit {
        id: oid(n),
        message: message.to_string(),
        author_name: "Test User".to_string(),
        author_email: "test@example.com".to_string(),
        author_time: 1_700_000_000 + i64::from(n),
        commit_time: 1_700_000_000 + i64::from(n),
        parent_count: 1,
    }
}

fn failed(command: &str) -> GitError {
    GitError::CommandFailed {
        command: command.to_string(),
        stderr: "simulated failure".to_string(),
    }
}

/// Fake repository implementing both `VersionControl` and `WorkingTree`.
#[derive(Default)]
pub struct FakeRepo {
    /// Downstream history, newest first.
    pub history: Vec<Commit>,
    pub merge_base: Option<Oid>,
    pub remotes: HashMap<String, String>,
    pub conflicts: HashSet<Oid>,

    pub timeout_pick: bool,
    pub fail_branch: bool,
    pub fail_merge: bool,
    pub fail_status: bool,
    pub fail_abort: bool,
    pub fail_apply: bool,

    /// Every trait call, in order.
    pub calls: RefCell<Vec<String>>,
    /// Changes that made it into the tree: `pick:<id>` or `patch:<contents>`.
    pub applied: RefCell<Vec<String>>,
    /// Messages of commits created on the working branch.
    pub messages: RefCell<Vec<String>>,
    /// A cherry-pick is stopped on a conflict.
    pub in_progress: RefCell<bool>,
    /// Staged but uncommitted patch contents.
    pub staged: RefCell<Option<String>>,
}

impl FakeRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set downstream history from oldest to newest.
    pub fn with_history(mut self, oldest_first: Vec<Commit>) -> Self {
        self.history = oldest_first.into_iter().rev().collect();
        self
    }

    pub fn with_merge_base(mut self, base: Oid) -> Self {
        self.merge_base = Some(base);
        self
    }

    pub fn with_conflict(mut self, id: Oid) -> Self {
        self.conflicts.insert(id);
        self
    }

    pub fn with_remote(mut self, name: &str, url: &str) -> Self {
        self.remotes.insert(name.to_string(), url.to_string());
        self
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn applied(&self) -> Vec<String> {
        self.applied.borrow().clone()
    }

    /// The tree has no conflict or staged leftovers.
    pub fn is_clean(&self) -> bool {
        !*self.in_progress.borrow() && self.staged.borrow().is_none()
    }
}

impl VersionControl for FakeRepo {
    fn head(&self) -> GitResult<Commit> {
        self.record("head");
        self.history
            .first()
            .cloned()
            .ok_or_else(|| GitError::RefNotFound("HEAD".into()))
    }

    fn find_commit(&self, rev: &str) -> GitResult<Commit> {
        self.record(format!("find_commit:{rev}"));
        self.history
            .iter()
            .find(|c| c.id.to_string().starts_with(rev))
            .cloned()
            .ok_or_else(|| GitError::RefNotFound(rev.into()))
    }

    fn remote_fetch_url(&self, remote: &str) -> GitResult<String> {
        self.record(format!("remote:{remote}"));
        self.remotes
            .get(remote)
            .cloned()
            .ok_or_else(|| GitError::RemoteNotFound(remote.into()))
    }

    fn create_branch_from(&self, name: &str, start: &str) -> GitResult<Oid> {
        self.record(format!("create_branch:{name}:{start}"));
        if self.fail_branch {
            return Err(GitError::RefNotFound(start.into()));
        }
        Ok(Oid::zero())
    }

    fn merge(&self, rev: &str, strategy: Option<&str>) -> GitResult<()> {
        self.record(format!("merge:{rev}:{}", strategy.unwrap_or("default")));
        if self.fail_merge {
            return Err(failed("git merge"));
        }
        Ok(())
    }

    fn merge_base(&self, one: &str, two: &str) -> GitResult<Oid> {
        self.record(format!("merge_base:{one}:{two}"));
        self.merge_base
            .ok_or_else(|| GitError::RefNotFound(format!("{one}...{two}")))
    }

    fn log(&self, options: &LogOptions) -> GitResult<Vec<Commit>> {
        self.record("log");
        Ok(self
            .history
            .iter()
            .take_while(|c| options.hide != Some(c.id))
            .cloned()
            .collect())
    }
}

impl WorkingTree for FakeRepo {
    fn cherry_pick(&self, commit: Oid) -> GitResult<()> {
        self.record(format!("cherry_pick:{commit}"));
        if self.timeout_pick {
            return Err(GitError::Timeout {
                command: format!("git cherry-pick --allow-empty {commit}"),
                secs: 1,
            });
        }
        if *self.in_progress.borrow() {
            return Err(failed("git cherry-pick (previous pick unresolved)"));
        }
        if self.conflicts.contains(&commit) {
            *self.in_progress.borrow_mut() = true;
            return Err(failed("git cherry-pick"));
        }
        self.applied.borrow_mut().push(format!("pick:{commit}"));
        if let Some(c) = self.history.iter().find(|c| c.id == commit) {
            self.messages.borrow_mut().push(c.message.clone());
        }
        Ok(())
    }

    fn abort_cherry_pick(&self) -> GitResult<()> {
        self.record("abort");
        if self.fail_abort {
            return Err(failed("git cherry-pick --abort"));
        }
        *self.in_progress.borrow_mut() = false;
        Ok(())
    }

    fn apply_patch(&self, patch: &[u8]) -> GitResult<()> {
        self.record("apply");
        if self.fail_apply || *self.in_progress.borrow() {
            return Err(failed("git apply"));
        }
        *self.staged.borrow_mut() = Some(String::from_utf8_lossy(patch).into_owned());
        Ok(())
    }

    fn commit_applied(&self, original: &Commit) -> GitResult<Oid> {
        self.record(format!("commit:{}", original.id));
        let staged = self
            .staged
            .borrow_mut()
            .take()
            .ok_or_else(|| failed("git commit (nothing staged)"))?;
        self.applied.borrow_mut().push(format!("patch:{staged}"));
        self.messages.borrow_mut().push(original.message.clone());
        Ok(original.id)
    }

    fn status(&self) -> GitResult<String> {
        self.record("status");
        if self.fail_status {
            return Err(failed("git status"));
        }
        Ok(if *self.in_progress.borrow() {
            "UU conflicted.txt\n".to_string()
        } else {
            String::new()
        })
    }

    fn amend_head_message(&self, rewrite: &dyn Fn(&str) -> Vec<String>) -> GitResult<()> {
        self.record("amend");
        let mut messages = self.messages.borrow_mut();
        let last = messages
            .last_mut()
            .ok_or_else(|| failed("git commit --amend"))?;
        *last = rewrite(last).join("\n\n");
        Ok(())
    }
}
