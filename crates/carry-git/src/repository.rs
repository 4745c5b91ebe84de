//! Repository wrapper implementing the carry git capabilities.

use std::path::Path;
use std::time::Duration;

use git2::build::CheckoutBuilder;
use git2::{Oid, Signature, Time};

use crate::command::GitCommand;
use crate::error::{Error, Result};
use crate::traits::{VersionControl, WorkingTree};
use crate::{Commit, LogOptions};

/// High-level wrapper around a git repository.
pub struct Repository {
    inner: git2::Repository,
    timeout: Option<Duration>,
}

impl Repository {
    /// Open a repository at the given path.
    ///
    /// # Errors
    /// Returns error if no repository found at path or any parent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = git2::Repository::discover(path)?;
        Ok(Self {
            inner,
            timeout: None,
        })
    }

    /// Bound every git subprocess by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the path to the repository root (workdir).
    #[must_use]
    pub fn workdir(&self) -> Option<&Path> {
        self.inner.workdir()
    }

    /// Get the path to the .git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        self.inner.path()
    }

    /// Check if the working directory is clean.
    ///
    /// # Errors
    /// Returns error if status check fails.
    pub fn is_clean(&self) -> Result<bool> {
        let statuses = self.inner.statuses(None)?;
        Ok(statuses.is_empty())
    }

    /// Resolve a revision to a commit OID.
    ///
    /// # Errors
    /// Returns `RefNotFound` if the revision does not name a commit.
    pub fn resolve(&self, rev: &str) -> Result<Oid> {
        Ok(self.resolve_commit(rev)?.id())
    }

    fn resolve_commit(&self, rev: &str) -> Result<git2::Commit<'_>> {
        self.inner
            .revparse_single(rev)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| Error::RefNotFound(rev.into()))
    }

    fn git(&self) -> Result<GitCommand<'_>> {
        let workdir = self.workdir().ok_or(Error::NotARepository)?;
        Ok(GitCommand::new(workdir, self.timeout))
    }

    /// Get a reference to the underlying git2 repository.
    ///
    /// Use sparingly - prefer high-level methods.
    #[must_use]
    pub const fn inner(&self) -> &git2::Repository {
        &self.inner
    }
}

impl VersionControl for Repository {
    fn head(&self) -> Result<Commit> {
        let commit = self.inner.head()?.peel_to_commit()?;
        Ok(Commit::from(&commit))
    }

    fn find_commit(&self, rev: &str) -> Result<Commit> {
        let commit = self.resolve_commit(rev)?;
        Ok(Commit::from(&commit))
    }

    fn remote_fetch_url(&self, remote: &str) -> Result<String> {
        let found = self
            .inner
            .find_remote(remote)
            .map_err(|_| Error::RemoteNotFound(remote.into()))?;
        found
            .url()
            .map(String::from)
            .ok_or_else(|| Error::NoFetchUrl(remote.into()))
    }

    fn create_branch_from(&self, name: &str, start: &str) -> Result<Oid> {
        let commit = self.resolve_commit(start)?;
        let branch = self.inner.branch(name, &commit, false)?;
        let refname = branch
            .get()
            .name()
            .ok_or_else(|| Error::RefNotFound(name.into()))?
            .to_string();

        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.inner
            .checkout_tree(commit.as_object(), Some(&mut checkout))?;
        self.inner.set_head(&refname)?;

        tracing::debug!(branch = name, %start, tip = %commit.id(), "created branch");
        Ok(commit.id())
    }

    fn merge(&self, rev: &str, strategy: Option<&str>) -> Result<()> {
        let mut cmd = self.git()?.args(["merge", "--no-edit"]);
        if let Some(strategy) = strategy {
            cmd = cmd.args(["--strategy", strategy]);
        }
        cmd.arg(rev).run()?;
        Ok(())
    }

    fn merge_base(&self, one: &str, two: &str) -> Result<Oid> {
        let one = self.resolve(one)?;
        let two = self.resolve(two)?;
        Ok(self.inner.merge_base(one, two)?)
    }

    fn log(&self, options: &LogOptions) -> Result<Vec<Commit>> {
        let start = match &options.from {
            Some(rev) => self.resolve(rev)?,
            None => self.inner.head()?.peel_to_commit()?.id(),
        };

        let mut revwalk = self.inner.revwalk()?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL)?;
        if options.first_parent {
            revwalk.simplify_first_parent()?;
        }
        revwalk.push(start)?;
        if let Some(hide) = options.hide {
            revwalk.hide(hide)?;
        }

        revwalk
            .map(|oid| {
                let commit = self.inner.find_commit(oid?)?;
                Ok(Commit::from(&commit))
            })
            .collect()
    }
}

impl WorkingTree for Repository {
    fn cherry_pick(&self, commit: Oid) -> Result<()> {
        self.git()?
            .args(["cherry-pick", "--allow-empty"])
            .arg(commit.to_string())
            .run()?;
        Ok(())
    }

    fn abort_cherry_pick(&self) -> Result<()> {
        self.git()?.args(["cherry-pick", "--abort"]).run()?;
        Ok(())
    }

    fn apply_patch(&self, patch: &[u8]) -> Result<()> {
        self.git()?
            .args(["apply", "--index", "--whitespace=nowarn", "-"])
            .stdin(patch)
            .run()?;
        Ok(())
    }

    fn commit_applied(&self, original: &Commit) -> Result<Oid> {
        let mut index = self.inner.index()?;
        index.read(true)?;
        let tree = self.inner.find_tree(index.write_tree()?)?;
        let parent = self.inner.head()?.peel_to_commit()?;

        let author = Signature::new(
            &original.author_name,
            &original.author_email,
            &Time::new(original.author_time, 0),
        )?;
        let committer = match self.inner.signature() {
            Ok(sig) => sig,
            Err(_) => Signature::now(&original.author_name, &original.author_email)?,
        };

        let oid = self.inner.commit(
            Some("HEAD"),
            &author,
            &committer,
            &original.message,
            &tree,
            &[&parent],
        )?;
        Ok(oid)
    }

    fn status(&self) -> Result<String> {
        let output = self.git()?.args(["status", "--short"]).run()?;
        Ok(output.stdout)
    }

    fn amend_head_message(&self, rewrite: &dyn Fn(&str) -> Vec<String>) -> Result<()> {
        let current = self.head()?.message;
        let paragraphs = rewrite(&current);

        let mut cmd = self.git()?.args(["commit", "--allow-empty", "--amend"]);
        if paragraphs.is_empty() {
            cmd = cmd.arg("--no-edit");
        }
        for paragraph in paragraphs {
            cmd = cmd.arg("-m").arg(paragraph);
        }
        cmd.run()?;
        Ok(())
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.git_dir())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn init_test_repo() -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        let repo = git2::Repository::init(temp.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        commit_file(&repo, "README.md", "# test\n", "Initial commit");

        let wrapped = Repository {
            inner: repo,
            timeout: Some(Duration::from_secs(60)),
        };
        (temp, wrapped)
    }

    fn commit_file(repo: &git2::Repository, path: &str, contents: &str, message: &str) -> Oid {
        let workdir = repo.workdir().unwrap().to_path_buf();
        fs::write(workdir.join(path), contents).unwrap();

        let mut index = repo.index().unwrap();
        index.read(false).unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = repo.signature().unwrap();

        let parents: Vec<git2::Commit<'_>> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    fn current_branch(repo: &Repository) -> String {
        repo.inner()
            .head()
            .unwrap()
            .shorthand()
            .unwrap()
            .to_string()
    }

    fn is_cherry_picking(repo: &Repository) -> bool {
        matches!(
            repo.inner().state(),
            git2::RepositoryState::CherryPick | git2::RepositoryState::CherryPickSequence
        )
    }

    fn read(temp: &TempDir, path: &str) -> String {
        fs::read_to_string(temp.path().join(path)).unwrap()
    }

    #[test]
    fn test_head_and_find_commit() {
        let (_temp, repo) = init_test_repo();
        let head = repo.head().unwrap();
        assert_eq!(head.summary(), "Initial commit");
        assert_eq!(head.author_email, "test@example.com");

        let found = repo.find_commit(&head.id.to_string()).unwrap();
        assert_eq!(found, head);
        assert!(matches!(
            repo.find_commit("does-not-exist"),
            Err(Error::RefNotFound(_))
        ));
    }

    #[test]
    fn test_create_branch_from_checks_out() {
        let (temp, repo) = init_test_repo();
        let base = repo.head().unwrap().id;
        commit_file(repo.inner(), "a.txt", "a\n", "add a");

        let tip = repo.create_branch_from("rebase-test", &base.to_string()).unwrap();
        assert_eq!(tip, base);
        assert_eq!(current_branch(&repo), "rebase-test");
        assert!(!temp.path().join("a.txt").exists());
    }

    #[test]
    fn test_log_hides_base_and_ancestors() {
        let (_temp, repo) = init_test_repo();
        let base = repo.head().unwrap().id;
        commit_file(repo.inner(), "a.txt", "a\n", "first");
        commit_file(repo.inner(), "b.txt", "b\n", "second");

        let all = repo.log(&LogOptions::default()).unwrap();
        let summaries: Vec<&str> = all.iter().map(Commit::summary).collect();
        assert_eq!(summaries, ["second", "first", "Initial commit"]);

        let bounded = repo
            .log(&LogOptions {
                from: Some("HEAD~1".to_string()),
                hide: Some(base),
                first_parent: true,
            })
            .unwrap();
        let summaries: Vec<&str> = bounded.iter().map(Commit::summary).collect();
        assert_eq!(summaries, ["first"]);
    }

    #[test]
    fn test_log_stops_at_base_merged_through_second_parent() {
        let (_temp, repo) = init_test_repo();
        let main = current_branch(&repo);
        let root = repo.head().unwrap().id;
        commit_file(repo.inner(), "d1.txt", "d1\n", "UPSTREAM: <carry>: d1");

        repo.create_branch_from("up", &root.to_string()).unwrap();
        let u1 = commit_file(repo.inner(), "u1.txt", "u1\n", "u1");
        repo.git().unwrap().args(["checkout", main.as_str()]).run().unwrap();
        repo.merge("up", None).unwrap();
        commit_file(repo.inner(), "d2.txt", "d2\n", "UPSTREAM: <carry>: d2");

        let base = repo.merge_base("up", "HEAD").unwrap();
        assert_eq!(base, u1);

        let commits = repo
            .log(&LogOptions {
                from: Some("HEAD".to_string()),
                hide: Some(base),
                first_parent: true,
            })
            .unwrap();
        let summaries: Vec<&str> = commits.iter().map(Commit::summary).collect();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0], "UPSTREAM: <carry>: d2");
        assert!(commits[1].is_merge());
        assert_eq!(summaries[2], "UPSTREAM: <carry>: d1");
        assert!(!summaries.contains(&"Initial commit"));
        assert!(!summaries.contains(&"u1"));
    }

    #[test]
    fn test_merge_base() {
        let (_temp, repo) = init_test_repo();
        let base = repo.head().unwrap().id;
        let downstream = commit_file(repo.inner(), "a.txt", "a\n", "downstream");
        repo.create_branch_from("other", &base.to_string()).unwrap();
        let upstream = commit_file(repo.inner(), "b.txt", "b\n", "upstream");

        let found = repo
            .merge_base(&downstream.to_string(), &upstream.to_string())
            .unwrap();
        assert_eq!(found, base);
    }

    #[test]
    fn test_cherry_pick_clean() {
        let (temp, repo) = init_test_repo();
        let base = repo.head().unwrap().id;
        let picked = commit_file(repo.inner(), "a.txt", "a\n", "UPSTREAM: <carry>: add a");
        repo.create_branch_from("work", &base.to_string()).unwrap();

        repo.cherry_pick(picked).unwrap();

        assert_eq!(repo.head().unwrap().summary(), "UPSTREAM: <carry>: add a");
        assert_eq!(read(&temp, "a.txt"), "a\n");
        assert!(repo.is_clean().unwrap());
    }

    #[test]
    fn test_cherry_pick_conflict_then_abort() {
        let (temp, repo) = init_test_repo();
        let base = repo.head().unwrap().id;
        let picked = commit_file(repo.inner(), "f.txt", "downstream\n", "downstream change");
        repo.create_branch_from("work", &base.to_string()).unwrap();
        let upstream = commit_file(repo.inner(), "f.txt", "upstream\n", "upstream change");

        assert!(repo.cherry_pick(picked).is_err());
        assert!(is_cherry_picking(&repo));
        assert!(!repo.status().unwrap().is_empty());

        repo.abort_cherry_pick().unwrap();
        assert!(!is_cherry_picking(&repo));
        assert!(repo.is_clean().unwrap());
        assert_eq!(repo.head().unwrap().id, upstream);
        assert_eq!(read(&temp, "f.txt"), "upstream\n");
    }

    #[test]
    fn test_apply_patch_and_commit() {
        let (temp, repo) = init_test_repo();
        let base = repo.head().unwrap().id;
        let picked = commit_file(repo.inner(), "f.txt", "downstream\n", "UPSTREAM: <carry>: change f");
        let original = repo.find_commit(&picked.to_string()).unwrap();
        repo.create_branch_from("work", &base.to_string()).unwrap();
        let upstream = commit_file(repo.inner(), "f.txt", "upstream\n", "upstream change");

        let patch = "diff --git a/f.txt b/f.txt\n\
                     --- a/f.txt\n\
                     +++ b/f.txt\n\
                     @@ -1 +1 @@\n\
                     -upstream\n\
                     +resolved\n";
        repo.apply_patch(patch.as_bytes()).unwrap();
        let oid = repo.commit_applied(&original).unwrap();

        let head = repo.head().unwrap();
        assert_eq!(head.id, oid);
        assert_eq!(head.message, original.message);
        assert_eq!(head.author_time, original.author_time);
        assert_eq!(repo.inner().find_commit(oid).unwrap().parent_id(0).unwrap(), upstream);
        assert_eq!(read(&temp, "f.txt"), "resolved\n");
        assert!(repo.is_clean().unwrap());
    }

    #[test]
    fn test_apply_patch_rejects_mismatch() {
        let (_temp, repo) = init_test_repo();
        let patch = "diff --git a/missing.txt b/missing.txt\n\
                     --- a/missing.txt\n\
                     +++ b/missing.txt\n\
                     @@ -1 +1 @@\n\
                     -old\n\
                     +new\n";
        assert!(matches!(
            repo.apply_patch(patch.as_bytes()),
            Err(Error::CommandFailed { .. })
        ));
        assert!(repo.is_clean().unwrap());
    }

    #[test]
    fn test_merge_with_ours_strategy() {
        let (temp, repo) = init_test_repo();
        let base = repo.head().unwrap().id;
        let downstream = commit_file(repo.inner(), "f.txt", "downstream\n", "downstream");
        repo.create_branch_from("work", &base.to_string()).unwrap();
        commit_file(repo.inner(), "f.txt", "upstream\n", "upstream");

        repo.merge(&downstream.to_string(), Some("ours")).unwrap();

        let head = repo.head().unwrap();
        assert!(head.is_merge());
        assert_eq!(read(&temp, "f.txt"), "upstream\n");
    }

    #[test]
    fn test_amend_head_message() {
        let (_temp, repo) = init_test_repo();
        repo.amend_head_message(&|old: &str| {
            vec![old.trim().to_string(), "Trailer: yes".to_string()]
        })
        .unwrap();

        let head = repo.head().unwrap();
        assert_eq!(head.summary(), "Initial commit");
        assert!(head.message.contains("Trailer: yes"));
    }

    #[test]
    fn test_remote_fetch_url() {
        let (_temp, repo) = init_test_repo();
        repo.inner()
            .remote("upstream", "git@github.com:kubernetes/kubernetes.git")
            .unwrap();

        assert_eq!(
            repo.remote_fetch_url("upstream").unwrap(),
            "git@github.com:kubernetes/kubernetes.git"
        );
        assert!(matches!(
            repo.remote_fetch_url("origin"),
            Err(Error::RemoteNotFound(_))
        ));
    }
}
