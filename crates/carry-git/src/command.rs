//! Git subprocess runner.
//!
//! Cherry-pick, merge and apply are delegated to the `git` binary: libgit2
//! has no sequencer, and the CLI leaves the repository in the states users
//! and `git status` expect. Each invocation can be bounded by a timeout.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured output of a successful git invocation.
#[derive(Debug, Default)]
pub struct Output {
    pub stdout: String,
    pub stderr: String,
}

/// A single `git` invocation in a working directory.
pub struct GitCommand<'a> {
    workdir: &'a Path,
    args: Vec<String>,
    stdin: Option<&'a [u8]>,
    timeout: Option<Duration>,
}

impl<'a> GitCommand<'a> {
    pub fn new(workdir: &'a Path, timeout: Option<Duration>) -> Self {
        Self {
            workdir,
            args: Vec::new(),
            stdin: None,
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: &'a [u8]) -> Self {
        self.stdin = Some(input);
        self
    }

    fn display(&self) -> String {
        format!("git {}", self.args.join(" "))
    }

    /// Run the command, failing if git exits non-zero.
    pub fn run(self) -> Result<Output> {
        let command = self.display();
        tracing::debug!(%command, "executing git");

        let mut child = Command::new("git")
            .args(&self.args)
            .current_dir(self.workdir)
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        if let (Some(input), Some(mut pipe)) = (self.stdin, child.stdin.take()) {
            pipe.write_all(input)?;
        }

        let status = match self.timeout {
            Some(limit) => wait_with_timeout(&mut child, limit, &command)?,
            None => child.wait()?,
        };

        let output = Output {
            stdout: join_reader(stdout)?,
            stderr: join_reader(stderr)?,
        };

        if !output.stdout.is_empty() || !output.stderr.is_empty() {
            tracing::debug!(
                %command,
                stdout = %output.stdout.trim_end(),
                stderr = %output.stderr.trim_end(),
                "git output"
            );
        }

        if status.success() {
            Ok(output)
        } else {
            let detail = if output.stderr.trim().is_empty() {
                output.stdout.trim().to_string()
            } else {
                output.stderr.trim().to_string()
            };
            Err(Error::CommandFailed {
                command,
                stderr: detail,
            })
        }
    }
}

type Reader = Option<thread::JoinHandle<std::io::Result<Vec<u8>>>>;

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Reader {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn join_reader(reader: Reader) -> Result<String> {
    let Some(handle) = reader else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| std::io::Error::other("output reader thread panicked"))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn wait_with_timeout(
    child: &mut Child,
    limit: Duration,
    command: &str,
) -> Result<std::process::ExitStatus> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            tracing::warn!(%command, secs = limit.as_secs(), "git timed out, killing");
            child.kill()?;
            child.wait()?;
            return Err(Error::Timeout {
                command: command.to_string(),
                secs: limit.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}
