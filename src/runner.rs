// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External process execution.
//!
//! Every external tool is reached through the [`ProcessRunner`] capability.
//! Profile logic only ever sees an [`Invocation`] going in and a
//! [`ProcessOutput`] coming out, so it can be exercised without launching the
//! real server binary.

use std::{
    ffi::{OsStr, OsString},
    fmt::{Display, Formatter, Result as FmtResult},
    future::Future,
    process::Stdio,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
    task::JoinHandle,
    time::timeout,
};
use tracing::{debug, instrument, warn};

/// Program invocation handed to a [`ProcessRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,

    /// Wall-clock bound, `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Invocation {
    /// Construct new invocation without a time bound.
    pub fn new(
        program: impl Into<OsString>,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: None,
        }
    }

    /// Bound invocation by wall-clock time.
    pub fn with_timeout(mut self, bound: Duration) -> Self {
        self.timeout = Some(bound);
        self
    }
}

impl Display for Invocation {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.program.to_string_lossy().as_ref())?;
        for arg in &self.args {
            write!(fmt, " {}", arg.to_string_lossy())?;
        }

        Ok(())
    }
}

/// Captured result of a finished or killed process.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if process was killed or terminated by signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,

    /// Lines of stdout and stderr in arrival order, i.e., what `2>&1` gives.
    pub combined: String,

    /// Process exceeded its wall-clock bound and was killed.
    pub timed_out: bool,
}

impl ProcessOutput {
    /// Check if process ran to completion with exit code zero.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Capability to run external programs.
pub trait ProcessRunner {
    /// Run program to completion or until its time bound expires.
    ///
    /// A nonzero exit code or an expired bound is reported through
    /// [`ProcessOutput`], not as an error. Output printed before an expired
    /// bound is kept.
    ///
    /// # Errors
    ///
    /// - Return [`RunnerError::Spawn`] if program cannot be started.
    /// - Return [`RunnerError::Wait`] if program output cannot be collected.
    fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<ProcessOutput>> + Send;
}

/// How long output pipes are drained after a timed out process was killed.
///
/// Grandchildren may hold the pipes open long after the killed process is
/// gone.
pub const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Runner launching real processes through tokio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    #[instrument(skip(self), level = "debug")]
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        debug!("run {invocation}");
        let wait_error = |err: std::io::Error| RunnerError::Wait {
            source: err,
            program: invocation.program.clone(),
        };

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| RunnerError::Spawn {
                source: err,
                program: invocation.program.clone(),
            })?;

        // INVARIANT: Pipes are drained while waiting.
        //   - A chatty child never blocks on a full pipe.
        //   - Output printed before a timeout survives the kill.
        let capture = Arc::new(Mutex::new(Capture::default()));
        let mut readers = Vec::with_capacity(2);
        if let Some(pipe) = child.stdout.take() {
            readers.push(spawn_reader(pipe, Stream::Stdout, Arc::clone(&capture)));
        }
        if let Some(pipe) = child.stderr.take() {
            readers.push(spawn_reader(pipe, Stream::Stderr, Arc::clone(&capture)));
        }

        let status = match invocation.timeout {
            Some(bound) => match timeout(bound, child.wait()).await {
                Ok(status) => Some(status.map_err(wait_error)?),
                Err(_) => {
                    warn!("{:?} exceeded {bound:?}, killed", invocation.program);
                    child.kill().await.map_err(wait_error)?;
                    None
                }
            },
            None => Some(child.wait().await.map_err(wait_error)?),
        };

        match status {
            Some(_) => join_readers(&mut readers).await.map_err(wait_error)?,
            None => match timeout(DRAIN_GRACE, join_readers(&mut readers)).await {
                Ok(result) => result.map_err(wait_error)?,
                Err(_) => {
                    debug!("output pipes of {:?} still open, keep partial output", invocation.program);
                    for reader in &readers {
                        reader.abort();
                    }
                }
            },
        }

        let capture = std::mem::take(&mut *lock(&capture));
        Ok(ProcessOutput {
            exit_code: status.and_then(|status| status.code()),
            stdout: capture.stdout.join("\n"),
            stderr: capture.stderr.join("\n"),
            combined: capture.combined.join("\n"),
            timed_out: status.is_none(),
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Lines read so far from both pipes.
#[derive(Debug, Default)]
struct Capture {
    stdout: Vec<String>,
    stderr: Vec<String>,
    combined: Vec<String>,
}

impl Capture {
    fn push(&mut self, stream: Stream, line: String) {
        match stream {
            Stream::Stdout => self.stdout.push(line.clone()),
            Stream::Stderr => self.stderr.push(line.clone()),
        }
        self.combined.push(line);
    }
}

fn lock(capture: &Mutex<Capture>) -> MutexGuard<'_, Capture> {
    capture.lock().unwrap_or_else(PoisonError::into_inner)
}

fn spawn_reader(
    pipe: impl AsyncRead + Unpin + Send + 'static,
    stream: Stream,
    capture: Arc<Mutex<Capture>>,
) -> JoinHandle<std::io::Result<()>> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer).await? == 0 {
                return Ok(());
            }

            let line = String::from_utf8_lossy(&buffer);
            lock(&capture).push(stream, line.trim_end_matches(['\n', '\r']).to_string());
        }
    })
}

async fn join_readers(readers: &mut [JoinHandle<std::io::Result<()>>]) -> std::io::Result<()> {
    for reader in readers.iter_mut() {
        reader.await.map_err(std::io::Error::other)??;
    }

    Ok(())
}

/// Locate program on `PATH`.
pub fn which(program: impl AsRef<OsStr>) -> Option<std::path::PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program.as_ref()))
        .find(|candidate| candidate.is_file())
}

/// Process execution error types.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Program cannot be started.
    #[error("failed to start {:?}", program)]
    Spawn {
        #[source]
        source: std::io::Error,
        program: OsString,
    },

    /// Program output cannot be collected.
    #[error("failed to wait on {:?}", program)]
    Wait {
        #[source]
        source: std::io::Error,
        program: OsString,
    },
}

/// Friendly result alias :3
pub type Result<T, E = RunnerError> = std::result::Result<T, E>;
