//! Managed external-process execution.
//!
//! Launches a bounded-lifetime external tool, drains its combined
//! stdout/stderr concurrently with waiting for it, enforces a wall-clock
//! timeout with forced termination, and translates the result into a typed
//! outcome. This is the only module that touches `std::process` for the
//! merge path; everything above it works with `Invocation`/`Outcome`.

use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default wall-clock timeout for an invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default grace period granted to the output reader after the process ends.
pub const DEFAULT_READER_GRACE: Duration = Duration::from_secs(1);

/// A single external-process invocation: program, arguments, environment
/// overrides, and timing limits. Immutable once built.
#[derive(Debug, Clone)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<String>,
    env: Vec<(String, String)>,
    timeout: Duration,
    reader_grace: Duration,
}

impl Invocation {
    /// Create an invocation for the given program with default limits.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            reader_grace: DEFAULT_READER_GRACE,
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an environment variable override. Overrides win over the
    /// inherited environment on key collision.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set the wall-clock timeout for the process.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the grace period granted to the output reader after the process
    /// has exited or been killed.
    pub fn reader_grace(mut self, grace: Duration) -> Self {
        self.reader_grace = grace;
        self
    }

    /// The program this invocation will launch.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Render the command for log and error messages.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().into_owned()];
        parts.extend(self.args.iter().cloned());
        shell_words::join(parts.iter().map(String::as_str))
    }
}

/// Result of a completed invocation.
#[derive(Debug)]
pub struct Outcome {
    /// Exit code of the process (present only if it exited normally).
    pub exit_code: Option<i32>,
    /// Combined stdout/stderr, one entry per line, in write order.
    pub output: Vec<String>,
    /// Whether the process was killed due to timeout.
    pub timed_out: bool,
    /// Wall-clock duration from spawn to exit.
    pub duration: Duration,
}

/// Failure modes of a single invocation.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The program could not be started at all.
    #[error("failed to launch '{program}': {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process exceeded its timeout and was killed.
    #[error("process exceeded {timeout:?} timeout (killed after {elapsed:?})")]
    Timeout {
        timeout: Duration,
        elapsed: Duration,
        /// Output captured before the kill.
        output: Vec<String>,
    },

    /// The process ran to completion but reported failure.
    #[error("process exited with code {code}")]
    NonZeroExit { code: i32, output: Vec<String> },

    /// The process was terminated by a signal and has no exit code.
    #[error("process was terminated by a signal")]
    Interrupted { output: Vec<String> },

    /// Setting up the combined output pipe failed.
    #[error("failed to set up output capture: {0}")]
    Pipe(#[source] io::Error),

    /// Polling the process status failed.
    #[error("failed to poll process status: {0}")]
    Wait(#[source] io::Error),
}

/// Run an invocation to completion, capturing combined output.
pub fn run(invocation: &Invocation) -> Result<Outcome, ExecutionError> {
    run_observed(invocation, |_| {})
}

/// Run an invocation, forwarding each captured line to `observer` as it
/// arrives. The observer runs on the drain thread.
pub fn run_observed<F>(invocation: &Invocation, observer: F) -> Result<Outcome, ExecutionError>
where
    F: Fn(&str) + Send + 'static,
{
    // One pipe, cloned for both child streams, so stderr interleaves into
    // stdout in write order and a single reader drains everything.
    let (pipe_reader, pipe_writer) = io::pipe().map_err(ExecutionError::Pipe)?;
    let writer_clone = pipe_writer.try_clone().map_err(ExecutionError::Pipe)?;

    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(pipe_writer)
        .stderr(writer_clone);

    for (key, value) in &invocation.env {
        command.env(key, value);
    }

    let started = Instant::now();
    let mut child = command.spawn().map_err(|e| ExecutionError::LaunchFailed {
        program: invocation.program.display().to_string(),
        source: e,
    })?;
    // The Command still holds the parent's copies of the pipe writer; until
    // they are dropped the reader never sees EOF.
    drop(command);

    // Drain the combined stream on a dedicated thread. The OS pipe buffer is
    // finite: a chatty process can fill it and deadlock the invocation if we
    // only read after waiting.
    let lines: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let drain = {
        let lines = Arc::clone(&lines);
        thread::spawn(move || {
            for line in BufReader::new(pipe_reader).lines() {
                let Ok(line) = line else { break };
                observer(&line);
                let mut acc = lines.lock().unwrap_or_else(|poison| poison.into_inner());
                acc.push(line);
            }
            let _ = done_tx.send(());
        })
    };

    let (exit_code, timed_out) = wait_with_timeout(&mut child, invocation.timeout)?;
    let duration = started.elapsed();

    // Give the drain thread a bounded window to flush buffered lines, then
    // abandon it. A leaked write handle in a grandchild process could keep
    // the pipe open indefinitely, so an unbounded join is not safe here.
    if done_rx.recv_timeout(invocation.reader_grace).is_ok() {
        let _ = drain.join();
    }

    let output = {
        let mut acc = lines.lock().unwrap_or_else(|poison| poison.into_inner());
        std::mem::take(&mut *acc)
    };

    if timed_out {
        return Err(ExecutionError::Timeout {
            timeout: invocation.timeout,
            elapsed: duration,
            output,
        });
    }

    match exit_code {
        Some(0) => Ok(Outcome {
            exit_code: Some(0),
            output,
            timed_out: false,
            duration,
        }),
        Some(code) => Err(ExecutionError::NonZeroExit { code, output }),
        None => Err(ExecutionError::Interrupted { output }),
    }
}

/// Wait for a child process with timeout.
///
/// Returns (exit_code, timed_out). On timeout the child is killed before
/// returning, so the total invocation cost stays bounded.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> Result<(Option<i32>, bool), ExecutionError> {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(50);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok((status.code(), false)),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    kill_process(child);
                    return Ok((None, true));
                }
                thread::sleep(poll_interval);
            }
            Err(e) => return Err(ExecutionError::Wait(e)),
        }
    }
}

/// Kill a child process and reap it. Safe to call on an already-exited child.
fn kill_process(child: &mut Child) {
    // On Unix this is SIGKILL; on Windows it is TerminateProcess.
    let _ = child.kill();
    let _ = child.wait();
}
