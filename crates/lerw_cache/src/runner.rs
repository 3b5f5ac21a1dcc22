//! Running a command and capturing its exit status and output streams.
//!
//! [`CommandRunner`] is the seam between the engine invocation contract and
//! the operating system: [`ProcessRunner`] launches real child processes,
//! while tests substitute a fake that records requests and writes fixtures.

use std::ffi::{OsStr, OsString};
use std::io::Read;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use crate::error::EngineError;

/// How often a child with a deadline is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long to wait for output after a timed-out child has been killed.
const READER_GRACE: Duration = Duration::from_secs(1);

/// A fully marshalled command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable to launch.
    pub program: PathBuf,
    /// Arguments, in order.
    pub args: Vec<OsString>,
    /// Kill the process if it runs longer than this.
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    /// Returns the value following `flag` in the argument list.
    pub fn flag_value(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(OsString::as_os_str)
    }
}

/// Everything observed from a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Full standard output.
    pub stdout: String,
    /// Full standard error.
    pub stderr: String,
}

/// Capability to run a command to completion and capture what it did.
///
/// Only the [`Spawn`](EngineError::Spawn), [`Wait`](EngineError::Wait), and
/// [`TimedOut`](EngineError::TimedOut) variants are produced here; judging a
/// completed run is left to the caller.
pub trait CommandRunner {
    /// Runs `spec`, blocking until the process exits or its timeout passes.
    fn run(&self, spec: &CommandSpec) -> Result<CapturedOutput, EngineError>;
}

/// Runs commands as real child processes.
///
/// On Unix the child leads its own process group, and a timeout kills the
/// whole group, so helpers started by a wrapper script die with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CapturedOutput, EngineError> {
        tracing::debug!(program = %spec.program.display(), args = ?spec.args, "spawning");

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| EngineError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        // Drain both pipes concurrently so a chatty child cannot block on a
        // full pipe while we wait for it.
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = match spec.timeout {
            None => child.wait(),
            Some(timeout) => match child.wait_timeout(timeout) {
                Ok(Some(status)) => Ok(status),
                Ok(None) => {
                    kill_tree(&mut child);
                    let _ = child.wait();
                    return Err(EngineError::TimedOut {
                        program: spec.program.clone(),
                        timeout,
                        stdout: collect(stdout, Some(READER_GRACE)),
                        stderr: collect(stderr, Some(READER_GRACE)),
                    });
                }
                Err(e) => {
                    kill_tree(&mut child);
                    let _ = child.wait();
                    Err(e)
                }
            },
        }
        .map_err(|source| EngineError::Wait {
            program: spec.program.clone(),
            source,
        })?;

        Ok(CapturedOutput {
            exit_code: status.code(),
            stdout: collect(stdout, None),
            stderr: collect(stderr, None),
        })
    }
}

/// Kills the child's process group, falling back to the child alone.
#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let group = Pid::from_raw(child.id() as i32);
    if killpg(group, Signal::SIGKILL).is_err() {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

fn spawn_reader<R>(pipe: Option<R>) -> Option<Receiver<String>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
        });
        rx
    })
}

/// Waits for a reader's text. With a deadline, a pipe still held open by a
/// process outside the killed group yields empty output instead of blocking.
fn collect(reader: Option<Receiver<String>>, deadline: Option<Duration>) -> String {
    let Some(rx) = reader else {
        return String::new();
    };
    match deadline {
        None => rx.recv().unwrap_or_default(),
        Some(limit) => rx.recv_timeout(limit).unwrap_or_default(),
    }
}

/// Extension trait to add `wait_timeout` to `Child`.
trait ChildExt {
    fn wait_timeout(&mut self, timeout: Duration) -> std::io::Result<Option<ExitStatus>>;
}

impl ChildExt for Child {
    fn wait_timeout(&mut self, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
        let start = Instant::now();
        loop {
            if let Some(status) = self.try_wait()? {
                return Ok(Some(status));
            }
            if start.elapsed() >= timeout {
                return Ok(None);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}
