//! Error types for cache operations.
//!
//! Nothing in this crate recovers from an error locally: storage, engine, and
//! parse failures all reach the caller of
//! [`Orchestrator::get_or_compute`](crate::Orchestrator::get_or_compute)
//! unchanged, wrapped in [`CacheError`].

use std::path::PathBuf;
use std::time::Duration;

/// Longest stream excerpt shown in an error message. The full text stays in
/// the error's fields.
const EXCERPT_LIMIT: usize = 512;

/// Any failure of a get-or-compute call.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The storage root or an artifact could not be accessed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The external engine could not be run or broke its success contract.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The artifact exists but does not have the expected shape.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Filesystem failures in the storage root.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The storage root directory could not be created.
    #[error("cannot create storage root {path}: {source}")]
    CreateRoot {
        /// The storage root.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An artifact could not be deleted during invalidation.
    #[error("cannot remove artifact {path}: {source}")]
    Remove {
        /// The artifact path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An artifact exists but could not be read.
    #[error("cannot read artifact {path}: {source}")]
    Read {
        /// The artifact path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A staging file for a new artifact could not be created.
    #[error("cannot create staging file in {path}: {source}")]
    Stage {
        /// The directory the staging file was to be created in.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A staged artifact could not be moved to its final location.
    #[error("cannot publish artifact {path}: {source}")]
    Commit {
        /// The final artifact path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The storage root could not be listed.
    #[error("cannot scan storage root {path}: {source}")]
    Scan {
        /// The storage root.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Failures of an external engine invocation.
///
/// The engine must exit with status 0 and write nothing to stdout or stderr.
/// Every other outcome lands here with whatever output was captured.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine process could not be started.
    #[error("failed to start engine `{}`: {source}", .program.display())]
    Spawn {
        /// The program that was launched.
        program: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Waiting on the running engine failed.
    #[error("failed waiting for engine `{}`: {source}", .program.display())]
    Wait {
        /// The program that was launched.
        program: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The engine did not finish in time and was killed.
    #[error("engine `{}` timed out after {timeout:?}", .program.display())]
    TimedOut {
        /// The program that was launched.
        program: PathBuf,
        /// The configured limit.
        timeout: Duration,
        /// Output captured before the kill.
        stdout: String,
        /// Error output captured before the kill.
        stderr: String,
    },

    /// The engine exited nonzero, was killed by a signal, or produced output.
    #[error(
        "engine `{}` failed with {}{}",
        .program.display(),
        describe_exit(.exit_code),
        describe_streams(.stdout, .stderr)
    )]
    Failed {
        /// The program that was launched.
        program: PathBuf,
        /// Exit code, or `None` if the process was terminated by a signal.
        exit_code: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
}

impl EngineError {
    /// The engine's exit code. `None` when the process could not be started,
    /// was killed, or could not be waited on.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            EngineError::Failed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// Captured standard output, if the engine ran at all.
    pub fn stdout(&self) -> Option<&str> {
        match self {
            EngineError::Failed { stdout, .. } | EngineError::TimedOut { stdout, .. } => {
                Some(stdout)
            }
            _ => None,
        }
    }

    /// Captured standard error, if the engine ran at all.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            EngineError::Failed { stderr, .. } | EngineError::TimedOut { stderr, .. } => {
                Some(stderr)
            }
            _ => None,
        }
    }
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".to_string(),
    }
}

fn describe_streams(stdout: &str, stderr: &str) -> String {
    let mut out = String::new();
    if !stderr.is_empty() {
        out.push_str("; stderr: ");
        out.push_str(&excerpt(stderr));
    }
    if !stdout.is_empty() {
        out.push_str("; stdout: ");
        out.push_str(&excerpt(stdout));
    }
    out
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(EXCERPT_LIMIT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Why a single artifact line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineFault {
    /// A token is not an integer.
    #[error("'{token}' is not an integer")]
    NotAnInteger {
        /// The offending token.
        token: String,
    },

    /// A coordinate row has the wrong number of columns.
    #[error("expected {expected} columns, found {found}")]
    ColumnCount {
        /// Columns required by the walk's dimension.
        expected: usize,
        /// Columns present on the line.
        found: usize,
    },

    /// The first coordinate row is not the origin.
    #[error("first row must be the origin")]
    NonZeroOrigin,
}

/// The artifact's content does not match its expected shape.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The artifact is not valid UTF-8.
    #[error("artifact {path} is not valid UTF-8")]
    Encoding {
        /// The artifact path.
        path: PathBuf,
    },

    /// Nothing but comments and blank lines.
    #[error("artifact {path} contains no data rows")]
    Empty {
        /// The artifact path.
        path: PathBuf,
    },

    /// A data line could not be decoded.
    #[error("{}:{line_number}: {fault}: `{line}`", .path.display())]
    InvalidLine {
        /// The artifact path.
        path: PathBuf,
        /// 1-based line number within the artifact.
        line_number: usize,
        /// The offending line, as written.
        line: String,
        /// What was wrong with it.
        fault: LineFault,
    },
}
