//! Invocation of the external simulation engine.
//!
//! Each mode has its own engine command. Parameters are passed as flags,
//! one per field, with values in canonical text form:
//!
//! | Flag                | Lengths mode      | Points mode       |
//! |---------------------|-------------------|-------------------|
//! | `--dimension`       | dimension         | dimension         |
//! | `--distance`        | target distance   | (not passed)      |
//! | `--number_of_walks` | trial count       | step count        |
//! | `--alpha`           | alpha             | alpha             |
//! | `--norm`            | `L1`/`L2`/`LINFTY`| `L1`/`L2`/`LINFTY`|
//! | `--output`          | target path       | target path       |
//! | `--seed`            | seed              | seed              |
//!
//! The engine must exit 0 and stay silent on both output streams. Any exit
//! code other than 0, and any output at all, is a failure.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use lerw_common::{canonical_f64, canonical_int, Extent, Mode, ParameterSet};

use crate::error::EngineError;
use crate::runner::{CommandRunner, CommandSpec, ProcessRunner};

const FLAG_DIMENSION: &str = "--dimension";
const FLAG_DISTANCE: &str = "--distance";
const FLAG_WALKS: &str = "--number_of_walks";
const FLAG_ALPHA: &str = "--alpha";
const FLAG_NORM: &str = "--norm";
/// Flag carrying the artifact target path.
pub const FLAG_OUTPUT: &str = "--output";
const FLAG_SEED: &str = "--seed";

/// An engine executable plus any arguments that precede the parameter flags,
/// such as a script path when `program` is an interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    /// Executable to launch.
    pub program: PathBuf,
    /// Arguments placed before the parameter flags.
    pub leading_args: Vec<OsString>,
}

impl EngineCommand {
    /// A command with no leading arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Appends leading arguments.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// The engine command for each mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSet {
    /// Engine producing length lists.
    pub lengths: EngineCommand,
    /// Engine producing a single walk's coordinates.
    pub points: EngineCommand,
}

impl EngineSet {
    /// The command that serves `mode`.
    pub fn for_mode(&self, mode: Mode) -> &EngineCommand {
        match mode {
            Mode::Lengths => &self.lengths,
            Mode::Points => &self.points,
        }
    }
}

/// Record of a successful invocation.
#[derive(Debug, Clone)]
pub struct EngineInvocation {
    /// The command that ran.
    pub command: CommandSpec,
    /// Wall-clock time the engine took.
    pub elapsed: Duration,
}

/// Runs the engine for a parameter set and enforces its success contract.
pub struct EngineInvoker<R = ProcessRunner> {
    engines: EngineSet,
    timeout: Option<Duration>,
    runner: R,
}

impl EngineInvoker<ProcessRunner> {
    /// An invoker that launches real processes.
    pub fn new(engines: EngineSet, timeout: Option<Duration>) -> Self {
        Self::with_runner(engines, timeout, ProcessRunner)
    }
}

impl<R: CommandRunner> EngineInvoker<R> {
    /// An invoker that runs commands through `runner`.
    pub fn with_runner(engines: EngineSet, timeout: Option<Duration>, runner: R) -> Self {
        Self {
            engines,
            timeout,
            runner,
        }
    }

    /// The configured engine commands.
    pub fn engines(&self) -> &EngineSet {
        &self.engines
    }

    /// The command runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Marshals the full command line for `params` writing to `target`.
    pub fn command_for(&self, params: &ParameterSet, target: &Path) -> CommandSpec {
        let engine = self.engines.for_mode(params.mode());
        let mut args = engine.leading_args.clone();
        let mut flag = |name: &str, value: String| {
            args.push(OsString::from(name));
            args.push(OsString::from(value));
        };

        flag(FLAG_DIMENSION, canonical_int(params.dimension()));
        match params.extent() {
            Extent::Distance(distance) => {
                flag(FLAG_DISTANCE, canonical_f64(distance));
                flag(FLAG_WALKS, canonical_int(params.trial_count()));
            }
            Extent::Steps(steps) => {
                flag(FLAG_WALKS, canonical_int(steps));
            }
        }
        flag(FLAG_ALPHA, canonical_f64(params.alpha()));
        flag(FLAG_NORM, params.norm().engine_name().to_string());
        args.push(OsString::from(FLAG_OUTPUT));
        args.push(target.as_os_str().to_owned());
        args.push(OsString::from(FLAG_SEED));
        args.push(OsString::from(canonical_int(params.seed())));

        CommandSpec {
            program: engine.program.clone(),
            args,
            timeout: self.timeout,
        }
    }

    /// Runs the engine for `params`, directing its artifact to `target`.
    ///
    /// Succeeds only if the engine exits 0 with empty stdout and stderr. The
    /// artifact at `target` is not inspected here.
    pub fn invoke(
        &self,
        params: &ParameterSet,
        target: &Path,
    ) -> Result<EngineInvocation, EngineError> {
        let command = self.command_for(params, target);
        let program = command.program.clone();
        tracing::info!(
            program = %program.display(),
            mode = %params.mode(),
            target = %target.display(),
            "invoking engine"
        );

        let start = Instant::now();
        let output = self.runner.run(&command).map_err(|err| {
            tracing::warn!(error = %err, "engine did not complete");
            err
        })?;
        let elapsed = start.elapsed();

        let silent = output.stdout.is_empty() && output.stderr.is_empty();
        if output.exit_code != Some(0) || !silent {
            let err = EngineError::Failed {
                program,
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
            };
            tracing::warn!(error = %err, "engine broke its success contract");
            return Err(err);
        }

        tracing::info!(
            program = %program.display(),
            elapsed_ms = elapsed.as_millis() as u64,
            "engine finished"
        );
        Ok(EngineInvocation { command, elapsed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CapturedOutput;
    use lerw_common::Norm;
    use std::cell::RefCell;

    /// Replays a canned outcome and records each command it was asked to run.
    struct ScriptedRunner {
        outcome: fn() -> Result<CapturedOutput, EngineError>,
        calls: RefCell<Vec<CommandSpec>>,
    }

    impl ScriptedRunner {
        fn new(outcome: fn() -> Result<CapturedOutput, EngineError>) -> Self {
            Self {
                outcome,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, spec: &CommandSpec) -> Result<CapturedOutput, EngineError> {
            self.calls.borrow_mut().push(spec.clone());
            (self.outcome)()
        }
    }

    fn engines() -> EngineSet {
        EngineSet {
            lengths: EngineCommand::new("bin/lerw"),
            points: EngineCommand::new("bin/lerw_points"),
        }
    }

    fn invoker(outcome: fn() -> Result<CapturedOutput, EngineError>) -> EngineInvoker<ScriptedRunner> {
        EngineInvoker::with_runner(engines(), None, ScriptedRunner::new(outcome))
    }

    fn silent_success() -> Result<CapturedOutput, EngineError> {
        Ok(CapturedOutput {
            exit_code: Some(0),
            ..Default::default()
        })
    }

    fn lossy(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn lengths_params() -> ParameterSet {
        ParameterSet::lengths(2, 5000.0, 10, 0.5, Norm::L2, 2).unwrap()
    }

    #[test]
    fn lengths_flag_mapping() {
        let inv = invoker(silent_success);
        let cmd = inv.command_for(&lengths_params(), Path::new("data/out.txt"));
        assert_eq!(cmd.program, PathBuf::from("bin/lerw"));
        assert_eq!(
            lossy(&cmd.args),
            vec![
                "--dimension",
                "2",
                "--distance",
                "5000",
                "--number_of_walks",
                "10",
                "--alpha",
                "0.5",
                "--norm",
                "L2",
                "--output",
                "data/out.txt",
                "--seed",
                "2",
            ]
        );
    }

    #[test]
    fn points_flag_mapping() {
        let inv = invoker(silent_success);
        let params = ParameterSet::points(2, 1000, 1.25, Norm::LInf, 9).unwrap();
        let cmd = inv.command_for(&params, Path::new("data/walk.txt"));
        assert_eq!(cmd.program, PathBuf::from("bin/lerw_points"));
        assert_eq!(
            lossy(&cmd.args),
            vec![
                "--dimension",
                "2",
                "--number_of_walks",
                "1000",
                "--alpha",
                "1.25",
                "--norm",
                "LINFTY",
                "--output",
                "data/walk.txt",
                "--seed",
                "9",
            ]
        );
        assert!(cmd.flag_value("--distance").is_none());
    }

    #[test]
    fn leading_args_come_first() {
        let engines = EngineSet {
            lengths: EngineCommand::new("sh").with_leading_args(["engine.sh"]),
            points: EngineCommand::new("bin/lerw_points"),
        };
        let inv = EngineInvoker::with_runner(
            engines,
            Some(Duration::from_secs(5)),
            ScriptedRunner::new(silent_success),
        );
        let cmd = inv.command_for(&lengths_params(), Path::new("out.txt"));
        assert_eq!(cmd.program, PathBuf::from("sh"));
        assert_eq!(lossy(&cmd.args[..3]), vec!["engine.sh", "--dimension", "2"]);
        assert_eq!(cmd.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn silent_zero_exit_succeeds() {
        let inv = invoker(silent_success);
        let ok = inv
            .invoke(&lengths_params(), Path::new("data/out.txt"))
            .unwrap();
        assert_eq!(ok.command.program, PathBuf::from("bin/lerw"));
        assert_eq!(inv.runner().calls.borrow().len(), 1);
    }

    #[test]
    fn zero_exit_with_stderr_fails() {
        let inv = invoker(|| {
            Ok(CapturedOutput {
                exit_code: Some(0),
                stdout: String::new(),
                stderr: "warning: slow convergence\n".to_string(),
            })
        });
        let err = inv
            .invoke(&lengths_params(), Path::new("data/out.txt"))
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(0));
        assert_eq!(err.stderr(), Some("warning: slow convergence\n"));
    }

    #[test]
    fn zero_exit_with_stdout_fails() {
        let inv = invoker(|| {
            Ok(CapturedOutput {
                exit_code: Some(0),
                stdout: "Allowed options:\n".to_string(),
                stderr: String::new(),
            })
        });
        let err = inv
            .invoke(&lengths_params(), Path::new("data/out.txt"))
            .unwrap_err();
        assert!(matches!(err, EngineError::Failed { .. }));
        assert_eq!(err.stdout(), Some("Allowed options:\n"));
    }

    #[test]
    fn nonzero_exit_fails_even_when_silent() {
        let inv = invoker(|| {
            Ok(CapturedOutput {
                exit_code: Some(1),
                ..Default::default()
            })
        });
        let err = inv
            .invoke(&lengths_params(), Path::new("data/out.txt"))
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(1));
    }

    #[test]
    fn signal_termination_fails() {
        let inv = invoker(|| Ok(CapturedOutput::default()));
        let err = inv
            .invoke(&lengths_params(), Path::new("data/out.txt"))
            .unwrap_err();
        assert!(matches!(err, EngineError::Failed { exit_code: None, .. }));
    }

    #[test]
    fn spawn_failure_propagates() {
        let inv = invoker(|| {
            Err(EngineError::Spawn {
                program: PathBuf::from("bin/lerw"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            })
        });
        let err = inv
            .invoke(&lengths_params(), Path::new("data/out.txt"))
            .unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }));
        assert_eq!(err.exit_code(), None);
    }
}
