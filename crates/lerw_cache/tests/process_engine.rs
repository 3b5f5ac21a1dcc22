//! End-to-end tests against real child processes.
//!
//! The fixture engine is a POSIX shell script run through `sh`, so no
//! executable bit or compiled binary is needed.

#![cfg(unix)]

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use lerw_cache::{
    CacheError, CommandRunner, CommandSpec, EngineCommand, EngineError, EngineSet, Orchestrator,
    Origin, ProcessRunner,
};
use lerw_common::{Norm, ParameterSet};

/// Logs each call to the counter file named by its first argument, then
/// writes a comment line, `51`, and `--number_of_walks - 1` further lengths.
const LENGTHS_ENGINE: &str = r##"
counter="$1"; shift
echo call >> "$counter"
out=""
n=0
while [ $# -gt 0 ]; do
  case "$1" in
    --output) out="$2"; shift 2 ;;
    --number_of_walks) n="$2"; shift 2 ;;
    *) shift ;;
  esac
done
echo "# fixture engine" > "$out"
echo 51 >> "$out"
i=1
while [ "$i" -lt "$n" ]; do
  echo $((40 + i)) >> "$out"
  i=$((i + 1))
done
"##;

/// Writes part of an artifact, then stalls in a forked `sleep`.
const STALLING_ENGINE: &str = r#"
shift
while [ $# -gt 0 ]; do
  case "$1" in
    --output) echo 51 > "$2"; shift 2 ;;
    *) shift ;;
  esac
done
sleep 30
true
"#;

/// Writes a valid artifact but also a diagnostic on stderr.
const CHATTY_ENGINE: &str = r#"
shift
while [ $# -gt 0 ]; do
  case "$1" in
    --output) echo 51 > "$2"; shift 2 ;;
    *) shift ;;
  esac
done
echo "warning: falling back to default stepper" >&2
"#;

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn root(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    fn counter(&self) -> PathBuf {
        self.dir.path().join("calls.log")
    }

    fn calls(&self) -> usize {
        std::fs::read_to_string(self.counter())
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    fn engine(&self, name: &str, script: &str) -> EngineCommand {
        let path = self.dir.path().join(name);
        std::fs::write(&path, script).unwrap();
        EngineCommand::new("sh").with_leading_args([path, self.counter()])
    }

    fn orchestrator(&self, script: &str) -> Orchestrator {
        self.orchestrator_with_timeout(script, Duration::from_secs(30))
    }

    fn orchestrator_with_timeout(&self, script: &str, timeout: Duration) -> Orchestrator {
        let engines = EngineSet {
            lengths: self.engine("lengths.sh", script),
            points: EngineCommand::new("/nonexistent/lerw_points"),
        };
        Orchestrator::new(self.root(), engines, Some(timeout))
    }

    fn root_entries(&self) -> Vec<String> {
        std::fs::read_dir(self.root())
            .map(|entries| {
                entries
                    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn sh(script: &str, timeout: Option<Duration>) -> CommandSpec {
    CommandSpec {
        program: PathBuf::from("sh"),
        args: vec![OsString::from("-c"), OsString::from(script)],
        timeout,
    }
}

fn scenario() -> ParameterSet {
    ParameterSet::lengths(2, 5000.0, 10, 0.5, Norm::L2, 2).unwrap()
}

#[test]
fn captures_streams_and_exit_code() {
    let out = ProcessRunner
        .run(&sh("echo out; echo err >&2; exit 3", None))
        .unwrap();
    assert_eq!(out.exit_code, Some(3));
    assert_eq!(out.stdout, "out\n");
    assert_eq!(out.stderr, "err\n");
}

#[test]
fn silent_process_has_empty_streams() {
    let out = ProcessRunner.run(&sh("true", None)).unwrap();
    assert_eq!(out.exit_code, Some(0));
    assert!(out.stdout.is_empty());
    assert!(out.stderr.is_empty());
}

#[test]
fn large_output_does_not_deadlock() {
    let out = ProcessRunner
        .run(&sh(
            "i=0; while [ $i -lt 20000 ]; do echo line-$i; i=$((i+1)); done",
            Some(Duration::from_secs(30)),
        ))
        .unwrap();
    assert_eq!(out.exit_code, Some(0));
    assert_eq!(out.stdout.lines().count(), 20000);
}

#[test]
fn timeout_kills_the_child() {
    let start = Instant::now();
    let err = ProcessRunner
        .run(&sh("exec sleep 10", Some(Duration::from_millis(200))))
        .unwrap_err();
    assert!(matches!(err, EngineError::TimedOut { .. }));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn timeout_kills_processes_started_by_the_child() {
    // Without `exec` the shell forks `sleep`, which inherits both pipes.
    let start = Instant::now();
    let err = ProcessRunner
        .run(&sh(
            "echo started; sleep 10; true",
            Some(Duration::from_millis(200)),
        ))
        .unwrap_err();
    assert!(start.elapsed() < Duration::from_secs(3), "{:?}", start.elapsed());
    match err {
        EngineError::TimedOut { stdout, .. } => assert_eq!(stdout, "started\n"),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[test]
fn concrete_scenario_computes_then_hits() {
    let fx = Fixture::new();
    let orch = fx.orchestrator(LENGTHS_ENGINE);

    let first = orch.fetch(&scenario(), false).unwrap();
    assert_eq!(first.origin, Origin::Computed);
    let lengths = first.result.as_lengths().unwrap();
    assert_eq!(lengths.len(), 10);
    assert_eq!(lengths[0], 51);
    assert_eq!(fx.calls(), 1);
    assert_eq!(
        first.path,
        fx.root().join("lengths_dim2_dist5000_n10_a0.5_L2_rng2.txt")
    );

    let second = orch.fetch(&scenario(), false).unwrap();
    assert_eq!(second.origin, Origin::Cached);
    assert_eq!(second.result, first.result);
    assert_eq!(fx.calls(), 1);
}

#[test]
fn forced_recompute_runs_engine_once_more() {
    let fx = Fixture::new();
    let orch = fx.orchestrator(LENGTHS_ENGINE);

    let first = orch.fetch(&scenario(), false).unwrap();
    let again = orch.fetch(&scenario(), true).unwrap();
    assert_eq!(again.origin, Origin::Computed);
    assert_eq!(fx.calls(), 2);
    assert_eq!(again.checksum, first.checksum);
}

#[test]
fn chatty_engine_is_rejected() {
    let fx = Fixture::new();
    let orch = fx.orchestrator(CHATTY_ENGINE);

    let err = orch.get_or_compute(&scenario(), false).unwrap_err();
    match err {
        CacheError::Engine(e) => {
            assert!(matches!(e, EngineError::Failed { .. }));
            assert_eq!(e.exit_code(), Some(0));
            assert!(e.stderr().unwrap().contains("falling back"));
        }
        other => panic!("expected engine failure, got {other:?}"),
    }
    assert!(orch.store().list().unwrap().is_empty());
}

#[test]
fn missing_engine_cannot_start() {
    let fx = Fixture::new();
    let orch = fx.orchestrator(LENGTHS_ENGINE);
    let params = ParameterSet::points(2, 100, 0.5, Norm::L2, 1).unwrap();

    let err = orch.get_or_compute(&params, false).unwrap_err();
    match err {
        CacheError::Engine(e) => {
            assert!(matches!(e, EngineError::Spawn { .. }));
            assert_eq!(e.exit_code(), None);
        }
        other => panic!("expected spawn failure, got {other:?}"),
    }
    assert!(orch.store().list().unwrap().is_empty());
    assert_eq!(orch.store().sweep_staging().unwrap(), 0);
}

#[test]
fn stalled_engine_times_out_without_leaving_files() {
    let fx = Fixture::new();
    let orch = fx.orchestrator_with_timeout(STALLING_ENGINE, Duration::from_millis(300));

    let start = Instant::now();
    let err = orch.fetch(&scenario(), false).unwrap_err();
    assert!(start.elapsed() < Duration::from_secs(5), "{:?}", start.elapsed());
    match err {
        CacheError::Engine(e) => {
            assert!(matches!(e, EngineError::TimedOut { .. }));
            assert_eq!(e.exit_code(), None);
        }
        other => panic!("expected timeout, got {other:?}"),
    }

    assert!(fx.root_entries().is_empty(), "{:?}", fx.root_entries());
    assert!(orch.store().list().unwrap().is_empty());
    assert_eq!(orch.store().sweep_staging().unwrap(), 0);
}
