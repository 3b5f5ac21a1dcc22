//! Turns the loaded configuration into an orchestrator.

use lerw_cache::{EngineCommand, EngineSet, Orchestrator};
use lerw_config::{EngineEntry, LerwConfig};

use crate::GlobalArgs;

/// Loads `--config`, else `./lerw.toml`, else the built-in defaults.
pub fn load_config(global: &GlobalArgs) -> Result<LerwConfig, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let config = lerw_config::discover_config(global.config.as_deref(), &cwd)?;
    tracing::debug!(
        root = %config.cache.root.display(),
        lengths = %config.engine.lengths.program.display(),
        points = %config.engine.points.program.display(),
        timeout_secs = ?config.engine.timeout_secs,
        "configuration loaded"
    );
    Ok(config)
}

/// An orchestrator over the configured storage root and engines.
pub fn orchestrator(config: &LerwConfig) -> Orchestrator {
    let engines = EngineSet {
        lengths: engine_command(&config.engine.lengths),
        points: engine_command(&config.engine.points),
    };
    Orchestrator::new(config.cache.root.clone(), engines, config.engine.timeout())
}

fn engine_command(entry: &EngineEntry) -> EngineCommand {
    EngineCommand::new(entry.program.clone()).with_leading_args(&entry.args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn orchestrator_uses_configured_root_and_engines() {
        let config = lerw_config::load_config_from_str(
            r#"
[cache]
root = "/tmp/lerw-store"

[engine]
timeout_secs = 5

[engine.lengths]
program = "nice"
args = ["-n", "10", "bin/lerw"]
"#,
        )
        .unwrap();
        let orch = orchestrator(&config);
        assert_eq!(orch.store().root(), Path::new("/tmp/lerw-store"));

        let engines = orch.invoker().engines();
        assert_eq!(engines.lengths.program, PathBuf::from("nice"));
        assert_eq!(engines.lengths.leading_args.len(), 3);
        assert_eq!(engines.points.program, PathBuf::from("bin/lerw_points"));
        assert!(engines.points.leading_args.is_empty());
    }

    #[test]
    fn explicit_config_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alt.toml");
        std::fs::write(&path, "[defaults]\nseed = 99\n").unwrap();
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            config: Some(path),
        };
        let config = load_config(&global).unwrap();
        assert_eq!(config.defaults.seed, 99);
    }

    #[test]
    fn missing_explicit_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            config: Some(dir.path().join("absent.toml")),
        };
        assert!(load_config(&global).is_err());
    }
}
