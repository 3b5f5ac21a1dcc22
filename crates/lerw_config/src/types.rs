//! Configuration types deserialized from `lerw.toml`.

use std::path::PathBuf;
use std::time::Duration;

use lerw_common::Norm;
use serde::Deserialize;

/// The top-level configuration parsed from `lerw.toml`.
///
/// Every section is optional; an empty file yields the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LerwConfig {
    /// Storage settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Engine commands and timeout.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Parameter defaults for the command line.
    #[serde(default)]
    pub defaults: DefaultParams,
}

/// Where artifacts are stored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CacheConfig {
    /// Storage root directory, relative to the working directory unless
    /// absolute.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

/// External engine settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Kill an engine that runs longer than this many seconds. Absent means
    /// wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Engine for lengths mode.
    #[serde(default = "default_lengths_engine")]
    pub lengths: EngineEntry,
    /// Engine for points mode.
    #[serde(default = "default_points_engine")]
    pub points: EngineEntry,
}

impl EngineConfig {
    /// The timeout as a [`Duration`].
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            lengths: default_lengths_engine(),
            points: default_points_engine(),
        }
    }
}

/// One engine command line prefix.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineEntry {
    /// Executable path.
    pub program: PathBuf,
    /// Arguments placed before the parameter flags.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Parameter values used when the command line omits them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DefaultParams {
    /// Lattice dimension.
    pub dimension: u32,
    /// Step-length scaling exponent.
    pub alpha: f64,
    /// Distance metric.
    pub norm: Norm,
    /// Engine random seed.
    pub seed: u64,
    /// Number of walks in lengths mode.
    pub walks: u64,
}

impl Default for DefaultParams {
    fn default() -> Self {
        Self {
            dimension: 2,
            alpha: 0.5,
            norm: Norm::L2,
            seed: 3,
            walks: 1000,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_lengths_engine() -> EngineEntry {
    EngineEntry {
        program: PathBuf::from("bin/lerw"),
        args: Vec::new(),
    }
}

fn default_points_engine() -> EngineEntry {
    EngineEntry {
        program: PathBuf::from("bin/lerw_points"),
        args: Vec::new(),
    }
}
