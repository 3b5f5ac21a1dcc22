//! Parsing and validation of `lerw.toml` configuration files.
//!
//! The configuration names the storage root, the engine command for each
//! mode, an optional engine timeout, and default simulation parameters for
//! the command line.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{discover_config, load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
