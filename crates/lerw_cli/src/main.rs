//! `lerw-cache`: command-line access to the LERW result cache.
//!
//! `get` returns the engine output for a parameter set, computing it on a
//! miss. `key`, `path`, `invalidate`, `list`, and `sweep` inspect and
//! maintain the storage root.

#![warn(missing_docs)]

mod context;
mod get;
mod params;
mod store;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use crate::params::ParamArgs;

/// Memoized runs of the LERW simulation engine.
#[derive(Parser, Debug)]
#[command(name = "lerw-cache", version, about = "LERW result cache")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Path to a custom `lerw.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Return the result for a parameter set, running the engine on a miss.
    Get(GetArgs),
    /// Print the cache key for a parameter set.
    Key(ParamArgs),
    /// Print the artifact path for a parameter set and whether it exists.
    Path(ParamArgs),
    /// Delete the artifact for a parameter set.
    Invalidate(ParamArgs),
    /// List cached keys.
    List,
    /// Remove staging files left by interrupted runs.
    Sweep,
}

/// Arguments for the `get` subcommand.
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Simulation parameters.
    #[command(flatten)]
    pub params: ParamArgs,

    /// Discard any cached artifact and run the engine again.
    #[arg(long)]
    pub recompute: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Result output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One row per line.
    Text,
    /// The result with its provenance as JSON.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Get(ref args) => get::run(args, &global),
        Command::Key(ref args) => store::key(args, &global),
        Command::Path(ref args) => store::path(args, &global),
        Command::Invalidate(ref args) => store::invalidate(args, &global),
        Command::List => store::list(&global),
        Command::Sweep => store::sweep(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides the flag level.
fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(global)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn default_log_level(global: &GlobalArgs) -> &'static str {
    if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "info"
    }
}
