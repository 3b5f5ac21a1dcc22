//! Parameter flags shared by the per-key subcommands.
//!
//! Omitted flags fall back to the `[defaults]` section of `lerw.toml`. The
//! extent has no default: lengths mode needs `--distance`, points mode needs
//! `--steps`.

use clap::{Args, ValueEnum};
use lerw_common::{Mode, Norm, ParameterError, ParameterSet};
use lerw_config::DefaultParams;
use thiserror::Error;

/// Simulation parameter flags.
#[derive(Args, Debug)]
pub struct ParamArgs {
    /// Walk-length distribution or a single walk's coordinates.
    #[arg(long, value_enum, default_value_t = ModeArg::Lengths)]
    pub mode: ModeArg,

    /// Lattice dimension.
    #[arg(short, long)]
    pub dimension: Option<u32>,

    /// Target distance (lengths mode).
    #[arg(long, conflicts_with = "steps")]
    pub distance: Option<f64>,

    /// Step count (points mode).
    #[arg(long)]
    pub steps: Option<u64>,

    /// Number of walks (lengths mode).
    #[arg(short = 'n', long, conflicts_with = "steps")]
    pub walks: Option<u64>,

    /// Step-length scaling exponent.
    #[arg(short, long)]
    pub alpha: Option<f64>,

    /// Distance metric.
    #[arg(long, value_enum)]
    pub norm: Option<NormArg>,

    /// Engine random seed.
    #[arg(short, long)]
    pub seed: Option<u64>,
}

/// `--mode` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Distribution of loop-erased walk lengths.
    Lengths,
    /// Coordinates of one loop-erased walk.
    Points,
}

/// `--norm` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum NormArg {
    /// Taxicab distance.
    L1,
    /// Euclidean distance.
    L2,
    /// Maximum coordinate distance.
    #[value(alias = "linfty")]
    Linf,
}

impl From<NormArg> for Norm {
    fn from(arg: NormArg) -> Self {
        match arg {
            NormArg::L1 => Norm::L1,
            NormArg::L2 => Norm::L2,
            NormArg::Linf => Norm::LInf,
        }
    }
}

/// Flags that do not form a parameter set.
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// Lengths mode without `--distance`.
    #[error("lengths mode requires --distance")]
    MissingDistance,
    /// Points mode without `--steps`.
    #[error("points mode requires --steps")]
    MissingSteps,
    /// A flag that belongs to the other mode.
    #[error("--{flag} is not accepted in {mode} mode")]
    WrongMode {
        /// Offending flag name.
        flag: &'static str,
        /// Requested mode.
        mode: Mode,
    },
    /// Values rejected by parameter validation.
    #[error(transparent)]
    Invalid(#[from] ParameterError),
}

impl ParamArgs {
    /// Builds the parameter set, filling omitted flags from `defaults`.
    pub fn resolve(&self, defaults: &DefaultParams) -> Result<ParameterSet, ArgumentError> {
        let dimension = self.dimension.unwrap_or(defaults.dimension);
        let alpha = self.alpha.unwrap_or(defaults.alpha);
        let norm = self.norm.map(Norm::from).unwrap_or(defaults.norm);
        let seed = self.seed.unwrap_or(defaults.seed);

        let params = match self.mode {
            ModeArg::Lengths => {
                if self.steps.is_some() {
                    return Err(ArgumentError::WrongMode {
                        flag: "steps",
                        mode: Mode::Lengths,
                    });
                }
                let distance = self.distance.ok_or(ArgumentError::MissingDistance)?;
                let walks = self.walks.unwrap_or(defaults.walks);
                ParameterSet::lengths(dimension, distance, walks, alpha, norm, seed)?
            }
            ModeArg::Points => {
                for (flag, given) in [
                    ("distance", self.distance.is_some()),
                    ("walks", self.walks.is_some()),
                ] {
                    if given {
                        return Err(ArgumentError::WrongMode {
                            flag,
                            mode: Mode::Points,
                        });
                    }
                }
                let steps = self.steps.ok_or(ArgumentError::MissingSteps)?;
                ParameterSet::points(dimension, steps, alpha, norm, seed)?
            }
        };
        Ok(params)
    }
}
