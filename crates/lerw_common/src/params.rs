//! Simulation parameter sets and their closed tag types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_f64, canonical_int};

/// Errors raised when a parameter set or one of its tags is invalid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    /// The lattice dimension must be at least 1.
    #[error("dimension must be positive")]
    InvalidDimension,

    /// The target distance must be finite and strictly positive.
    #[error("distance must be a finite positive number, got {0}")]
    InvalidDistance(f64),

    /// The step count of a single walk must be at least 1.
    #[error("step count must be positive")]
    InvalidSteps,

    /// At least one trial is required.
    #[error("trial count must be positive")]
    InvalidTrialCount,

    /// The scaling exponent must be finite and strictly positive.
    #[error("alpha must be a finite positive number, got {0}")]
    InvalidAlpha(f64),

    /// Text did not name a known norm.
    #[error("unknown norm '{0}' (expected L1, L2, or LINFTY)")]
    UnknownNorm(String),

    /// Text did not name a known mode.
    #[error("unknown mode '{0}' (expected lengths or points)")]
    UnknownMode(String),
}

/// Distance metric the engine uses to decide when a walk has reached its
/// target extent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Norm {
    /// Maximum norm.
    #[serde(rename = "LINFTY", alias = "LINF")]
    LInf,
    /// Taxicab norm.
    L1,
    /// Euclidean norm.
    L2,
}

impl Norm {
    /// The spelling the external engine accepts for `--norm`.
    pub fn engine_name(self) -> &'static str {
        match self {
            Norm::LInf => "LINFTY",
            Norm::L1 => "L1",
            Norm::L2 => "L2",
        }
    }
}

impl fmt::Display for Norm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.engine_name())
    }
}

impl FromStr for Norm {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L1" => Ok(Norm::L1),
            "L2" => Ok(Norm::L2),
            "LINF" | "LINFTY" => Ok(Norm::LInf),
            _ => Err(ParameterError::UnknownNorm(s.to_string())),
        }
    }
}

/// Which engine runs and which artifact shape it produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Many walks to a target distance; the artifact lists one length per walk.
    Lengths,
    /// One walk of a fixed step count; the artifact lists its coordinates.
    Points,
}

impl Mode {
    /// The tag used as the first component of a cache key.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Lengths => "lengths",
            Mode::Points => "points",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lengths" => Ok(Mode::Lengths),
            "points" => Ok(Mode::Points),
            _ => Err(ParameterError::UnknownMode(s.to_string())),
        }
    }
}

/// How far each walk runs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extent {
    /// Walks stop once they leave the ball of this radius (lengths mode).
    Distance(f64),
    /// The single walk takes exactly this many steps (points mode).
    Steps(u64),
}

impl Extent {
    /// The mode implied by this extent.
    pub fn mode(&self) -> Mode {
        match self {
            Extent::Distance(_) => Mode::Lengths,
            Extent::Steps(_) => Mode::Points,
        }
    }

    /// Key component prefix: `dist` or `steps`.
    pub fn key_tag(&self) -> &'static str {
        match self {
            Extent::Distance(_) => "dist",
            Extent::Steps(_) => "steps",
        }
    }

    /// The value in canonical text form.
    pub fn canonical(&self) -> String {
        match *self {
            Extent::Distance(d) => canonical_f64(d),
            Extent::Steps(n) => canonical_int(n),
        }
    }
}

/// An immutable, validated description of one simulation request.
///
/// Construct with [`ParameterSet::lengths`] or [`ParameterSet::points`]; the
/// mode is implied by the extent, so a mode that disagrees with its extent
/// cannot be represented.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParameterSet {
    dimension: u32,
    extent: Extent,
    trial_count: u64,
    alpha: f64,
    norm: Norm,
    seed: u64,
}

impl ParameterSet {
    /// A length-distribution request: `trial_count` walks, each stopped at
    /// `distance` from the origin.
    pub fn lengths(
        dimension: u32,
        distance: f64,
        trial_count: u64,
        alpha: f64,
        norm: Norm,
        seed: u64,
    ) -> Result<Self, ParameterError> {
        if !distance.is_finite() || distance <= 0.0 {
            return Err(ParameterError::InvalidDistance(distance));
        }
        if trial_count == 0 {
            return Err(ParameterError::InvalidTrialCount);
        }
        Self::validated(dimension, Extent::Distance(distance), trial_count, alpha, norm, seed)
    }

    /// A single-walk request of `steps` steps. The trial count is fixed at 1.
    pub fn points(
        dimension: u32,
        steps: u64,
        alpha: f64,
        norm: Norm,
        seed: u64,
    ) -> Result<Self, ParameterError> {
        if steps == 0 {
            return Err(ParameterError::InvalidSteps);
        }
        Self::validated(dimension, Extent::Steps(steps), 1, alpha, norm, seed)
    }

    fn validated(
        dimension: u32,
        extent: Extent,
        trial_count: u64,
        alpha: f64,
        norm: Norm,
        seed: u64,
    ) -> Result<Self, ParameterError> {
        if dimension == 0 {
            return Err(ParameterError::InvalidDimension);
        }
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(ParameterError::InvalidAlpha(alpha));
        }
        Ok(Self {
            dimension,
            extent,
            trial_count,
            alpha,
            norm,
            seed,
        })
    }

    /// Spatial dimensionality of the lattice.
    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    /// Target distance or step count.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Number of independent walks (always 1 in points mode).
    pub fn trial_count(&self) -> u64 {
        self.trial_count
    }

    /// Step-length scaling exponent.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Distance metric.
    pub fn norm(&self) -> Norm {
        self.norm
    }

    /// Engine random seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Mode implied by the extent.
    pub fn mode(&self) -> Mode {
        self.extent.mode()
    }
}
