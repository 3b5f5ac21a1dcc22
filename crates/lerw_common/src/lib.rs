//! Shared foundational types for the LERW result cache.
//!
//! This crate provides the simulation parameter set, the closed norm and mode
//! tags, the canonical numeric formatting rule used for cache keys and engine
//! arguments, and content hashing for artifact fingerprints.

#![warn(missing_docs)]

pub mod canonical;
pub mod hash;
pub mod params;

pub use canonical::{canonical_f64, canonical_int};
pub use hash::{ContentHash, InvalidContentHash};
pub use params::{Extent, Mode, Norm, ParameterError, ParameterSet};
