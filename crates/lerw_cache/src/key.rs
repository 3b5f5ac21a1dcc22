//! Canonical cache keys derived from parameter sets.
//!
//! A key concatenates the mode tag and every field's canonical text in a
//! fixed order, separated by `_`:
//!
//! ```text
//! {mode}_dim{D}_{dist|steps}{extent}_n{N}_a{alpha}_{NORM}_rng{seed}
//! ```
//!
//! No canonical value can contain `_` (digits, `.` and the norm's uppercase
//! letters only), so the components can never run into each other.
//!
//! Plain decimal text for values like `1e300` runs to hundreds of digits. A
//! key longer than [`MAX_KEY_LEN`] keeps its first 160 bytes
//! and ends in `_h` plus the XXH3-128 of the full text, which keeps artifact
//! and staging file names within common filesystem limits.

use std::fmt;

use lerw_common::{canonical_f64, canonical_int, ContentHash, ParameterSet};
use serde::Serialize;

/// Separator between key components.
const DELIMITER: char = '_';

/// Longest key used verbatim.
pub const MAX_KEY_LEN: usize = 200;

/// Bytes of the full key kept ahead of the hash suffix in a shortened key.
const KEPT_PREFIX_LEN: usize = 160;

/// Human-legible storage identity of a [`ParameterSet`].
///
/// Used only to address artifacts; two parameter sets are cache-equivalent
/// exactly when their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// The key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reconstructs a key from an artifact file stem found in the storage
    /// root. Returns `None` for names this builder could not have produced.
    pub fn from_stem(stem: &str) -> Option<Self> {
        let well_formed = (stem.starts_with("lengths_") || stem.starts_with("points_"))
            && stem
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == DELIMITER);
        well_formed.then(|| Self(stem.to_string()))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives [`CacheKey`]s. Pure and deterministic across runs and processes.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Builds the key for `params`.
    pub fn build(params: &ParameterSet) -> CacheKey {
        let extent = params.extent();
        let components = [
            params.mode().as_str().to_string(),
            format!("dim{}", canonical_int(params.dimension())),
            format!("{}{}", extent.key_tag(), extent.canonical()),
            format!("n{}", canonical_int(params.trial_count())),
            format!("a{}", canonical_f64(params.alpha())),
            params.norm().engine_name().to_string(),
            format!("rng{}", canonical_int(params.seed())),
        ];
        let full = components.join(&DELIMITER.to_string());
        let key = if full.len() > MAX_KEY_LEN {
            let digest = ContentHash::from_bytes(full.as_bytes());
            // Canonical text is ASCII, so any byte offset is a char boundary.
            format!("{}{DELIMITER}h{digest}", &full[..KEPT_PREFIX_LEN])
        } else {
            full
        };
        tracing::debug!(%key, "derived cache key");
        CacheKey(key)
    }
}
