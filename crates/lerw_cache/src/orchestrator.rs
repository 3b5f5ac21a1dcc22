//! Get-or-compute over the store, the engine, and the parser.
//!
//! The orchestrator holds no state of its own between calls. Storage root and
//! engine commands are passed in at construction.

use std::path::PathBuf;
use std::time::Duration;

use lerw_common::{ContentHash, ParameterSet};
use serde::Serialize;

use crate::engine::{EngineInvoker, EngineSet};
use crate::error::CacheError;
use crate::key::{CacheKey, CacheKeyBuilder};
use crate::parser::{ArtifactShape, ParsedResult, ResultParser};
use crate::runner::{CommandRunner, ProcessRunner};
use crate::store::ResultStore;

/// Where a fetched result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// An artifact was already published for the key.
    Cached,
    /// The engine ran during this call.
    Computed,
}

/// A result together with its provenance.
#[derive(Debug, Clone, Serialize)]
pub struct Fetched {
    /// Cache key of the request.
    pub key: CacheKey,
    /// Published artifact path.
    pub path: PathBuf,
    /// Whether the engine ran.
    pub origin: Origin,
    /// XXH3-128 of the artifact bytes.
    pub checksum: ContentHash,
    /// The decoded artifact.
    pub result: ParsedResult,
}

/// File-backed memoization of the external engine.
///
/// Under sequential use, a call invokes the engine at most once and a cache
/// hit never invokes it. Concurrent processes may both compute the same key;
/// each publishes atomically, so readers see one complete artifact or none.
pub struct Orchestrator<R = ProcessRunner> {
    store: ResultStore,
    invoker: EngineInvoker<R>,
}

impl Orchestrator<ProcessRunner> {
    /// An orchestrator over `root` that launches real engine processes.
    pub fn new(root: impl Into<PathBuf>, engines: EngineSet, timeout: Option<Duration>) -> Self {
        Self::with_invoker(ResultStore::new(root), EngineInvoker::new(engines, timeout))
    }
}

impl<R: CommandRunner> Orchestrator<R> {
    /// An orchestrator from explicit parts.
    pub fn with_invoker(store: ResultStore, invoker: EngineInvoker<R>) -> Self {
        Self { store, invoker }
    }

    /// The artifact store.
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// The engine invoker.
    pub fn invoker(&self) -> &EngineInvoker<R> {
        &self.invoker
    }

    /// Returns the parsed result for `params`, running the engine only if no
    /// artifact is published or `force_recompute` is set.
    pub fn get_or_compute(
        &self,
        params: &ParameterSet,
        force_recompute: bool,
    ) -> Result<ParsedResult, CacheError> {
        self.fetch(params, force_recompute).map(|f| f.result)
    }

    /// Like [`get_or_compute`](Self::get_or_compute), with provenance.
    ///
    /// On a miss the engine writes into a staging file, which is parsed and
    /// only then published. A failed engine run or an unparseable artifact
    /// leaves nothing behind under the key.
    pub fn fetch(&self, params: &ParameterSet, force_recompute: bool) -> Result<Fetched, CacheError> {
        self.store.ensure_root()?;
        let key = CacheKeyBuilder::build(params);
        let path = self.store.path(&key);
        let shape = ArtifactShape::for_params(params);

        if force_recompute {
            self.store.invalidate(&key)?;
        }

        let (origin, result, checksum) = if self.store.exists(&key) {
            tracing::debug!(%key, "cache hit");
            let (result, checksum) = ResultParser::parse_with_checksum(&path, shape)?;
            (Origin::Cached, result, checksum)
        } else {
            tracing::debug!(%key, force_recompute, "cache miss");
            let staged = self.store.stage(&key)?;
            self.invoker.invoke(params, &staged)?;
            let (result, checksum) = ResultParser::parse_with_checksum(&staged, shape)?;
            self.store.commit(staged, &key)?;
            tracing::info!(%key, checksum = %checksum.short(), rows = result.len(), "published artifact");
            (Origin::Computed, result, checksum)
        };

        Ok(Fetched {
            key,
            path,
            origin,
            checksum,
            result,
        })
    }
}
