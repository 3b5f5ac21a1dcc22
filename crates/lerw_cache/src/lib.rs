//! File-backed result cache over the external LERW simulation engine.
//!
//! A [`ParameterSet`](lerw_common::ParameterSet) is turned into a canonical
//! [`CacheKey`], which addresses one artifact file in a flat storage root. On a
//! miss the [`EngineInvoker`] runs the engine into a staging file under a strict
//! silent-on-success contract, the staged file is published atomically, and the
//! [`ResultParser`] decodes it. The [`Orchestrator`] composes these steps.

#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod key;
pub mod orchestrator;
pub mod parser;
pub mod runner;
pub mod store;

pub use engine::{EngineCommand, EngineInvocation, EngineInvoker, EngineSet};
pub use error::{CacheError, EngineError, LineFault, ParseError, StorageError};
pub use key::{CacheKey, CacheKeyBuilder, MAX_KEY_LEN};
pub use orchestrator::{Fetched, Orchestrator, Origin};
pub use parser::{ArtifactShape, ParsedResult, ResultParser, COMMENT_MARKER};
pub use runner::{CapturedOutput, CommandRunner, CommandSpec, ProcessRunner};
pub use store::{ResultStore, ARTIFACT_EXT};
