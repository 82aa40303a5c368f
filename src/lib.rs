//! Web2Video - find the videos behind bot-protected web pages.
//!
//! Pages are retrieved through escalating bypass tiers (direct request,
//! challenge-solver proxy, identity rotation) and then scanned for video
//! references with several independent heuristics.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod probe;
pub mod retrieval;
pub mod server;

pub use config::{Config, ConfigHandle, RetrievalConfig};
pub use error::{ConfigError, RetrievalError, TierError};
pub use extract::{extract, ExtractOptions, VideoKind, VideoReference};
pub use probe::{MetadataProbe, VideoMetadata};
pub use retrieval::{
    AttemptRecord, BypassTier, FetchOptions, RetrievalOrchestrator, RetrievalOutcome, TierKind,
};
