//! Page retrieval with tiered bot-protection bypass.

pub mod identity;
pub mod orchestrator;
pub mod random;
pub mod response;
pub mod solver;
pub mod tier;

pub use identity::{merge_headers, referer_for, HeaderSet, IdentityPool};
pub use orchestrator::{
    AttemptRecord, FetchOptions, RetrievalOrchestrator, RetrievalOutcome, MAX_REDIRECTS,
};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use response::RawResponse;
pub use tier::{BypassTier, TierKind, TierRequest};
