//! Source Aggregator
//!
//! Rate-limited live match fetching over an ordered fallback chain
//! (provider, cache, persisted store), with a working cache and a periodic
//! fetch task feeding the update queue.

pub mod fetch;
pub mod rate_limit;
pub mod sources;

pub use fetch::Aggregator;
pub use rate_limit::RateLimiter;
pub use sources::{CacheSource, MatchCache, MatchSource, SourceKind, StoreSource};
