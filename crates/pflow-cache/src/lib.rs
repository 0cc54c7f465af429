//! pflow Cache
//!
//! The entity cache store behind the console's query modules. It associates
//! a [`QueryKey`] with the last successful fetch result, decides staleness
//! with a pure freshness function, keeps polled keys live while they have
//! subscribers, and lets mutations invalidate the keys they affect.
//!
//! The store is an explicit object with an injectable [`Clock`]; there is no
//! process-wide cache.

pub mod clock;
pub mod error;
pub mod freshness;
pub mod key;
pub mod mutation;
pub mod options;
pub mod state;
pub mod store;
pub mod subscription;

pub use clock::{Clock, TokioClock};
pub use error::{CacheError, CacheResult, FetchError};
pub use freshness::Staleness;
pub use key::{KeyToken, QueryKey};
pub use mutation::Mutation;
pub use options::{ConflictPolicy, QueryCacheConfig, QueryOptions};
pub use state::{QueryState, QueryStatus};
pub use store::QueryCache;
pub use subscription::Subscription;
