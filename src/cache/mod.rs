//! Read-through cache of team member sets.
//!
//! The cache maps a team to the set of its member ids with a sliding TTL
//! (24 hours by default). Reads that miss, time out, or hit a broken backend
//! all report [`CacheLookup::Miss`]; callers then consult the authoritative
//! roster and call [`TeamMembershipCache::store`].
//!
//! The cache is not invalidated when the roster changes. Readers may observe
//! membership up to one TTL stale, or until the next repopulation after a
//! miss.
//!
//! # Example
//!
//! ```rust,ignore
//! use folio::cache::{CacheLookup, InMemoryCacheBackend, TeamMembershipCache};
//! use folio::config::CacheConfig;
//!
//! let cache = TeamMembershipCache::new(InMemoryCacheBackend::new(), CacheConfig::default());
//!
//! cache.store(team_id, &[alice, bob]).await;
//! match cache.get(team_id).await {
//!     CacheLookup::Hit(members) => assert!(members.contains(&alice)),
//!     CacheLookup::Miss => unreachable!(),
//! }
//! ```

mod backend;
mod clock;
mod team_cache;

pub use backend::{CacheBackend, InMemoryCacheBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use team_cache::{CacheLookup, TeamMembershipCache};
