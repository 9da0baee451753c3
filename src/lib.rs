//! # Expiring Cache
//!
//! A sharded, in-process key/value store for multi-threaded applications
//! that want a small slice of data-server semantics without leaving the
//! process:
//!
//! - **Scalar entries** with TTL and atomic increment
//! - **Hash entries** with per-field update, delete and increment
//! - **LRU or FIFO eviction** under a per-shard capacity bound
//! - **Lazy expiry**: every read and write checks the deadline of the
//!   entry it touches and evicts stale entries on the spot
//! - **Eviction callback** invoked exactly once per removed entry
//! - **Ordered sets** via a rank-aware skip list ([`SkipList`] / [`ZSet`])
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use expiring_cache::{Cache, DataType, Value};
//!
//! let cache = Cache::new(16, 1024).expect("valid configuration");
//!
//! // Scalars with a TTL.
//! cache.set("greeting", "hello", Duration::from_secs(30));
//! assert_eq!(cache.get("greeting"), Some(Value::from("hello")));
//!
//! // Integer scalars support atomic increments.
//! cache.set("visits", 10i64, Duration::from_secs(30));
//! assert_eq!(cache.incr_by("visits", 5), 15);
//!
//! // Hash entries hold field maps under a single key.
//! cache.h_set("user:7", "name", "alice", Duration::from_secs(30));
//! cache.h_set("user:7", "logins", 1i64, Duration::ZERO);
//! assert_eq!(cache.data_type("user:7"), Some(DataType::Hash));
//! assert_eq!(cache.h_incr_by("user:7", "logins", 1, Duration::ZERO), 2);
//! ```
//!
//! ## Concurrency
//!
//! The cache is `Send + Sync`; share it with `Arc<Cache>`. Keys are routed
//! to one of N shards by a seeded hash, and each shard is guarded by its
//! own mutex held for the duration of one operation. Operations on the
//! same shard are linearizable; aggregate operations (`len`, `keys`) walk
//! the shards one at a time and do not see a consistent cross-shard
//! snapshot.
//!
//! The eviction callback runs while the owning shard is locked. It must
//! not call back into the cache — re-entering the same shard deadlocks —
//! and should not block.
//!
//! ## Ordered sets
//!
//! ```rust
//! use expiring_cache::ZSet;
//!
//! let mut board = ZSet::new();
//! board.insert("carol", 310);
//! board.insert("alice", 120);
//! board.insert("bob", 250);
//!
//! assert_eq!(board.rank("alice"), Some(1));
//! assert_eq!(board.member_by_rank(3), Some(("carol", 310)));
//! ```
//!
//! [`SkipList`] is the underlying index: single-threaded, ordered by
//! `(score, member)`, with O(log n) expected insert, delete, rank and
//! select-by-rank. [`ZSet`] adds the member→score dictionary that makes
//! members unique.

mod builder;
mod cache;
mod clock;
mod entry;
mod hash;
mod list;
mod shard;
mod skiplist;
mod zset;

pub use builder::{CacheBuilder, ConfigError};
pub use cache::Cache;
pub use clock::DEFAULT_TTL;
pub use entry::{DataType, Payload, Value};
pub use shard::{CachePolicy, EvictFn};
pub use skiplist::SkipList;
pub use zset::ZSet;
