//! Construction surface for [`Cache`].

use std::sync::Arc;

use thiserror::Error;

use crate::cache::Cache;
use crate::entry::Payload;
use crate::shard::{CachePolicy, EvictFn};

/// Rejected configurations. Both are fatal misconfigurations: a cache with
/// zero shards cannot route and a zero-capacity shard cannot hold a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
	#[error("shard count must be at least 1")]
	ZeroShards,
	#[error("per-shard capacity must be at least 1")]
	ZeroCapacity,
}

/// Builder for configuring a [`Cache`].
///
/// # Example
///
/// ```
/// use expiring_cache::{CacheBuilder, CachePolicy};
///
/// let cache = CacheBuilder::new()
///     .policy(CachePolicy::Fifo)
///     .shards(32)
///     .shard_capacity(4096)
///     .on_evict(|key, _payload| println!("dropped {key}"))
///     .build()
///     .expect("valid configuration");
/// # drop(cache);
/// ```
pub struct CacheBuilder {
	policy: CachePolicy,
	shards: u32,
	shard_capacity: usize,
	on_evict: Option<Arc<EvictFn>>,
}

impl CacheBuilder {
	pub fn new() -> Self {
		Self {
			policy: CachePolicy::Lru,
			shards: 16,
			shard_capacity: 1024,
			on_evict: None,
		}
	}

	/// Eviction ordering for every shard. Default: LRU.
	pub fn policy(mut self, policy: CachePolicy) -> Self {
		self.policy = policy;
		self
	}

	/// Number of independent shards. Fixed for the cache's lifetime.
	/// More shards reduce lock contention. Default: 16.
	pub fn shards(mut self, count: u32) -> Self {
		self.shards = count;
		self
	}

	/// Maximum live entries per shard; total capacity is
	/// `shards * shard_capacity`. Default: 1024.
	pub fn shard_capacity(mut self, capacity: usize) -> Self {
		self.shard_capacity = capacity;
		self
	}

	/// Removal notification, invoked once per evicted entry while the
	/// owning shard's lock is held. Must not call back into the cache.
	pub fn on_evict(mut self, f: impl Fn(&str, Payload) + Send + Sync + 'static) -> Self {
		self.on_evict = Some(Arc::new(f));
		self
	}

	pub fn build(self) -> Result<Cache, ConfigError> {
		if self.shards == 0 {
			return Err(ConfigError::ZeroShards);
		}
		if self.shard_capacity == 0 {
			return Err(ConfigError::ZeroCapacity);
		}
		Ok(Cache::with_parts(
			self.policy,
			self.shards,
			self.shard_capacity,
			self.on_evict,
		))
	}
}

impl Default for CacheBuilder {
	fn default() -> Self {
		Self::new()
	}
}
