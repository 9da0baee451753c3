//! The sharded facade: key routing and per-shard locking.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::builder::{CacheBuilder, ConfigError};
use crate::entry::{DataType, Value};
use crate::hash;
use crate::shard::{CachePolicy, EvictFn, Shard};

/// Thread-safe, sharded, expiring key/value store. Share it across threads
/// via `Arc<Cache>`.
///
/// Every single-key operation hashes the key, locks the owning shard for
/// the duration of the call, and forwards to it. Operations on different
/// shards never contend; operations on the same shard are linearizable in
/// lock-grant order.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use expiring_cache::{Cache, Value};
///
/// let cache = Cache::new(4, 1024).expect("valid configuration");
///
/// cache.set("user:42", "alice", Duration::from_secs(60));
/// assert_eq!(cache.get("user:42"), Some(Value::from("alice")));
///
/// cache.h_set("session:42", "hits", 1i64, Duration::from_secs(60));
/// assert_eq!(cache.h_incr_by("session:42", "hits", 2, Duration::ZERO), 3);
/// ```
pub struct Cache {
	seed: u32,
	shards: Vec<Mutex<Shard>>,
}

impl Cache {
	/// LRU cache with `shard_count` shards of `shard_capacity` entries each
	/// and no eviction callback. Total capacity is the product of the two.
	pub fn new(shard_count: u32, shard_capacity: usize) -> Result<Self, ConfigError> {
		Self::builder()
			.shards(shard_count)
			.shard_capacity(shard_capacity)
			.build()
	}

	/// Full construction surface.
	pub fn builder() -> CacheBuilder {
		CacheBuilder::new()
	}

	pub(crate) fn with_parts(
		policy: CachePolicy,
		shard_count: u32,
		shard_capacity: usize,
		on_evict: Option<Arc<EvictFn>>,
	) -> Self {
		let shards = (0..shard_count)
			.map(|_| Mutex::new(Shard::new(policy, shard_capacity, on_evict.clone())))
			.collect();
		Self {
			seed: hash::routing_seed(),
			shards,
		}
	}

	/// Write a scalar value. See the shard contract: a live scalar is
	/// overwritten in place, a hash under the same key is evicted first,
	/// and `Duration::ZERO` selects the default three-hour TTL.
	pub fn set(&self, key: &str, value: impl Into<Value>, ttl: Duration) {
		self.shard_for(key).lock().set(key, value.into(), ttl)
	}

	/// Scalar read; `None` for absent, expired or hash-shaped keys.
	pub fn get(&self, key: &str) -> Option<Value> {
		self.shard_for(key).lock().get(key)
	}

	/// Liveness check regardless of shape.
	pub fn exist(&self, key: &str) -> bool {
		self.shard_for(key).lock().exist(key)
	}

	/// Shape tag without an expiry check or recency update.
	pub fn data_type(&self, key: &str) -> Option<DataType> {
		self.shard_for(key).lock().data_type(key)
	}

	/// Remove the key, notifying the eviction callback if it was present.
	pub fn del(&self, key: &str) {
		self.shard_for(key).lock().del(key)
	}

	/// Total live entries. Walks the shards one lock at a time, so the sum
	/// is not a consistent snapshot under concurrent writers.
	pub fn len(&self) -> usize {
		self.shards.iter().map(|s| s.lock().len()).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// All live keys, shard by shard. Same consistency caveat as [`len`].
	///
	/// [`len`]: Cache::len
	pub fn keys(&self) -> Vec<String> {
		let mut keys = Vec::new();
		for shard in &self.shards {
			keys.extend(shard.lock().keys());
		}
		keys
	}

	/// Add `delta` to a live scalar integer; 0 without mutation otherwise.
	pub fn incr_by(&self, key: &str, delta: i64) -> i64 {
		self.shard_for(key).lock().incr_by(key, delta)
	}

	/// Remaining lifetime; `Duration::ZERO` when absent or expired.
	pub fn ttl(&self, key: &str) -> Duration {
		self.shard_for(key).lock().ttl(key)
	}

	/// Reset a live entry's deadline to `now + ttl`.
	pub fn expire(&self, key: &str, ttl: Duration) {
		self.shard_for(key).lock().expire(key, ttl)
	}

	/// Write one hash field, creating or displacing as needed.
	pub fn h_set(&self, key: &str, field: &str, value: impl Into<Value>, ttl: Duration) {
		self.shard_for(key).lock().h_set(key, field, value.into(), ttl)
	}

	/// Read one field of a live hash.
	pub fn h_get(&self, key: &str, field: &str) -> Option<Value> {
		self.shard_for(key).lock().h_get(key, field)
	}

	pub fn h_exist(&self, key: &str, field: &str) -> bool {
		self.shard_for(key).lock().h_exist(key, field)
	}

	/// Delete one field; deleting the last field removes the entry.
	pub fn h_del(&self, key: &str, field: &str) {
		self.shard_for(key).lock().h_del(key, field)
	}

	/// Snapshot of a live hash's field map.
	pub fn h_get_all(&self, key: &str) -> Option<IndexMap<String, Value>> {
		self.shard_for(key).lock().h_get_all(key)
	}

	pub fn h_len(&self, key: &str) -> usize {
		self.shard_for(key).lock().h_len(key)
	}

	/// Field names in insertion order.
	pub fn h_keys(&self, key: &str) -> Vec<String> {
		self.shard_for(key).lock().h_keys(key)
	}

	/// Add `delta` to an integer field, creating the hash or the field when
	/// missing. `ttl` only applies when a fresh entry is created.
	pub fn h_incr_by(&self, key: &str, field: &str, delta: i64, ttl: Duration) -> i64 {
		self.shard_for(key).lock().h_incr_by(key, field, delta, ttl)
	}

	/// Drop every entry in every shard, notifying the callback per entry.
	pub fn clear(&self) {
		for shard in &self.shards {
			shard.lock().clear();
		}
	}

	pub fn shard_count(&self) -> usize {
		self.shards.len()
	}

	/// Routing is pure: `djb33(seed, key) mod shard_count`.
	fn shard_for(&self, key: &str) -> &Mutex<Shard> {
		let idx = hash::djb33(self.seed, key) % self.shards.len() as u32;
		&self.shards[idx as usize]
	}
}
