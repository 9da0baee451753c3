//! A single bounded sub-cache: ordered entry list, key dictionary, lazy
//! TTL eviction and the eviction callback.
//!
//! The shard is not thread-safe on its own; [`Cache`](crate::cache::Cache)
//! wraps each shard in a `parking_lot::Mutex` and holds the lock for the
//! whole operation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use tracing::trace;

use crate::clock;
use crate::entry::{DataType, Entry, Payload, Value};
use crate::list::{EntryList, Slot};

/// Per-shard ordering policy.
///
/// `Lru` moves an entry to the front of the recency list on every touch;
/// `Fifo` keeps insertion order, so the back is always the oldest insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
	#[default]
	Lru,
	Fifo,
}

/// Removal notification: `(key, payload)` of the entry just removed.
///
/// Invoked exactly once per removal — capacity eviction, expiry, explicit
/// delete, shape change, or a hash emptied by `h_del` — while the owning
/// shard's lock is held. The callback must not call back into the cache:
/// re-entering the same shard deadlocks.
pub type EvictFn = dyn Fn(&str, Payload) + Send + Sync;

pub(crate) struct Shard {
	policy: CachePolicy,
	capacity: usize,
	entries: EntryList,
	index: HashMap<String, Slot, ahash::RandomState>,
	on_evict: Option<Arc<EvictFn>>,
}

impl Shard {
	pub(crate) fn new(policy: CachePolicy, capacity: usize, on_evict: Option<Arc<EvictFn>>) -> Self {
		Self {
			policy,
			capacity,
			entries: EntryList::new(),
			index: HashMap::default(),
			on_evict,
		}
	}

	/// Write a scalar. Overwrites a live scalar in place; displaces a hash
	/// entry (the callback sees the old payload); creates the key otherwise.
	/// `Duration::ZERO` selects the default TTL.
	pub(crate) fn set(&mut self, key: &str, value: Value, ttl: Duration) {
		if key.is_empty() {
			return;
		}
		if let Some(&slot) = self.index.get(key) {
			if self.entries.get(slot).is_expired(clock::now()) {
				self.remove_slot(slot);
			} else if matches!(self.entries.get(slot).payload, Payload::Scalar(_)) {
				let entry = self.entries.get_mut(slot);
				entry.payload = Payload::Scalar(value);
				entry.expires_at = clock::deadline_after(clock::effective_ttl(ttl));
				self.touch(slot);
				return;
			} else {
				// Shape change: the hash entry is evicted, not converted.
				self.remove_slot(slot);
			}
		}
		let deadline = clock::deadline_after(clock::effective_ttl(ttl));
		self.insert_new(Entry::new(key, Payload::Scalar(value), deadline));
	}

	/// Scalar read. Expiry is checked first; a hash-shaped entry reads as
	/// absent but is left in place.
	pub(crate) fn get(&mut self, key: &str) -> Option<Value> {
		let &slot = self.index.get(key)?;
		if self.entries.get(slot).is_expired(clock::now()) {
			self.remove_slot(slot);
			return None;
		}
		let value = match &self.entries.get(slot).payload {
			Payload::Scalar(v) => v.clone(),
			Payload::Hash(_) => return None,
		};
		self.touch(slot);
		Some(value)
	}

	/// Presence check; shape is ignored. Touches recency like a read.
	pub(crate) fn exist(&mut self, key: &str) -> bool {
		let Some(&slot) = self.index.get(key) else {
			return false;
		};
		if self.entries.get(slot).is_expired(clock::now()) {
			self.remove_slot(slot);
			return false;
		}
		self.touch(slot);
		true
	}

	/// Shape tag of whatever the dictionary holds. No expiry check and no
	/// recency update: this is a pure inspection.
	pub(crate) fn data_type(&self, key: &str) -> Option<DataType> {
		let &slot = self.index.get(key)?;
		Some(self.entries.get(slot).payload.data_type())
	}

	pub(crate) fn del(&mut self, key: &str) {
		if let Some(&slot) = self.index.get(key) {
			self.remove_slot(slot);
		}
	}

	/// Live keys, front to back. Entries observed expired are evicted on
	/// the way.
	pub(crate) fn keys(&mut self) -> Vec<String> {
		self.purge_expired();
		self.entries.iter().map(|(_, e)| e.key.clone()).collect()
	}

	/// Count of live keys; lazily evicts expired entries like `keys`.
	pub(crate) fn len(&mut self) -> usize {
		self.purge_expired();
		self.entries.len()
	}

	/// Add `delta` to a live scalar integer. Anything else — absent key,
	/// expired entry, hash shape, non-integer payload — returns 0 without
	/// mutating.
	pub(crate) fn incr_by(&mut self, key: &str, delta: i64) -> i64 {
		let Some(&slot) = self.index.get(key) else {
			return 0;
		};
		if self.entries.get(slot).is_expired(clock::now()) {
			self.remove_slot(slot);
			return 0;
		}
		let new = match &mut self.entries.get_mut(slot).payload {
			Payload::Scalar(Value::Int(n)) => {
				*n = n.wrapping_add(delta);
				*n
			}
			_ => return 0,
		};
		self.touch(slot);
		new
	}

	/// Remaining lifetime, `Duration::ZERO` when absent. An entry observed
	/// expired is evicted and reads as absent.
	pub(crate) fn ttl(&mut self, key: &str) -> Duration {
		let Some(&slot) = self.index.get(key) else {
			return Duration::ZERO;
		};
		let now = clock::now();
		let expires_at = self.entries.get(slot).expires_at;
		if expires_at < now {
			self.remove_slot(slot);
			return Duration::ZERO;
		}
		Duration::from_nanos((expires_at - now) as u64)
	}

	/// Reset the deadline to `now + ttl`. `Duration::ZERO` makes the entry
	/// due immediately (no default substitution here). An entry observed
	/// expired is evicted instead.
	pub(crate) fn expire(&mut self, key: &str, ttl: Duration) {
		let Some(&slot) = self.index.get(key) else {
			return;
		};
		if self.entries.get(slot).is_expired(clock::now()) {
			self.remove_slot(slot);
			return;
		}
		self.entries.get_mut(slot).expires_at = clock::deadline_after(ttl);
		self.touch(slot);
	}

	/// Write one hash field. Creates the hash entry (displacing a scalar or
	/// an expired predecessor) when needed. A non-zero `ttl` on a live hash
	/// replaces its deadline; zero leaves the deadline alone.
	pub(crate) fn h_set(&mut self, key: &str, field: &str, value: Value, ttl: Duration) {
		if key.is_empty() || field.is_empty() {
			return;
		}
		if let Some(&slot) = self.index.get(key) {
			if self.entries.get(slot).is_expired(clock::now()) {
				self.remove_slot(slot);
			} else if matches!(self.entries.get(slot).payload, Payload::Hash(_)) {
				let entry = self.entries.get_mut(slot);
				if let Payload::Hash(map) = &mut entry.payload {
					map.insert(field.to_string(), value);
				}
				if !ttl.is_zero() {
					entry.expires_at = clock::deadline_after(ttl);
				}
				self.touch(slot);
				return;
			} else {
				// Shape change: the scalar entry is evicted, not converted.
				self.remove_slot(slot);
			}
		}
		let mut map = IndexMap::new();
		map.insert(field.to_string(), value);
		let deadline = clock::deadline_after(clock::effective_ttl(ttl));
		self.insert_new(Entry::new(key, Payload::Hash(map), deadline));
	}

	/// Field read. Requires a live hash; a live hash missing the field still
	/// counts as a touch.
	pub(crate) fn h_get(&mut self, key: &str, field: &str) -> Option<Value> {
		let &slot = self.index.get(key)?;
		if self.entries.get(slot).is_expired(clock::now()) {
			self.remove_slot(slot);
			return None;
		}
		let value = match &self.entries.get(slot).payload {
			Payload::Hash(map) => map.get(field).cloned(),
			Payload::Scalar(_) => return None,
		};
		self.touch(slot);
		value
	}

	pub(crate) fn h_exist(&mut self, key: &str, field: &str) -> bool {
		let Some(&slot) = self.index.get(key) else {
			return false;
		};
		if self.entries.get(slot).is_expired(clock::now()) {
			self.remove_slot(slot);
			return false;
		}
		let present = match &self.entries.get(slot).payload {
			Payload::Hash(map) => map.contains_key(field),
			Payload::Scalar(_) => return false,
		};
		self.touch(slot);
		present
	}

	/// Delete one field. Removing the last field evicts the whole entry
	/// (the callback sees the now-empty hash payload).
	pub(crate) fn h_del(&mut self, key: &str, field: &str) {
		let Some(&slot) = self.index.get(key) else {
			return;
		};
		if self.entries.get(slot).is_expired(clock::now()) {
			self.remove_slot(slot);
			return;
		}
		let emptied = match &mut self.entries.get_mut(slot).payload {
			Payload::Hash(map) => {
				if map.shift_remove(field).is_none() {
					return;
				}
				map.is_empty()
			}
			Payload::Scalar(_) => return,
		};
		if emptied {
			self.remove_slot(slot);
		} else {
			self.touch(slot);
		}
	}

	/// Snapshot of the field map of a live hash.
	pub(crate) fn h_get_all(&mut self, key: &str) -> Option<IndexMap<String, Value>> {
		let &slot = self.index.get(key)?;
		if self.entries.get(slot).is_expired(clock::now()) {
			self.remove_slot(slot);
			return None;
		}
		match &self.entries.get(slot).payload {
			Payload::Hash(map) => Some(map.clone()),
			Payload::Scalar(_) => None,
		}
	}

	pub(crate) fn h_len(&mut self, key: &str) -> usize {
		let Some(&slot) = self.index.get(key) else {
			return 0;
		};
		if self.entries.get(slot).is_expired(clock::now()) {
			self.remove_slot(slot);
			return 0;
		}
		match &self.entries.get(slot).payload {
			Payload::Hash(map) => map.len(),
			Payload::Scalar(_) => 0,
		}
	}

	/// Field names in insertion order; empty unless the key is a live hash.
	pub(crate) fn h_keys(&mut self, key: &str) -> Vec<String> {
		let Some(&slot) = self.index.get(key) else {
			return Vec::new();
		};
		if self.entries.get(slot).is_expired(clock::now()) {
			self.remove_slot(slot);
			return Vec::new();
		}
		match &self.entries.get(slot).payload {
			Payload::Hash(map) => map.keys().cloned().collect(),
			Payload::Scalar(_) => Vec::new(),
		}
	}

	/// Add `delta` to an integer field, creating whatever is missing along
	/// the way: an absent key, an expired entry or a scalar in the way all
	/// become a fresh one-field hash holding `delta`. A live non-integer
	/// field returns 0 without mutation. `ttl` applies to creation only.
	pub(crate) fn h_incr_by(&mut self, key: &str, field: &str, delta: i64, ttl: Duration) -> i64 {
		if key.is_empty() || field.is_empty() {
			return 0;
		}
		if let Some(&slot) = self.index.get(key) {
			if self.entries.get(slot).is_expired(clock::now()) {
				self.remove_slot(slot);
			} else if matches!(self.entries.get(slot).payload, Payload::Hash(_)) {
				let new = {
					let entry = self.entries.get_mut(slot);
					let Payload::Hash(map) = &mut entry.payload else {
						return 0;
					};
					match map.get_mut(field) {
						None => {
							map.insert(field.to_string(), Value::Int(delta));
							delta
						}
						Some(Value::Int(n)) => {
							*n = n.wrapping_add(delta);
							*n
						}
						Some(_) => return 0,
					}
				};
				self.touch(slot);
				return new;
			} else {
				self.remove_slot(slot);
			}
		}
		let mut map = IndexMap::new();
		map.insert(field.to_string(), Value::Int(delta));
		let deadline = clock::deadline_after(clock::effective_ttl(ttl));
		self.insert_new(Entry::new(key, Payload::Hash(map), deadline));
		delta
	}

	/// Remove every entry, notifying the callback for each.
	pub(crate) fn clear(&mut self) {
		while let Some(slot) = self.entries.back() {
			self.remove_slot(slot);
		}
	}

	/// Push a fresh entry at the front and enforce capacity by evicting the
	/// back position.
	fn insert_new(&mut self, entry: Entry) {
		let key = entry.key.clone();
		let slot = self.entries.push_front(entry);
		self.index.insert(key, slot);
		if self.entries.len() > self.capacity {
			if let Some(victim) = self.entries.back() {
				trace!(key = %self.entries.get(victim).key, "capacity eviction");
				self.remove_slot(victim);
			}
		}
	}

	/// Detach an entry from both structures, then notify. The callback runs
	/// after the entry is fully unreachable from the shard.
	fn remove_slot(&mut self, slot: Slot) {
		let Entry { key, payload, .. } = self.entries.remove(slot);
		self.index.remove(&key);
		if let Some(on_evict) = &self.on_evict {
			on_evict(&key, payload);
		}
	}

	fn touch(&mut self, slot: Slot) {
		if self.policy == CachePolicy::Lru {
			self.entries.move_to_front(slot);
		}
	}

	fn purge_expired(&mut self) {
		let now = clock::now();
		let expired: Vec<Slot> = self
			.entries
			.iter()
			.filter(|(_, e)| e.is_expired(now))
			.map(|(slot, _)| slot)
			.collect();
		for slot in expired {
			trace!(key = %self.entries.get(slot).key, "expired during enumeration");
			self.remove_slot(slot);
		}
	}
}
