use std::sync::{Arc, Mutex};
use std::time::Duration;

use expiring_cache::{Cache, CacheBuilder, DataType, Payload, SkipList, Value};

const TEN_MINUTES: Duration = Duration::from_secs(600);
const HOUR: Duration = Duration::from_secs(3600);

type EvictionLog = Arc<Mutex<Vec<(String, Payload)>>>;

fn logging_cache(shards: u32, capacity: usize) -> (Cache, EvictionLog) {
	let log: EvictionLog = Arc::new(Mutex::new(Vec::new()));
	let sink = log.clone();
	let cache = CacheBuilder::new()
		.shards(shards)
		.shard_capacity(capacity)
		.on_evict(move |key, payload| {
			sink.lock().unwrap().push((key.to_string(), payload));
		})
		.build()
		.expect("valid configuration");
	(cache, log)
}

#[test]
fn test_lru_eviction_on_single_shard() {
	let (cache, log) = logging_cache(1, 3);

	cache.set("a", 1i64, TEN_MINUTES);
	cache.set("b", 2i64, TEN_MINUTES);
	cache.set("c", 3i64, TEN_MINUTES);
	cache.get("a"); // refresh "a" so "b" is the least recently touched
	cache.set("d", 4i64, TEN_MINUTES);

	let mut keys = cache.keys();
	keys.sort();
	assert_eq!(keys, ["a", "c", "d"]);

	let log = log.lock().unwrap();
	assert_eq!(log.len(), 1);
	assert_eq!(log[0].0, "b");
	assert_eq!(log[0].1, Payload::Scalar(Value::Int(2)));
}

#[test]
fn test_shape_change_evicts_old_scalar() {
	let (cache, log) = logging_cache(4, 16);

	cache.set("k", "v", HOUR);
	cache.h_set("k", "f", 7i64, HOUR);

	assert_eq!(cache.get("k"), None);
	assert_eq!(cache.data_type("k"), Some(DataType::Hash));
	assert_eq!(cache.h_get("k", "f"), Some(Value::Int(7)));

	let log = log.lock().unwrap();
	assert_eq!(log.len(), 1);
	assert_eq!(log[0].0, "k");
	assert_eq!(log[0].1, Payload::Scalar(Value::from("v")));
}

#[test]
fn test_ttl_lazy_removal() {
	let (cache, log) = logging_cache(4, 16);

	cache.set("k", 1i64, Duration::from_millis(1));
	std::thread::sleep(Duration::from_millis(5));

	assert!(!cache.exist("k"));
	assert_eq!(cache.len(), 0);
	assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn test_incr_by_semantics() {
	let cache = Cache::new(4, 16).unwrap();

	cache.set("n", 10i64, HOUR);
	assert_eq!(cache.incr_by("n", 5), 15);
	assert_eq!(cache.incr_by("n", -20), -5);
	assert_eq!(cache.incr_by("missing", 1), 0);
}

#[test]
fn test_h_incr_by_creates_entry_and_field() {
	let cache = Cache::new(4, 16).unwrap();

	assert_eq!(cache.h_incr_by("h", "f", 3, HOUR), 3);
	assert_eq!(cache.h_incr_by("h", "f", 4, Duration::ZERO), 7);
	assert_eq!(cache.h_len("h"), 1);
}

#[test]
fn test_skiplist_ordering_with_score_ties() {
	let mut list = SkipList::new();
	for (member, score) in [("a", 10), ("b", 20), ("c", 5), ("d", 75), ("f", 20)] {
		list.insert(member, score);
	}

	assert_eq!(list.member_by_rank(1).map(|(m, _)| m), Some("c"));
	assert_eq!(list.member_by_rank(5).map(|(m, _)| m), Some("d"));

	// The tie at score 20 is broken lexicographically: "b" before "f".
	let order: Vec<&str> = list.iter().map(|(m, _)| m).collect();
	assert_eq!(order, ["c", "a", "b", "f", "d"]);
}

#[test]
fn test_hash_entry_end_to_end() {
	let (cache, log) = logging_cache(2, 8);

	cache.h_set("user", "name", "alice", HOUR);
	cache.h_set("user", "email", "alice@example.com", Duration::ZERO);
	assert_eq!(cache.h_len("user"), 2);
	assert_eq!(cache.h_keys("user"), ["name", "email"]);
	assert!(cache.h_exist("user", "name"));

	let all = cache.h_get_all("user").unwrap();
	assert_eq!(all.get("name"), Some(&Value::from("alice")));

	cache.h_del("user", "name");
	assert_eq!(cache.h_len("user"), 1);

	// Deleting the last field removes the whole entry and notifies.
	cache.h_del("user", "email");
	assert!(!cache.exist("user"));
	assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn test_expire_and_ttl_roundtrip() {
	let cache = Cache::new(2, 8).unwrap();

	cache.set("k", 1i64, Duration::from_secs(5));
	let before = cache.ttl("k");
	assert!(before > Duration::ZERO && before <= Duration::from_secs(5));

	cache.expire("k", HOUR);
	assert!(cache.ttl("k") > Duration::from_secs(3500));

	assert_eq!(cache.ttl("missing"), Duration::ZERO);
}

#[test]
fn test_opaque_payload_survives_roundtrip() {
	#[derive(Debug, PartialEq)]
	struct Session {
		user_id: u64,
	}

	let cache = Cache::new(2, 8).unwrap();
	cache.set("sess", Value::opaque(Session { user_id: 42 }), HOUR);

	let value = cache.get("sess").unwrap();
	assert_eq!(value.downcast_ref::<Session>(), Some(&Session { user_id: 42 }));
}

#[test]
fn test_callback_retains_payload_after_eviction() {
	let (cache, log) = logging_cache(1, 8);

	cache.h_set("h", "a", 1i64, HOUR);
	cache.h_set("h", "b", 2i64, HOUR);
	cache.del("h");

	// The callback owns the payload outright once the entry is gone.
	let log = log.lock().unwrap();
	let Payload::Hash(fields) = &log[0].1 else {
		panic!("expected the hash payload");
	};
	assert_eq!(fields.get("a"), Some(&Value::Int(1)));
	assert_eq!(fields.get("b"), Some(&Value::Int(2)));
}
