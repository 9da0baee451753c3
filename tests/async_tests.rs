//! The cache is synchronous but `Send + Sync`, so async applications share
//! it across tasks behind an `Arc`. Shard locks are held only for the
//! duration of one call, never across an await point.

use std::sync::Arc;
use std::time::Duration;

use expiring_cache::{Cache, Value};

const HOUR: Duration = Duration::from_secs(3600);

#[tokio::test(flavor = "multi_thread")]
async fn test_shared_across_tasks() {
	let cache = Arc::new(Cache::new(8, 1024).unwrap());
	let mut handles = Vec::new();

	for t in 0..4u32 {
		let cache = cache.clone();
		handles.push(tokio::spawn(async move {
			for i in 0..100u32 {
				let key = format!("t{t}-k{i}");
				cache.set(&key, i as i64, HOUR);
				assert_eq!(cache.get(&key), Some(Value::Int(i as i64)));
			}
		}));
	}
	for handle in handles {
		handle.await.unwrap();
	}

	assert_eq!(cache.len(), 400);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_counter_increments() {
	let cache = Arc::new(Cache::new(8, 64).unwrap());
	cache.set("hits", 0i64, HOUR);

	let mut handles = Vec::new();
	for _ in 0..8 {
		let cache = cache.clone();
		handles.push(tokio::spawn(async move {
			for _ in 0..50 {
				cache.incr_by("hits", 1);
				tokio::task::yield_now().await;
			}
		}));
	}
	for handle in handles {
		handle.await.unwrap();
	}

	assert_eq!(cache.get("hits"), Some(Value::Int(400)));
}

#[tokio::test]
async fn test_expiry_observed_after_async_sleep() {
	let cache = Cache::new(2, 16).unwrap();
	cache.set("ephemeral", 1i64, Duration::from_millis(5));

	tokio::time::sleep(Duration::from_millis(20)).await;

	assert!(!cache.exist("ephemeral"));
	assert_eq!(cache.len(), 0);
}
