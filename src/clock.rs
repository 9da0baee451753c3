//! Monotonic time source shared by every shard.
//!
//! Deadlines are stored as signed nanoseconds on a process-wide monotonic
//! clock anchored at first use. Signed arithmetic keeps the comparison and
//! remaining-lifetime math branch-free; an `i64` of nanoseconds covers
//! roughly 292 years of process uptime.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// TTL substituted when a write supplies `Duration::ZERO`.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3 * 60 * 60);

static ANCHOR: OnceLock<Instant> = OnceLock::new();

/// Nanoseconds elapsed since the clock was first read.
pub(crate) fn now() -> i64 {
	ANCHOR.get_or_init(Instant::now).elapsed().as_nanos() as i64
}

/// Absolute deadline `ttl` from now. The caller is responsible for any
/// default-TTL substitution; `Duration::ZERO` yields an already-due
/// deadline.
pub(crate) fn deadline_after(ttl: Duration) -> i64 {
	let nanos = ttl.as_nanos().min(i64::MAX as u128) as i64;
	now().saturating_add(nanos)
}

/// Maps the zero sentinel to [`DEFAULT_TTL`].
pub(crate) fn effective_ttl(ttl: Duration) -> Duration {
	if ttl.is_zero() { DEFAULT_TTL } else { ttl }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_now_is_monotonic() {
		let a = now();
		let b = now();
		assert!(b >= a);
	}

	#[test]
	fn test_deadline_is_in_the_future() {
		let deadline = deadline_after(Duration::from_secs(1));
		assert!(deadline > now());
	}

	#[test]
	fn test_zero_ttl_deadline_is_already_due() {
		let deadline = deadline_after(Duration::ZERO);
		assert!(deadline <= now());
	}

	#[test]
	fn test_effective_ttl_substitutes_default() {
		assert_eq!(effective_ttl(Duration::ZERO), DEFAULT_TTL);
		assert_eq!(effective_ttl(Duration::from_secs(5)), Duration::from_secs(5));
	}

	#[test]
	fn test_huge_ttl_saturates() {
		let deadline = deadline_after(Duration::MAX);
		assert_eq!(deadline, i64::MAX);
	}
}
