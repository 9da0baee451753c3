//! The payload model: tagged values, the scalar/hash entry shapes, and the
//! record stored per key.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// A cache value.
///
/// The common payloads are first-class variants so the increment operations
/// can project them without downcasting; anything else rides in `Opaque`
/// behind an `Arc`, which keeps `Clone` a reference-count bump.
#[derive(Clone)]
pub enum Value {
	Int(i64),
	Str(String),
	Bytes(Vec<u8>),
	Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
	/// Wrap an arbitrary value. Retrieve it again with [`Value::downcast_ref`].
	pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
		Value::Opaque(Arc::new(value))
	}

	/// The projection used by `incr_by`/`h_incr_by`: only `Int` projects.
	pub fn as_int(&self) -> Option<i64> {
		match self {
			Value::Int(n) => Some(*n),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			Value::Bytes(b) => Some(b),
			_ => None,
		}
	}

	/// Attempt to downcast an `Opaque` payload to its concrete type.
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		match self {
			Value::Opaque(any) => any.downcast_ref(),
			_ => None,
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
			Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
			Value::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
			Value::Opaque(_) => f.write_str("Opaque(..)"),
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Int(a), Value::Int(b)) => a == b,
			(Value::Str(a), Value::Str(b)) => a == b,
			(Value::Bytes(a), Value::Bytes(b)) => a == b,
			// Opaque values have no deep equality; identity is the best we can do.
			(Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl From<i64> for Value {
	fn from(n: i64) -> Self {
		Value::Int(n)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::Str(s.to_string())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::Str(s)
	}
}

impl From<Vec<u8>> for Value {
	fn from(b: Vec<u8>) -> Self {
		Value::Bytes(b)
	}
}

/// Shape tag reported by `data_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
	Scalar,
	Hash,
}

/// What a key holds: a single value or a field map.
///
/// Modeling the two shapes as a tagged enum makes "exactly one payload
/// branch is populated" impossible to violate.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
	Scalar(Value),
	Hash(IndexMap<String, Value>),
}

impl Payload {
	pub fn data_type(&self) -> DataType {
		match self {
			Payload::Scalar(_) => DataType::Scalar,
			Payload::Hash(_) => DataType::Hash,
		}
	}
}

/// One record in a shard. `key` always equals the dictionary key that maps
/// to this entry, and `expires_at` is always a concrete deadline.
#[derive(Debug)]
pub(crate) struct Entry {
	pub(crate) key: String,
	pub(crate) payload: Payload,
	pub(crate) expires_at: i64,
}

impl Entry {
	pub(crate) fn new(key: &str, payload: Payload, expires_at: i64) -> Self {
		Self {
			key: key.to_string(),
			payload,
			expires_at,
		}
	}

	/// Liveness rule: an entry is live while `expires_at >= now`.
	pub(crate) fn is_expired(&self, now: i64) -> bool {
		self.expires_at < now
	}
}
