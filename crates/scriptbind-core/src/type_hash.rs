//! Deterministic hash-based identity for native types.
//!
//! [`TypeHash`] is a 64-bit hash computed from a type's spelling. Because the
//! hash only depends on the name, supertype lists and classification caches
//! can refer to a type before it has been registered anywhere, and the same
//! class name always maps to the same identity.
//!
//! # Examples
//!
//! ```
//! use scriptbind_core::TypeHash;
//!
//! let a = TypeHash::from_name("Tank");
//! assert_eq!(a, TypeHash::from_name("Tank"));
//!
//! // Composite types mix their element hashes in order.
//! let list = TypeHash::from_composite("List", &[TypeHash::from_name("int")]);
//! let map = TypeHash::from_composite("Map", &[a, list]);
//! assert_ne!(list, map);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant for chained components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for composite (parameterized) type hashes.
    pub const COMPOSITE: u64 = 0x3e9f5d2a8c7b1403;

    /// Position markers so that argument order changes the hash.
    pub const POSITION_MARKERS: [u64; 8] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
    ];
}

/// A deterministic 64-bit hash identifying a native type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a hash for a parameterized type (`List<T>`, `Map<K, V>`, `T[]`).
    ///
    /// Argument order matters: `Map<int, string>` differs from `Map<string, int>`.
    #[inline]
    pub fn from_composite(kind: &str, args: &[TypeHash]) -> Self {
        let mut hash = hash_constants::COMPOSITE ^ xxh64(kind.as_bytes(), 0);
        for (i, arg) in args.iter().enumerate() {
            hash = hash
                .wrapping_mul(hash_constants::SEP)
                .wrapping_add(position_marker(i) ^ arg.0);
        }
        TypeHash(hash)
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

#[inline]
fn position_marker(i: usize) -> u64 {
    hash_constants::POSITION_MARKERS
        .get(i)
        .copied()
        .unwrap_or_else(|| hash_constants::POSITION_MARKERS[0].wrapping_add(i as u64))
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
