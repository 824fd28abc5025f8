//! Deterministic hash-based type identity.
//!
//! [`TypeHash`] identifies host classes, built-in type families and native
//! functions. Hashes are computed from names, so a class can be referenced
//! before it is registered and the same name always maps to the same id.
//!
//! ```
//! use dynex_core::TypeHash;
//!
//! assert_eq!(TypeHash::from_name("Person"), TypeHash::from_name("Person"));
//! assert_ne!(
//!     TypeHash::from_function("f", 0),
//!     TypeHash::from_function("f", 1),
//! );
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain mixing constants so types and functions never share a hash.
mod hash_constants {
    /// Domain marker for type hashes
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for function hashes
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;

    /// Mixed into function hashes per overload slot.
    pub const OVERLOAD: u64 = 0x9e3779b97f4a7c15;
}

/// A deterministic 64-bit hash identifying a type or a native function.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), hash_constants::TYPE))
    }

    /// Create a function hash from its name and overload slot.
    ///
    /// The slot distinguishes functions registered under the same name.
    #[inline]
    pub fn from_function(name: &str, slot: usize) -> Self {
        let base = xxh64(name.as_bytes(), hash_constants::FUNCTION);
        TypeHash(base ^ (slot as u64).wrapping_mul(hash_constants::OVERLOAD))
    }

    /// Whether this is the empty hash.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_and_function_domains_differ() {
        assert_ne!(TypeHash::from_name("f"), TypeHash::from_function("f", 0));
    }

    #[test]
    fn empty_hash() {
        assert!(TypeHash::EMPTY.is_empty());
        assert!(!TypeHash::from_name("int").is_empty());
    }
}
