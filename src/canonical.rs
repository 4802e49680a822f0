//! Canonical serialization for deterministic fingerprints.
//!
//! Serializes data in a canonical, deterministic format suitable for
//! hashing and run-to-run comparison of optimization results.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: struct fields serialize in declaration order
//! - Stable Vec order: vectors serialize in index order
//! - No HashMap allowed: use BTreeMap for maps in hashed data
//! - Floats entering fingerprints must be quantized by the caller

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing.
///
/// Produces deterministic output for the same input, suitable for hash
/// computation and run-to-run comparison.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct TestStruct {
        name: String,
        value: i32,
    }

    #[test]
    fn test_determinism() {
        let s = TestStruct {
            name: "sector".to_string(),
            value: 7,
        };

        let h1 = canonical_hash(&s);
        let h2 = canonical_hash(&s);
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_distinct_values_distinct_hashes() {
        let a = TestStruct {
            name: "sector".to_string(),
            value: 7,
        };
        let b = TestStruct {
            name: "sector".to_string(),
            value: 8,
        };
        assert_ne!(canonical_hash(&a), canonical_hash(&b));
    }
}
