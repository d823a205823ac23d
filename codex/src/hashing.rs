//! Integrity hashing for tri-dimensional records.
//!
//! Payloads are serialized to canonical JSON (struct field order, sorted
//! maps) and hashed with SHA-256.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::types::{
    ClassificationPayload, Dimension, NarrativePayload, StructuralPayload, TriDimensionalRecord,
};

/// Compute SHA256 hash of content.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

fn hash_json(value: &impl Serialize) -> String {
    let json = serde_json::to_string(value).unwrap_or_default();
    compute_hash(json.as_bytes())
}

/// Combined hash over all three payloads.
pub fn hash_payloads(
    structural: &StructuralPayload,
    narrative: &NarrativePayload,
    classification: &ClassificationPayload,
) -> String {
    hash_json(&(structural, narrative, classification))
}

/// Hash of a single dimension of a record.
pub fn hash_dimension(record: &TriDimensionalRecord, dimension: Dimension) -> String {
    match dimension {
        Dimension::Structural => hash_json(&record.structural),
        Dimension::Narrative => hash_json(&record.narrative),
        Dimension::Classification => hash_json(&record.classification),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_hash() {
        let hash1 = compute_hash(b"hello");
        let hash2 = compute_hash(b"hello");
        let hash3 = compute_hash(b"world");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(hash1.len(), 64);
    }
}
