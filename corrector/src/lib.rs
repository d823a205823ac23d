//! Redundancy corrector for tri-dimensional records.
//!
//! Each record carries the same content three ways. As long as at most one
//! payload is corrupted, the other two are enough to rebuild it:
//!
//! | Corrupted | Rebuilt from |
//! |---|---|
//! | classification | narrative text, scored to a tier |
//! | narrative | structural values, tone from the classification tier |
//! | structural | narrative and classification, data type from the tone |
//!
//! Localizing the fault needs per-dimension hashes taken while the record
//! was still healthy ([`QuantumCorrector::enrich`]). Corruption that
//! happened before enrichment cannot be localized and is never "repaired".

pub mod config;
pub mod corrector;
pub mod types;

pub use config::CorrectorConfig;
pub use corrector::QuantumCorrector;
pub use types::*;
