//! Content quality scoring.
//!
//! - [`analyze_resonance`]: five explainable sub-scores and a weighted composite
//! - [`detect_intention`]: marker-word classification of a text's intent
//!
//! Both are pure functions over text; no state is kept between calls.

pub mod intention;
pub mod scorer;

pub use intention::{detect_intention, intention_evidence, IntentionTag, INTENTION_MARKERS};
pub use scorer::{analyze_resonance, QualityScore, ResonanceRequest, ResonanceScorer, ScoreWeights};
