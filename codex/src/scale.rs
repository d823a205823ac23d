//! The fixed nine-tier classification scale.

use crate::types::ClassificationPayload;

/// Base unit of the scale; tier `n` maps to `n * TIER_BASE_UNIT`.
pub const TIER_BASE_UNIT: u32 = 111;

/// Golden ratio, used to spread tier ratios around the middle tier.
const PHI: f64 = 1.618_033_988_749_895;

/// Presentation attributes of one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierInfo {
    /// Tier (1-9)
    pub tier: u8,
    /// Tier name
    pub label: &'static str,
    /// Display color
    pub color: &'static str,
    /// Geometric tag
    pub shape: &'static str,
    /// Number of sides of the shape
    pub sides: u8,
}

const TIERS: [TierInfo; 9] = [
    TierInfo { tier: 1, label: "Fragment", color: "#8b0000", shape: "point", sides: 1 },
    TierInfo { tier: 2, label: "Trace", color: "#d2691e", shape: "line", sides: 2 },
    TierInfo { tier: 3, label: "Signal", color: "#daa520", shape: "triangle", sides: 3 },
    TierInfo { tier: 4, label: "Pattern", color: "#9acd32", shape: "square", sides: 4 },
    TierInfo { tier: 5, label: "Insight", color: "#2e8b57", shape: "pentagon", sides: 5 },
    TierInfo { tier: 6, label: "Synthesis", color: "#20b2aa", shape: "hexagon", sides: 6 },
    TierInfo { tier: 7, label: "Resonance", color: "#4169e1", shape: "heptagon", sides: 7 },
    TierInfo { tier: 8, label: "Harmony", color: "#8a2be2", shape: "octagon", sides: 8 },
    TierInfo { tier: 9, label: "Wisdom", color: "#ffd700", shape: "enneagon", sides: 9 },
];

impl TierInfo {
    /// Look up a tier, clamping out-of-range values into 1..=9.
    pub fn for_tier(tier: u8) -> &'static TierInfo {
        let index = tier.clamp(1, 9) as usize - 1;
        &TIERS[index]
    }

    /// Whether `tier` lies on the scale.
    pub fn is_valid(tier: u8) -> bool {
        (1..=9).contains(&tier)
    }

    /// Value of this tier on the scale.
    pub fn scale_value(&self) -> u32 {
        self.tier as u32 * TIER_BASE_UNIT
    }

    /// Ratio of this tier relative to the middle tier.
    pub fn ratio(&self) -> f64 {
        PHI.powi(self.tier as i32 - 5)
    }
}

impl ClassificationPayload {
    /// Build the full classification payload for a tier.
    pub fn from_tier(tier: u8) -> Self {
        let info = TierInfo::for_tier(tier);
        let ratio = info.ratio();
        Self {
            score_tier: info.tier,
            scale_value: info.scale_value(),
            tier_label: info.label.to_string(),
            tier_color: info.color.to_string(),
            shape_tag: info.shape.to_string(),
            signature: [
                info.tier as f64,
                info.scale_value() as f64,
                ratio,
                info.sides as f64,
            ],
            ratio,
        }
    }

    /// Whether the tier and its scale value are consistent.
    pub fn is_on_scale(&self) -> bool {
        TierInfo::is_valid(self.score_tier)
            && self.scale_value == self.score_tier as u32 * TIER_BASE_UNIT
    }
}
