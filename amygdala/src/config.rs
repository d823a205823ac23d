//! Configuration for the anomaly detector.

use serde::{Deserialize, Serialize};

/// Tunables of an [`Amygdala`](crate::Amygdala) instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmygdalaConfig {
    /// Signals kept in alert memory
    pub memory_capacity: usize,
    /// How long a signal stays active (seconds)
    pub active_window_secs: i64,
    /// Repetition window (seconds)
    pub repetition_window_secs: i64,
    /// Identical inputs tolerated inside the repetition window
    pub repetition_limit: usize,
    /// Distinct inputs tracked for repetition
    pub repetition_capacity: usize,
    /// Score delta counted as a sudden jump
    pub jump_threshold: f64,
    /// Cascade window (seconds)
    pub cascade_window_secs: i64,
    /// Signals needed for a cascade
    pub cascade_min_signals: usize,
    /// Distinct signal types needed for a cascade
    pub cascade_min_types: usize,
    /// Severity added on cascade
    pub cascade_bonus: u8,
    /// Resting sensitivity
    pub sensitivity_baseline: f64,
    pub sensitivity_min: f64,
    pub sensitivity_max: f64,
    /// Sensitivity added when signals cluster
    pub sensitivity_increment: f64,
    /// Window in which clustering signals raise sensitivity (seconds)
    pub sensitivity_window_secs: i64,
    /// Signals that count as a cluster
    pub sensitivity_trigger_signals: usize,
    /// Sensitivity regained toward baseline per calm minute
    pub sensitivity_decay_per_minute: f64,
    /// Alert score lost per elapsed minute
    pub decay_per_minute: f64,
    /// Share of `severity * sensitivity` added to the alert score
    pub score_factor: f64,
}

impl Default for AmygdalaConfig {
    fn default() -> Self {
        Self {
            memory_capacity: 50,
            active_window_secs: 60,
            repetition_window_secs: 10,
            repetition_limit: 3,
            repetition_capacity: 100,
            jump_threshold: 40.0,
            cascade_window_secs: 5,
            cascade_min_signals: 3,
            cascade_min_types: 2,
            cascade_bonus: 15,
            sensitivity_baseline: 0.5,
            sensitivity_min: 0.1,
            sensitivity_max: 1.0,
            sensitivity_increment: 0.1,
            sensitivity_window_secs: 30,
            sensitivity_trigger_signals: 3,
            sensitivity_decay_per_minute: 0.05,
            decay_per_minute: 5.0,
            score_factor: 0.4,
        }
    }
}

impl AmygdalaConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AmygdalaConfig::default();
        assert_eq!(config.memory_capacity, 50);
        assert_eq!(config.repetition_capacity, 100);
        assert_eq!(config.active_window_secs, 60);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AmygdalaConfig::from_yaml("jump_threshold: 25.0\n").unwrap();
        assert_eq!(config.jump_threshold, 25.0);
        assert_eq!(config.repetition_limit, 3);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = AmygdalaConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(AmygdalaConfig::from_yaml(&yaml).unwrap(), config);
    }
}
