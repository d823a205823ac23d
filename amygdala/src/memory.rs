//! Bounded memories of the detector.
//!
//! Both structures evict oldest-first inside the same call that inserts,
//! so neither can grow past its capacity.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};

use crate::types::ThreatSignal;

/// Circular buffer of accepted signals.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertMemory {
    signals: VecDeque<ThreatSignal>,
    capacity: usize,
}

impl AlertMemory {
    /// Create an empty memory.
    pub fn new(capacity: usize) -> Self {
        Self {
            signals: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a signal, evicting the oldest when full.
    pub fn push(&mut self, signal: ThreatSignal) {
        if self.capacity == 0 {
            return;
        }
        while self.signals.len() >= self.capacity {
            self.signals.pop_front();
        }
        self.signals.push_back(signal);
    }

    /// Most recent signals, newest first.
    pub fn recent(&self, limit: usize) -> Vec<ThreatSignal> {
        self.signals.iter().rev().take(limit).cloned().collect()
    }

    /// Signals at or after `since`, oldest first.
    pub fn since(&self, since: DateTime<Utc>) -> impl Iterator<Item = &ThreatSignal> {
        self.signals.iter().filter(move |s| s.timestamp >= since)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Rolling per-input timestamp windows.
#[derive(Debug, Clone)]
pub struct RepetitionTracker {
    seen: HashMap<String, VecDeque<DateTime<Utc>>>,
    order: VecDeque<String>,
    capacity: usize,
    window: Duration,
}

impl RepetitionTracker {
    /// Track at most `capacity` distinct inputs over `window`.
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self {
            seen: HashMap::new(),
            order: VecDeque::new(),
            capacity,
            window,
        }
    }

    /// Record an occurrence of `key` and return how many occurrences fall
    /// inside the window, this one included.
    pub fn record(&mut self, key: &str, now: DateTime<Utc>) -> usize {
        if !self.seen.contains_key(key) {
            while self.order.len() >= self.capacity.max(1) {
                if let Some(oldest) = self.order.pop_front() {
                    self.seen.remove(&oldest);
                }
            }
            self.order.push_back(key.to_string());
        }

        let cutoff = now - self.window;
        let times = self.seen.entry(key.to_string()).or_default();
        times.retain(|t| *t > cutoff);
        times.push_back(now);
        times.len()
    }

    /// Number of distinct inputs tracked.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Forget every input.
    pub fn clear(&mut self) {
        self.seen.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertLevel, Pathway, ThreatType};

    fn signal(n: usize) -> ThreatSignal {
        ThreatSignal {
            id: format!("sig-{}", n),
            threat_type: ThreatType::SuddenShift,
            severity: 10,
            alert_level: AlertLevel::Calm,
            source_component: "test".to_string(),
            timestamp: Utc::now(),
            evidence: vec![],
            pathway: Pathway::Fast,
        }
    }

    #[test]
    fn test_memory_is_bounded() {
        let mut memory = AlertMemory::new(50);
        for i in 0..70 {
            memory.push(signal(i));
        }
        assert_eq!(memory.len(), 50);
        assert_eq!(memory.recent(1)[0].id, "sig-69");
        assert_eq!(memory.recent(50)[49].id, "sig-20");
    }

    #[test]
    fn test_repetition_window() {
        let mut tracker = RepetitionTracker::new(100, Duration::seconds(10));
        let start = Utc::now();
        assert_eq!(tracker.record("a", start), 1);
        assert_eq!(tracker.record("a", start + Duration::seconds(2)), 2);
        assert_eq!(tracker.record("a", start + Duration::seconds(4)), 3);
        // The first occurrence has left the window.
        assert_eq!(tracker.record("a", start + Duration::seconds(11)), 3);
    }

    #[test]
    fn test_repetition_keys_are_bounded() {
        let mut tracker = RepetitionTracker::new(100, Duration::seconds(10));
        let now = Utc::now();
        for i in 0..150 {
            tracker.record(&format!("input-{}", i), now);
        }
        assert_eq!(tracker.len(), 100);
        // The oldest keys were evicted, so this counts as new.
        assert_eq!(tracker.record("input-0", now), 1);
        assert_eq!(tracker.len(), 100);
    }
}
