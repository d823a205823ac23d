//! Archive of eliminated content, kept for forensic replay.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use codex::RawContent;

use crate::types::Stage;

/// One eliminated item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteEntry {
    pub id: String,
    pub raw: RawContent,
    /// Stage that rejected the item
    pub failed_at: Stage,
    pub reason: String,
    pub eliminated_at: DateTime<Utc>,
}

/// Bounded FIFO of eliminated items.
#[derive(Debug, Clone)]
pub struct WasteLog {
    /// Oldest first
    entries: VecDeque<WasteEntry>,
    capacity: usize,
}

impl WasteLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Archive an item, dropping the oldest when full.
    pub fn push(&mut self, entry: WasteEntry) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Most recent entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<WasteEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&WasteEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
