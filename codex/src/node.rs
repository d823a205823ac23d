//! Knowledge nodes: the stored form of an admitted record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::types::TriDimensionalRecord;

/// Knowledge categories a record can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Science,
    Technology,
    Health,
    Environment,
    Economy,
    Governance,
    Culture,
    Education,
    /// Default when no lexicon keyword matches
    Society,
}

impl Category {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Science => "science",
            Self::Technology => "technology",
            Self::Health => "health",
            Self::Environment => "environment",
            Self::Economy => "economy",
            Self::Governance => "governance",
            Self::Culture => "culture",
            Self::Education => "education",
            Self::Society => "society",
        }
    }

    /// All categories in routing order.
    pub fn all() -> [Self; 9] {
        [
            Self::Science,
            Self::Technology,
            Self::Health,
            Self::Environment,
            Self::Economy,
            Self::Governance,
            Self::Culture,
            Self::Education,
            Self::Society,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage layer, from most to least established knowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum StorageLayer {
    /// Well-sourced, high-scoring facts
    VerifiedEvents,
    /// Solid but less verified accounts
    Narratives,
    /// Weak signals worth keeping
    Patterns,
}

impl StorageLayer {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerifiedEvents => "verified_events",
            Self::Narratives => "narratives",
            Self::Patterns => "patterns",
        }
    }

    /// Tree depth of nodes stored in this layer.
    pub fn depth(&self) -> u8 {
        match self {
            Self::VerifiedEvents => 1,
            Self::Narratives => 2,
            Self::Patterns => 3,
        }
    }
}

impl fmt::Display for StorageLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Active,
    Polishing,
    Archived,
}

impl NodeStatus {
    /// Status that may follow this one.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Active => Some(Self::Polishing),
            Self::Polishing => Some(Self::Archived),
            Self::Archived => None,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Polishing => "polishing",
            Self::Archived => "archived",
        }
    }
}

/// Errors from node lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    /// Status change outside active → polishing → archived
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: &'static str, to: &'static str },
}

/// Where and how an admitted record is placed in the knowledge tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub category: Category,
    pub layer: StorageLayer,
    /// Presentation position (degrees on the category ring)
    pub position: u16,
    /// Component creating the node
    pub created_by: String,
}

/// A stored record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct KnowledgeNode {
    /// Unique identifier
    pub id: String,
    /// Parent branch (category/layer)
    pub parent_id: Option<String>,
    pub category: Category,
    pub layer: StorageLayer,
    pub title: String,
    pub status: NodeStatus,
    /// Depth in the knowledge tree
    pub depth: u8,
    /// Presentation position
    pub position: u16,
    /// Classification tier of the record
    pub tier: u8,
    pub record: TriDimensionalRecord,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeNode {
    /// Create an active node for a record.
    pub fn new(record: TriDimensionalRecord, placement: Placement) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            parent_id: Some(format!(
                "{}/{}",
                placement.category.as_str(),
                placement.layer.as_str()
            )),
            category: placement.category,
            layer: placement.layer,
            title: record.title().to_string(),
            status: NodeStatus::Active,
            depth: placement.layer.depth(),
            position: placement.position,
            tier: record.classification.score_tier,
            record,
            created_by: placement.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to the next lifecycle status.
    pub fn transition(&mut self, to: NodeStatus) -> Result<(), NodeError> {
        if self.status.next() != Some(to) {
            return Err(NodeError::InvalidTransition {
                from: self.status.as_str(),
                to: to.as_str(),
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_order() {
        assert_eq!(NodeStatus::Active.next(), Some(NodeStatus::Polishing));
        assert_eq!(NodeStatus::Polishing.next(), Some(NodeStatus::Archived));
        assert_eq!(NodeStatus::Archived.next(), None);
    }

    #[test]
    fn test_layer_depths() {
        assert!(StorageLayer::VerifiedEvents.depth() < StorageLayer::Patterns.depth());
    }
}
