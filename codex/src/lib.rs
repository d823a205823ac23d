//! Shared record format for the knowledge digestion core.
//!
//! Every engine in the workspace speaks in terms of the types defined here:
//!
//! - [`TriDimensionalRecord`]: one unit of content carried as three
//!   independent payloads (structural, narrative, classification) bound
//!   together by an integrity hash
//! - [`Translator`]: turns a [`ParsedContent`] into a record
//! - [`KnowledgeStore`]: persists admitted records as [`KnowledgeNode`]s
//! - [`Listeners`]: synchronous fire-and-forget event fan-out
//!
//! # Example
//!
//! ```ignore
//! use codex::{KnowledgeTranslator, Translator, KNOWLEDGE_TEMPLATE};
//!
//! let translator = KnowledgeTranslator::new();
//! translator.register_template(KNOWLEDGE_TEMPLATE).await;
//! let record = translator.translate(KNOWLEDGE_TEMPLATE, &parsed).await?;
//! assert!(record.is_intact());
//! ```

pub mod derive;
pub mod hashing;
pub mod listeners;
pub mod node;
pub mod scale;
pub mod store;
pub mod text;
pub mod translator;
pub mod types;

pub use hashing::{compute_hash, hash_dimension, hash_payloads};
pub use listeners::{ListenerId, Listeners};
pub use node::{Category, KnowledgeNode, NodeError, NodeStatus, Placement, StorageLayer};
pub use scale::{TierInfo, TIER_BASE_UNIT};
pub use store::{InMemoryKnowledgeStore, KnowledgeStore, StoreError};
pub use translator::{KnowledgeTranslator, TranslationError, Translator, KNOWLEDGE_TEMPLATE};
pub use types::*;
