//! Digestive system - ingestion pipeline for the knowledge core.
//!
//! Raw content goes through six stages before it may become a knowledge
//! node:
//!
//! - **Ingest**: wrap the payload as [`codex::RawContent`]
//! - **Parse**: extract title, body, author, sources and keywords from
//!   HTML, JSON or plain text
//! - **Translate**: build a tri-dimensional record through a
//!   [`codex::Translator`]
//! - **Absorb**: score quality, screen with the anomaly detector, reject
//!   hostile or weak content
//! - **Route**: choose a category and a storage layer
//! - **Store**: hand the record to a [`codex::KnowledgeStore`]
//!
//! Anything rejected along the way lands in a bounded waste log and can be
//! replayed later.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use codex::{InMemoryKnowledgeStore, KnowledgeTranslator, SourceKind};
//! use digestion::{DigestionConfig, DigestiveSystem};
//!
//! let system = DigestiveSystem::new(
//!     DigestionConfig::default(),
//!     Arc::new(KnowledgeTranslator::with_knowledge_template()),
//!     Arc::new(InMemoryKnowledgeStore::new()),
//! )?;
//! let result = system.digest(SourceKind::Web, url, html, "text/html").await;
//! ```

pub mod config;
pub mod parser;
pub mod router;
pub mod system;
pub mod types;
pub mod waste;

pub use config::{AbsorptionConfig, DigestionConfig, ParserConfig, RoutingConfig, SystemConfig};
pub use parser::{discloses_methodology, extract_keywords, ContentParser};
pub use router::{Router, CATEGORY_LEXICON};
pub use system::{DigestiveSystem, COMPONENT};
pub use types::*;
pub use waste::{WasteEntry, WasteLog};
