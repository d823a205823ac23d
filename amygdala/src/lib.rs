//! Amygdala - two-tier anomaly detection.
//!
//! Screens records and governance actions and keeps a decaying alert
//! posture:
//!
//! - **Fast path**: cheap checks run on every scan (score range, integrity
//!   hash, missing dimensions, sudden jumps, repetition)
//! - **Deep path**: intention markers, extraction-vs-service checklist,
//!   immutable principles and cascade detection, run only when the fast
//!   path fires or the detector is already above calm
//! - **Alert state**: score accumulated from accepted signals, decaying per
//!   elapsed minute, mapped onto CALM / VIGILANT / ALERT / LOCKDOWN
//!
//! # Architecture
//!
//! ```text
//! scan(context)
//!    │
//!    ├─ decay ──► level transitions
//!    │
//!    ├─ fast path ──┐
//!    │              ├─ findings? ──► ThreatSignal ──► AlertState
//!    └─ deep path ──┘                     │
//!                                         └─► listeners
//! ```
//!
//! Every [`Amygdala`] owns its [`AlertState`]; independent detectors
//! (one per tenant, for instance) never share state.

pub mod config;
pub mod detector;
pub mod memory;
pub mod principles;
pub mod service;
pub mod types;

pub use config::AmygdalaConfig;
pub use detector::Amygdala;
pub use memory::{AlertMemory, RepetitionTracker};
pub use principles::{check_principles, Principle, PrincipleViolation, IMMUTABLE_PRINCIPLES};
pub use service::{ServiceCriterion, ServiceEvaluation, ServiceEvaluator};
pub use types::*;
