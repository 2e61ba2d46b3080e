//! Sonauto REST client and generation orchestrator.
//!
//! Provides typed request/response messages, an HTTP client for the
//! Sonauto generation endpoints, the [`service::GenerationService`] seam
//! that the orchestrator is written against, bounded retry helpers, and
//! the [`orchestrator::GenerationOrchestrator`] that drives one request
//! from submission to saved files.

pub mod api;
pub mod messages;
pub mod orchestrator;
pub mod retry;
pub mod service;
