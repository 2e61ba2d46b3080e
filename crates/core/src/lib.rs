//! Domain types shared by the Aether backend crates.
//!
//! Holds the generation request model and its validation, the remote
//! status table used for progress narration, media filename rules, and
//! the request-scoped media store.

pub mod error;
pub mod generation;
pub mod media;
pub mod status;
pub mod storage;
pub mod types;
