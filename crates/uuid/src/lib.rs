//! Research identifiers and sharded-path utilities.
//!
//! Every research task gets a [`ResearchId`] at submission time. The same identifier keys the
//! in-memory task status, the persisted report, and the temporary document file rendered for
//! it, so it has one canonical textual form: **32 lowercase hexadecimal characters** (no
//! hyphens).
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Externally supplied identifiers (URL path segments, CLI arguments) must already be
//! canonical; [`ResearchId::parse`] rejects anything else.
//!
//! ## Sharded directory layout
//! For a canonical identifier `u`, reports are stored under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`

mod service;

pub use service::{ResearchId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
