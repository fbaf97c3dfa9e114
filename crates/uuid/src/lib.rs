//! Record identifiers and sharded-path utilities.
//!
//! Every stored patient document is keyed by an opaque, store-assigned [`RecordId`]. CareTrack
//! uses a *canonical* textual form for it: **32 lowercase hexadecimal characters** (no hyphens),
//! the same value `Uuid::new_v4().simple().to_string()` produces.
//!
//! The canonical form matters in two places:
//! - path ids from HTTP requests are only resolved when canonical, and
//! - the advanced search adds an id-equality clause when its free text is canonical.
//!
//! ## Sharded directory layout
//! For a canonical id `u` the file store keeps the document under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `patient_data/patients/55/0e/550e8400e29b41d4a716446655440000/`
//!
//! This keeps per-directory fan-out bounded as the record count grows.

mod record_id;

pub use record_id::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
