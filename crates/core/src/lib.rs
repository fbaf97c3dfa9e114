//! # CareTrack Core
//!
//! Core business logic for the CareTrack patient record service.
//!
//! This crate contains pure data operations:
//! - Patient validation, creation, update and the append-only sub-record operations
//! - Duplicate-contact detection and `PT<n>` number allocation
//! - Advanced search and the aggregate reports
//! - The record store boundary, with in-memory and sharded YAML file implementations
//!
//! **No API concerns**: HTTP servers and wire routing belong in `api-rest`; wire types live in
//! `api-shared`.

pub mod analytics;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod patient;
pub mod patient_number;
pub mod query;
pub mod store;
pub mod uniqueness;
pub mod validation;

pub use config::{
    page_size_from_env_value, store_backend_from_env_value, CoreConfig, StoreBackend,
};
pub use error::{FieldError, PatientError, PatientResult, ValidationErrors};
pub use model::{MedicalHistoryEntry, NewPatient, Patient, PatientUpdate, Prescription, Visit};
pub use patient::PatientService;
pub use query::{SearchPage, SearchQuery};
pub use store::{FileStore, MemoryStore, PatientStore, StoreError};

pub use caretrack_types::{EmailAddress, NonEmptyText};
pub use caretrack_uuid::RecordId;
