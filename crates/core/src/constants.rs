//! Constants used throughout the CareTrack core crate.
//!
//! Path names, file names and the defaults that configuration falls back to.

/// Default directory for patient data storage when no explicit directory is configured.
pub const DEFAULT_PATIENT_DATA_DIR: &str = "patient_data";

/// Directory (under the data dir) holding the sharded patient documents.
pub const PATIENTS_DIR_NAME: &str = "patients";

/// Filename of a stored patient document.
pub const PATIENT_YAML_FILENAME: &str = "patient.yaml";

/// Filename of the persisted sequence counters.
pub const SEQUENCES_FILENAME: &str = "sequences.yaml";

/// Prefix of the human-facing patient identifier.
pub const PATIENT_NUMBER_PREFIX: &str = "PT";

/// Number given to the first patient in an empty store.
pub const FIRST_PATIENT_NUMBER: u64 = 1001;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

pub const DEFAULT_MAX_PAGE_SIZE: u64 = 100;
