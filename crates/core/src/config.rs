//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services, so
//! request handling never reads process-wide environment variables.

use crate::constants::{DEFAULT_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE, PATIENTS_DIR_NAME};
use crate::store::{FileStore, MemoryStore, PatientStore};
use crate::{PatientError, PatientResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Which record store implementation backs the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// YAML documents in sharded directories under the patient data dir.
    File,
    /// Process-local, lost on exit. Useful for demos and tests.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = PatientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(PatientError::InvalidInput(format!(
                "unknown store backend '{other}' (expected 'file' or 'memory')"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    patient_data_dir: PathBuf,
    store_backend: StoreBackend,
    default_page_size: u64,
    max_page_size: u64,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidInput` if either page size is zero or the default exceeds
    /// the maximum.
    pub fn new(
        patient_data_dir: PathBuf,
        store_backend: StoreBackend,
        default_page_size: u64,
        max_page_size: u64,
    ) -> PatientResult<Self> {
        if default_page_size == 0 || max_page_size == 0 {
            return Err(PatientError::InvalidInput(
                "page sizes must be greater than zero".into(),
            ));
        }
        if default_page_size > max_page_size {
            return Err(PatientError::InvalidInput(format!(
                "default page size {default_page_size} exceeds maximum page size {max_page_size}"
            )));
        }

        Ok(Self {
            patient_data_dir,
            store_backend,
            default_page_size,
            max_page_size,
        })
    }

    /// In-memory configuration with the default paging limits.
    pub fn in_memory() -> Self {
        Self {
            patient_data_dir: PathBuf::new(),
            store_backend: StoreBackend::Memory,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    pub fn patient_data_dir(&self) -> &Path {
        &self.patient_data_dir
    }

    pub fn patients_dir(&self) -> PathBuf {
        self.patient_data_dir.join(PATIENTS_DIR_NAME)
    }

    pub fn store_backend(&self) -> StoreBackend {
        self.store_backend
    }

    pub fn default_page_size(&self) -> u64 {
        self.default_page_size
    }

    pub fn max_page_size(&self) -> u64 {
        self.max_page_size
    }

    /// Opens the configured record store.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Store` if the file store cannot create or read its directory.
    pub fn open_store(&self) -> PatientResult<Arc<dyn PatientStore>> {
        let store: Arc<dyn PatientStore> = match self.store_backend {
            StoreBackend::File => Arc::new(FileStore::open(&self.patient_data_dir)?),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(store)
    }
}

/// Parse the store backend from an optional environment value.
///
/// `None` or blank selects the file store.
pub fn store_backend_from_env_value(value: Option<String>) -> PatientResult<StoreBackend> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<StoreBackend>())
        .transpose()
        .map(|parsed| parsed.unwrap_or(StoreBackend::File))
}

/// Parse a page size from an optional environment value, falling back to `default`.
pub fn page_size_from_env_value(value: Option<String>, default: u64) -> PatientResult<u64> {
    let Some(raw) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };

    match raw.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(PatientError::InvalidInput(format!(
            "page size must be a positive integer, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_defaults_to_file() {
        assert_eq!(
            store_backend_from_env_value(None).unwrap(),
            StoreBackend::File
        );
        assert_eq!(
            store_backend_from_env_value(Some("   ".into())).unwrap(),
            StoreBackend::File
        );
    }

    #[test]
    fn store_backend_parses_case_insensitively() {
        assert_eq!(
            store_backend_from_env_value(Some("Memory".into())).unwrap(),
            StoreBackend::Memory
        );
    }

    #[test]
    fn store_backend_rejects_unknown_value() {
        let err = store_backend_from_env_value(Some("mongo".into())).unwrap_err();
        assert!(matches!(err, PatientError::InvalidInput(_)));
    }

    #[test]
    fn page_size_env_value_parsing() {
        assert_eq!(page_size_from_env_value(None, 10).unwrap(), 10);
        assert_eq!(page_size_from_env_value(Some("25".into()), 10).unwrap(), 25);
        assert!(page_size_from_env_value(Some("0".into()), 10).is_err());
        assert!(page_size_from_env_value(Some("ten".into()), 10).is_err());
    }

    #[test]
    fn new_rejects_default_above_max() {
        let err = CoreConfig::new(PathBuf::from("x"), StoreBackend::Memory, 50, 20).unwrap_err();
        assert!(matches!(err, PatientError::InvalidInput(_)));
    }

    #[test]
    fn file_backend_opens_store_under_data_dir() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let cfg = CoreConfig::new(
            temp_dir.path().to_path_buf(),
            StoreBackend::File,
            DEFAULT_PAGE_SIZE,
            DEFAULT_MAX_PAGE_SIZE,
        )
        .unwrap();

        let store = cfg.open_store().expect("file store should open");
        assert_eq!(store.count(&crate::store::Filter::All).unwrap(), 0);
        assert!(cfg.patients_dir().is_dir());
    }
}
