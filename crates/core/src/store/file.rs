use super::collection::Collection;
use super::{Filter, FindOptions, PatientStore, StoreError, StoreResult};
use crate::constants::{PATIENTS_DIR_NAME, PATIENT_YAML_FILENAME, SEQUENCES_FILENAME};
use crate::model::{NewPatient, Patient, PatientUpdate};
use crate::patient_number::PatientSequence;
use caretrack_uuid::RecordId;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A write-through store of YAML documents.
///
/// Layout under the data dir:
///
/// ```text
/// patients/<s1>/<s2>/<id>/patient.yaml
/// sequences.yaml
/// ```
///
/// All documents are loaded on open and served from memory; each successful write is persisted
/// before it becomes visible, via a temp file renamed over the old document.
#[derive(Debug)]
pub struct FileStore {
    data_dir: PathBuf,
    inner: RwLock<Collection>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Sequences {
    #[serde(default)]
    patient_number: PatientSequence,
}

impl FileStore {
    /// Opens (creating if needed) the store rooted at `data_dir`.
    ///
    /// Documents that cannot be read or parsed are skipped with a warning so one damaged file
    /// does not take the whole service down.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::StorageDirCreation` if the patients directory cannot be created, or
    /// a read/parse error for an unreadable `sequences.yaml`.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        let patients_dir = data_dir.join(PATIENTS_DIR_NAME);
        fs::create_dir_all(&patients_dir).map_err(StoreError::StorageDirCreation)?;

        let docs = load_documents(&patients_dir);
        let sequences = load_sequences(&data_dir.join(SEQUENCES_FILENAME))?;
        tracing::info!(
            "loaded {} patient records from {}",
            docs.len(),
            patients_dir.display()
        );

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            inner: RwLock::new(Collection::from_parts(docs, sequences.patient_number)),
        })
    }

    fn patient_dir(&self, id: &RecordId) -> PathBuf {
        id.sharded_dir(&self.data_dir.join(PATIENTS_DIR_NAME))
    }

    fn write_patient(&self, patient: &Patient) -> StoreResult<()> {
        let dir = self.patient_dir(&patient.id);
        fs::create_dir_all(&dir).map_err(StoreError::StorageDirCreation)?;
        let yaml = serde_yaml::to_string(patient).map_err(StoreError::YamlSerialization)?;
        write_atomically(&dir.join(PATIENT_YAML_FILENAME), &yaml)
    }

    fn write_sequences(&self, sequence: PatientSequence) -> StoreResult<()> {
        let yaml = serde_yaml::to_string(&Sequences {
            patient_number: sequence,
        })
        .map_err(StoreError::YamlSerialization)?;
        write_atomically(&self.data_dir.join(SEQUENCES_FILENAME), &yaml)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Collection>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Collection>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

fn write_atomically(path: &Path, contents: &str) -> StoreResult<()> {
    let tmp = path.with_extension("yaml.tmp");
    fs::write(&tmp, contents).map_err(StoreError::FileWrite)?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::FileWrite(e)
    })
}

fn load_sequences(path: &Path) -> StoreResult<Sequences> {
    if !path.is_file() {
        return Ok(Sequences::default());
    }
    let contents = fs::read_to_string(path).map_err(StoreError::FileRead)?;
    serde_yaml::from_str(&contents).map_err(StoreError::YamlDeserialization)
}

/// Walks `patients/<s1>/<s2>/<id>/` and parses every `patient.yaml` found.
fn load_documents(patients_dir: &Path) -> Vec<Patient> {
    let mut patients = Vec::new();

    for s1 in subdirs(patients_dir) {
        for s2 in subdirs(&s1) {
            for id_path in subdirs(&s2) {
                let doc_path = id_path.join(PATIENT_YAML_FILENAME);
                if !doc_path.is_file() {
                    continue;
                }

                let contents = match fs::read_to_string(&doc_path) {
                    Ok(contents) => contents,
                    Err(e) => {
                        tracing::warn!("failed to read {}: {}", doc_path.display(), e);
                        continue;
                    }
                };

                match serde_yaml::from_str::<Patient>(&contents) {
                    Ok(patient) => patients.push(patient),
                    Err(e) => {
                        tracing::warn!("failed to parse patient: {}: {}", doc_path.display(), e)
                    }
                }
            }
        }
    }

    patients
}

fn subdirs(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect(),
        Err(_) => Vec::new(),
    }
}

impl PatientStore for FileStore {
    fn insert(&self, new: NewPatient) -> StoreResult<Patient> {
        let mut collection = self.write()?;
        let prepared = collection.prepare_insert(new, Utc::now())?;
        self.write_patient(&prepared.patient)?;
        let patient = collection.commit_insert(prepared);

        // The document is durable at this point; a lost counter is recovered from the labels
        // on the next open.
        if let Err(e) = self.write_sequences(collection.sequence()) {
            tracing::warn!("failed to persist patient number sequence: {}", e);
        }
        Ok(patient)
    }

    fn find(&self, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Patient>> {
        Ok(self.read()?.find(filter, options))
    }

    fn find_one(&self, filter: &Filter) -> StoreResult<Option<Patient>> {
        Ok(self.read()?.find_one(filter))
    }

    fn find_by_id(&self, id: &RecordId) -> StoreResult<Option<Patient>> {
        Ok(self.read()?.get(id).cloned())
    }

    fn update_by_id(&self, id: &RecordId, update: PatientUpdate) -> StoreResult<Option<Patient>> {
        let mut collection = self.write()?;
        let Some(updated) = collection.prepare_update(id, update, Utc::now())? else {
            return Ok(None);
        };
        self.write_patient(&updated)?;
        Ok(Some(collection.commit_replace(updated)))
    }

    fn delete_by_id(&self, id: &RecordId) -> StoreResult<Option<Patient>> {
        let mut collection = self.write()?;
        if collection.get(id).is_none() {
            return Ok(None);
        }
        fs::remove_dir_all(self.patient_dir(id)).map_err(StoreError::FileRemove)?;
        Ok(collection.remove(id))
    }

    fn count(&self, filter: &Filter) -> StoreResult<u64> {
        Ok(self.read()?.count(filter))
    }

    fn scan(&self) -> StoreResult<Vec<Patient>> {
        Ok(self.read()?.all())
    }
}
