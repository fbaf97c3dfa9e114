use super::collection::Collection;
use super::{Filter, FindOptions, PatientStore, StoreError, StoreResult};
use crate::model::{NewPatient, Patient, PatientUpdate};
use caretrack_uuid::RecordId;
use chrono::Utc;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A store that keeps every document in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Collection>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Collection>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl PatientStore for MemoryStore {
    fn insert(&self, new: NewPatient) -> StoreResult<Patient> {
        let mut collection = self.write()?;
        let prepared = collection.prepare_insert(new, Utc::now())?;
        Ok(collection.commit_insert(prepared))
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
        let updated = collection.prepare_update(id, update, Utc::now())?;
        Ok(updated.map(|patient| collection.commit_replace(patient)))
    }

    fn delete_by_id(&self, id: &RecordId) -> StoreResult<Option<Patient>> {
        Ok(self.write()?.remove(id))
    }

    fn count(&self, filter: &Filter) -> StoreResult<u64> {
        Ok(self.read()?.count(filter))
    }

    fn scan(&self) -> StoreResult<Vec<Patient>> {
        Ok(self.read()?.all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{fields, new_patient, prescription};
    use crate::store::{SortField, SortOrder, SortSpec, UniqueField};

    #[test]
    fn insert_assigns_sequential_numbers_from_baseline() {
        let store = MemoryStore::new();
        let first = store
            .insert(new_patient("Ann", "Lee", "ann@example.com", "100"))
            .unwrap();
        let second = store
            .insert(new_patient("Bob", "Ray", "bob@example.com", "200"))
            .unwrap();

        assert_eq!(first.patient_id, "PT1001");
        assert_eq!(second.patient_id, "PT1002");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn insert_rejects_duplicate_contact_without_consuming_a_number() {
        let store = MemoryStore::new();
        store
            .insert(new_patient("Ann", "Lee", "ann@example.com", "100"))
            .unwrap();

        let err = store
            .insert(new_patient("Ann", "Twin", "ANN@example.com", "100"))
            .unwrap_err();
        match err {
            StoreError::ConstraintViolation { fields } => {
                assert_eq!(fields, vec![UniqueField::Email, UniqueField::Phone]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let next = store
            .insert(new_patient("Cat", "Kim", "cat@example.com", "300"))
            .unwrap();
        assert_eq!(next.patient_id, "PT1002");
    }

    #[test]
    fn update_constraint_failure_leaves_record_untouched() {
        let store = MemoryStore::new();
        store
            .insert(new_patient("Ann", "Lee", "ann@example.com", "100"))
            .unwrap();
        let bob = store
            .insert(new_patient("Bob", "Ray", "bob@example.com", "200"))
            .unwrap();

        let err = store
            .update_by_id(
                &bob.id,
                PatientUpdate::Replace {
                    fields: fields("Robert", "Ray", "ann@example.com", "200"),
                    prescriptions: vec![prescription("Aspirin")],
                    visits: vec![],
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation { .. }));

        let unchanged = store.find_by_id(&bob.id).unwrap().unwrap();
        assert_eq!(unchanged, bob);
    }

    #[test]
    fn update_unknown_id_returns_none() {
        let store = MemoryStore::new();
        let result = store
            .update_by_id(
                &RecordId::new(),
                PatientUpdate::AddPrescription(prescription("Aspirin")),
            )
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn find_sorts_skips_and_limits() {
        let store = MemoryStore::new();
        for (i, name) in ["Cara", "Abe", "Bea"].iter().enumerate() {
            store
                .insert(new_patient(
                    name,
                    "X",
                    &format!("{name}@example.com"),
                    &i.to_string(),
                ))
                .unwrap();
        }

        let options = FindOptions {
            sort: Some(SortSpec {
                field: SortField::FirstName,
                order: SortOrder::Asc,
            }),
            skip: 1,
            limit: Some(1),
        };
        let page = store.find(&Filter::All, &options).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].first_name.as_str(), "Bea");
    }

    #[test]
    fn delete_then_find_returns_none() {
        let store = MemoryStore::new();
        let ann = store
            .insert(new_patient("Ann", "Lee", "ann@example.com", "100"))
            .unwrap();

        assert!(store.delete_by_id(&ann.id).unwrap().is_some());
        assert!(store.find_by_id(&ann.id).unwrap().is_none());
        assert!(store.delete_by_id(&ann.id).unwrap().is_none());
    }
}
