//! Record store boundary.
//!
//! [`PatientStore`] is the document-store contract the service is written against. Two
//! implementations share one in-process [`Collection`](collection::Collection):
//!
//! - [`MemoryStore`]: nothing persisted; used by tests and the `memory` backend.
//! - [`FileStore`]: write-through YAML documents in sharded directories.
//!
//! Every write runs inside the store's write lock, which is what makes the unique constraints
//! on `email`, `phone` and `patientId` authoritative and each update all-or-nothing.

mod collection;
mod file;
mod filter;
mod memory;

pub use file::FileStore;
pub use filter::{Filter, FilterField};
pub use memory::MemoryStore;

use crate::model::{NewPatient, Patient, PatientUpdate};
use crate::patient_number::PatientNumber;
use caretrack_uuid::RecordId;
use std::cmp::Ordering;
use std::str::FromStr;

/// Fields covered by a store-level unique constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Phone,
    PatientId,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated on {fields:?}")]
    ConstraintViolation { fields: Vec<UniqueField> },
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write patient file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read patient file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to remove patient file: {0}")]
    FileRemove(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    PatientId,
    FirstName,
    LastName,
    Dob,
    LastVisit,
    Email,
    Phone,
    Gender,
    Department,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "createdAt" => SortField::CreatedAt,
            "updatedAt" => SortField::UpdatedAt,
            "patientId" => SortField::PatientId,
            "firstName" => SortField::FirstName,
            "lastName" => SortField::LastName,
            "dob" => SortField::Dob,
            "lastVisit" => SortField::LastVisit,
            "email" => SortField::Email,
            "phone" => SortField::Phone,
            "gender" => SortField::Gender,
            "department" => SortField::Department,
            other => return Err(format!("cannot sort by '{other}'")),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("sort order must be 'asc' or 'desc', got '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl SortSpec {
    /// Orders two patients by this sort. Missing values sort before present ones, as in
    /// ascending document-store order.
    pub fn compare(&self, a: &Patient, b: &Patient) -> Ordering {
        let ordering = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::PatientId => PatientNumber::parse(&a.patient_id)
                .cmp(&PatientNumber::parse(&b.patient_id))
                .then_with(|| a.patient_id.cmp(&b.patient_id)),
            SortField::FirstName => a.first_name.cmp(&b.first_name),
            SortField::LastName => a.last_name.cmp(&b.last_name),
            SortField::Dob => a.dob.cmp(&b.dob),
            SortField::LastVisit => a.last_visit.cmp(&b.last_visit),
            SortField::Email => a.email.cmp(&b.email),
            SortField::Phone => a.phone.cmp(&b.phone),
            SortField::Gender => a.gender.cmp(&b.gender),
            SortField::Department => a.department.cmp(&b.department),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Sort, skip and limit for [`PatientStore::find`].
#[derive(Clone, Debug, Default)]
pub struct FindOptions {
    pub sort: Option<SortSpec>,
    pub skip: usize,
    pub limit: Option<usize>,
}

/// The document-store contract.
///
/// Results of `find` without a sort come back in creation order; sorted results keep creation
/// order among equal keys.
pub trait PatientStore: Send + Sync {
    /// Stores a new patient, assigning its record id, patient number and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConstraintViolation`] when email, phone or patient number are
    /// already taken.
    fn insert(&self, new: NewPatient) -> StoreResult<Patient>;

    fn find(&self, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Patient>>;

    fn find_one(&self, filter: &Filter) -> StoreResult<Option<Patient>>;

    fn find_by_id(&self, id: &RecordId) -> StoreResult<Option<Patient>>;

    /// Applies `update` atomically. Returns `Ok(None)` if no record has this id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConstraintViolation`] when the updated contact details collide
    /// with another record; the stored record is then left untouched.
    fn update_by_id(&self, id: &RecordId, update: PatientUpdate) -> StoreResult<Option<Patient>>;

    /// Removes and returns the record, or `Ok(None)` if there was none.
    fn delete_by_id(&self, id: &RecordId) -> StoreResult<Option<Patient>>;

    fn count(&self, filter: &Filter) -> StoreResult<u64>;

    /// Every stored patient in creation order; the input of the aggregation reports.
    fn scan(&self) -> StoreResult<Vec<Patient>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_names_match_wire_names() {
        assert_eq!("createdAt".parse::<SortField>(), Ok(SortField::CreatedAt));
        assert_eq!("lastVisit".parse::<SortField>(), Ok(SortField::LastVisit));
        assert!("created_at".parse::<SortField>().is_err());
    }

    #[test]
    fn sort_order_is_case_insensitive() {
        assert_eq!("ASC".parse::<SortOrder>(), Ok(SortOrder::Asc));
        assert!("up".parse::<SortOrder>().is_err());
    }
}
