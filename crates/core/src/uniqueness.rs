//! Duplicate-contact detection.
//!
//! Two layers guard the email/phone uniqueness invariant:
//! 1. a pre-check query run by the service before writing, which gives a precise message in the
//!    common case but can race with a concurrent create, and
//! 2. the store's unique constraint, checked inside its write section, which is authoritative.
//!
//! Both layers classify a collision the same way.

use crate::model::Patient;
use crate::store::{Filter, FilterField, StoreError, UniqueField};
use crate::PatientError;
use caretrack_types::{EmailAddress, NonEmptyText};
use caretrack_uuid::RecordId;

/// Which contact details collided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactCollision {
    Both,
    Email,
    Phone,
}

impl ContactCollision {
    fn from_flags(email: bool, phone: bool) -> Option<Self> {
        match (email, phone) {
            (true, true) => Some(ContactCollision::Both),
            (true, false) => Some(ContactCollision::Email),
            (false, true) => Some(ContactCollision::Phone),
            (false, false) => None,
        }
    }

    pub fn into_error(self) -> PatientError {
        match self {
            ContactCollision::Both => PatientError::DuplicateContact,
            ContactCollision::Email => PatientError::DuplicateEmail,
            ContactCollision::Phone => PatientError::DuplicatePhone,
        }
    }
}

/// Records whose email OR phone equals the given ones, optionally excluding one record.
pub fn duplicate_filter(
    email: &EmailAddress,
    phone: &NonEmptyText,
    exclude: Option<RecordId>,
) -> Filter {
    let contact = Filter::Or(vec![
        Filter::Equals(FilterField::Email, email.to_string()),
        Filter::Equals(FilterField::Phone, phone.to_string()),
    ]);
    match exclude {
        Some(id) => Filter::And(vec![contact, Filter::NotId(id)]),
        None => contact,
    }
}

/// Classifies the pre-check result across every matching record.
pub fn classify_existing(
    existing: &[Patient],
    email: &EmailAddress,
    phone: &NonEmptyText,
) -> Option<ContactCollision> {
    let email_taken = existing.iter().any(|p| &p.email == email);
    let phone_taken = existing.iter().any(|p| &p.phone == phone);
    ContactCollision::from_flags(email_taken, phone_taken)
}

/// Maps a failed store write to the service error, re-deriving the duplicate classification
/// from the constrained fields the store reported.
pub fn map_write_error(err: StoreError) -> PatientError {
    match err {
        StoreError::ConstraintViolation { fields } => {
            let email = fields.contains(&UniqueField::Email);
            let phone = fields.contains(&UniqueField::Phone);
            ContactCollision::from_flags(email, phone)
                .map(ContactCollision::into_error)
                .unwrap_or(PatientError::DuplicatePatient)
        }
        other => PatientError::Store(other),
    }
}
