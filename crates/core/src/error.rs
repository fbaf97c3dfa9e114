use crate::store::StoreError;
use std::fmt;

/// A single problem with one input field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    /// Wire name of the field, e.g. `email` or `visits[1].date`.
    pub field: String,
    pub message: String,
}

/// Every field problem found in one request, in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Returns `Ok(value)` when no problems were recorded.
    pub(crate) fn finish<T>(self, value: T) -> PatientResult<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(PatientError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("A patient with this email and phone number already exists.")]
    DuplicateContact,
    #[error("A patient with this email already exists.")]
    DuplicateEmail,
    #[error("A patient with this phone number already exists.")]
    DuplicatePhone,
    #[error("A patient with this information already exists.")]
    DuplicatePatient,
    #[error("Patient not found")]
    NotFound,
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;
