//! The error envelope shared by every endpoint.

use api_shared::wire::{ErrorRes, FieldErrorRes};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use caretrack_core::PatientError;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorRes,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorRes {
                message: message.into(),
                errors: vec![],
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<PatientError> for ApiError {
    fn from(err: PatientError) -> Self {
        let (status, message, errors) = match &err {
            PatientError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                fields
                    .fields()
                    .iter()
                    .map(|f| FieldErrorRes {
                        field: f.field.clone(),
                        message: f.message.clone(),
                    })
                    .collect(),
            ),
            PatientError::InvalidInput(_)
            | PatientError::DuplicateContact
            | PatientError::DuplicateEmail
            | PatientError::DuplicatePhone
            | PatientError::DuplicatePatient => {
                (StatusCode::BAD_REQUEST, err.to_string(), vec![])
            }
            PatientError::NotFound => (StatusCode::NOT_FOUND, err.to_string(), vec![]),
            PatientError::Store(e) => {
                tracing::error!("store error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    vec![],
                )
            }
        };

        Self {
            status,
            body: ErrorRes { message, errors },
        }
    }
}

/// Malformed JSON bodies are reported in the same envelope as validation failures.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caretrack_core::ValidationErrors;

    #[test]
    fn maps_error_kinds_to_status_codes() {
        assert_eq!(
            ApiError::from(PatientError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(PatientError::DuplicatePhone).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(PatientError::Store(caretrack_core::StoreError::Poisoned)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_errors_carry_fields() {
        let err = ApiError::from(PatientError::Validation(ValidationErrors::single(
            "email",
            "email is required",
        )));
        assert_eq!(err.body.errors.len(), 1);
        assert_eq!(err.body.errors[0].field, "email");
    }
}
