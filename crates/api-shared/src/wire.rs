//! HTTP wire types.
//!
//! Request bodies keep every field optional so that missing values reach the core validator and
//! are reported per field, instead of failing JSON extraction with one opaque message.
//! Response types are what the core hands back to the API layer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// ============================================================================
// REQUESTS
// ============================================================================

/// Body of `POST /api/patients` and `PUT /api/patients/{id}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PatientReq {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Date of birth, `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub department: Option<String>,
    pub medical_history: Option<MedicalHistoryInput>,
    /// On update these are appended to the existing prescriptions.
    pub prescriptions: Option<Vec<PrescriptionReq>>,
    /// On update these are appended to the existing visits.
    pub visits: Option<Vec<VisitReq>>,
    pub last_visit: Option<String>,
}

/// Body of `POST /api/patients/{id}/visits`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct VisitReq {
    pub date: Option<String>,
    pub reason: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
}

/// Body of `POST /api/patients/{id}/prescriptions`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PrescriptionReq {
    pub medication_name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub notes: Option<String>,
}

/// Body of `POST /api/patients/{id}/medical-history`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct MedicalHistoryReq {
    pub condition: Option<String>,
    pub diagnosis_date: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
}

/// Medical history as sent by clients: older clients send a single `{ condition }` object,
/// newer ones an array of entries.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum MedicalHistoryInput {
    Many(Vec<MedicalHistoryReq>),
    One(MedicalHistoryReq),
}

impl MedicalHistoryInput {
    pub fn into_entries(self) -> Vec<MedicalHistoryReq> {
        match self {
            MedicalHistoryInput::Many(entries) => entries,
            MedicalHistoryInput::One(entry) => vec![entry],
        }
    }
}

/// Query parameters of `GET /api/patients`.
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ListPatientsParams {
    /// Exact human-facing identifier, e.g. `PT1001`.
    pub patient_id: Option<String>,
}

/// Query parameters of `GET /api/patients/advanced-search`.
///
/// Numbers arrive as strings and are validated by the core so that a bad `page` is reported
/// in the usual error envelope.
#[derive(Clone, Debug, Default, Serialize, Deserialize, IntoParams)]
#[serde(default, rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct SearchParams {
    /// Case-insensitive substring of first name, last name or phone, or an exact record id.
    pub search: Option<String>,
    /// Case-insensitive substring of a medical history condition.
    pub condition: Option<String>,
    /// Case-insensitive substring of any visit date (`YYYY-MM-DD`).
    pub visit_date: Option<String>,
    /// Defaults to `createdAt`.
    pub sort_field: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_order: Option<String>,
    /// 1-based, defaults to 1.
    pub page: Option<String>,
    /// Defaults to 10.
    pub page_size: Option<String>,
}

// ============================================================================
// RESPONSES
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientRes {
    /// Store-assigned record id (32 lowercase hex characters).
    pub id: String,
    /// Human-facing identifier, `PT<n>`.
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub gender: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medications: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub medical_history: Vec<MedicalHistoryRes>,
    pub prescriptions: Vec<PrescriptionRes>,
    pub visits: Vec<VisitRes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_visit: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisitRes {
    pub date: NaiveDate,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionRes {
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistoryRes {
    pub condition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One page of the advanced search.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchRes {
    pub patients: Vec<PatientRes>,
    /// Always at least 1, even when nothing matched.
    pub total_pages: u64,
    /// Number of records matching the filters across all pages.
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletePatientRes {
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ConditionCountRes {
    pub condition: String,
    pub count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicationCountRes {
    pub medication_name: String,
    pub count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentAgeRes {
    /// `null` groups patients with no department recorded.
    pub department: Option<String>,
    pub average_age: f64,
    pub patients: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct MonthlyVisitsRes {
    /// `YYYY-MM`
    pub month: String,
    pub count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GenderCountRes {
    pub gender: String,
    pub count: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgeGroupsRes {
    pub under18: u64,
    pub age18_to35: u64,
    pub age36_to55: u64,
    pub over55: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DemographicsRes {
    pub by_gender: Vec<GenderCountRes>,
    pub age_groups: AgeGroupsRes,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub enum ActivityKind {
    Added,
    Edited,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRes {
    pub id: String,
    pub patient_id: String,
    pub name: String,
    pub activity: ActivityKind,
    pub at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRes {
    pub total_patients: u64,
    pub new_patients_this_month: u64,
    pub upcoming_visits: u64,
    pub patients_with_prescriptions: u64,
    pub recent_activity: Vec<ActivityRes>,
}

/// The single error envelope used by every endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ErrorRes {
    pub message: String,
    /// Per-field problems, present for validation failures only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldErrorRes>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct FieldErrorRes {
    pub field: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}
