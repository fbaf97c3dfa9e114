//! # API REST
//!
//! REST API implementation for CareTrack.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! Handlers are thin: they decode the request, call [`PatientService`] and map its result onto
//! the wire types from `api-shared`.

#![warn(rust_2018_idioms)]

mod error;

pub use error::ApiError;

use api_shared::wire::{
    ActivityKind, ActivityRes, AgeGroupsRes, ConditionCountRes, DeletePatientRes,
    DemographicsRes, DepartmentAgeRes, ErrorRes, FieldErrorRes, GenderCountRes, HealthRes,
    ListPatientsParams, MedicalHistoryInput, MedicalHistoryReq, MedicalHistoryRes,
    MedicationCountRes, MonthlyVisitsRes, PatientReq, PatientRes, PrescriptionReq,
    PrescriptionRes, SearchParams, SearchRes, SummaryRes, VisitReq, VisitRes,
};
use api_shared::HealthService;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use caretrack_core::{Patient, PatientService};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server
///
/// Shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub patient_service: PatientService,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_patients,
        get_patient,
        create_patient,
        update_patient,
        delete_patient,
        add_medical_history,
        add_visit,
        add_prescription,
        advanced_search,
        patients_per_condition,
        most_prescribed_medications,
        average_age_per_department,
        visits_per_month,
        demographics,
        summary,
    ),
    components(schemas(
        HealthRes,
        PatientReq,
        VisitReq,
        PrescriptionReq,
        MedicalHistoryReq,
        MedicalHistoryInput,
        PatientRes,
        VisitRes,
        PrescriptionRes,
        MedicalHistoryRes,
        SearchRes,
        DeletePatientRes,
        ConditionCountRes,
        MedicationCountRes,
        DepartmentAgeRes,
        MonthlyVisitsRes,
        GenderCountRes,
        AgeGroupsRes,
        DemographicsRes,
        ActivityKind,
        ActivityRes,
        SummaryRes,
        ErrorRes,
        FieldErrorRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full application router, including Swagger UI at `/swagger-ui`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/patients", get(list_patients).post(create_patient))
        .route("/api/patients/advanced-search", get(advanced_search))
        .route(
            "/api/patients/analytics/patients-per-condition",
            get(patients_per_condition),
        )
        .route(
            "/api/patients/analytics/most-prescribed-medications",
            get(most_prescribed_medications),
        )
        .route(
            "/api/patients/analytics/average-age-per-department",
            get(average_age_per_department),
        )
        .route(
            "/api/patients/analytics/visits-per-month",
            get(visits_per_month),
        )
        .route("/api/patients/analytics/demographics", get(demographics))
        .route("/api/patients/analytics/summary", get(summary))
        .route(
            "/api/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route(
            "/api/patients/:id/medical-history",
            post(add_medical_history),
        )
        .route("/api/patients/:id/visits", post(add_visit))
        .route("/api/patients/:id/prescriptions", post(add_prescription))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn to_res(patients: Vec<Patient>) -> Vec<PatientRes> {
    patients.iter().map(Patient::to_res).collect()
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/api/patients",
    params(ListPatientsParams),
    responses(
        (status = 200, description = "Patients in creation order", body = [PatientRes]),
        (status = 404, description = "No patient has the requested patientId", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List every patient, or only the one whose `patientId` matches exactly.
#[axum::debug_handler]
async fn list_patients(
    State(state): State<AppState>,
    Query(params): Query<ListPatientsParams>,
) -> ApiResult<Vec<PatientRes>> {
    let patients = state
        .patient_service
        .list_patients(params.patient_id.as_deref())?;
    Ok(Json(to_res(patients)))
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}",
    params(("id" = String, Path, description = "Record id")),
    responses(
        (status = 200, description = "The patient", body = PatientRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PatientRes> {
    let patient = state.patient_service.get_patient(&id)?;
    Ok(Json(patient.to_res()))
}

#[utoipa::path(
    post,
    path = "/api/patients",
    request_body = PatientReq,
    responses(
        (status = 201, description = "Patient created", body = PatientRes),
        (status = 400, description = "Validation failure or duplicate contact details", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Create a patient. The `patientId` is assigned by the server.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    payload: Result<Json<PatientReq>, JsonRejection>,
) -> Result<(StatusCode, Json<PatientRes>), ApiError> {
    let Json(req) = payload?;
    let patient = state.patient_service.create_patient(req)?;
    Ok((StatusCode::CREATED, Json(patient.to_res())))
}

#[utoipa::path(
    put,
    path = "/api/patients/{id}",
    params(("id" = String, Path, description = "Record id")),
    request_body = PatientReq,
    responses(
        (status = 200, description = "Patient updated", body = PatientRes),
        (status = 400, description = "Validation failure or duplicate contact details", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
/// Replace a patient's fields. Prescriptions and visits in the body are appended.
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PatientReq>, JsonRejection>,
) -> ApiResult<PatientRes> {
    let Json(req) = payload?;
    let patient = state.patient_service.update_patient(&id, req)?;
    Ok(Json(patient.to_res()))
}

#[utoipa::path(
    delete,
    path = "/api/patients/{id}",
    params(("id" = String, Path, description = "Record id")),
    responses(
        (status = 200, description = "Patient deleted", body = DeletePatientRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeletePatientRes> {
    state.patient_service.delete_patient(&id)?;
    Ok(Json(DeletePatientRes {
        message: "Patient deleted".into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/patients/{id}/medical-history",
    params(("id" = String, Path, description = "Record id")),
    request_body = MedicalHistoryReq,
    responses(
        (status = 200, description = "Entry appended", body = PatientRes),
        (status = 400, description = "Validation failure", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn add_medical_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<MedicalHistoryReq>, JsonRejection>,
) -> ApiResult<PatientRes> {
    let Json(req) = payload?;
    let patient = state.patient_service.add_medical_history(&id, req)?;
    Ok(Json(patient.to_res()))
}

#[utoipa::path(
    post,
    path = "/api/patients/{id}/visits",
    params(("id" = String, Path, description = "Record id")),
    request_body = VisitReq,
    responses(
        (status = 200, description = "Visit appended and lastVisit moved", body = PatientRes),
        (status = 400, description = "Validation failure", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn add_visit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<VisitReq>, JsonRejection>,
) -> ApiResult<PatientRes> {
    let Json(req) = payload?;
    let patient = state.patient_service.add_visit(&id, req)?;
    Ok(Json(patient.to_res()))
}

#[utoipa::path(
    post,
    path = "/api/patients/{id}/prescriptions",
    params(("id" = String, Path, description = "Record id")),
    request_body = PrescriptionReq,
    responses(
        (status = 200, description = "Prescription appended", body = PatientRes),
        (status = 400, description = "Validation failure", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn add_prescription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PrescriptionReq>, JsonRejection>,
) -> ApiResult<PatientRes> {
    let Json(req) = payload?;
    let patient = state.patient_service.add_prescription(&id, req)?;
    Ok(Json(patient.to_res()))
}

#[utoipa::path(
    get,
    path = "/api/patients/advanced-search",
    params(SearchParams),
    responses(
        (status = 200, description = "One page of matching patients", body = SearchRes),
        (status = 400, description = "Bad sort or paging parameter", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn advanced_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<SearchRes> {
    let page = state.patient_service.advanced_search(params)?;
    Ok(Json(page.to_res()))
}

#[utoipa::path(
    get,
    path = "/api/patients/analytics/patients-per-condition",
    responses(
        (status = 200, description = "Medical history entries per condition", body = [ConditionCountRes])
    )
)]
#[axum::debug_handler]
async fn patients_per_condition(
    State(state): State<AppState>,
) -> ApiResult<Vec<ConditionCountRes>> {
    Ok(Json(state.patient_service.patients_per_condition()?))
}

#[utoipa::path(
    get,
    path = "/api/patients/analytics/most-prescribed-medications",
    responses(
        (status = 200, description = "Prescriptions per medication, most frequent first", body = [MedicationCountRes])
    )
)]
#[axum::debug_handler]
async fn most_prescribed_medications(
    State(state): State<AppState>,
) -> ApiResult<Vec<MedicationCountRes>> {
    Ok(Json(state.patient_service.most_prescribed_medications()?))
}

#[utoipa::path(
    get,
    path = "/api/patients/analytics/average-age-per-department",
    responses(
        (status = 200, description = "Average whole-year age per department", body = [DepartmentAgeRes])
    )
)]
#[axum::debug_handler]
async fn average_age_per_department(
    State(state): State<AppState>,
) -> ApiResult<Vec<DepartmentAgeRes>> {
    Ok(Json(state.patient_service.average_age_per_department()?))
}

#[utoipa::path(
    get,
    path = "/api/patients/analytics/visits-per-month",
    responses(
        (status = 200, description = "Visits per YYYY-MM, oldest first", body = [MonthlyVisitsRes])
    )
)]
#[axum::debug_handler]
async fn visits_per_month(State(state): State<AppState>) -> ApiResult<Vec<MonthlyVisitsRes>> {
    Ok(Json(state.patient_service.visits_per_month()?))
}

#[utoipa::path(
    get,
    path = "/api/patients/analytics/demographics",
    responses(
        (status = 200, description = "Gender split and age groups", body = DemographicsRes)
    )
)]
#[axum::debug_handler]
async fn demographics(State(state): State<AppState>) -> ApiResult<DemographicsRes> {
    Ok(Json(state.patient_service.demographics()?))
}

#[utoipa::path(
    get,
    path = "/api/patients/analytics/summary",
    responses(
        (status = 200, description = "Dashboard totals and recent activity", body = SummaryRes)
    )
)]
#[axum::debug_handler]
async fn summary(State(state): State<AppState>) -> ApiResult<SummaryRes> {
    Ok(Json(state.patient_service.summary()?))
}
