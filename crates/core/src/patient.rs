//! Patient service.
//!
//! Pure patient operations over a [`PatientStore`]; no HTTP concerns. Request bodies arrive as
//! wire types and are validated here, so every surface (REST, CLI) applies the same rules.

use crate::analytics;
use crate::config::CoreConfig;
use crate::model::{Patient, PatientUpdate};
use crate::query::{self, SearchPage, SearchQuery};
use crate::store::{Filter, FilterField, FindOptions, PatientStore};
use crate::uniqueness::{classify_existing, duplicate_filter, map_write_error};
use crate::validation::{
    validate_medical_history, validate_patient, validate_prescription, validate_visit,
};
use crate::{PatientError, PatientResult};
use api_shared::wire::{
    ConditionCountRes, DemographicsRes, DepartmentAgeRes, MedicalHistoryReq, MedicationCountRes,
    MonthlyVisitsRes, PatientReq, PrescriptionReq, SearchParams, SummaryRes, VisitReq,
};
use caretrack_types::{EmailAddress, NonEmptyText};
use caretrack_uuid::RecordId;
use chrono::Utc;
use std::sync::Arc;

#[derive(Clone)]
pub struct PatientService {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn PatientStore>,
}

impl PatientService {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn PatientStore>) -> Self {
        Self { cfg, store }
    }

    /// Opens the store named by `cfg` and wraps it in a service.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Store` if the store cannot be opened.
    pub fn open(cfg: Arc<CoreConfig>) -> PatientResult<Self> {
        let store = cfg.open_store()?;
        Ok(Self::new(cfg, store))
    }

    /// Every patient in creation order, or only those whose `patientId` equals `patient_id`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::NotFound` when a `patient_id` is given and nothing matches.
    pub fn list_patients(&self, patient_id: Option<&str>) -> PatientResult<Vec<Patient>> {
        let Some(label) = patient_id.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(self.store.scan()?);
        };

        let filter = Filter::Equals(FilterField::PatientId, label.to_string());
        let patients = self.store.find(&filter, &FindOptions::default())?;
        if patients.is_empty() {
            return Err(PatientError::NotFound);
        }
        Ok(patients)
    }

    /// # Errors
    ///
    /// Returns `PatientError::NotFound` for an unknown or malformed id.
    pub fn get_patient(&self, id: &str) -> PatientResult<Patient> {
        let id = parse_id(id)?;
        self.store.find_by_id(&id)?.ok_or(PatientError::NotFound)
    }

    /// Validates and stores a new patient, assigning its `PT<n>` number.
    ///
    /// # Errors
    ///
    /// - `PatientError::Validation` for missing or malformed fields.
    /// - `PatientError::Duplicate*` when email or phone already belong to a patient.
    /// - `PatientError::Store` when the write fails.
    pub fn create_patient(&self, req: PatientReq) -> PatientResult<Patient> {
        let new = validate_patient(req, Utc::now().date_naive())?;
        self.ensure_contact_free(&new.fields.email, &new.fields.phone, None)?;

        let patient = self.store.insert(new).map_err(map_write_error)?;
        tracing::info!("created patient {} ({})", patient.patient_id, patient.id);
        Ok(patient)
    }

    /// Replaces the scalar fields and appends any given prescriptions and visits, atomically.
    ///
    /// # Errors
    ///
    /// As [`create_patient`](Self::create_patient), plus `PatientError::NotFound`.
    pub fn update_patient(&self, id: &str, req: PatientReq) -> PatientResult<Patient> {
        let id = parse_id(id)?;
        let new = validate_patient(req, Utc::now().date_naive())?;
        self.ensure_contact_free(&new.fields.email, &new.fields.phone, Some(id))?;

        let update = PatientUpdate::Replace {
            fields: new.fields,
            prescriptions: new.prescriptions,
            visits: new.visits,
        };
        let patient = self.apply(&id, update)?;
        tracing::info!("updated patient {} ({})", patient.patient_id, patient.id);
        Ok(patient)
    }

    /// # Errors
    ///
    /// Returns `PatientError::NotFound` if nothing was deleted.
    pub fn delete_patient(&self, id: &str) -> PatientResult<Patient> {
        let id = parse_id(id)?;
        let patient = self.store.delete_by_id(&id)?.ok_or(PatientError::NotFound)?;
        tracing::info!("deleted patient {} ({})", patient.patient_id, patient.id);
        Ok(patient)
    }

    /// Appends one visit and moves `lastVisit` to its date.
    pub fn add_visit(&self, id: &str, req: VisitReq) -> PatientResult<Patient> {
        let id = parse_id(id)?;
        let visit = validate_visit(req)?;
        self.apply(&id, PatientUpdate::AddVisit(visit))
    }

    pub fn add_prescription(&self, id: &str, req: PrescriptionReq) -> PatientResult<Patient> {
        let id = parse_id(id)?;
        let prescription = validate_prescription(req)?;
        self.apply(&id, PatientUpdate::AddPrescription(prescription))
    }

    pub fn add_medical_history(&self, id: &str, req: MedicalHistoryReq) -> PatientResult<Patient> {
        let id = parse_id(id)?;
        let entry = validate_medical_history(req)?;
        self.apply(&id, PatientUpdate::AddMedicalHistory(entry))
    }

    /// Filtered, sorted and paginated search.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Validation` for bad sort or paging parameters.
    pub fn advanced_search(&self, params: SearchParams) -> PatientResult<SearchPage> {
        let query = SearchQuery::from_params(params, &self.cfg)?;
        query::run(self.store.as_ref(), &query)
    }

    pub fn patients_per_condition(&self) -> PatientResult<Vec<ConditionCountRes>> {
        Ok(analytics::patients_per_condition(&self.store.scan()?))
    }

    pub fn most_prescribed_medications(&self) -> PatientResult<Vec<MedicationCountRes>> {
        Ok(analytics::most_prescribed_medications(&self.store.scan()?))
    }

    pub fn average_age_per_department(&self) -> PatientResult<Vec<DepartmentAgeRes>> {
        Ok(analytics::average_age_per_department(
            &self.store.scan()?,
            Utc::now(),
        ))
    }

    pub fn visits_per_month(&self) -> PatientResult<Vec<MonthlyVisitsRes>> {
        Ok(analytics::visits_per_month(&self.store.scan()?))
    }

    pub fn demographics(&self) -> PatientResult<DemographicsRes> {
        Ok(analytics::demographics(&self.store.scan()?, Utc::now()))
    }

    pub fn summary(&self) -> PatientResult<SummaryRes> {
        Ok(analytics::summary(&self.store.scan()?, Utc::now()))
    }

    /// The advisory duplicate check. The store repeats it authoritatively inside the write.
    fn ensure_contact_free(
        &self,
        email: &EmailAddress,
        phone: &NonEmptyText,
        exclude: Option<RecordId>,
    ) -> PatientResult<()> {
        let existing = self
            .store
            .find(&duplicate_filter(email, phone, exclude), &FindOptions::default())?;
        match classify_existing(&existing, email, phone) {
            Some(collision) => {
                tracing::debug!("rejected duplicate contact details: {:?}", collision);
                Err(collision.into_error())
            }
            None => Ok(()),
        }
    }

    fn apply(&self, id: &RecordId, update: PatientUpdate) -> PatientResult<Patient> {
        self.store
            .update_by_id(id, update)
            .map_err(map_write_error)?
            .ok_or(PatientError::NotFound)
    }
}

/// Path ids that are not canonical record ids cannot name a record.
fn parse_id(id: &str) -> PatientResult<RecordId> {
    RecordId::parse(id).map_err(|_| PatientError::NotFound)
}
