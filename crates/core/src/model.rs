//! Patient aggregate and its embedded records.
//!
//! `Patient` is the stored document (serialised camelCase, so the on-disk YAML reads like the
//! HTTP payloads). Embedded records have no identity of their own.
//!
//! Writes go through two carriers:
//! - [`NewPatient`]: a validated create request; the store adds id, number and timestamps.
//! - [`PatientUpdate`]: one atomic mutation, applied by the store inside its write section.

use api_shared::wire;
use caretrack_types::{EmailAddress, NonEmptyText};
use caretrack_uuid::RecordId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: RecordId,
    /// Human-facing `PT<n>` label. Kept as text so documents with a legacy label still load.
    pub patient_id: String,
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
    pub dob: NaiveDate,
    pub gender: NonEmptyText,
    pub phone: NonEmptyText,
    pub email: EmailAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medications: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default)]
    pub medical_history: Vec<MedicalHistoryEntry>,
    #[serde(default)]
    pub prescriptions: Vec<Prescription>,
    #[serde(default)]
    pub visits: Vec<Visit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visit: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub date: NaiveDate,
    pub reason: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub medication_name: NonEmptyText,
    pub dosage: NonEmptyText,
    pub frequency: NonEmptyText,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistoryEntry {
    pub condition: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The replaceable part of a patient: everything a full update overwrites.
#[derive(Clone, Debug, PartialEq)]
pub struct PatientFields {
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
    pub dob: NaiveDate,
    pub gender: NonEmptyText,
    pub phone: NonEmptyText,
    pub email: EmailAddress,
    pub address: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub department: Option<String>,
    pub medical_history: Vec<MedicalHistoryEntry>,
    pub last_visit: Option<NaiveDate>,
}

/// A validated create request.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPatient {
    pub fields: PatientFields,
    pub prescriptions: Vec<Prescription>,
    pub visits: Vec<Visit>,
}

impl NewPatient {
    /// Materialises the stored document. Only the store calls this, inside its write section.
    pub(crate) fn into_patient(
        self,
        id: RecordId,
        patient_id: String,
        now: DateTime<Utc>,
    ) -> Patient {
        let f = self.fields;
        let last_visit = f.last_visit.or_else(|| latest_visit_date(&self.visits));
        Patient {
            id,
            patient_id,
            first_name: f.first_name,
            last_name: f.last_name,
            dob: f.dob,
            gender: f.gender,
            phone: f.phone,
            email: f.email,
            address: f.address,
            allergies: f.allergies,
            medications: f.medications,
            department: f.department,
            medical_history: f.medical_history,
            prescriptions: self.prescriptions,
            visits: self.visits,
            last_visit,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One atomic mutation of an existing patient.
#[derive(Clone, Debug, PartialEq)]
pub enum PatientUpdate {
    /// Replace every scalar field (absent optionals become unset) and append the given
    /// prescriptions and visits to the existing sequences.
    Replace {
        fields: PatientFields,
        prescriptions: Vec<Prescription>,
        visits: Vec<Visit>,
    },
    /// Push one visit and set `lastVisit` to its date.
    AddVisit(Visit),
    AddPrescription(Prescription),
    AddMedicalHistory(MedicalHistoryEntry),
}

impl PatientUpdate {
    /// The contact details this update would leave on the record, if it changes them.
    pub(crate) fn contact(&self) -> Option<(&EmailAddress, &NonEmptyText)> {
        match self {
            PatientUpdate::Replace { fields, .. } => Some((&fields.email, &fields.phone)),
            _ => None,
        }
    }

    pub(crate) fn apply(self, patient: &mut Patient, now: DateTime<Utc>) {
        match self {
            PatientUpdate::Replace {
                fields,
                prescriptions,
                visits,
            } => {
                patient.first_name = fields.first_name;
                patient.last_name = fields.last_name;
                patient.dob = fields.dob;
                patient.gender = fields.gender;
                patient.phone = fields.phone;
                patient.email = fields.email;
                patient.address = fields.address;
                patient.allergies = fields.allergies;
                patient.medications = fields.medications;
                patient.department = fields.department;
                patient.medical_history = fields.medical_history;
                patient.prescriptions.extend(prescriptions);
                patient.visits.extend(visits);
                patient.last_visit = fields
                    .last_visit
                    .or_else(|| latest_visit_date(&patient.visits));
            }
            PatientUpdate::AddVisit(visit) => {
                patient.last_visit = Some(visit.date);
                patient.visits.push(visit);
            }
            PatientUpdate::AddPrescription(prescription) => {
                patient.prescriptions.push(prescription);
            }
            PatientUpdate::AddMedicalHistory(entry) => {
                patient.medical_history.push(entry);
            }
        }
        patient.updated_at = now;
    }
}

fn latest_visit_date(visits: &[Visit]) -> Option<NaiveDate> {
    visits.iter().map(|v| v.date).max()
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn to_res(&self) -> wire::PatientRes {
        wire::PatientRes {
            id: self.id.to_string(),
            patient_id: self.patient_id.clone(),
            first_name: self.first_name.to_string(),
            last_name: self.last_name.to_string(),
            dob: self.dob,
            gender: self.gender.to_string(),
            phone: self.phone.to_string(),
            email: self.email.to_string(),
            address: self.address.clone(),
            allergies: self.allergies.clone(),
            medications: self.medications.clone(),
            department: self.department.clone(),
            medical_history: self.medical_history.iter().map(|h| h.to_res()).collect(),
            prescriptions: self.prescriptions.iter().map(|p| p.to_res()).collect(),
            visits: self.visits.iter().map(|v| v.to_res()).collect(),
            last_visit: self.last_visit,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Visit {
    pub fn to_res(&self) -> wire::VisitRes {
        wire::VisitRes {
            date: self.date,
            reason: self.reason.to_string(),
            diagnosis: self.diagnosis.clone(),
            treatment: self.treatment.clone(),
            notes: self.notes.clone(),
        }
    }
}

impl Prescription {
    pub fn to_res(&self) -> wire::PrescriptionRes {
        wire::PrescriptionRes {
            medication_name: self.medication_name.to_string(),
            dosage: self.dosage.to_string(),
            frequency: self.frequency.to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
            notes: self.notes.clone(),
        }
    }
}

impl MedicalHistoryEntry {
    pub fn to_res(&self) -> wire::MedicalHistoryRes {
        wire::MedicalHistoryRes {
            condition: self.condition.to_string(),
            diagnosis_date: self.diagnosis_date,
            treatment: self.treatment.clone(),
            notes: self.notes.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders shared by the core test modules.

    use super::*;

    pub(crate) fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("fixture date")
    }

    pub(crate) fn text(s: &str) -> NonEmptyText {
        NonEmptyText::new(s).expect("fixture text")
    }

    pub(crate) fn fields(first: &str, last: &str, email: &str, phone: &str) -> PatientFields {
        PatientFields {
            first_name: text(first),
            last_name: text(last),
            dob: date("1980-05-17"),
            gender: text("Female"),
            phone: text(phone),
            email: EmailAddress::parse(email).expect("fixture email"),
            address: None,
            allergies: None,
            medications: None,
            department: None,
            medical_history: vec![],
            last_visit: None,
        }
    }

    pub(crate) fn new_patient(first: &str, last: &str, email: &str, phone: &str) -> NewPatient {
        NewPatient {
            fields: fields(first, last, email, phone),
            prescriptions: vec![],
            visits: vec![],
        }
    }

    pub(crate) fn visit(on: &str, reason: &str) -> Visit {
        Visit {
            date: date(on),
            reason: text(reason),
            diagnosis: None,
            treatment: None,
            notes: None,
        }
    }

    pub(crate) fn prescription(name: &str) -> Prescription {
        Prescription {
            medication_name: text(name),
            dosage: text("10mg"),
            frequency: text("daily"),
            start_date: date("2024-01-01"),
            end_date: date("2024-02-01"),
            notes: None,
        }
    }

    pub(crate) fn history(condition: &str) -> MedicalHistoryEntry {
        MedicalHistoryEntry {
            condition: text(condition),
            diagnosis_date: None,
            treatment: None,
            notes: None,
        }
    }
}
