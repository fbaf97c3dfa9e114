//! Request validation.
//!
//! Turns the all-optional wire requests into domain values. Every problem is collected and
//! reported against the wire name of its field (`email`, `visits[1].date`), so a client can
//! show all of them inline at once.

use crate::error::ValidationErrors;
use crate::model::{MedicalHistoryEntry, NewPatient, PatientFields, Prescription, Visit};
use crate::PatientResult;
use api_shared::wire::{MedicalHistoryReq, PatientReq, PrescriptionReq, VisitReq};
use caretrack_types::{EmailAddress, NonEmptyText};
use chrono::{DateTime, NaiveDate};

/// Validates a create or full-update body.
///
/// `today` bounds the date of birth.
pub fn validate_patient(req: PatientReq, today: NaiveDate) -> PatientResult<NewPatient> {
    let mut errors = ValidationErrors::new();

    let first_name = required_text(&mut errors, "firstName", req.first_name);
    let last_name = required_text(&mut errors, "lastName", req.last_name);
    let dob = required_date(&mut errors, "dob", req.dob);
    if let Some(dob) = dob {
        if dob > today {
            errors.push("dob", "dob cannot be in the future");
        }
    }
    let gender = required_text(&mut errors, "gender", req.gender);
    let phone = required_text(&mut errors, "phone", req.phone);
    let email = match req.email.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => {
            errors.push("email", "email is required");
            None
        }
        Some(raw) => match EmailAddress::parse(raw) {
            Ok(email) => Some(email),
            Err(_) => {
                errors.push("email", "email must be a valid email address");
                None
            }
        },
    };
    let last_visit = optional_date(&mut errors, "lastVisit", req.last_visit);

    let medical_history: Vec<MedicalHistoryEntry> = req
        .medical_history
        .map(|input| input.into_entries())
        .unwrap_or_default()
        .into_iter()
        .filter(|entry| !is_blank_history(entry))
        .enumerate()
        .filter_map(|(i, entry)| {
            history_entry(&mut errors, &format!("medicalHistory[{i}]."), entry)
        })
        .collect();

    let prescriptions: Vec<Prescription> = req
        .prescriptions
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(i, p)| prescription(&mut errors, &format!("prescriptions[{i}]."), p))
        .collect();

    let visits: Vec<Visit> = req
        .visits
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(i, v)| visit(&mut errors, &format!("visits[{i}]."), v))
        .collect();

    let (Some(first_name), Some(last_name), Some(dob), Some(gender), Some(phone), Some(email)) =
        (first_name, last_name, dob, gender, phone, email)
    else {
        return Err(crate::PatientError::Validation(errors));
    };

    errors.finish(NewPatient {
        fields: PatientFields {
            first_name,
            last_name,
            dob,
            gender,
            phone,
            email,
            address: optional_text(req.address),
            allergies: optional_text(req.allergies),
            medications: optional_text(req.medications),
            department: optional_text(req.department),
            medical_history,
            last_visit,
        },
        prescriptions,
        visits,
    })
}

pub fn validate_visit(req: VisitReq) -> PatientResult<Visit> {
    let mut errors = ValidationErrors::new();
    let visit = visit(&mut errors, "", req);
    finish_single(errors, visit)
}

pub fn validate_prescription(req: PrescriptionReq) -> PatientResult<Prescription> {
    let mut errors = ValidationErrors::new();
    let prescription = prescription(&mut errors, "", req);
    finish_single(errors, prescription)
}

pub fn validate_medical_history(req: MedicalHistoryReq) -> PatientResult<MedicalHistoryEntry> {
    let mut errors = ValidationErrors::new();
    let entry = history_entry(&mut errors, "", req);
    finish_single(errors, entry)
}

fn finish_single<T>(errors: ValidationErrors, value: Option<T>) -> PatientResult<T> {
    match value {
        Some(value) => errors.finish(value),
        None => Err(crate::PatientError::Validation(errors)),
    }
}

fn visit(errors: &mut ValidationErrors, prefix: &str, req: VisitReq) -> Option<Visit> {
    let date = required_date(errors, &format!("{prefix}date"), req.date);
    let reason = required_text(errors, &format!("{prefix}reason"), req.reason);
    Some(Visit {
        date: date?,
        reason: reason?,
        diagnosis: optional_text(req.diagnosis),
        treatment: optional_text(req.treatment),
        notes: optional_text(req.notes),
    })
}

fn prescription(
    errors: &mut ValidationErrors,
    prefix: &str,
    req: PrescriptionReq,
) -> Option<Prescription> {
    let medication_name = required_text(
        errors,
        &format!("{prefix}medicationName"),
        req.medication_name,
    );
    let dosage = required_text(errors, &format!("{prefix}dosage"), req.dosage);
    let frequency = required_text(errors, &format!("{prefix}frequency"), req.frequency);
    let start_date = required_date(errors, &format!("{prefix}startDate"), req.start_date);
    let end_date = required_date(errors, &format!("{prefix}endDate"), req.end_date);

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            errors.push(
                format!("{prefix}endDate"),
                "endDate cannot be before startDate",
            );
            return None;
        }
    }

    Some(Prescription {
        medication_name: medication_name?,
        dosage: dosage?,
        frequency: frequency?,
        start_date: start_date?,
        end_date: end_date?,
        notes: optional_text(req.notes),
    })
}

fn history_entry(
    errors: &mut ValidationErrors,
    prefix: &str,
    req: MedicalHistoryReq,
) -> Option<MedicalHistoryEntry> {
    let condition = required_text(errors, &format!("{prefix}condition"), req.condition);
    let diagnosis_date = optional_date(
        errors,
        &format!("{prefix}diagnosisDate"),
        req.diagnosis_date,
    );
    Some(MedicalHistoryEntry {
        condition: condition?,
        diagnosis_date,
        treatment: optional_text(req.treatment),
        notes: optional_text(req.notes),
    })
}

/// A history object with nothing in it, as legacy clients send `"medicalHistory": {}`.
fn is_blank_history(req: &MedicalHistoryReq) -> bool {
    [&req.condition, &req.diagnosis_date, &req.treatment, &req.notes]
        .into_iter()
        .all(|value| value.as_deref().map_or(true, |s| s.trim().is_empty()))
}

/// Last path segment of a field name, for messages: `visits[0].date` reads as `date`.
fn label(field: &str) -> &str {
    field.rsplit('.').next().unwrap_or(field)
}

fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
) -> Option<NonEmptyText> {
    match value.as_deref().map(NonEmptyText::new) {
        Some(Ok(text)) => Some(text),
        _ => {
            errors.push(field, format!("{} is required", label(field)));
            None
        }
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required_date(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
) -> Option<NaiveDate> {
    match value.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => {
            errors.push(field, format!("{} is required", label(field)));
            None
        }
        Some(raw) => parse_date_field(errors, field, raw),
    }
}

fn optional_date(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
) -> Option<NaiveDate> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|raw| parse_date_field(errors, field, raw))
}

fn parse_date_field(errors: &mut ValidationErrors, field: &str, raw: &str) -> Option<NaiveDate> {
    let parsed = parse_date(raw);
    if parsed.is_none() {
        errors.push(
            field,
            format!("{} must be a date (YYYY-MM-DD)", label(field)),
        );
    }
    parsed
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, keeping the UTC calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.naive_utc().date())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::date;
    use crate::PatientError;
    use api_shared::wire::MedicalHistoryInput;

    fn today() -> NaiveDate {
        date("2024-06-15")
    }

    fn valid_req() -> PatientReq {
        PatientReq {
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            dob: Some("1985-02-03".into()),
            gender: Some("Female".into()),
            phone: Some(" 555-0100 ".into()),
            email: Some("Jane.Doe@Example.com".into()),
            ..Default::default()
        }
    }

    fn validation_errors(result: PatientResult<impl std::fmt::Debug>) -> ValidationErrors {
        match result {
            Err(PatientError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_patient_is_normalised() {
        let new = validate_patient(valid_req(), today()).unwrap();
        assert_eq!(new.fields.email.as_str(), "jane.doe@example.com");
        assert_eq!(new.fields.phone.as_str(), "555-0100");
        assert!(new.prescriptions.is_empty());
        assert_eq!(new.fields.address, None);
    }

    #[test]
    fn all_missing_required_fields_are_reported() {
        let errors = validation_errors(validate_patient(PatientReq::default(), today()));
        for field in ["firstName", "lastName", "dob", "gender", "phone", "email"] {
            assert!(errors.contains_field(field), "missing {field}");
        }
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let req = PatientReq {
            first_name: Some("   ".into()),
            ..valid_req()
        };
        let errors = validation_errors(validate_patient(req, today()));
        assert_eq!(errors.fields().len(), 1);
        assert_eq!(errors.fields()[0].message, "firstName is required");
    }

    #[test]
    fn malformed_email_and_future_dob_are_rejected() {
        let req = PatientReq {
            email: Some("not-an-email".into()),
            dob: Some("2030-01-01".into()),
            ..valid_req()
        };
        let errors = validation_errors(validate_patient(req, today()));
        assert!(errors.contains_field("email"));
        assert!(errors.contains_field("dob"));
    }

    #[test]
    fn nested_errors_are_indexed() {
        let req = PatientReq {
            visits: Some(vec![
                VisitReq {
                    date: Some("2024-01-01".into()),
                    reason: Some("Checkup".into()),
                    ..Default::default()
                },
                VisitReq {
                    date: Some("yesterday".into()),
                    ..Default::default()
                },
            ]),
            ..valid_req()
        };
        let errors = validation_errors(validate_patient(req, today()));
        assert!(errors.contains_field("visits[1].date"));
        assert!(errors.contains_field("visits[1].reason"));
        assert!(!errors.contains_field("visits[0].date"));
    }

    #[test]
    fn single_history_object_is_accepted() {
        let req = PatientReq {
            medical_history: Some(MedicalHistoryInput::One(MedicalHistoryReq {
                condition: Some("Asthma".into()),
                ..Default::default()
            })),
            ..valid_req()
        };
        let new = validate_patient(req, today()).unwrap();
        assert_eq!(new.fields.medical_history.len(), 1);
        assert_eq!(new.fields.medical_history[0].condition.as_str(), "Asthma");
    }

    #[test]
    fn empty_history_object_means_no_entries() {
        let req = PatientReq {
            medical_history: Some(MedicalHistoryInput::One(MedicalHistoryReq {
                notes: Some("  ".into()),
                ..Default::default()
            })),
            ..valid_req()
        };
        let new = validate_patient(req, today()).unwrap();
        assert!(new.fields.medical_history.is_empty());
    }

    #[test]
    fn prescription_end_before_start_is_rejected() {
        let req = PrescriptionReq {
            medication_name: Some("Aspirin".into()),
            dosage: Some("100mg".into()),
            frequency: Some("daily".into()),
            start_date: Some("2024-03-01".into()),
            end_date: Some("2024-02-01".into()),
            notes: None,
        };
        let errors = validation_errors(validate_prescription(req));
        assert!(errors.contains_field("endDate"));
    }

    #[test]
    fn visit_requires_date_and_reason() {
        let errors = validation_errors(validate_visit(VisitReq::default()));
        assert!(errors.contains_field("date"));
        assert!(errors.contains_field("reason"));
    }

    #[test]
    fn history_requires_condition() {
        let errors = validation_errors(validate_medical_history(MedicalHistoryReq::default()));
        assert!(errors.contains_field("condition"));
    }

    #[test]
    fn rfc3339_dates_keep_the_utc_date() {
        assert_eq!(parse_date("2024-03-15"), Some(date("2024-03-15")));
        assert_eq!(
            parse_date("2024-03-15T10:30:00.000Z"),
            Some(date("2024-03-15"))
        );
        assert_eq!(parse_date("15/03/2024"), None);
    }
}
