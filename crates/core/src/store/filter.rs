use crate::model::Patient;
use caretrack_uuid::RecordId;

/// Queryable patient fields. Array-valued fields match when any element matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterField {
    FirstName,
    LastName,
    Phone,
    Email,
    PatientId,
    /// `medicalHistory.condition`
    Condition,
    /// `visits.date`, compared as `YYYY-MM-DD` text.
    VisitDate,
}

/// A small filter expression evaluated against stored documents.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    All,
    Id(RecordId),
    NotId(RecordId),
    Equals(FilterField, String),
    /// Needle is held lowercased; build with [`Filter::contains`].
    ContainsIgnoreCase(FilterField, String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    /// Case-insensitive literal substring match.
    pub fn contains(field: FilterField, needle: &str) -> Self {
        Filter::ContainsIgnoreCase(field, needle.to_lowercase())
    }

    pub fn matches(&self, patient: &Patient) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(id) => patient.id == *id,
            Filter::NotId(id) => patient.id != *id,
            Filter::Equals(field, value) => any_value(patient, *field, |v| v == value),
            Filter::ContainsIgnoreCase(field, needle) => {
                any_value(patient, *field, |v| v.to_lowercase().contains(needle.as_str()))
            }
            Filter::And(filters) => filters.iter().all(|f| f.matches(patient)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(patient)),
        }
    }
}

fn any_value(patient: &Patient, field: FilterField, mut pred: impl FnMut(&str) -> bool) -> bool {
    match field {
        FilterField::FirstName => pred(patient.first_name.as_str()),
        FilterField::LastName => pred(patient.last_name.as_str()),
        FilterField::Phone => pred(patient.phone.as_str()),
        FilterField::Email => pred(patient.email.as_str()),
        FilterField::PatientId => pred(&patient.patient_id),
        FilterField::Condition => patient
            .medical_history
            .iter()
            .any(|h| pred(h.condition.as_str())),
        FilterField::VisitDate => patient
            .visits
            .iter()
            .any(|v| pred(&v.date.format("%Y-%m-%d").to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{history, new_patient, visit};
    use chrono::Utc;

    fn johnny() -> Patient {
        let mut new = new_patient("Johnny", "Walker", "johnny@example.com", "555-0199");
        new.fields.medical_history = vec![history("Type 2 Diabetes")];
        new.visits = vec![visit("2024-03-15", "Checkup")];
        new.into_patient(RecordId::new(), "PT1001".into(), Utc::now())
    }

    #[test]
    fn contains_is_case_insensitive() {
        let p = johnny();
        assert!(Filter::contains(FilterField::FirstName, "JOHN").matches(&p));
        assert!(!Filter::contains(FilterField::FirstName, "jon").matches(&p));
    }

    #[test]
    fn contains_is_literal_not_a_pattern() {
        let p = johnny();
        assert!(!Filter::contains(FilterField::FirstName, "j.hnny").matches(&p));
        assert!(!Filter::contains(FilterField::FirstName, "^J").matches(&p));
    }

    #[test]
    fn array_fields_match_any_element() {
        let p = johnny();
        assert!(Filter::contains(FilterField::Condition, "diabetes").matches(&p));
        assert!(Filter::contains(FilterField::VisitDate, "2024-03").matches(&p));
        assert!(!Filter::contains(FilterField::VisitDate, "2023").matches(&p));
    }

    #[test]
    fn empty_combinators() {
        let p = johnny();
        assert!(Filter::And(vec![]).matches(&p));
        assert!(!Filter::Or(vec![]).matches(&p));
    }

    #[test]
    fn id_filters() {
        let p = johnny();
        assert!(Filter::Id(p.id).matches(&p));
        assert!(!Filter::NotId(p.id).matches(&p));
    }
}
