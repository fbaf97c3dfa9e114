use super::{Filter, FindOptions, StoreError, StoreResult, UniqueField};
use crate::model::{NewPatient, Patient, PatientUpdate};
use crate::patient_number::{PatientNumber, PatientSequence};
use caretrack_types::{EmailAddress, NonEmptyText};
use caretrack_uuid::RecordId;
use chrono::{DateTime, Utc};

/// In-process document collection shared by the store implementations.
///
/// Writes are split into a `prepare_*` step that validates and builds the new document
/// without mutating anything, and a `commit_*` step. The file store persists in between, so a
/// failed write never leaves memory and disk disagreeing.
#[derive(Debug, Default)]
pub(crate) struct Collection {
    /// Creation order.
    docs: Vec<Patient>,
    sequence: PatientSequence,
}

/// A validated insert waiting to be committed.
pub(crate) struct PreparedInsert {
    pub(crate) patient: Patient,
    pub(crate) number: PatientNumber,
}

impl Collection {
    /// Builds a collection from loaded documents, restoring creation order and reconciling the
    /// patient-number sequence with the labels present.
    pub(crate) fn from_parts(mut docs: Vec<Patient>, mut sequence: PatientSequence) -> Self {
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        sequence.reconcile(docs.iter().map(|p| p.patient_id.as_str()));
        Self { docs, sequence }
    }

    pub(crate) fn sequence(&self) -> PatientSequence {
        self.sequence
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.docs.iter().position(|p| p.id == *id)
    }

    fn check_unique(
        &self,
        email: &EmailAddress,
        phone: &NonEmptyText,
        patient_id: Option<&str>,
        exclude: Option<&RecordId>,
    ) -> StoreResult<()> {
        let (mut email_taken, mut phone_taken, mut label_taken) = (false, false, false);
        for other in self.docs.iter().filter(|p| Some(&p.id) != exclude) {
            email_taken |= &other.email == email;
            phone_taken |= &other.phone == phone;
            label_taken |= patient_id == Some(other.patient_id.as_str());
        }

        let mut fields = Vec::new();
        if email_taken {
            fields.push(UniqueField::Email);
        }
        if phone_taken {
            fields.push(UniqueField::Phone);
        }
        if label_taken {
            fields.push(UniqueField::PatientId);
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(StoreError::ConstraintViolation { fields })
        }
    }

    pub(crate) fn prepare_insert(
        &self,
        new: NewPatient,
        now: DateTime<Utc>,
    ) -> StoreResult<PreparedInsert> {
        let number = self.sequence.peek_next();
        let label = number.to_string();
        self.check_unique(&new.fields.email, &new.fields.phone, Some(label.as_str()), None)?;

        let mut id = RecordId::new();
        while self.position(&id).is_some() {
            id = RecordId::new();
        }

        Ok(PreparedInsert {
            patient: new.into_patient(id, label, now),
            number,
        })
    }

    pub(crate) fn commit_insert(&mut self, prepared: PreparedInsert) -> Patient {
        self.sequence.commit(prepared.number);
        self.docs.push(prepared.patient.clone());
        prepared.patient
    }

    /// Returns the updated document without storing it, or `Ok(None)` if `id` is unknown.
    pub(crate) fn prepare_update(
        &self,
        id: &RecordId,
        update: PatientUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Patient>> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };

        if let Some((email, phone)) = update.contact() {
            self.check_unique(email, phone, None, Some(id))?;
        }

        let mut patient = self.docs[index].clone();
        update.apply(&mut patient, now);
        Ok(Some(patient))
    }

    pub(crate) fn commit_replace(&mut self, patient: Patient) -> Patient {
        if let Some(index) = self.position(&patient.id) {
            self.docs[index] = patient.clone();
        }
        patient
    }

    pub(crate) fn get(&self, id: &RecordId) -> Option<&Patient> {
        self.docs.iter().find(|p| p.id == *id)
    }

    pub(crate) fn remove(&mut self, id: &RecordId) -> Option<Patient> {
        self.position(id).map(|index| self.docs.remove(index))
    }

    pub(crate) fn find(&self, filter: &Filter, options: &FindOptions) -> Vec<Patient> {
        let mut matched: Vec<&Patient> = self.docs.iter().filter(|p| filter.matches(p)).collect();
        if let Some(sort) = options.sort {
            matched.sort_by(|a, b| sort.compare(a, b));
        }
        matched
            .into_iter()
            .skip(options.skip)
            .take(options.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub(crate) fn find_one(&self, filter: &Filter) -> Option<Patient> {
        self.docs.iter().find(|p| filter.matches(p)).cloned()
    }

    pub(crate) fn count(&self, filter: &Filter) -> u64 {
        self.docs.iter().filter(|p| filter.matches(p)).count() as u64
    }

    pub(crate) fn all(&self) -> Vec<Patient> {
        self.docs.clone()
    }
}
