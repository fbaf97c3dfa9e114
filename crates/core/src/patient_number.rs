//! Human-facing patient numbers (`PT<n>`).
//!
//! Numbers come from a store-managed sequence rather than from reading the newest record and
//! adding one, so two concurrent creates can never be handed the same label. The sequence is
//! reconciled against the labels already stored whenever a store is opened, which keeps the
//! `PT1001` baseline and compatibility with records created before the counter existed.

use crate::constants::{FIRST_PATIENT_NUMBER, PATIENT_NUMBER_PREFIX};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatientNumber(u64);

impl PatientNumber {
    pub const FIRST: PatientNumber = PatientNumber(FIRST_PATIENT_NUMBER);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Parses the numeric suffix of a `PT<n>` label.
    ///
    /// Returns `None` for anything else (wrong prefix, empty or non-digit suffix, overflow);
    /// such labels simply do not take part in numbering.
    pub fn parse(label: &str) -> Option<Self> {
        let digits = label.strip_prefix(PATIENT_NUMBER_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u64>().ok().map(Self)
    }
}

impl fmt::Display for PatientNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PATIENT_NUMBER_PREFIX, self.0)
    }
}

/// Persistent counter behind [`PatientNumber`] allocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSequence {
    /// Highest number handed out so far; 0 when none.
    #[serde(default)]
    last_issued: u64,
}

impl PatientSequence {
    /// Raises the counter to at least the highest parseable label in `labels`.
    pub fn reconcile<'a>(&mut self, labels: impl IntoIterator<Item = &'a str>) {
        let highest = labels
            .into_iter()
            .filter_map(PatientNumber::parse)
            .map(|n| n.value())
            .max()
            .unwrap_or(0);
        self.last_issued = self.last_issued.max(highest);
    }

    /// The number the next allocation will return.
    pub fn peek_next(&self) -> PatientNumber {
        PatientNumber(self.last_issued.saturating_add(1).max(FIRST_PATIENT_NUMBER))
    }

    /// Records `number` as issued. Callers pass the value from [`peek_next`](Self::peek_next)
    /// once the write that uses it has succeeded.
    pub fn commit(&mut self, number: PatientNumber) {
        self.last_issued = self.last_issued.max(number.value());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence_starts_at_baseline() {
        let seq = PatientSequence::default();
        assert_eq!(seq.peek_next().to_string(), "PT1001");
    }

    #[test]
    fn parse_strips_prefix() {
        assert_eq!(PatientNumber::parse("PT1042"), Some(PatientNumber::new(1042)));
        assert_eq!(PatientNumber::parse("PT"), None);
        assert_eq!(PatientNumber::parse("PTabc"), None);
        assert_eq!(PatientNumber::parse("XX1042"), None);
        assert_eq!(PatientNumber::parse("PT+5"), None);
    }

    #[test]
    fn reconcile_uses_highest_label_not_newest() {
        let mut seq = PatientSequence::default();
        seq.reconcile(["PT1003", "PT1010", "PT1004", "legacy-7"]);
        assert_eq!(seq.peek_next(), PatientNumber::new(1011));
    }

    #[test]
    fn reconcile_never_lowers_counter() {
        let mut seq = PatientSequence::default();
        seq.commit(PatientNumber::new(2000));
        seq.reconcile(["PT1005"]);
        assert_eq!(seq.peek_next(), PatientNumber::new(2001));
    }

    #[test]
    fn low_legacy_numbers_still_start_at_baseline() {
        let mut seq = PatientSequence::default();
        seq.reconcile(["PT7"]);
        assert_eq!(seq.peek_next(), PatientNumber::FIRST);
    }

    #[test]
    fn commit_advances_strictly() {
        let mut seq = PatientSequence::default();
        let first = seq.peek_next();
        seq.commit(first);
        let second = seq.peek_next();
        assert!(second > first);
        assert_eq!(second.to_string(), "PT1002");
    }
}
