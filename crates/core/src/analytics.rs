//! Read-only aggregate reports.
//!
//! Each report is a pure function of the full patient set and, where ages or "upcoming" are
//! involved, the current instant. Nothing here is paginated.

use crate::model::Patient;
use api_shared::wire::{
    ActivityKind, ActivityRes, AgeGroupsRes, ConditionCountRes, DemographicsRes,
    DepartmentAgeRes, GenderCountRes, MedicationCountRes, MonthlyVisitsRes, SummaryRes,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};

const MILLIS_PER_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0 * 1000.0;
const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Whole years between `dob` (midnight UTC) and `now`, using a 365.25-day year.
pub fn age_in_years(dob: NaiveDate, now: DateTime<Utc>) -> i64 {
    let born = dob.and_time(chrono::NaiveTime::MIN).and_utc();
    let millis = (now - born).num_milliseconds() as f64;
    (millis / MILLIS_PER_YEAR).floor() as i64
}

/// Counts grouped by label, sorted by count descending and then label ascending.
fn ranked<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<(String, u64)> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut ranked: Vec<(String, u64)> = counts
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Every medical history entry counts once, so a patient may contribute to several conditions.
pub fn patients_per_condition(patients: &[Patient]) -> Vec<ConditionCountRes> {
    let conditions = patients
        .iter()
        .flat_map(|p| p.medical_history.iter().map(|h| h.condition.as_str()));
    ranked(conditions)
        .into_iter()
        .map(|(condition, count)| ConditionCountRes { condition, count })
        .collect()
}

pub fn most_prescribed_medications(patients: &[Patient]) -> Vec<MedicationCountRes> {
    let names = patients
        .iter()
        .flat_map(|p| p.prescriptions.iter().map(|rx| rx.medication_name.as_str()));
    ranked(names)
        .into_iter()
        .map(|(medication_name, count)| MedicationCountRes {
            medication_name,
            count,
        })
        .collect()
}

/// Patients without a department form one `None` group, which sorts first.
pub fn average_age_per_department(
    patients: &[Patient],
    now: DateTime<Utc>,
) -> Vec<DepartmentAgeRes> {
    let mut groups: BTreeMap<Option<&str>, (i64, u64)> = BTreeMap::new();
    for patient in patients {
        let group = groups.entry(patient.department.as_deref()).or_default();
        group.0 += age_in_years(patient.dob, now);
        group.1 += 1;
    }

    groups
        .into_iter()
        .map(|(department, (age_sum, count))| DepartmentAgeRes {
            department: department.map(str::to_string),
            average_age: age_sum as f64 / count as f64,
            patients: count,
        })
        .collect()
}

/// Visits grouped by `YYYY-MM`, oldest month first.
pub fn visits_per_month(patients: &[Patient]) -> Vec<MonthlyVisitsRes> {
    let mut months: BTreeMap<String, u64> = BTreeMap::new();
    for visit in patients.iter().flat_map(|p| p.visits.iter()) {
        *months
            .entry(visit.date.format("%Y-%m").to_string())
            .or_default() += 1;
    }
    months
        .into_iter()
        .map(|(month, count)| MonthlyVisitsRes { month, count })
        .collect()
}

pub fn demographics(patients: &[Patient], now: DateTime<Utc>) -> DemographicsRes {
    let by_gender = ranked(patients.iter().map(|p| p.gender.as_str()))
        .into_iter()
        .map(|(gender, count)| GenderCountRes { gender, count })
        .collect();

    let mut age_groups = AgeGroupsRes::default();
    for patient in patients {
        match age_in_years(patient.dob, now) {
            ..=17 => age_groups.under18 += 1,
            18..=35 => age_groups.age18_to35 += 1,
            36..=55 => age_groups.age36_to55 += 1,
            _ => age_groups.over55 += 1,
        }
    }

    DemographicsRes {
        by_gender,
        age_groups,
    }
}

pub fn summary(patients: &[Patient], now: DateTime<Utc>) -> SummaryRes {
    let today = now.date_naive();

    let new_patients_this_month = patients
        .iter()
        .filter(|p| p.created_at.year() == now.year() && p.created_at.month() == now.month())
        .count() as u64;
    let upcoming_visits = patients
        .iter()
        .flat_map(|p| p.visits.iter())
        .filter(|v| v.date > today)
        .count() as u64;
    let patients_with_prescriptions = patients
        .iter()
        .filter(|p| !p.prescriptions.is_empty())
        .count() as u64;

    let mut recent_activity: Vec<ActivityRes> = patients
        .iter()
        .map(|p| ActivityRes {
            id: p.id.to_string(),
            patient_id: p.patient_id.clone(),
            name: p.full_name(),
            activity: if p.updated_at > p.created_at {
                ActivityKind::Edited
            } else {
                ActivityKind::Added
            },
            at: p.updated_at,
        })
        .collect();
    recent_activity.sort_by(|a, b| b.at.cmp(&a.at));
    recent_activity.truncate(RECENT_ACTIVITY_LIMIT);

    SummaryRes {
        total_patients: patients.len() as u64,
        new_patients_this_month,
        upcoming_visits,
        patients_with_prescriptions,
        recent_activity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{date, history, new_patient, prescription, visit};
    use caretrack_uuid::RecordId;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn patient(first: &str, n: u32) -> Patient {
        new_patient(
            first,
            "Test",
            &format!("{}@example.com", first.to_lowercase()),
            &format!("555-{n:04}"),
        )
        .into_patient(RecordId::new(), format!("PT{}", 1000 + n), now())
    }

    #[test]
    fn age_uses_whole_years() {
        assert_eq!(age_in_years(date("2000-06-16"), now()), 23);
        assert_eq!(age_in_years(date("2000-06-01"), now()), 24);
        assert_eq!(age_in_years(date("2024-01-01"), now()), 0);
    }

    #[test]
    fn shared_medication_counts_twice() {
        let mut a = patient("Ann", 1);
        a.prescriptions = vec![prescription("Metformin")];
        let mut b = patient("Bob", 2);
        b.prescriptions = vec![prescription("Metformin"), prescription("Aspirin")];

        let report = most_prescribed_medications(&[a, b]);
        assert_eq!(
            report,
            vec![
                MedicationCountRes {
                    medication_name: "Metformin".into(),
                    count: 2
                },
                MedicationCountRes {
                    medication_name: "Aspirin".into(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn conditions_tie_break_by_label() {
        let mut a = patient("Ann", 1);
        a.medical_history = vec![history("Diabetes"), history("Asthma")];
        let report = patients_per_condition(&[a]);
        let labels: Vec<&str> = report.iter().map(|r| r.condition.as_str()).collect();
        assert_eq!(labels, vec!["Asthma", "Diabetes"]);
    }

    #[test]
    fn department_average_groups_missing_department_first() {
        let mut a = patient("Ann", 1);
        a.dob = date("1984-01-01");
        a.department = Some("Cardiology".into());
        let mut b = patient("Bob", 2);
        b.dob = date("1994-01-01");
        b.department = Some("Cardiology".into());
        let c = patient("Cat", 3);

        let report = average_age_per_department(&[a, b, c], now());
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].department, None);
        assert_eq!(report[1].department.as_deref(), Some("Cardiology"));
        assert_eq!(report[1].patients, 2);
        assert_eq!(report[1].average_age, 35.0);
    }

    #[test]
    fn visits_group_by_month_ascending() {
        let mut a = patient("Ann", 1);
        a.visits = vec![visit("2024-03-15", "A"), visit("2023-12-01", "B")];
        let mut b = patient("Bob", 2);
        b.visits = vec![visit("2024-03-02", "C")];

        let report = visits_per_month(&[a, b]);
        assert_eq!(
            report,
            vec![
                MonthlyVisitsRes {
                    month: "2023-12".into(),
                    count: 1
                },
                MonthlyVisitsRes {
                    month: "2024-03".into(),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn empty_store_yields_empty_reports() {
        assert!(patients_per_condition(&[]).is_empty());
        assert!(most_prescribed_medications(&[]).is_empty());
        assert!(average_age_per_department(&[], now()).is_empty());
        assert!(visits_per_month(&[]).is_empty());
        assert_eq!(summary(&[], now()).total_patients, 0);
    }

    #[test]
    fn demographics_buckets_ages() {
        let mut kid = patient("Kid", 1);
        kid.dob = date("2010-01-01");
        let mut young = patient("Young", 2);
        young.dob = date("1995-01-01");
        let mut mid = patient("Mid", 3);
        mid.dob = date("1980-01-01");
        let mut old = patient("Old", 4);
        old.dob = date("1950-01-01");
        old.gender = crate::model::fixtures::text("Male");

        let report = demographics(&[kid, young, mid, old], now());
        assert_eq!(
            report.age_groups,
            AgeGroupsRes {
                under18: 1,
                age18_to35: 1,
                age36_to55: 1,
                over55: 1
            }
        );
        assert_eq!(report.by_gender[0].gender, "Female");
        assert_eq!(report.by_gender[0].count, 3);
    }

    #[test]
    fn summary_counts_and_recent_activity() {
        let mut a = patient("Ann", 1);
        a.created_at = now() - Duration::days(60);
        a.updated_at = now() - Duration::days(1);
        a.visits = vec![visit("2024-07-01", "Follow-up"), visit("2024-01-01", "Past")];
        a.prescriptions = vec![prescription("Aspirin")];
        let b = patient("Bob", 2);

        let report = summary(&[a, b], now());
        assert_eq!(report.total_patients, 2);
        assert_eq!(report.new_patients_this_month, 1);
        assert_eq!(report.upcoming_visits, 1);
        assert_eq!(report.patients_with_prescriptions, 1);
        assert_eq!(report.recent_activity[0].name, "Bob Test");
        assert_eq!(report.recent_activity[0].activity, ActivityKind::Added);
        assert_eq!(report.recent_activity[1].activity, ActivityKind::Edited);
    }
}
