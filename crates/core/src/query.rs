//! Advanced search: parameter parsing, filter construction and paging.

use crate::config::CoreConfig;
use crate::error::ValidationErrors;
use crate::model::Patient;
use crate::store::{
    Filter, FilterField, FindOptions, PatientStore, SortField, SortOrder, SortSpec,
};
use crate::PatientResult;
use api_shared::wire::{SearchParams, SearchRes};
use caretrack_uuid::RecordId;

/// A validated advanced-search request.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchQuery {
    pub search: Option<String>,
    pub condition: Option<String>,
    pub visit_date: Option<String>,
    pub sort: SortSpec,
    /// 1-based.
    pub page: u64,
    pub page_size: u64,
}

impl SearchQuery {
    /// Validates raw query parameters, applying defaults from `cfg`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Validation` naming each bad parameter: an unknown sort field or
    /// order, or a page / page size that is not a positive integer.
    pub fn from_params(params: SearchParams, cfg: &CoreConfig) -> PatientResult<Self> {
        let mut errors = ValidationErrors::new();

        let field = match non_blank(params.sort_field) {
            None => SortField::CreatedAt,
            Some(raw) => raw.parse().unwrap_or_else(|msg: String| {
                errors.push("sortField", msg);
                SortField::CreatedAt
            }),
        };
        let order = match non_blank(params.sort_order) {
            None => SortOrder::Desc,
            Some(raw) => raw.parse().unwrap_or_else(|msg: String| {
                errors.push("sortOrder", msg);
                SortOrder::Desc
            }),
        };
        let page = positive(&mut errors, "page", params.page).unwrap_or(1);
        let page_size = positive(&mut errors, "pageSize", params.page_size)
            .unwrap_or(cfg.default_page_size())
            .min(cfg.max_page_size());

        errors.finish(Self {
            search: non_blank(params.search),
            condition: non_blank(params.condition),
            visit_date: non_blank(params.visit_date),
            sort: SortSpec { field, order },
            page,
            page_size,
        })
    }

    /// Conjunction of the present filters; `search` itself is a disjunction over name and phone
    /// fields, plus the record id when the text is a canonical id.
    pub fn filter(&self) -> Filter {
        let mut clauses = Vec::new();

        if let Some(search) = &self.search {
            let mut any = vec![
                Filter::contains(FilterField::FirstName, search),
                Filter::contains(FilterField::LastName, search),
                Filter::contains(FilterField::Phone, search),
            ];
            let lowered = search.to_lowercase();
            if RecordId::is_canonical(&lowered) {
                if let Ok(id) = RecordId::parse(&lowered) {
                    any.push(Filter::Id(id));
                }
            }
            clauses.push(Filter::Or(any));
        }
        if let Some(condition) = &self.condition {
            clauses.push(Filter::contains(FilterField::Condition, condition));
        }
        if let Some(visit_date) = &self.visit_date {
            clauses.push(Filter::contains(FilterField::VisitDate, visit_date));
        }

        match clauses.len() {
            0 => Filter::All,
            _ => Filter::And(clauses),
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    fn find_options(&self) -> FindOptions {
        FindOptions {
            sort: Some(self.sort),
            skip: usize::try_from(self.skip()).unwrap_or(usize::MAX),
            limit: usize::try_from(self.page_size).ok(),
        }
    }
}

/// One page of results together with the paging totals.
#[derive(Clone, Debug)]
pub struct SearchPage {
    pub patients: Vec<Patient>,
    pub total: u64,
    pub total_pages: u64,
    pub page: u64,
    pub page_size: u64,
}

impl SearchPage {
    pub fn to_res(&self) -> SearchRes {
        SearchRes {
            patients: self.patients.iter().map(Patient::to_res).collect(),
            total_pages: self.total_pages,
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// `max(1, ceil(total / page_size))`
pub fn total_pages(total: u64, page_size: u64) -> u64 {
    total.div_ceil(page_size).max(1)
}

/// Runs `query` against `store`. Pages past the end come back empty, not as an error.
pub fn run(store: &dyn PatientStore, query: &SearchQuery) -> PatientResult<SearchPage> {
    let filter = query.filter();
    let total = store.count(&filter)?;
    let patients = store.find(&filter, &query.find_options())?;

    Ok(SearchPage {
        patients,
        total,
        total_pages: total_pages(total, query.page_size),
        page: query.page,
        page_size: query.page_size,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn positive(errors: &mut ValidationErrors, field: &str, value: Option<String>) -> Option<u64> {
    let raw = non_blank(value)?;
    match raw.parse::<u64>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            errors.push(field, format!("{field} must be a positive integer"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{history, new_patient, visit};
    use crate::store::MemoryStore;
    use crate::PatientError;

    fn params() -> SearchParams {
        SearchParams::default()
    }

    fn query(params: SearchParams) -> SearchQuery {
        SearchQuery::from_params(params, &CoreConfig::in_memory()).unwrap()
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let mut johnny = new_patient("Johnny", "Walker", "johnny@example.com", "555-0001");
        johnny.fields.medical_history = vec![history("Type 2 Diabetes")];
        johnny.visits = vec![visit("2024-03-15", "Checkup")];
        store.insert(johnny).unwrap();

        let mut mary = new_patient("Mary", "Johnson", "mary@example.com", "555-0002");
        mary.fields.medical_history = vec![history("Asthma")];
        mary.visits = vec![visit("2023-11-02", "Cough")];
        store.insert(mary).unwrap();

        store
            .insert(new_patient("Zed", "Brown", "zed@example.com", "777-0003"))
            .unwrap();
        store
    }

    #[test]
    fn defaults_apply() {
        let q = query(params());
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 10);
        assert_eq!(q.sort, SortSpec::default());
        assert_eq!(q.filter(), Filter::All);
    }

    #[test]
    fn bad_parameters_are_reported_per_field() {
        let err = SearchQuery::from_params(
            SearchParams {
                page: Some("0".into()),
                page_size: Some("many".into()),
                sort_field: Some("password".into()),
                sort_order: Some("sideways".into()),
                ..params()
            },
            &CoreConfig::in_memory(),
        )
        .unwrap_err();

        let PatientError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        for field in ["page", "pageSize", "sortField", "sortOrder"] {
            assert!(errors.contains_field(field), "missing {field}");
        }
    }

    #[test]
    fn page_size_is_capped() {
        let q = query(SearchParams {
            page_size: Some("5000".into()),
            ..params()
        });
        assert_eq!(q.page_size, 100);
    }

    #[test]
    fn skip_saturates_on_huge_pages() {
        let q = query(SearchParams {
            page: Some(u64::MAX.to_string()),
            ..params()
        });
        assert_eq!(q.skip(), u64::MAX);
    }

    #[test]
    fn total_pages_is_at_least_one() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn search_matches_names_and_phone_case_insensitively() {
        let store = seeded();
        let page = run(
            &store,
            &query(SearchParams {
                search: Some("john".into()),
                ..params()
            }),
        )
        .unwrap();
        assert_eq!(page.total, 2);

        let page = run(
            &store,
            &query(SearchParams {
                search: Some("777".into()),
                ..params()
            }),
        )
        .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.patients[0].first_name.as_str(), "Zed");
    }

    #[test]
    fn search_by_record_id() {
        let store = seeded();
        let zed = store.scan().unwrap().pop().unwrap();
        let page = run(
            &store,
            &query(SearchParams {
                search: Some(zed.id.to_string().to_uppercase()),
                ..params()
            }),
        )
        .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.patients[0].id, zed.id);
    }

    #[test]
    fn filters_are_conjoined() {
        let store = seeded();
        let page = run(
            &store,
            &query(SearchParams {
                search: Some("john".into()),
                condition: Some("diabetes".into()),
                visit_date: Some("2024-03".into()),
                ..params()
            }),
        )
        .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.patients[0].first_name.as_str(), "Johnny");
    }

    #[test]
    fn page_past_the_end_is_empty_with_valid_total_pages() {
        let store = seeded();
        let page = run(
            &store,
            &query(SearchParams {
                page: Some("5".into()),
                page_size: Some("2".into()),
                ..params()
            }),
        )
        .unwrap();
        assert!(page.patients.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn twenty_five_matches_make_three_pages_of_ten() {
        let store = MemoryStore::new();
        for n in 0..25 {
            store
                .insert(new_patient(
                    &format!("Pat{n}"),
                    "Smith",
                    &format!("pat{n}@example.com"),
                    &format!("555-1{n:03}"),
                ))
                .unwrap();
        }

        let first = run(&store, &query(params())).unwrap();
        assert_eq!(first.total, 25);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.patients.len(), 10);

        let last = run(
            &store,
            &query(SearchParams {
                page: Some("3".into()),
                page_size: Some("10".into()),
                ..params()
            }),
        )
        .unwrap();
        assert_eq!(last.total_pages, 3);
        assert_eq!(last.patients.len(), 5);
    }

    #[test]
    fn sorts_by_requested_field() {
        let store = seeded();
        let page = run(
            &store,
            &query(SearchParams {
                sort_field: Some("firstName".into()),
                sort_order: Some("asc".into()),
                ..params()
            }),
        )
        .unwrap();
        let names: Vec<&str> = page.patients.iter().map(|p| p.first_name.as_str()).collect();
        assert_eq!(names, vec!["Johnny", "Mary", "Zed"]);
    }
}
