use std::collections::BTreeSet;

use super::model::{IpoDataset, IpoRecord};

// ---------------------------------------------------------------------------
// Filter predicate: selected years and company search
// ---------------------------------------------------------------------------

/// User selection narrowing the table.
///
/// An empty `years` set and a blank `company` query both mean "no
/// constraint", so the default value selects every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub years: BTreeSet<i32>,
    /// Case-insensitive substring of the company name.
    pub company: Option<String>,
}

impl FilterCriteria {
    /// Criteria with every year of the dataset selected.
    pub fn all_years(dataset: &IpoDataset) -> Self {
        FilterCriteria {
            years: dataset.years.clone(),
            company: None,
        }
    }

    fn company_needle(&self) -> Option<String> {
        self.company
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    pub fn is_unconstrained(&self) -> bool {
        self.years.is_empty() && self.company_needle().is_none()
    }
}

/// Return indices of records passing all supplied criteria, in file order.
pub fn filtered_indices(dataset: &IpoDataset, criteria: &FilterCriteria) -> Vec<usize> {
    let needle = criteria.company_needle();
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| criteria.years.is_empty() || criteria.years.contains(&r.listing_year))
        .filter(|(_, r)| match &needle {
            Some(n) => r.company_name.to_lowercase().contains(n.as_str()),
            None => true,
        })
        .map(|(i, _)| i)
        .collect()
}

/// Return the matching records themselves.
pub fn apply<'a>(dataset: &'a IpoDataset, criteria: &FilterCriteria) -> Vec<&'a IpoRecord> {
    filtered_indices(dataset, criteria)
        .into_iter()
        .map(|i| &dataset.records[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::record;

    fn fixture() -> IpoDataset {
        IpoDataset::from_records(
            vec![
                record("A", 2021, 10.0),
                record("B", 2021, -5.0),
                record("C", 2022, 0.0),
                record("Alpha Beverages", 2023, 4.0),
            ],
            Vec::new(),
        )
    }

    fn names(rows: &[&IpoRecord]) -> Vec<String> {
        rows.iter().map(|r| r.company_name.clone()).collect()
    }

    #[test]
    fn no_criteria_returns_full_table() {
        let ds = fixture();
        let criteria = FilterCriteria::default();
        assert!(criteria.is_unconstrained());
        assert_eq!(apply(&ds, &criteria), ds.rows());
    }

    #[test]
    fn filters_by_year() {
        let ds = fixture();
        let criteria = FilterCriteria {
            years: BTreeSet::from([2021]),
            company: None,
        };
        assert_eq!(names(&apply(&ds, &criteria)), vec!["A", "B"]);
    }

    #[test]
    fn absent_year_yields_empty_table() {
        let ds = fixture();
        let criteria = FilterCriteria {
            years: BTreeSet::from([1999]),
            company: None,
        };
        assert!(apply(&ds, &criteria).is_empty());
    }

    #[test]
    fn all_years_reproduces_unfiltered_table() {
        let ds = fixture();
        let criteria = FilterCriteria::all_years(&ds);
        assert_eq!(apply(&ds, &criteria), ds.rows());
        assert_eq!(filtered_indices(&ds, &criteria), vec![0, 1, 2, 3]);
    }

    #[test]
    fn company_query_is_case_insensitive_substring() {
        let ds = fixture();
        let criteria = FilterCriteria {
            years: BTreeSet::new(),
            company: Some("  beVER ".to_string()),
        };
        assert_eq!(names(&apply(&ds, &criteria)), vec!["Alpha Beverages"]);
    }

    #[test]
    fn criteria_combine() {
        let ds = fixture();
        let criteria = FilterCriteria {
            years: BTreeSet::from([2021, 2023]),
            company: Some("a".to_string()),
        };
        assert_eq!(names(&apply(&ds, &criteria)), vec!["A", "Alpha Beverages"]);
    }

    #[test]
    fn blank_company_query_is_ignored() {
        let ds = fixture();
        let criteria = FilterCriteria {
            years: BTreeSet::new(),
            company: Some("   ".to_string()),
        };
        assert!(criteria.is_unconstrained());
        assert_eq!(apply(&ds, &criteria).len(), 4);
    }
}
