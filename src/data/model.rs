use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::loader::ParseError;

// ---------------------------------------------------------------------------
// Status – profit / loss on listing day
// ---------------------------------------------------------------------------

/// Outcome of the listing day, derived from the sign of the listing gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Status {
    Profit,
    Loss,
}

impl Status {
    pub fn from_gain(gain: f64) -> Self {
        if gain > 0.0 {
            Status::Profit
        } else {
            Status::Loss
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Profit => write!(f, "Profit"),
            Status::Loss => write!(f, "Loss"),
        }
    }
}

// ---------------------------------------------------------------------------
// NumericField – the numeric columns charts and statistics can address
// ---------------------------------------------------------------------------

/// A numeric column of [`IpoRecord`], used to pick chart axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NumericField {
    IssuePrice,
    IssueSize,
    ListingGain,
    SubscriptionQib,
    SubscriptionHni,
    SubscriptionRii,
    SubscriptionTotal,
    Year,
}

impl NumericField {
    pub const ALL: [NumericField; 8] = [
        NumericField::IssuePrice,
        NumericField::IssueSize,
        NumericField::ListingGain,
        NumericField::SubscriptionQib,
        NumericField::SubscriptionHni,
        NumericField::SubscriptionRii,
        NumericField::SubscriptionTotal,
        NumericField::Year,
    ];

    /// Fields offered by the distribution view.
    pub const DISTRIBUTION: [NumericField; 3] = [
        NumericField::ListingGain,
        NumericField::IssueSize,
        NumericField::SubscriptionTotal,
    ];

    /// Fields of the subscription correlation heatmap.
    pub const SUBSCRIPTION_HEATMAP: [NumericField; 6] = [
        NumericField::SubscriptionQib,
        NumericField::SubscriptionHni,
        NumericField::SubscriptionRii,
        NumericField::SubscriptionTotal,
        NumericField::IssueSize,
        NumericField::ListingGain,
    ];

    /// CSV header name of the column.
    pub fn column_name(self) -> &'static str {
        match self {
            NumericField::IssuePrice => "Issue_Price",
            NumericField::IssueSize => "Issue_Size",
            NumericField::ListingGain => "Listing_Gains_Percent",
            NumericField::SubscriptionQib => "Subscription_QIB",
            NumericField::SubscriptionHni => "Subscription_HNI",
            NumericField::SubscriptionRii => "Subscription_RII",
            NumericField::SubscriptionTotal => "Subscription_Total",
            NumericField::Year => "Year",
        }
    }

    /// Human readable label for axes and legends.
    pub fn label(self) -> &'static str {
        match self {
            NumericField::IssuePrice => "Issue Price (₹)",
            NumericField::IssueSize => "Issue Size (₹ Cr)",
            NumericField::ListingGain => "Listing Gain (%)",
            NumericField::SubscriptionQib => "QIB Subscription (x)",
            NumericField::SubscriptionHni => "HNI Subscription (x)",
            NumericField::SubscriptionRii => "RII Subscription (x)",
            NumericField::SubscriptionTotal => "Total Subscription (x)",
            NumericField::Year => "Year",
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

// ---------------------------------------------------------------------------
// IpoRecord – one row of the CSV
// ---------------------------------------------------------------------------

/// A single IPO listing event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpoRecord {
    pub company_name: String,
    /// Listing date, when the source carried a full date.
    pub listing_date: Option<NaiveDate>,
    pub listing_year: i32,
    pub issue_price: f64,
    /// Issue size in crores.
    pub issue_size: f64,
    /// Signed percentage change from issue price to first-day listing price.
    pub listing_gain_percent: f64,
    pub qib_subscription: f64,
    pub hni_subscription: Option<f64>,
    pub rii_subscription: f64,
    pub total_subscription: Option<f64>,
}

impl IpoRecord {
    pub fn status(&self) -> Status {
        Status::from_gain(self.listing_gain_percent)
    }

    /// Value of a numeric column, `None` when the optional column is blank.
    pub fn value(&self, field: NumericField) -> Option<f64> {
        match field {
            NumericField::IssuePrice => Some(self.issue_price),
            NumericField::IssueSize => Some(self.issue_size),
            NumericField::ListingGain => Some(self.listing_gain_percent),
            NumericField::SubscriptionQib => Some(self.qib_subscription),
            NumericField::SubscriptionHni => self.hni_subscription,
            NumericField::SubscriptionRii => Some(self.rii_subscription),
            NumericField::SubscriptionTotal => self.total_subscription,
            NumericField::Year => Some(self.listing_year as f64),
        }
    }
}

// ---------------------------------------------------------------------------
// IpoDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table with pre-computed selector values.
#[derive(Debug, Clone, Default)]
pub struct IpoDataset {
    /// All rows, in file order.
    pub records: Vec<IpoRecord>,
    /// Sorted set of listing years present.
    pub years: BTreeSet<i32>,
    /// Sorted unique company names.
    pub companies: Vec<String>,
    /// Rows dropped during load because a required cell failed to parse.
    pub skipped: Vec<ParseError>,
}

impl IpoDataset {
    pub fn from_records(records: Vec<IpoRecord>, skipped: Vec<ParseError>) -> Self {
        let years = records.iter().map(|r| r.listing_year).collect();
        let companies: BTreeSet<&str> = records.iter().map(|r| r.company_name.as_str()).collect();
        let companies = companies.into_iter().map(str::to_string).collect();
        IpoDataset {
            records,
            years,
            companies,
            skipped,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> Vec<&IpoRecord> {
        self.records.iter().collect()
    }
}

#[cfg(test)]
pub(crate) fn record(name: &str, year: i32, gain: f64) -> IpoRecord {
    IpoRecord {
        company_name: name.to_string(),
        listing_date: NaiveDate::from_ymd_opt(year, 1, 15),
        listing_year: year,
        issue_price: 100.0,
        issue_size: 500.0,
        listing_gain_percent: gain,
        qib_subscription: 10.0,
        hni_subscription: Some(5.0),
        rii_subscription: 2.0,
        total_subscription: Some(6.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_profit_only_for_positive_gain() {
        assert_eq!(record("A", 2021, 0.1).status(), Status::Profit);
        assert_eq!(record("B", 2021, 0.0).status(), Status::Loss);
        assert_eq!(record("C", 2021, -3.0).status(), Status::Loss);
    }

    #[test]
    fn dataset_indexes_years_and_companies() {
        let ds = IpoDataset::from_records(
            vec![
                record("Zomato", 2021, 10.0),
                record("Adani Wilmar", 2022, 3.0),
                record("Zomato", 2021, 1.0),
            ],
            Vec::new(),
        );
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.years.iter().copied().collect::<Vec<_>>(), vec![2021, 2022]);
        assert_eq!(ds.companies, vec!["Adani Wilmar", "Zomato"]);
    }

    #[test]
    fn optional_columns_surface_as_none() {
        let mut r = record("A", 2020, 1.0);
        r.hni_subscription = None;
        assert_eq!(r.value(NumericField::SubscriptionHni), None);
        assert_eq!(r.value(NumericField::Year), Some(2020.0));
    }
}
