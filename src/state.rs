use std::path::{Path, PathBuf};

use crate::chart::{ChartSpec, ColorBy, CompanyCharts, HeatmapSpec, HistogramSpec, ScatterSpec};
use crate::data::filter::{filtered_indices, FilterCriteria};
use crate::data::loader::{load_file, LoadError};
use crate::data::model::{IpoDataset, IpoRecord, NumericField};
use crate::stats::{CompanyScorecard, MarketSnapshot};

// ---------------------------------------------------------------------------
// View selectors
// ---------------------------------------------------------------------------

/// Layout of the custom visualisation area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Distribution,
    Scatter,
    Heatmap,
    Company,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Distribution,
        ChartKind::Scatter,
        ChartKind::Heatmap,
        ChartKind::Company,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Distribution => "Distribution Analysis",
            ChartKind::Scatter => "Variable Relationships (Scatter)",
            ChartKind::Heatmap => "Subscription Heatmap",
            ChartKind::Company => "Company Specific Analysis",
        }
    }
}

/// What the current filters leave on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    NoDataset,
    /// Filters matched nothing; shown as an informational state.
    Empty,
    Rows(usize),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// Widgets never write fields directly; they call the handlers below, which
/// re-run filter, aggregation and chart building only for what changed.
pub struct AppState {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<IpoDataset>,
    /// Path the dataset was read from.
    pub source: Option<PathBuf>,

    pub criteria: FilterCriteria,
    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,
    /// KPI figures for the visible records (cached).
    pub snapshot: MarketSnapshot,

    pub chart_kind: ChartKind,
    pub hist_field: NumericField,
    pub hist_bins: usize,
    pub scatter_x: NumericField,
    pub scatter_y: NumericField,
    pub scatter_color: ColorBy,
    pub scatter_size: Option<NumericField>,
    pub selected_company: Option<String>,
    /// Chart for the current layout and selection (cached).
    pub chart: Option<ChartSpec>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            source: None,
            criteria: FilterCriteria::default(),
            visible_indices: Vec::new(),
            snapshot: MarketSnapshot::compute(&[]),
            chart_kind: ChartKind::Distribution,
            hist_field: NumericField::ListingGain,
            hist_bins: HistogramSpec::DEFAULT_BINS,
            scatter_x: NumericField::IssueSize,
            scatter_y: NumericField::ListingGain,
            scatter_color: ColorBy::Status,
            scatter_size: Some(NumericField::IssueSize),
            selected_company: None,
            chart: None,
            status_message: None,
        }
    }
}

impl AppState {
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.hist_bins = bins.clamp(HistogramSpec::MIN_BINS, HistogramSpec::MAX_BINS);
        self
    }

    /// Ingest a newly loaded dataset with every year selected.
    pub fn set_dataset(&mut self, dataset: IpoDataset, source: Option<PathBuf>) {
        self.criteria = FilterCriteria::all_years(&dataset);
        self.dataset = Some(dataset);
        self.source = source;
        self.selected_company = None;
        self.status_message = None;
        self.refilter();
    }

    /// Load a file, keeping the current dataset if loading fails.
    pub fn open_path(&mut self, path: &Path) -> Result<(), LoadError> {
        match load_file(path) {
            Ok(dataset) => {
                self.set_dataset(dataset, Some(path.to_path_buf()));
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    // -- derived views --

    pub fn visible_rows(&self) -> Vec<&IpoRecord> {
        match &self.dataset {
            Some(ds) => self.visible_indices.iter().map(|&i| &ds.records[i]).collect(),
            None => Vec::new(),
        }
    }

    pub fn selection(&self) -> Selection {
        match &self.dataset {
            None => Selection::NoDataset,
            Some(_) if self.visible_indices.is_empty() => Selection::Empty,
            Some(_) => Selection::Rows(self.visible_indices.len()),
        }
    }

    /// Unique company names among visible records, in file order.
    pub fn visible_companies(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.visible_rows()
            .into_iter()
            .map(|r| r.company_name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Visible records newest first; undated rows go last, ordered by year.
    pub fn rows_by_date_desc(&self) -> Vec<&IpoRecord> {
        let mut rows = self.visible_rows();
        rows.sort_by_key(|r| std::cmp::Reverse((r.listing_date, r.listing_year)));
        rows
    }

    pub fn chart_json(&self) -> Option<String> {
        let chart = self.chart.as_ref()?;
        match chart.to_json() {
            Ok(json) => Some(json),
            Err(e) => {
                log::error!("Failed to serialise chart: {e}");
                None
            }
        }
    }

    // -- filter handlers --

    pub fn toggle_year(&mut self, year: i32) {
        if !self.criteria.years.remove(&year) {
            self.criteria.years.insert(year);
        }
        self.refilter();
    }

    pub fn select_all_years(&mut self) {
        if let Some(ds) = &self.dataset {
            self.criteria.years = ds.years.clone();
            self.refilter();
        }
    }

    /// Clearing the year selection removes the year constraint.
    pub fn select_no_years(&mut self) {
        self.criteria.years.clear();
        self.refilter();
    }

    pub fn set_company_query(&mut self, query: &str) {
        let query = (!query.trim().is_empty()).then(|| query.to_string());
        if query != self.criteria.company {
            self.criteria.company = query;
            self.refilter();
        }
    }

    // -- chart handlers --

    pub fn set_chart_kind(&mut self, kind: ChartKind) {
        if kind != self.chart_kind {
            self.chart_kind = kind;
            self.rebuild_chart();
        }
    }

    pub fn set_hist_field(&mut self, field: NumericField) {
        if field != self.hist_field {
            self.hist_field = field;
            self.rebuild_chart();
        }
    }

    pub fn set_hist_bins(&mut self, bins: usize) {
        let bins = bins.clamp(HistogramSpec::MIN_BINS, HistogramSpec::MAX_BINS);
        if bins != self.hist_bins {
            self.hist_bins = bins;
            self.rebuild_chart();
        }
    }

    pub fn set_scatter_axes(&mut self, x: NumericField, y: NumericField) {
        if (x, y) != (self.scatter_x, self.scatter_y) {
            self.scatter_x = x;
            self.scatter_y = y;
            self.rebuild_chart();
        }
    }

    pub fn set_scatter_color(&mut self, color: ColorBy) {
        if color != self.scatter_color {
            self.scatter_color = color;
            self.rebuild_chart();
        }
    }

    pub fn set_scatter_size(&mut self, size: Option<NumericField>) {
        if size != self.scatter_size {
            self.scatter_size = size;
            self.rebuild_chart();
        }
    }

    pub fn select_company(&mut self, name: &str) {
        if self.selected_company.as_deref() != Some(name) {
            self.selected_company = Some(name.to_string());
            self.rebuild_chart();
        }
    }

    // -- recomputation --

    /// Recompute visible rows and everything derived from them.
    fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        self.visible_indices = filtered_indices(ds, &self.criteria);
        log::debug!(
            "Filter {:?} keeps {} of {} records",
            self.criteria,
            self.visible_indices.len(),
            ds.len()
        );
        let snapshot = MarketSnapshot::compute(&self.visible_rows());
        self.snapshot = snapshot;

        // Keep the company explorer pointed at a visible company.
        let replacement = {
            let companies = self.visible_companies();
            let still_visible = self
                .selected_company
                .as_deref()
                .is_some_and(|name| companies.contains(&name));
            (!still_visible).then(|| companies.first().map(|s| s.to_string()))
        };
        if let Some(company) = replacement {
            self.selected_company = company;
        }

        self.rebuild_chart();
    }

    fn rebuild_chart(&mut self) {
        let chart = {
            let Some(ds) = &self.dataset else {
                self.chart = None;
                return;
            };
            let rows = self.visible_rows();
            match self.chart_kind {
            ChartKind::Distribution => Some(ChartSpec::Histogram(HistogramSpec::build(
                &rows,
                self.hist_field,
                self.hist_bins,
            ))),
            ChartKind::Scatter => Some(ChartSpec::Scatter(ScatterSpec::build(
                &rows,
                self.scatter_x,
                self.scatter_y,
                self.scatter_color,
                self.scatter_size,
            ))),
            ChartKind::Heatmap => Some(ChartSpec::Heatmap(HeatmapSpec::build(
                &rows,
                &NumericField::SUBSCRIPTION_HEATMAP,
            ))),
            ChartKind::Company => self
                .selected_company
                .as_deref()
                .and_then(|name| CompanyScorecard::for_company(&rows, name))
                .map(|card| ChartSpec::Company(CompanyCharts::build(&ds.rows(), card))),
            }
        };
        self.chart = chart;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::record;

    fn loaded() -> AppState {
        let ds = IpoDataset::from_records(
            vec![record("A", 2021, 10.0), record("B", 2021, -5.0), record("C", 2022, 0.0)],
            Vec::new(),
        );
        let mut state = AppState::default();
        state.set_dataset(ds, None);
        state
    }

    #[test]
    fn new_dataset_shows_everything() {
        let state = loaded();
        assert_eq!(state.selection(), Selection::Rows(3));
        assert_eq!(state.snapshot.total, 3);
        assert_eq!(state.selected_company.as_deref(), Some("A"));
        assert!(matches!(state.chart, Some(ChartSpec::Histogram(_))));
    }

    #[test]
    fn year_toggle_updates_snapshot() {
        let mut state = loaded();
        state.toggle_year(2022);
        assert_eq!(state.snapshot.total, 2);
        assert_eq!(state.snapshot.avg_listing_gain, Some(2.5));
        assert_eq!(state.snapshot.success_rate, 50.0);

        state.select_no_years();
        assert_eq!(state.snapshot.total, 3);
        state.select_all_years();
        assert_eq!(state.criteria.years.len(), 2);
    }

    #[test]
    fn empty_selection_is_a_display_state() {
        let mut state = loaded();
        state.set_company_query("zzz");
        assert_eq!(state.selection(), Selection::Empty);
        assert_eq!(state.snapshot.total, 0);
        assert_eq!(state.selected_company, None);
        state.set_chart_kind(ChartKind::Company);
        assert!(state.chart.is_none());
    }

    #[test]
    fn company_selection_follows_filter() {
        let mut state = loaded();
        state.select_company("B");
        state.set_chart_kind(ChartKind::Company);
        match &state.chart {
            Some(ChartSpec::Company(c)) => assert_eq!(c.scorecard.company_name, "B"),
            other => panic!("unexpected chart {other:?}"),
        }

        state.set_company_query("c");
        assert_eq!(state.selected_company.as_deref(), Some("C"));
        assert!(state.chart_json().is_some_and(|j| j.contains("\"company\"")));
    }

    #[test]
    fn table_rows_are_newest_first() {
        let mut undated = record("Undated", 2023, 1.0);
        undated.listing_date = None;
        let ds = IpoDataset::from_records(
            vec![record("Old", 2019, 1.0), undated, record("New", 2022, 1.0)],
            Vec::new(),
        );
        let mut state = AppState::default();
        state.set_dataset(ds, None);
        let names: Vec<&str> = state
            .rows_by_date_desc()
            .into_iter()
            .map(|r| r.company_name.as_str())
            .collect();
        assert_eq!(names, vec!["New", "Old", "Undated"]);
    }

    #[test]
    fn bins_are_clamped() {
        let mut state = loaded();
        state.set_hist_bins(1000);
        assert_eq!(state.hist_bins, HistogramSpec::MAX_BINS);
        assert_eq!(AppState::default().with_bins(0).hist_bins, HistogramSpec::MIN_BINS);
    }

    #[test]
    fn failed_open_keeps_current_dataset() {
        let mut state = loaded();
        let err = state.open_path(Path::new("/no/such/ipo.csv"));
        assert!(err.is_err());
        assert_eq!(state.selection(), Selection::Rows(3));
        assert!(state.status_message.is_some());
    }

    #[test]
    fn reopen_after_failure_replaces_dataset_and_clears_error() {
        use std::io::Write;

        let mut state = loaded();
        assert!(state.open_path(Path::new("/no/such/ipo.csv")).is_err());

        let mut tmp = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            tmp,
            "Date,IPOName,Issue_Size,Subscription_QIB,Subscription_HNI,Subscription_RII,Subscription_Total,Issue_Price,Listing_Gains_Percent\n\
             03/02/10,Infinite Comp,189.8,48.44,106.02,11.08,43.22,165,11.82\n"
        )
        .expect("write csv");
        tmp.flush().expect("flush");

        state.open_path(tmp.path()).expect("reopen");
        assert_eq!(state.selection(), Selection::Rows(1));
        assert_eq!(state.status_message, None);
        assert_eq!(state.source.as_deref(), Some(tmp.path()));
    }
}
