//! Chart specifications: pure data describing what to draw.
//!
//! Every spec is built from rows handed over by the filter stage and can be
//! serialised to JSON; `ui::plot` turns them into egui_plot items.

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::model::{IpoRecord, NumericField, Status};
use crate::stats::{correlation_matrix, mean_of, CompanyScorecard};

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub profit: usize,
    pub loss: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSpec {
    pub field: NumericField,
    /// Bins carry Profit / Loss counts that the UI should stack.
    pub split_by_status: bool,
    pub bins: Vec<HistogramBin>,
    /// Box summary drawn as a marginal strip above the bars.
    pub marginal: Option<BoxSummary>,
}

impl HistogramSpec {
    pub const MIN_BINS: usize = 5;
    pub const MAX_BINS: usize = 100;
    pub const DEFAULT_BINS: usize = 30;

    /// Equal-width histogram over `[min, max]` of the rows carrying `field`.
    /// The maximum falls into the last bin.
    pub fn build(rows: &[&IpoRecord], field: NumericField, bins: usize) -> Self {
        let n_bins = bins.clamp(Self::MIN_BINS, Self::MAX_BINS);
        let values: Vec<(f64, Status)> = rows
            .iter()
            .filter_map(|r| Some((r.value(field)?, r.status())))
            .collect();
        let split_by_status = field == NumericField::ListingGain;
        let marginal = BoxSummary::build(rows, field);

        let Some((min, max)) = min_max(values.iter().map(|v| v.0)) else {
            return HistogramSpec {
                field,
                split_by_status,
                bins: Vec::new(),
                marginal,
            };
        };

        let (start, width, n_bins) = if max - min < f64::EPSILON {
            (min - 0.5, 1.0, 1)
        } else {
            (min, (max - min) / n_bins as f64, n_bins)
        };

        let mut bins: Vec<HistogramBin> = (0..n_bins)
            .map(|i| HistogramBin {
                lower: start + i as f64 * width,
                upper: start + (i + 1) as f64 * width,
                count: 0,
                profit: 0,
                loss: 0,
            })
            .collect();

        for (v, status) in values {
            let idx = (((v - start) / width).floor() as usize).min(n_bins - 1);
            let bin = &mut bins[idx];
            bin.count += 1;
            match status {
                Status::Profit => bin.profit += 1,
                Status::Loss => bin.loss += 1,
            }
        }

        HistogramSpec {
            field,
            split_by_status,
            bins,
            marginal,
        }
    }

    pub fn title(&self) -> String {
        format!("Distribution of {}", self.field)
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// A single value outside the whiskers, kept with the row it came from so
/// the hover label can name it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginalPoint {
    pub company_name: String,
    pub listing_date: Option<NaiveDate>,
    pub value: f64,
}

impl MarginalPoint {
    pub fn hover_text(&self) -> String {
        match self.listing_date {
            Some(date) => format!("{}\n{}", self.company_name, date.format("%d/%m/%Y")),
            None => self.company_name.clone(),
        }
    }
}

/// Tukey box: linear-interpolated quartiles, whiskers at the furthest values
/// within 1.5 IQR of the box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<MarginalPoint>,
}

impl BoxSummary {
    pub fn build(rows: &[&IpoRecord], field: NumericField) -> Option<Self> {
        let mut values: Vec<(f64, &IpoRecord)> = rows
            .iter()
            .filter_map(|r| Some((r.value(field)?, *r)))
            .filter(|(v, _)| v.is_finite())
            .collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| a.0.total_cmp(&b.0));
        let sorted: Vec<f64> = values.iter().map(|v| v.0).collect();

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let reach = 1.5 * (q3 - q1);
        let (low_fence, high_fence) = (q1 - reach, q3 + reach);

        let within = |v: &f64| (low_fence..=high_fence).contains(v);
        // The median is always within the fences, so both whiskers are finite.
        let (lower_whisker, upper_whisker) = sorted
            .iter()
            .copied()
            .filter(within)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

        let outliers = values
            .iter()
            .filter(|(v, _)| !within(v))
            .map(|(v, r)| MarginalPoint {
                company_name: r.company_name.clone(),
                listing_date: r.listing_date,
                value: *v,
            })
            .collect();

        Some(BoxSummary {
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
            outliers,
        })
    }
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

/// Point colour encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorBy {
    Status,
    Field(NumericField),
}

impl std::fmt::Display for ColorBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorBy::Status => write!(f, "Status"),
            ColorBy::Field(field) => write!(f, "{field}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub status: Status,
    pub color_value: Option<f64>,
    pub size_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSpec {
    pub x: NumericField,
    pub y: NumericField,
    pub color: ColorBy,
    pub size: Option<NumericField>,
    pub points: Vec<ScatterPoint>,
    /// Min / max of the colour field, when colouring by a numeric field.
    pub color_range: Option<(f64, f64)>,
    pub size_range: Option<(f64, f64)>,
}

impl ScatterSpec {
    pub const MIN_RADIUS: f64 = 2.0;
    pub const MAX_RADIUS: f64 = 14.0;

    /// Rows missing either axis value are left out.
    pub fn build(
        rows: &[&IpoRecord],
        x: NumericField,
        y: NumericField,
        color: ColorBy,
        size: Option<NumericField>,
    ) -> Self {
        let points: Vec<ScatterPoint> = rows
            .iter()
            .filter_map(|r| {
                Some(ScatterPoint {
                    label: r.company_name.clone(),
                    x: r.value(x)?,
                    y: r.value(y)?,
                    status: r.status(),
                    color_value: match color {
                        ColorBy::Status => None,
                        ColorBy::Field(f) => r.value(f),
                    },
                    size_value: size.and_then(|f| r.value(f)),
                })
            })
            .collect();

        let color_range = min_max(points.iter().filter_map(|p| p.color_value));
        let size_range = min_max(points.iter().filter_map(|p| p.size_value));

        ScatterSpec {
            x,
            y,
            color,
            size,
            points,
            color_range,
            size_range,
        }
    }

    pub fn title(&self) -> String {
        format!("{} vs {}", self.y, self.x)
    }

    /// Marker radius in points; area grows linearly with the size value.
    pub fn marker_radius(&self, point: &ScatterPoint) -> f64 {
        let (Some(v), Some((lo, hi))) = (point.size_value, self.size_range) else {
            return Self::MIN_RADIUS + 2.0;
        };
        if hi - lo < f64::EPSILON {
            return (Self::MIN_RADIUS + Self::MAX_RADIUS) / 2.0;
        }
        let t = ((v - lo) / (hi - lo)).clamp(0.0, 1.0).sqrt();
        Self::MIN_RADIUS + t * (Self::MAX_RADIUS - Self::MIN_RADIUS)
    }
}

// ---------------------------------------------------------------------------
// Company comparisons
// ---------------------------------------------------------------------------

/// One category of a grouped bar chart: the company's value next to the
/// market mean of the same field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarGroup {
    pub category: String,
    pub company: f64,
    pub market: Option<f64>,
}

/// QIB and RII subscription of a company against the market-wide means.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionComparison {
    pub company: String,
    pub groups: Vec<BarGroup>,
}

impl SubscriptionComparison {
    /// `market` is the whole loaded table, not the filtered selection.
    pub fn build(market: &[&IpoRecord], card: &CompanyScorecard) -> Self {
        let group = |category: &str, company: f64, field: NumericField| BarGroup {
            category: category.to_string(),
            company,
            market: mean_of(market, field),
        };
        SubscriptionComparison {
            company: card.company_name.clone(),
            groups: vec![
                group("QIB", card.qib_subscription, NumericField::SubscriptionQib),
                group("RII", card.rii_subscription, NumericField::SubscriptionRii),
            ],
        }
    }
}

/// Listing gain of a company against the market-average listing gain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GainComparison {
    pub company: String,
    pub company_gain: f64,
    pub market_gain: Option<f64>,
}

impl GainComparison {
    pub fn build(market: &[&IpoRecord], card: &CompanyScorecard) -> Self {
        GainComparison {
            company: card.company_name.clone(),
            company_gain: card.listing_gain_percent,
            market_gain: mean_of(market, NumericField::ListingGain),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownSlice {
    pub category: String,
    pub value: f64,
    /// Fraction of the whole pie in [0, 1].
    pub share: f64,
}

/// QIB / HNI / RII shares of a company's subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionBreakdown {
    pub company: String,
    pub slices: Vec<BreakdownSlice>,
}

impl SubscriptionBreakdown {
    /// Categories without a value are omitted; negative values count as zero.
    pub fn build(card: &CompanyScorecard) -> Self {
        let raw = [
            ("QIB", Some(card.qib_subscription)),
            ("HNI", card.hni_subscription),
            ("RII", Some(card.rii_subscription)),
        ];
        let present: Vec<(&str, f64)> = raw
            .iter()
            .filter_map(|(c, v)| Some((*c, v.map(|v| v.max(0.0))?)))
            .collect();
        let total: f64 = present.iter().map(|(_, v)| v).sum();

        SubscriptionBreakdown {
            company: card.company_name.clone(),
            slices: present
                .into_iter()
                .map(|(category, value)| BreakdownSlice {
                    category: category.to_string(),
                    value,
                    share: if total > 0.0 { value / total } else { 0.0 },
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapSpec {
    pub fields: Vec<NumericField>,
    /// `values[row][col]`, `None` where the correlation is undefined.
    pub values: Vec<Vec<Option<f64>>>,
}

impl HeatmapSpec {
    pub fn build(rows: &[&IpoRecord], fields: &[NumericField]) -> Self {
        HeatmapSpec {
            fields: fields.to_vec(),
            values: correlation_matrix(rows, fields),
        }
    }
}

// ---------------------------------------------------------------------------
// Export envelope
// ---------------------------------------------------------------------------

/// Everything shown in the company explorer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyCharts {
    pub scorecard: CompanyScorecard,
    pub breakdown: SubscriptionBreakdown,
    pub gain: GainComparison,
    pub subscription: SubscriptionComparison,
}

impl CompanyCharts {
    pub fn build(market: &[&IpoRecord], card: CompanyScorecard) -> Self {
        CompanyCharts {
            breakdown: SubscriptionBreakdown::build(&card),
            gain: GainComparison::build(market, &card),
            subscription: SubscriptionComparison::build(market, &card),
            scorecard: card,
        }
    }
}

/// The chart currently on screen, in exportable form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Histogram(HistogramSpec),
    Scatter(ScatterSpec),
    Heatmap(HeatmapSpec),
    Company(CompanyCharts),
}

impl ChartSpec {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
