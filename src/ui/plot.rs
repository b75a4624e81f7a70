use std::f32::consts::TAU;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, RichText, Sense, Shape, Stroke, Ui, Vec2};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Plot, PlotPoints, Points};

use crate::chart::{
    ChartSpec, ColorBy, CompanyCharts, GainComparison, HeatmapSpec, HistogramSpec, ScatterSpec,
    SubscriptionBreakdown, SubscriptionComparison,
};
use crate::color::{self, ColorScale};
use crate::data::model::{NumericField, Status};
use crate::state::{AppState, ChartKind, Selection};
use crate::ui::panels::metric;

const PLOT_HEIGHT: f32 = 420.0;
const OUTLIER_NAME: &str = "Outliers";

// ---------------------------------------------------------------------------
// Custom visualisation (central panel)
// ---------------------------------------------------------------------------

/// Render the chart selector, per-chart controls and the chart itself.
pub fn chart_area(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🛠 Custom Visualization");

    let current = state.chart_kind;
    egui::ComboBox::from_label("Choose Chart Layout")
        .selected_text(current.label())
        .show_ui(ui, |ui: &mut Ui| {
            for kind in ChartKind::ALL {
                if ui.selectable_label(kind == current, kind.label()).clicked() {
                    state.set_chart_kind(kind);
                }
            }
        });
    ui.add_space(6.0);

    match state.selection() {
        Selection::NoDataset => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a file to view IPO data  (File → Open…)");
            });
            return;
        }
        Selection::Empty => {
            ui.label(RichText::new("No data for the current selection.").heading().weak());
            return;
        }
        Selection::Rows(_) => {}
    }

    match state.chart_kind {
        ChartKind::Distribution => distribution_controls(ui, state),
        ChartKind::Scatter => scatter_controls(ui, state),
        ChartKind::Company => company_controls(ui, state),
        ChartKind::Heatmap => {
            ui.label("Correlation between different subscription categories and listing gains.");
        }
    }

    match &state.chart {
        Some(ChartSpec::Histogram(spec)) => histogram(ui, spec),
        Some(ChartSpec::Scatter(spec)) => scatter(ui, spec),
        Some(ChartSpec::Heatmap(spec)) => heatmap(ui, spec),
        Some(ChartSpec::Company(charts)) => company(ui, charts),
        None => {
            ui.label("No data for the current selection.");
        }
    }
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

fn field_combo(ui: &mut Ui, id: &str, label: &str, current: NumericField, options: &[NumericField]) -> NumericField {
    let mut picked = current;
    ui.label(label);
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for &field in options {
                ui.selectable_value(&mut picked, field, field.to_string());
            }
        });
    picked
}

fn distribution_controls(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        let field = field_combo(ui, "hist_field", "Variable", state.hist_field, &NumericField::DISTRIBUTION);
        state.set_hist_field(field);

        let mut bins = state.hist_bins;
        ui.label("Number of Bins");
        let slider = egui::Slider::new(&mut bins, HistogramSpec::MIN_BINS..=HistogramSpec::MAX_BINS);
        if ui.add(slider).changed() {
            state.set_hist_bins(bins);
        }
    });
}

fn scatter_controls(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        let x = field_combo(ui, "scatter_x", "X-Axis", state.scatter_x, &NumericField::ALL);
        let y = field_combo(ui, "scatter_y", "Y-Axis", state.scatter_y, &NumericField::ALL);
        state.set_scatter_axes(x, y);

        let mut color = state.scatter_color;
        ui.label("Color By");
        egui::ComboBox::from_id_salt("scatter_color")
            .selected_text(color.to_string())
            .show_ui(ui, |ui: &mut Ui| {
                ui.selectable_value(&mut color, ColorBy::Status, "Status");
                for field in NumericField::ALL {
                    ui.selectable_value(&mut color, ColorBy::Field(field), field.to_string());
                }
            });
        state.set_scatter_color(color);

        let mut sized = state.scatter_size.is_some();
        if ui.checkbox(&mut sized, "Size by Issue_Size").changed() {
            state.set_scatter_size(sized.then_some(NumericField::IssueSize));
        }
    });
}

fn company_controls(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🏢 Company Explorer");
    let current = state.selected_company.clone().unwrap_or_default();
    let companies: Vec<String> = state.visible_companies().into_iter().map(str::to_string).collect();

    let mut picked: Option<String> = None;
    egui::ComboBox::from_label("Select Company")
        .selected_text(current.as_str())
        .height(300.0)
        .show_ui(ui, |ui: &mut Ui| {
            for name in &companies {
                if ui.selectable_label(*name == current, name.as_str()).clicked() {
                    picked = Some(name.clone());
                }
            }
        });
    if let Some(name) = picked {
        state.select_company(&name);
    }
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

fn histogram(ui: &mut Ui, spec: &HistogramSpec) {
    if spec.is_empty() {
        ui.label(format!("No values for {}.", spec.field));
        return;
    }

    let bar = |center: f64, value: usize, width: f64| Bar::new(center, value as f64).width(width);

    // Marginal strip sits just above the tallest bar.
    let tallest = spec.bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64;
    let strip_y = tallest * 1.15;
    let strip_h = tallest * 0.08;
    let outliers: Vec<(f64, String)> = spec
        .marginal
        .iter()
        .flat_map(|m| m.outliers.iter())
        .map(|p| (p.value, p.hover_text()))
        .collect();

    Plot::new("histogram")
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label(spec.field.label())
        .y_axis_label("count")
        .label_formatter(move |name, value| {
            let named = (name == OUTLIER_NAME)
                .then(|| {
                    outliers
                        .iter()
                        .min_by(|a, b| (a.0 - value.x).abs().total_cmp(&(b.0 - value.x).abs()))
                })
                .flatten();
            match named {
                Some((v, text)) => format!("{text}\n{v:.2}"),
                None if name.is_empty() => format!("{:.2}", value.x),
                None => format!("{name}\n{:.2}", value.x),
            }
        })
        .show(ui, |plot_ui| {
            if let Some(summary) = &spec.marginal {
                let spread = BoxSpread::new(
                    summary.lower_whisker,
                    summary.q1,
                    summary.median,
                    summary.q3,
                    summary.upper_whisker,
                );
                let elem = BoxElem::new(strip_y, spread)
                    .box_width(strip_h)
                    .whisker_width(strip_h * 0.6);
                plot_ui.box_plot(
                    BoxPlot::new(vec![elem])
                        .horizontal()
                        .name(format!("{} spread", spec.field))
                        .color(color::MARKET),
                );
                if !summary.outliers.is_empty() {
                    let points: Vec<[f64; 2]> =
                        summary.outliers.iter().map(|p| [p.value, strip_y]).collect();
                    plot_ui.points(
                        Points::new(PlotPoints::from(points))
                            .radius(3.0)
                            .color(color::MARKET)
                            .name(OUTLIER_NAME),
                    );
                }
            }

            if spec.split_by_status {
                let profit = BarChart::new(
                    spec.bins.iter().map(|b| bar(b.center(), b.profit, b.width())).collect(),
                )
                .name(Status::Profit.to_string())
                .color(color::PROFIT);
                let loss = BarChart::new(
                    spec.bins.iter().map(|b| bar(b.center(), b.loss, b.width())).collect(),
                )
                .name(Status::Loss.to_string())
                .color(color::LOSS)
                .stack_on(&[&profit]);
                plot_ui.bar_chart(profit);
                plot_ui.bar_chart(loss);
            } else {
                let all = BarChart::new(
                    spec.bins.iter().map(|b| bar(b.center(), b.count, b.width())).collect(),
                )
                .name(spec.title())
                .color(color::MARKET);
                plot_ui.bar_chart(all);
            }
        });
}

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

fn scatter(ui: &mut Ui, spec: &ScatterSpec) {
    ui.label(RichText::new(spec.title()).strong());
    let scale = ColorScale::sequential();

    Plot::new("scatter")
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label(spec.x.label())
        .y_axis_label(spec.y.label())
        .label_formatter(|name, value| {
            if name.is_empty() {
                format!("x = {:.2}\ny = {:.2}", value.x, value.y)
            } else {
                format!("{name}\nx = {:.2}\ny = {:.2}", value.x, value.y)
            }
        })
        .show(ui, |plot_ui| {
            for point in &spec.points {
                let (color, name) = match (spec.color, spec.color_range) {
                    (ColorBy::Field(_), Some((lo, hi))) => (
                        point
                            .color_value
                            .map(|v| scale.sample_range(v, lo, hi))
                            .unwrap_or(Color32::GRAY),
                        String::new(),
                    ),
                    _ => (color::status_color(point.status), point.status.to_string()),
                };
                let marker = Points::new(PlotPoints::from(vec![[point.x, point.y]]))
                    .radius(spec.marker_radius(point) as f32)
                    .color(color.gamma_multiply(0.8))
                    .filled(true)
                    .name(name);
                plot_ui.points(marker);
            }
        });

    if let (ColorBy::Field(field), Some((lo, hi))) = (spec.color, spec.color_range) {
        color_legend(ui, &scale, &field.to_string(), lo, hi);
    }
}

fn color_legend(ui: &mut Ui, scale: &ColorScale, title: &str, lo: f64, hi: f64) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!("{title}: {lo:.2}"));
        let (rect, _) = ui.allocate_exact_size(Vec2::new(160.0, 12.0), Sense::hover());
        let steps = 32;
        let step_w = rect.width() / steps as f32;
        for i in 0..steps {
            let r = egui::Rect::from_min_size(
                Pos2::new(rect.left() + i as f32 * step_w, rect.top()),
                Vec2::new(step_w + 0.5, rect.height()),
            );
            ui.painter()
                .rect_filled(r, 0.0, scale.sample(i as f64 / (steps - 1) as f64));
        }
        ui.label(format!("{hi:.2}"));
    });
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

fn heatmap(ui: &mut Ui, spec: &HeatmapSpec) {
    ui.label(RichText::new("Correlation Matrix: Subscription & Gains").strong());
    let scale = ColorScale::diverging();
    let n = spec.fields.len();
    if n == 0 {
        return;
    }

    let label_w = 170.0;
    let cell = ((ui.available_width() - label_w) / n as f32).clamp(40.0, 90.0);
    let size = Vec2::new(label_w + cell * n as f32, cell * n as f32 + 40.0);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let origin = response.rect.min;
    let font = FontId::proportional(12.0);

    for (i, field) in spec.fields.iter().enumerate() {
        painter.text(
            Pos2::new(origin.x + label_w - 6.0, origin.y + cell * (i as f32 + 0.5)),
            Align2::RIGHT_CENTER,
            field.to_string(),
            font.clone(),
            ui.visuals().text_color(),
        );
        for (j, value) in spec.values[i].iter().enumerate() {
            let rect = egui::Rect::from_min_size(
                Pos2::new(origin.x + label_w + cell * j as f32, origin.y + cell * i as f32),
                Vec2::splat(cell - 1.0),
            );
            let (fill, text) = match value {
                Some(v) => (scale.sample((v + 1.0) / 2.0), format!("{v:.2}")),
                None => (Color32::DARK_GRAY, "n/a".to_string()),
            };
            painter.rect_filled(rect, 0.0, fill);
            painter.text(rect.center(), Align2::CENTER_CENTER, text, font.clone(), Color32::BLACK);
        }
    }
    for (j, field) in spec.fields.iter().enumerate() {
        let label = field.to_string().replace("Subscription_", "Sub_");
        painter.text(
            Pos2::new(origin.x + label_w + cell * (j as f32 + 0.5), origin.y + cell * n as f32 + 12.0),
            Align2::CENTER_CENTER,
            label,
            FontId::proportional(10.0),
            ui.visuals().text_color(),
        );
    }
}

// ---------------------------------------------------------------------------
// Company explorer
// ---------------------------------------------------------------------------

fn company(ui: &mut Ui, charts: &CompanyCharts) {
    let card = &charts.scorecard;
    let total = card
        .total_subscription
        .map(|t| format!("{t}x"))
        .unwrap_or_else(|| "N/A".to_string());
    ui.columns(4, |cols| {
        metric(&mut cols[0], "Issue Price", &format!("₹{}", card.issue_price));
        metric(&mut cols[1], "Issue Size", &format!("₹{} Cr", card.issue_size));
        metric(
            &mut cols[2],
            "Listing Gains",
            &format!("{:.2}% ({})", card.listing_gain_percent, card.status),
        );
        metric(&mut cols[3], "Total Subscription", &total);
    });

    ui.add_space(8.0);
    ui.heading("Subscription Breakdown");
    ui.columns(2, |cols| {
        breakdown_pie(&mut cols[0], &charts.breakdown);
        gain_comparison(&mut cols[1], &charts.gain);
    });
    subscription_comparison(ui, &charts.subscription);
}

fn breakdown_pie(ui: &mut Ui, pie: &SubscriptionBreakdown) {
    ui.label(RichText::new(format!("Subscription Breakdown for {}", pie.company)).strong());
    let palette = color::generate_palette(pie.slices.len());
    let diameter = ui.available_width().min(260.0);
    let (response, painter) = ui.allocate_painter(Vec2::new(diameter, diameter), Sense::hover());
    let center = response.rect.center();
    let radius = diameter / 2.0 - 4.0;

    let mut start = -TAU / 4.0;
    for (slice, fill) in pie.slices.iter().zip(palette.iter().copied()) {
        let sweep = slice.share as f32 * TAU;
        if sweep <= 0.0 {
            continue;
        }
        // Fan of thin triangles keeps every shape convex.
        let steps = ((sweep / TAU) * 96.0).ceil().max(1.0) as usize;
        for k in 0..steps {
            let a0 = start + sweep * k as f32 / steps as f32;
            let a1 = start + sweep * (k + 1) as f32 / steps as f32;
            let p0 = center + radius * Vec2::angled(a0);
            let p1 = center + radius * Vec2::angled(a1);
            painter.add(Shape::convex_polygon(vec![center, p0, p1], fill, Stroke::NONE));
        }
        let mid = start + sweep / 2.0;
        painter.text(
            center + radius * 0.6 * Vec2::angled(mid),
            Align2::CENTER_CENTER,
            format!("{}\n{:.1}%", slice.category, slice.share * 100.0),
            FontId::proportional(12.0),
            Color32::BLACK,
        );
        start += sweep;
    }
    if pie.slices.iter().all(|s| s.share == 0.0) {
        painter.text(center, Align2::CENTER_CENTER, "no subscription data", FontId::proportional(12.0), Color32::GRAY);
    }
}

fn gain_comparison(ui: &mut Ui, gain: &GainComparison) {
    ui.label(RichText::new("Performance vs Market Average").strong());
    let company = BarChart::new(vec![Bar::new(0.0, gain.company_gain).width(0.6)])
        .name(&gain.company)
        .color(color::PROFIT);
    let market = gain
        .market_gain
        .map(|m| BarChart::new(vec![Bar::new(1.0, m).width(0.6)]).name("Market Average").color(color::MARKET));

    Plot::new("gain_comparison")
        .legend(Legend::default())
        .height(260.0)
        .y_axis_label(NumericField::ListingGain.label())
        .show_x(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(company);
            if let Some(market) = market {
                plot_ui.bar_chart(market);
            }
        });
}

fn subscription_comparison(ui: &mut Ui, cmp: &SubscriptionComparison) {
    ui.label(RichText::new(format!("QIB vs RII: {} against market mean", cmp.company)).strong());
    let company: Vec<Bar> = cmp
        .groups
        .iter()
        .enumerate()
        .map(|(i, g)| Bar::new(i as f64 - 0.2, g.company).width(0.35).name(&g.category))
        .collect();
    let market: Vec<Bar> = cmp
        .groups
        .iter()
        .enumerate()
        .filter_map(|(i, g)| Some(Bar::new(i as f64 + 0.2, g.market?).width(0.35).name(&g.category)))
        .collect();
    let categories: Vec<String> = cmp.groups.iter().map(|g| g.category.clone()).collect();

    Plot::new("subscription_comparison")
        .legend(Legend::default())
        .height(260.0)
        .y_axis_label("Subscription (x)")
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() < 1e-6 && idx >= 0.0 {
                categories.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(company).name(&cmp.company).color(color::PROFIT));
            plot_ui.bar_chart(BarChart::new(market).name("Market Average").color(color::MARKET));
        });
}
