use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Raw data explorer
// ---------------------------------------------------------------------------

const HEADERS: [&str; 10] = [
    "Date",
    "IPOName",
    "Issue_Size",
    "Subscription_QIB",
    "Subscription_HNI",
    "Subscription_RII",
    "Subscription_Total",
    "Issue_Price",
    "Listing_Gains_Percent",
    "Status",
];

fn optional(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.2}")).unwrap_or_default()
}

/// Collapsible table of the visible records, newest first.
pub fn raw_data(ui: &mut Ui, state: &AppState) {
    ui.heading("📄 Raw Data Explorer");
    egui::CollapsingHeader::new("View Full Dataset")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let rows = state.rows_by_date_desc();
            if rows.is_empty() {
                ui.label("No data for the current selection.");
                return;
            }

            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .max_scroll_height(360.0)
                .column(Column::auto().at_least(80.0))
                .column(Column::initial(200.0).at_least(120.0))
                .columns(Column::auto().at_least(60.0), HEADERS.len() - 2)
                .header(20.0, |mut header| {
                    for title in HEADERS {
                        header.col(|ui| {
                            ui.strong(title);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, rows.len(), |mut row| {
                        let r = rows[row.index()];
                        let date = r
                            .listing_date
                            .map(|d| d.format("%Y-%m-%d").to_string())
                            .unwrap_or_else(|| r.listing_year.to_string());
                        let status = r.status();
                        let cells = [
                            date,
                            r.company_name.clone(),
                            format!("{:.2}", r.issue_size),
                            format!("{:.2}", r.qib_subscription),
                            optional(r.hni_subscription),
                            format!("{:.2}", r.rii_subscription),
                            optional(r.total_subscription),
                            format!("{:.2}", r.issue_price),
                            format!("{:.2}", r.listing_gain_percent),
                        ];
                        for text in cells {
                            row.col(|ui| {
                                ui.label(text);
                            });
                        }
                        row.col(|ui| {
                            ui.label(RichText::new(status.to_string()).color(color::status_color(status)));
                        });
                    });
                });
        });
}
