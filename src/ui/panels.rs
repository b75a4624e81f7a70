use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, Selection};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Configuration");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let all_years: Vec<i32> = dataset.years.iter().copied().collect();
    let skipped = dataset.skipped.len();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Company search ----
            ui.strong("Company");
            let mut query = state.criteria.company.clone().unwrap_or_default();
            let edit = egui::TextEdit::singleline(&mut query).hint_text("Search by name…");
            if ui.add(edit).changed() {
                state.set_company_query(&query);
            }
            ui.separator();

            // ---- Year multiselect ----
            let n_selected = state.criteria.years.len();
            let header_text = format!("Select Year(s)  ({n_selected}/{})", all_years.len());
            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("year_filter")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_years();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_years();
                        }
                    });
                    if state.criteria.years.is_empty() {
                        ui.label(RichText::new("No year selected: showing all years").weak());
                    }

                    for year in &all_years {
                        let mut checked = state.criteria.years.contains(year);
                        if ui.checkbox(&mut checked, year.to_string()).changed() {
                            state.toggle_year(*year);
                        }
                    }
                });

            ui.separator();
            match state.selection() {
                Selection::Rows(n) => ui.label(format!("Showing {n} IPOs")),
                Selection::Empty => ui.label(RichText::new("No IPOs match the filters").color(Color32::YELLOW)),
                Selection::NoDataset => ui.label(""),
            };
            if skipped > 0 {
                ui.label(RichText::new(format!("{skipped} unparseable rows skipped")).weak());
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Copy chart JSON").clicked() {
                if let Some(json) = state.chart_json() {
                    ui.ctx().copy_text(json);
                    log::info!("Copied current chart spec to clipboard");
                }
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let source = state
                .source
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!(
                "{source}  {} IPOs loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// KPI row
// ---------------------------------------------------------------------------

/// Render the "Market Snapshot" metrics.
pub fn kpi_row(ui: &mut Ui, state: &AppState) {
    ui.heading("📊 Market Snapshot");
    let snap = &state.snapshot;
    let avg_gain = snap
        .avg_listing_gain
        .map(|g| format!("{g:.2}%"))
        .unwrap_or_else(|| "N/A".to_string());

    let avg_size = snap
        .avg_issue_size
        .map(|s| format!("₹{s:.0} Cr"))
        .unwrap_or_else(|| "N/A".to_string());

    ui.columns(5, |cols| {
        metric(&mut cols[0], "Total IPOs", &snap.total.to_string());
        metric(&mut cols[1], "Avg Listing Gain", &avg_gain);
        metric(&mut cols[2], "Profitable IPOs", &snap.profitable.to_string());
        metric(&mut cols[3], "Success Rate", &format!("{:.1}%", snap.success_rate));
        metric(&mut cols[4], "Avg Issue Size", &avg_size);
    });
}

/// A labelled figure in a framed box.
pub fn metric(ui: &mut Ui, label: &str, value: &str) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_min_width(ui.available_width());
        ui.label(RichText::new(label).small());
        ui.label(RichText::new(value).size(22.0).strong());
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open IPO data")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match state.open_path(&path) {
            Ok(()) => log::info!("Switched dataset to {}", path.display()),
            Err(e) => log::debug!("Keeping previous dataset after failed open: {e}"),
        }
    }
}
