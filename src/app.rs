use eframe::egui::{self, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct IpoLensApp {
    pub state: AppState,
}

impl IpoLensApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for IpoLensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: KPIs, chart, raw table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("📈 Indian IPO Market Analysis");
            ui.label("Analyze historical IPO performance, listing gains, and subscription trends in the Indian Market.");
            ui.separator();

            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    if self.state.dataset.is_some() {
                        panels::kpi_row(ui, &self.state);
                        ui.separator();
                    }
                    plot::chart_area(ui, &mut self.state);
                    if self.state.dataset.is_some() {
                        ui.separator();
                        table::raw_data(ui, &self.state);
                    }
                });
        });
    }
}
