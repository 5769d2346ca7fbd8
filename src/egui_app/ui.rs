//! egui renderer for the wizard UI.

mod analysis_panel;
mod map_render;
mod map_view;
mod side_panel;
mod style;
mod tags_panel;
mod upload_panel;

use std::time::Duration;

use eframe::egui::{self, Frame, Margin, RichText};

use crate::api::ApiClient;
use crate::egui_app::controller::Controller;
use crate::wizard::Stage;

/// Smallest usable window for the map canvas plus side panel.
pub const MIN_VIEWPORT_SIZE: egui::Vec2 = egui::vec2(900.0, 600.0);

/// Renders the wizard using the shared controller state.
pub struct EguiApp {
    controller: Controller,
    visuals_set: bool,
    last_probed_stage: Option<Stage>,
}

impl EguiApp {
    /// App at the Upload stage, talking to the given backend client.
    pub fn new(api: ApiClient) -> Self {
        Self {
            controller: Controller::new(api),
            visuals_set: false,
            last_probed_stage: None,
        }
    }

    fn apply_visuals(&mut self, ctx: &egui::Context) {
        if self.visuals_set {
            return;
        }
        let mut visuals = egui::Visuals::dark();
        style::apply_visuals(&mut visuals);
        ctx.set_visuals(visuals);
        self.visuals_set = true;
    }

    /// Probe backend health once per stage entry. The status badge offers a
    /// manual re-check; nothing fires on a timer.
    fn probe_health(&mut self) -> bool {
        let stage = self.controller.stage();
        if self.last_probed_stage == Some(stage) {
            return false;
        }
        self.last_probed_stage = Some(stage);
        self.controller.request_health_probe();
        true
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        let palette = style::palette();
        egui::TopBottomPanel::top("wizard_header")
            .frame(
                Frame::new()
                    .fill(palette.bg_primary)
                    .inner_margin(Margin::symmetric(8, 6)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("Clustering Map")
                            .color(palette.text_primary)
                            .strong(),
                    );
                    ui.separator();
                    let current = self.controller.stage();
                    for (position, stage) in Stage::ALL.iter().enumerate() {
                        if position > 0 {
                            ui.label(RichText::new(">").color(palette.text_muted));
                        }
                        let color = if *stage == current {
                            palette.accent_ice
                        } else if *stage < current {
                            palette.success
                        } else {
                            palette.text_muted
                        };
                        ui.label(
                            RichText::new(format!("{}. {}", position + 1, stage.label()))
                                .color(color),
                        );
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let reset = ui.add_enabled(
                            !self.controller.busy(),
                            egui::Button::new("Start over"),
                        );
                        if reset.clicked() {
                            self.controller.reset();
                        }
                    });
                });
            });
    }

    fn render_status(&mut self, ctx: &egui::Context) {
        let palette = style::palette();
        egui::TopBottomPanel::bottom("status_bar")
            .frame(
                Frame::new()
                    .fill(palette.bg_primary)
                    .inner_margin(Margin::symmetric(8, 4)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let (color, label) = match self.controller.ui.status.backend_healthy {
                        Some(true) => (palette.success, "backend ok"),
                        Some(false) => (palette.warning, "backend unreachable"),
                        None => (palette.text_muted, "backend …"),
                    };
                    ui.painter().circle_filled(
                        ui.cursor().min + egui::vec2(6.0, 9.0),
                        5.0,
                        color,
                    );
                    ui.add_space(14.0);
                    let badge = ui
                        .add(
                            egui::Label::new(RichText::new(label).color(palette.text_muted))
                                .sense(egui::Sense::click()),
                        )
                        .on_hover_text("Check backend now");
                    if badge.clicked() {
                        self.controller.request_health_probe();
                    }
                    ui.separator();
                    if let Some(entry) = self.controller.ui.status.latest() {
                        ui.label(RichText::new(&entry.message).color(entry.tone.color()));
                    }
                });
            });
    }
}

impl eframe::App for EguiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_visuals(ctx);
        self.probe_health();
        self.controller.poll_jobs();
        self.render_header(ctx);
        self.render_status(ctx);
        if self.controller.stage() == Stage::Visualization {
            egui::SidePanel::right("map_side")
                .resizable(false)
                .min_width(280.0)
                .max_width(340.0)
                .show(ctx, |ui| self.render_side_panel(ui));
        }
        egui::CentralPanel::default().show(ctx, |ui| match self.controller.stage() {
            Stage::Upload => self.render_upload_panel(ui),
            Stage::Tags => self.render_tags_panel(ui),
            Stage::Analysis => self.render_analysis_panel(ui),
            Stage::Visualization => self.render_map_panel(ui),
        });
        // Background jobs report over a channel, so keep frames coming even
        // without input.
        let tick = if self.controller.busy() {
            Duration::from_millis(100)
        } else {
            Duration::from_secs(1)
        };
        ctx.request_repaint_after(tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_probe_fires_once_per_stage_entry() {
        let mut app = EguiApp::new(ApiClient::new("http://127.0.0.1:9"));
        assert!(app.probe_health());
        assert!(!app.probe_health());
        assert!(!app.probe_health());
    }
}
