use super::style;
use super::*;
use eframe::egui;

impl EguiApp {
    pub(super) fn render_upload_panel(&mut self, ui: &mut egui::Ui) {
        let palette = style::palette();
        ui.add_space(32.0);
        ui.vertical_centered(|ui| {
            ui.heading("Upload survey data");
            ui.label(
                RichText::new("Excel or CSV with one free-text answer column")
                    .color(palette.text_muted),
            );
            ui.add_space(16.0);
            if let Some(path) = &self.controller.ui.upload.picked_file {
                ui.label(format!("Selected: {}", path.display()));
                ui.add_space(8.0);
            }
            let uploading = self.controller.upload_pending();
            let label = if uploading {
                "Uploading…"
            } else {
                "Choose file…"
            };
            if ui
                .add_enabled(!uploading, egui::Button::new(label))
                .clicked()
            {
                self.controller.pick_and_upload();
            }
            if uploading {
                ui.add_space(8.0);
                ui.spinner();
            }
        });
    }
}
