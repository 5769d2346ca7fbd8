use super::style;
use super::*;
use crate::egui_app::view_model;
use eframe::egui;

/// Vertical room kept below the candidate list for the navigation buttons.
const FOOTER_RESERVE: f32 = 48.0;

fn list_height(available: f32) -> f32 {
    (available - FOOTER_RESERVE).max(0.0)
}

impl EguiApp {
    pub(super) fn render_tags_panel(&mut self, ui: &mut egui::Ui) {
        let palette = style::palette();
        ui.heading("Review tag candidates");
        ui.label(
            RichText::new("Edit the list before it becomes the extraction rules.")
                .color(palette.text_muted),
        );
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label("Search");
            ui.add(
                egui::TextEdit::singleline(&mut self.controller.ui.tags.search)
                    .desired_width(180.0),
            );
            let toggle_label = if self.controller.ui.tags.show_add_form {
                "Close"
            } else {
                "Add tag"
            };
            if ui.button(toggle_label).clicked() {
                self.controller.ui.tags.show_add_form = !self.controller.ui.tags.show_add_form;
            }
        });
        if self.controller.ui.tags.show_add_form {
            ui.horizontal(|ui| {
                ui.label("Text");
                ui.add(
                    egui::TextEdit::singleline(&mut self.controller.ui.tags.new_text)
                        .desired_width(140.0),
                );
                ui.label("Category");
                ui.add(
                    egui::TextEdit::singleline(&mut self.controller.ui.tags.new_category)
                        .desired_width(120.0),
                );
                if ui.button("Add").clicked() {
                    self.controller.add_tag_candidate();
                }
            });
        }
        ui.add_space(8.0);
        let rows = view_model::filtered_tag_rows(
            &self.controller.ui.tags.candidates,
            &self.controller.ui.tags.search,
        );
        let mut delete: Option<usize> = None;
        egui::ScrollArea::vertical()
            .id_salt("tag_rows")
            .max_height(list_height(ui.available_height()))
            .show(ui, |ui| {
                for row in &rows {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&row.text).color(palette.text_primary));
                        if let Some(category) = &row.category {
                            ui.label(RichText::new(category).color(palette.accent_ice));
                        }
                        ui.label(
                            RichText::new(format!("score {:.2} | {} hits", row.score, row.count))
                                .color(palette.text_muted),
                        );
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Delete").clicked() {
                                delete = Some(row.index);
                            }
                        });
                    });
                }
                if rows.is_empty() {
                    ui.label(RichText::new("No candidates match").color(palette.text_muted));
                }
            });
        if let Some(index) = delete {
            self.controller.delete_tag_candidate(index);
        }
        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if ui.button("Back").clicked() {
                self.controller.back();
            }
            if ui.button("Next: analysis").clicked() {
                self.controller.finalize_tags();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::list_height;

    #[test]
    fn list_height_never_goes_negative() {
        assert_eq!(list_height(148.0), 100.0);
        assert_eq!(list_height(30.0), 0.0);
    }
}
