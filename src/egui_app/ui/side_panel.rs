use super::style;
use super::*;
use crate::egui_app::jobs::ExportKind;
use crate::egui_app::view_model;
use crate::model::NOISE_CLUSTER_ID;
use eframe::egui;

impl EguiApp {
    pub(super) fn render_side_panel(&mut self, ui: &mut egui::Ui) {
        let palette = style::palette();
        let (tags, cluster_ids, stats, cards) = {
            let Some(index) = self.controller.index() else {
                return;
            };
            (
                index.result().tags.clone(),
                index.result().clusters.keys().copied().collect::<Vec<i32>>(),
                view_model::result_stats(index.result()),
                view_model::selected_point_cards(index, self.controller.selection()),
            )
        };

        ui.heading("Filters");
        ui.add_space(4.0);
        for tag in &tags {
            let mut active = self.controller.filter().has_tag(tag);
            if ui.checkbox(&mut active, tag).changed() {
                self.controller.toggle_tag_filter(tag);
            }
        }
        ui.add_space(4.0);
        let current = self.controller.filter().cluster();
        let mut choice = current;
        egui::ComboBox::from_id_salt("cluster_filter")
            .selected_text(match current {
                Some(id) => cluster_label(id),
                None => "All clusters".to_string(),
            })
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut choice, None, "All clusters");
                for id in &cluster_ids {
                    ui.selectable_value(&mut choice, Some(*id), cluster_label(*id));
                }
            });
        if choice != current {
            self.controller.set_cluster_filter(choice);
        }
        let clearable = !self.controller.filter().is_empty();
        if ui
            .add_enabled(clearable, egui::Button::new("Clear filters"))
            .clicked()
        {
            self.controller.clear_filters();
        }

        ui.separator();
        ui.heading("Selected points");
        ui.horizontal(|ui| {
            ui.label(
                RichText::new(format!("{} selected", cards.len())).color(palette.text_muted),
            );
            if ui
                .add_enabled(!cards.is_empty(), egui::Button::new("Clear"))
                .clicked()
            {
                self.controller.clear_selection();
            }
        });
        egui::ScrollArea::vertical()
            .id_salt("selected_cards")
            .max_height(220.0)
            .show(ui, |ui| {
                for card in &cards {
                    egui::Frame::new()
                        .fill(palette.bg_tertiary)
                        .inner_margin(egui::Margin::symmetric(6, 4))
                        .show(ui, |ui| {
                            ui.label(
                                RichText::new(format!("ID: {}", card.id))
                                    .color(palette.accent_ice),
                            );
                            ui.label(RichText::new(&card.excerpt).color(palette.text_primary));
                            if !card.tags.is_empty() {
                                ui.label(
                                    RichText::new(&card.tags).color(palette.text_muted),
                                );
                            }
                        });
                    ui.add_space(4.0);
                }
            });

        ui.separator();
        ui.heading("Summary");
        ui.label(format!("Points: {}", stats.points));
        ui.label(format!("Clusters: {}", stats.clusters));
        ui.label(format!("Tags: {}", stats.tags));

        ui.separator();
        let exporting = self.controller.export_pending();
        ui.horizontal(|ui| {
            for kind in [ExportKind::Pdf, ExportKind::Png] {
                let label = if exporting == Some(kind) {
                    format!("Exporting {}…", kind.label())
                } else {
                    format!("Export {}", kind.label())
                };
                if ui
                    .add_enabled(exporting.is_none(), egui::Button::new(label))
                    .clicked()
                {
                    self.controller.export(kind);
                }
            }
        });
        ui.add_space(8.0);
        if ui.button("Back").clicked() {
            self.controller.back();
        }
    }
}

fn cluster_label(id: i32) -> String {
    if id == NOISE_CLUSTER_ID {
        "Noise".to_string()
    } else {
        format!("Cluster {id}")
    }
}
