use super::style;
use super::*;
use crate::model::ClusterMethod;
use eframe::egui;

impl EguiApp {
    pub(super) fn render_analysis_panel(&mut self, ui: &mut egui::Ui) {
        let palette = style::palette();
        ui.heading("Configure analysis");
        ui.label(
            RichText::new("Column roles, clustering method, and projection parameters.")
                .color(palette.text_muted),
        );
        ui.add_space(8.0);
        let columns: Vec<String> = self
            .controller
            .wizard()
            .upload()
            .map(|upload| upload.columns.clone())
            .unwrap_or_default();
        let column_error = self.controller.ui.analysis.text_column_error.clone();
        let analyzing = self.controller.analyze_pending();
        let Some(request) = self.controller.request_mut() else {
            ui.label(RichText::new("No analysis request yet.").color(palette.text_muted));
            return;
        };
        egui::Grid::new("analysis_settings")
            .num_columns(2)
            .spacing([12.0, 6.0])
            .show(ui, |ui| {
                ui.label("Text column");
                ui.horizontal(|ui| {
                    column_combo(
                        ui,
                        "text_column",
                        &mut request.column_mapping.text_column,
                        &columns,
                        false,
                    );
                    if let Some(error) = &column_error {
                        ui.label(RichText::new(error).color(palette.warning));
                    }
                });
                ui.end_row();
                ui.label("ID column");
                column_combo(
                    ui,
                    "id_column",
                    &mut request.column_mapping.id_column,
                    &columns,
                    true,
                );
                ui.end_row();
                ui.label("Group column");
                column_combo(
                    ui,
                    "group_column",
                    &mut request.column_mapping.group_column,
                    &columns,
                    true,
                );
                ui.end_row();
                ui.label("Method");
                egui::ComboBox::from_id_salt("cluster_method")
                    .selected_text(request.cluster_method.as_str())
                    .show_ui(ui, |ui| {
                        for method in ClusterMethod::ALL {
                            ui.selectable_value(
                                &mut request.cluster_method,
                                method,
                                method.as_str(),
                            );
                        }
                    });
                ui.end_row();
            });
        ui.add_space(8.0);
        match request.cluster_method {
            ClusterMethod::Hdbscan | ClusterMethod::Dbscan => {
                ui.horizontal(|ui| {
                    ui.label("Min cluster size");
                    ui.add(
                        egui::DragValue::new(&mut request.hdbscan_params.min_cluster_size)
                            .range(2..=500),
                    );
                    ui.label("Min samples");
                    ui.add(
                        egui::DragValue::new(&mut request.hdbscan_params.min_samples)
                            .range(1..=100),
                    );
                });
            }
            ClusterMethod::Kmeans => {
                ui.horizontal(|ui| {
                    ui.label("Clusters");
                    ui.add(
                        egui::DragValue::new(&mut request.kmeans_params.n_clusters).range(2..=50),
                    );
                });
            }
        }
        ui.horizontal(|ui| {
            ui.label("UMAP neighbors");
            ui.add(egui::DragValue::new(&mut request.umap_params.n_neighbors).range(2..=200));
            ui.label("Min distance");
            ui.add(
                egui::DragValue::new(&mut request.umap_params.min_dist)
                    .range(0.0..=1.0)
                    .speed(0.01),
            );
        });
        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if ui.add_enabled(!analyzing, egui::Button::new("Back")).clicked() {
                self.controller.back();
            }
            let run_label = if analyzing { "Analyzing…" } else { "Run analysis" };
            if ui
                .add_enabled(!analyzing, egui::Button::new(run_label))
                .clicked()
            {
                self.controller.run_analysis();
            }
            if analyzing {
                ui.spinner();
            }
        });
    }
}

fn column_combo(
    ui: &mut egui::Ui,
    salt: &str,
    value: &mut String,
    columns: &[String],
    optional: bool,
) {
    let selected = if value.is_empty() {
        "(none)".to_string()
    } else {
        value.clone()
    };
    egui::ComboBox::from_id_salt(salt)
        .selected_text(selected)
        .show_ui(ui, |ui| {
            if optional {
                ui.selectable_value(value, String::new(), "(none)");
            }
            for column in columns {
                ui.selectable_value(value, column.clone(), column);
            }
        });
}
