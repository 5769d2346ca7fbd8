use super::map_render::{self, MapView};
use super::style;
use super::*;
use eframe::egui::{self, StrokeKind};

const MAP_ZOOM_MIN: f32 = 0.2;
const MAP_ZOOM_MAX: f32 = 20.0;
const MAP_ZOOM_SPEED: f32 = 0.0015;

impl EguiApp {
    pub(super) fn render_map_panel(&mut self, ui: &mut egui::Ui) {
        let palette = style::palette();
        let Some(scene) = self.controller.scene() else {
            ui.label(RichText::new("No analysis result to draw.").color(palette.text_muted));
            return;
        };
        ui.horizontal(|ui| {
            ui.checkbox(
                &mut self.controller.ui.map.show_centroid_labels,
                "Centroid labels",
            );
            if ui.button("Reset view").clicked() {
                self.controller.ui.map.reset_view();
            }
            ui.label(
                RichText::new(format!("{} points shown", scene.point_count()))
                    .color(palette.text_muted),
            );
        });
        ui.add_space(4.0);

        let available = ui.available_size();
        let (rect, response) = ui.allocate_exact_size(available, egui::Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, palette.bg_primary);

        let Some(bounds) = scene.bounds() else {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "No points match the current filters",
                egui::FontId::proportional(14.0),
                palette.text_muted,
            );
            return;
        };

        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if response.hovered() && scroll_delta.abs() > 0.0 {
            let zoom_delta = 1.0 + scroll_delta * MAP_ZOOM_SPEED;
            self.controller.ui.map.zoom =
                (self.controller.ui.map.zoom * zoom_delta).clamp(MAP_ZOOM_MIN, MAP_ZOOM_MAX);
        }
        if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                let last = self.controller.ui.map.last_drag_pos.unwrap_or(pos);
                self.controller.ui.map.pan += pos - last;
                self.controller.ui.map.last_drag_pos = Some(pos);
            }
        } else {
            self.controller.ui.map.last_drag_pos = None;
        }

        let view = MapView::new(
            rect,
            bounds,
            self.controller.ui.map.zoom,
            self.controller.ui.map.pan,
        );

        for group in &scene.groups {
            for point in &group.points {
                let pos = view.to_screen(point.x, point.y);
                if !rect.contains(pos) {
                    continue;
                }
                let selected = self.controller.selection().contains(&point.id);
                let radius = if selected { 4.5 } else { 3.0 };
                painter.circle_filled(pos, radius, group.color);
                if selected {
                    painter.circle_stroke(
                        pos,
                        radius + 1.5,
                        egui::Stroke::new(1.5, palette.text_primary),
                    );
                }
            }
        }
        for centroid in &scene.centroids {
            let pos = view.to_screen(centroid.x, centroid.y);
            if !rect.contains(pos) {
                continue;
            }
            let r = 6.0;
            let diamond = vec![
                pos + egui::vec2(0.0, -r),
                pos + egui::vec2(r, 0.0),
                pos + egui::vec2(0.0, r),
                pos + egui::vec2(-r, 0.0),
            ];
            painter.add(egui::Shape::convex_polygon(
                diamond,
                centroid.color,
                egui::Stroke::new(1.0, palette.bg_primary),
            ));
            if self.controller.ui.map.show_centroid_labels {
                painter.text(
                    pos + egui::vec2(8.0, -8.0),
                    egui::Align2::LEFT_BOTTOM,
                    &centroid.label,
                    egui::FontId::proportional(12.0),
                    palette.text_primary,
                );
            }
        }

        let hovered = map_render::find_hover_item(
            &scene,
            &view,
            response.hover_pos().filter(|pos| rect.contains(*pos)),
        );
        self.controller.ui.map.hovered = hovered.as_ref().map(|(item, _)| item.clone());
        if let Some((item, pos)) = hovered.as_ref() {
            painter.circle_stroke(*pos, 6.5, egui::Stroke::new(1.5, palette.accent_ice));
            if let Some(text) = self.controller.tooltip(item) {
                egui::Tooltip::always_open(
                    ui.ctx().clone(),
                    ui.layer_id(),
                    egui::Id::new("map_hover_tooltip"),
                    egui::PopupAnchor::Pointer,
                )
                .show(|ui| {
                    ui.label(text);
                });
            }
        }
        if response.clicked() {
            if let Some((item, _)) = hovered.as_ref() {
                self.controller.click_item(item);
            }
        }
        painter.rect_stroke(
            rect,
            0.0,
            egui::Stroke::new(1.0, palette.panel_outline),
            StrokeKind::Inside,
        );
    }
}
