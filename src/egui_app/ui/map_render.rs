use eframe::egui;

use crate::map_scene::{MapScene, SceneBounds, SceneItemId};

const HOVER_RADIUS_SQ: f32 = 36.0;

/// Projection from world coordinates to the canvas rectangle.
pub(super) struct MapView {
    rect: egui::Rect,
    center: egui::Pos2,
    scale: f32,
    pan: egui::Vec2,
}

impl MapView {
    /// Fit the bounds into the rect with a small margin, then apply zoom
    /// and pan on top.
    pub(super) fn new(rect: egui::Rect, bounds: SceneBounds, zoom: f32, pan: egui::Vec2) -> Self {
        let world_w = ((bounds.max_x - bounds.min_x) as f32).max(1e-3);
        let world_h = ((bounds.max_y - bounds.min_y) as f32).max(1e-3);
        let base = (rect.width() / world_w).min(rect.height() / world_h) * 0.9;
        let center = egui::pos2(
            ((bounds.min_x + bounds.max_x) * 0.5) as f32,
            ((bounds.min_y + bounds.max_y) * 0.5) as f32,
        );
        Self {
            rect,
            center,
            scale: base * zoom,
            pan,
        }
    }

    pub(super) fn to_screen(&self, x: f64, y: f64) -> egui::Pos2 {
        let dx = (x as f32 - self.center.x) * self.scale;
        let dy = (y as f32 - self.center.y) * self.scale;
        egui::pos2(
            self.rect.center().x + dx + self.pan.x,
            self.rect.center().y + dy + self.pan.y,
        )
    }
}

/// Nearest scene item within the hover radius of the pointer. Centroids
/// compete with points on distance alone.
pub(super) fn find_hover_item(
    scene: &MapScene,
    view: &MapView,
    pointer: Option<egui::Pos2>,
) -> Option<(SceneItemId, egui::Pos2)> {
    let pointer = pointer?;
    if !view.rect.contains(pointer) {
        return None;
    }
    let candidates = scene
        .groups
        .iter()
        .flat_map(|group| {
            group
                .points
                .iter()
                .map(|point| (SceneItemId::Point(point.id.clone()), point.x, point.y))
        })
        .chain(
            scene
                .centroids
                .iter()
                .map(|centroid| (SceneItemId::Centroid(centroid.cluster_id), centroid.x, centroid.y)),
        );
    let mut best: Option<(SceneItemId, egui::Pos2, f32)> = None;
    for (item, x, y) in candidates {
        let pos = view.to_screen(x, y);
        let dist_sq = pos.distance_sq(pointer);
        if dist_sq > HOVER_RADIUS_SQ {
            continue;
        }
        match &best {
            Some((_, _, best_sq)) if dist_sq >= *best_sq => {}
            _ => best = Some((item, pos, dist_sq)),
        }
    }
    best.map(|(item, pos, _)| (item, pos))
}
