//! egui application shell: controller, shared UI state, and renderer.

/// Bridges core logic to the egui UI.
pub mod controller;
/// Background collaborator calls.
pub(crate) mod jobs;
/// Shared state types consumed by the renderer.
pub mod state;
/// egui renderer for the wizard stages.
pub mod ui;
/// Converters from domain data to display rows.
pub mod view_model;
