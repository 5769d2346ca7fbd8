//! Library exports for reuse in tests.
/// Backend HTTP client.
pub mod api;
/// Shared egui UI modules.
pub mod egui_app;
/// Point filtering for the map view.
pub mod filter;
/// Shared HTTP agent helpers.
pub mod http_client;
/// Tracing setup with per-launch log files.
pub mod logging;
/// Drawable map scene and renderer.
pub mod map_scene;
/// Wire types shared with the backend.
pub mod model;
/// Lookup views over an analysis result.
pub mod result_index;
/// Point selection state.
pub mod selection;
/// Wizard stage machine.
pub mod wizard;
