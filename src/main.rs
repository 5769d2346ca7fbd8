#![deny(missing_docs)]
#![deny(warnings)]

//! Entry point for the egui-based clustering map UI.
#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]
use clustermap::api::ApiClient;
use clustermap::egui_app::ui::{EguiApp, MIN_VIEWPORT_SIZE};
use clustermap::logging;
use eframe::egui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    let api = ApiClient::from_env();

    let viewport = egui::ViewportBuilder::default()
        .with_min_inner_size(MIN_VIEWPORT_SIZE)
        .with_inner_size(egui::vec2(1200.0, 800.0));

    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Clustering Map",
        native_options,
        Box::new(move |_cc| Ok(Box::new(EguiApp::new(api)))),
    )?;
    Ok(())
}
