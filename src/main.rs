//! Interactive viewer binary for the lumo ray tracing engine.

use std::path::{Path, PathBuf};

use lumo::app::LumoApp;
use lumo::options::Options;

fn main() {
    env_logger::init();

    let options = Options::load_or_default(Path::new("lumo.toml"));
    let initial_models: Vec<PathBuf> = std::env::args()
        .skip(1)
        .map(PathBuf::from)
        .collect();

    let window_size = [
        options.render.width as f32 + 300.0,
        options.render.height as f32 + 40.0,
    ];

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(window_size)
            .with_title("Lumo"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "Lumo",
        native_options,
        Box::new(move |_cc| match LumoApp::new(&options, &initial_models) {
            Ok(app) => Ok(Box::new(app)),
            Err(e) => Err(Box::new(e)),
        }),
    );

    if let Err(e) = result {
        log::error!("viewer error: {e}");
        std::process::exit(1);
    }
}
