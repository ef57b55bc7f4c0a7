use eframe::egui;
use std::error::Error;

use imadjust::Config;

mod app;

use app::ImageAdjustApp;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let config = Config::load();
    // Engine loading and image decoding run on this runtime's blocking pool.
    let runtime = tokio::runtime::Runtime::new()?;
    let handle = runtime.handle().clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Image Adjustment Tool",
        options,
        Box::new(move |cc| Ok(Box::new(ImageAdjustApp::new(cc, handle, config)))),
    )?;

    Ok(())
}
