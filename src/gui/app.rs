use eframe::egui;
use rfd::FileDialog;
use std::path::PathBuf;
use tokio::sync::oneshot;

use imadjust::engine::load_in_background;
use imadjust::source::IMAGE_EXTENSIONS;
use imadjust::{Config, Editor, EngineStatus, NativeEngine, Outcome, SourceImage};

type PendingLoad = oneshot::Receiver<imadjust::Result<SourceImage>>;

pub struct ImageAdjustApp {
    runtime: tokio::runtime::Handle,
    editor: Editor<NativeEngine>,
    texture: Option<egui::TextureHandle>,
    texture_dirty: bool,
    pending_load: Option<PendingLoad>,
    panel_visible: bool,
    status_message: String,
}

impl ImageAdjustApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        runtime: tokio::runtime::Handle,
        config: Config,
    ) -> Self {
        let ctx = cc.egui_ctx.clone();
        let engine = load_in_background(&runtime, config.engine.clone(), move || {
            ctx.request_repaint();
        });

        Self {
            runtime,
            editor: Editor::new(engine, config.editor),
            texture: None,
            texture_dirty: false,
            pending_load: None,
            panel_visible: true,
            status_message: "Ready".to_string(),
        }
    }
}

impl eframe::App for ImageAdjustApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_pending_load();
        if let Some(outcome) = self.editor.poll_engine().transpose() {
            self.apply(outcome);
        }

        if self.texture_dirty {
            self.upload_texture(ctx);
            self.texture_dirty = false;
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Image Adjustment Tool");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.show_status(ui);
                });
            });
        });

        egui::TopBottomPanel::bottom("adjustments").show(ctx, |ui| {
            if self.editor.has_image() {
                self.show_adjustments_panel(ui);
            } else {
                self.show_open_panel(ui, ctx);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_canvas(ui);
        });

        // A slider change this frame still needs its texture uploaded
        if self.texture_dirty {
            ctx.request_repaint();
        }
    }
}

impl ImageAdjustApp {
    fn show_status(&self, ui: &mut egui::Ui) {
        match self.editor.engine_status() {
            EngineStatus::Loading => {
                ui.spinner();
                ui.label("Loading engine...");
            }
            EngineStatus::Failed(reason) => {
                ui.colored_label(
                    egui::Color32::RED,
                    format!("Engine unavailable, adjustments disabled: {}", reason),
                );
            }
            EngineStatus::Ready => {
                ui.label(&self.status_message);
            }
        }
    }

    fn show_open_panel(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            let loading = self.pending_load.is_some();
            if ui
                .add_enabled(!loading, egui::Button::new("📂 Open image"))
                .clicked()
            {
                if let Some(path) = FileDialog::new()
                    .add_filter("Images", IMAGE_EXTENSIONS)
                    .pick_file()
                {
                    self.start_load(path, ctx);
                }
            }
            if loading {
                ui.spinner();
                ui.label("Decoding...");
            }
        });
    }

    fn show_adjustments_panel(&mut self, ui: &mut egui::Ui) {
        let toggle = if self.panel_visible {
            "▼ Hide adjustments"
        } else {
            "▲ Show adjustments"
        };
        if ui.button(toggle).clicked() {
            self.panel_visible = !self.panel_visible;
        }
        if !self.panel_visible {
            return;
        }

        let params = self.editor.params();

        // Brightness
        ui.label("Brightness");
        let mut brightness = params.brightness();
        if ui.add(egui::Slider::new(&mut brightness, 0..=200)).changed() {
            let outcome = self.editor.set_brightness(brightness);
            self.apply(outcome);
        }

        // Contrast
        ui.label("Contrast");
        let mut contrast = params.contrast();
        if ui.add(egui::Slider::new(&mut contrast, 0..=200)).changed() {
            let outcome = self.editor.set_contrast(contrast);
            self.apply(outcome);
        }

        // Saturation
        ui.label("Saturation");
        let mut saturation = params.saturation();
        if ui.add(egui::Slider::new(&mut saturation, 0..=200)).changed() {
            let outcome = self.editor.set_saturation(saturation);
            self.apply(outcome);
        }

        ui.separator();

        ui.horizontal(|ui| {
            if ui.button("Reset").clicked() {
                let outcome = self.editor.reset();
                self.apply(outcome);
            }
            if ui.button("Download").clicked() {
                self.download();
            }
        });
    }

    fn show_canvas(&mut self, ui: &mut egui::Ui) {
        if !self.editor.has_image() {
            ui.centered_and_justified(|ui| {
                ui.label("No image selected");
            });
            return;
        }

        if ui.button("🗑 Clear").clicked() {
            self.clear();
            return;
        }

        if let Some(texture) = &self.texture {
            let available_size = ui.available_size();
            let image_size = texture.size_vec2();

            // Fit inside the available space without upscaling
            let scale = (available_size.x / image_size.x)
                .min(available_size.y / image_size.y)
                .min(1.0);

            ui.centered_and_justified(|ui| {
                ui.image((texture.id(), image_size * scale));
            });
        } else {
            ui.centered_and_justified(|ui| {
                ui.label("Waiting for the processing engine...");
            });
        }
    }

    fn start_load(&mut self, path: PathBuf, ctx: &egui::Context) {
        let (tx, rx) = oneshot::channel();
        let ctx = ctx.clone();
        self.runtime.spawn_blocking(move || {
            let _ = tx.send(SourceImage::open(&path));
            ctx.request_repaint();
        });
        self.pending_load = Some(rx);
        self.status_message = "Decoding image...".to_string();
    }

    fn poll_pending_load(&mut self) {
        let Some(rx) = self.pending_load.as_mut() else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(source)) => {
                self.pending_load = None;
                self.status_message = format!("Image {}x{}", source.width(), source.height());
                self.panel_visible = true;
                let outcome = self.editor.load_image(source);
                self.apply(outcome);
            }
            Ok(Err(e)) => {
                self.pending_load = None;
                log::warn!("failed to open image: {}", e);
                self.status_message = format!("Could not open image: {}", e);
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                self.pending_load = None;
                self.status_message = "Image loading was interrupted".to_string();
            }
        }
    }

    fn apply(&mut self, result: imadjust::Result<Outcome>) {
        if preview_changed(&result) {
            self.texture_dirty = true;
        }
        if let Err(e) = result {
            log::warn!("adjustment failed: {}", e);
            self.status_message = format!("Adjustment failed: {}", e);
        }
    }

    fn upload_texture(&mut self, ctx: &egui::Context) {
        let Some(surface) = self.editor.surface().filter(|s| s.is_rendered()) else {
            self.texture = None;
            return;
        };

        let pixels = surface.pixels();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [pixels.width() as usize, pixels.height() as usize],
            pixels.as_raw(),
        );

        match &mut self.texture {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture(
                    "adjusted_image",
                    color_image,
                    egui::TextureOptions::LINEAR,
                ));
            }
        }
    }

    fn download(&mut self) {
        let Some(path) = FileDialog::new()
            .set_file_name(self.editor.export_file_name())
            .add_filter("PNG", &["png"])
            .save_file()
        else {
            return;
        };

        match self.editor.save_png(&path) {
            Ok(true) => self.status_message = format!("Saved {}", path.display()),
            Ok(false) => self.status_message = "Nothing to save yet".to_string(),
            Err(e) => {
                log::warn!("download failed: {}", e);
                self.status_message = format!("Save failed: {}", e);
            }
        }
    }

    fn clear(&mut self) {
        self.editor.clear();
        self.texture = None;
        self.panel_visible = false;
        self.status_message = "Ready".to_string();
    }
}

/// Whether the surface may differ from the uploaded texture. A failed run has
/// already cleared the surface, so the stale texture has to go too.
fn preview_changed(result: &imadjust::Result<Outcome>) -> bool {
    !matches!(result, Ok(Outcome::Skipped(_)))
}
