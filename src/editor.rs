use std::path::Path;

use crate::config::EditorSettings;
use crate::engine::{Engine, EngineHandle, EngineStatus};
use crate::error::Result;
use crate::params::AdjustmentParams;
use crate::pipeline::{Outcome, Pipeline, SkipReason};
use crate::source::SourceImage;
use crate::surface::Surface;

/// Shell state for one editing session: the current photo, the slider values
/// and the surface they render to. Every mutation re-runs the pipeline.
pub struct Editor<E> {
    pipeline: Pipeline<E>,
    settings: EditorSettings,
    source: Option<SourceImage>,
    surface: Option<Surface>,
    params: AdjustmentParams,
    engine_was_ready: bool,
}

impl<E: Engine> Editor<E> {
    pub fn new(engine: EngineHandle<E>, settings: EditorSettings) -> Self {
        let engine_was_ready = engine.is_ready();
        Self {
            pipeline: Pipeline::new(engine),
            settings,
            source: None,
            surface: None,
            params: AdjustmentParams::default(),
            engine_was_ready,
        }
    }

    pub fn params(&self) -> AdjustmentParams {
        self.params
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.source.is_some()
    }

    pub fn engine_status(&self) -> EngineStatus {
        self.pipeline.engine().status()
    }

    /// Replaces the current photo and renders it once.
    pub fn load_image(&mut self, source: SourceImage) -> Result<Outcome> {
        log::info!("loaded {}x{} image", source.width(), source.height());
        self.source = Some(source);
        self.surface = Some(Surface::new());
        self.render()
    }

    /// Drops the photo and anything rendered from it.
    pub fn clear(&mut self) {
        self.source = None;
        self.surface = None;
    }

    pub fn set_brightness(&mut self, value: u8) -> Result<Outcome> {
        self.params.set_brightness(value);
        self.render()
    }

    pub fn set_contrast(&mut self, value: u8) -> Result<Outcome> {
        self.params.set_contrast(value);
        self.render()
    }

    pub fn set_saturation(&mut self, value: u8) -> Result<Outcome> {
        self.params.set_saturation(value);
        self.render()
    }

    pub fn set_params(&mut self, params: AdjustmentParams) -> Result<Outcome> {
        self.params = params;
        self.render()
    }

    pub fn reset(&mut self) -> Result<Outcome> {
        self.params.reset();
        self.render()
    }

    /// Call after the engine may have settled. Renders once when it has just
    /// become ready and a photo is already loaded.
    pub fn poll_engine(&mut self) -> Result<Option<Outcome>> {
        let ready = self.pipeline.engine().is_ready();
        let became_ready = ready && !self.engine_was_ready;
        self.engine_was_ready = ready;

        if !became_ready {
            return Ok(None);
        }
        log::debug!("engine became ready");
        if self.settings.rerun_on_engine_ready && self.source.is_some() {
            return self.render().map(Some);
        }
        Ok(None)
    }

    /// PNG bytes of the current rendering, if there is one.
    pub fn export_png(&self) -> Result<Option<Vec<u8>>> {
        match &self.surface {
            Some(surface) if surface.is_rendered() => surface.encode_png().map(Some),
            _ => Ok(None),
        }
    }

    /// Writes the current rendering to `path`. Returns `false` when there is
    /// nothing to save.
    pub fn save_png(&self, path: &Path) -> Result<bool> {
        match &self.surface {
            Some(surface) if surface.is_rendered() => {
                surface.save_png(path)?;
                log::info!("saved {}", path.display());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn export_file_name(&self) -> &str {
        &self.settings.export_file_name
    }

    fn render(&mut self) -> Result<Outcome> {
        let result = self
            .pipeline
            .adjust(self.source.as_ref(), &self.params, self.surface.as_mut());
        // Anything past the readiness guard means this render already saw the
        // engine, so the next poll must not render the same state again.
        if !matches!(result, Ok(Outcome::Skipped(SkipReason::EngineNotReady))) {
            self.engine_was_ready = true;
        }
        result
    }
}
