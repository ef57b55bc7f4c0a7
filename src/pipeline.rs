//! Brightness, contrast and saturation applied through an [`Engine`].
//!
//! Each run is a full recompute from the source: an affine convert
//! (`alpha = contrast / 100`, `beta = brightness - 100`), then the HSV
//! saturation channel scaled by `saturation / 100`, then a write-back that
//! replaces the surface. All intermediates are locals of [`Pipeline::adjust`],
//! so they are released on every exit path, including errors.

use std::fmt;
use std::time::Instant;

use crate::engine::{ColorConversion, Depth, Engine, EngineHandle};
use crate::error::Result;
use crate::params::AdjustmentParams;
use crate::source::SourceImage;
use crate::surface::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EngineNotReady,
    NoSource,
    NoSurface,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SkipReason::EngineNotReady => write!(f, "engine not ready"),
            SkipReason::NoSource => write!(f, "no source image"),
            SkipReason::NoSurface => write!(f, "no display surface"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Rendered { width: u32, height: u32 },
    Skipped(SkipReason),
}

impl Outcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Outcome::Rendered { .. })
    }
}

pub struct Pipeline<E> {
    engine: EngineHandle<E>,
}

impl<E: Engine> Pipeline<E> {
    pub fn new(engine: EngineHandle<E>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &EngineHandle<E> {
        &self.engine
    }

    /// Renders `source` with `params` into `surface`.
    ///
    /// A missing engine, source or surface is not an error: the call returns
    /// `Outcome::Skipped` and leaves the surface untouched.
    pub fn adjust(
        &self,
        source: Option<&SourceImage>,
        params: &AdjustmentParams,
        surface: Option<&mut Surface>,
    ) -> Result<Outcome> {
        let Some(engine) = self.engine.engine() else {
            return Ok(skip(SkipReason::EngineNotReady));
        };
        let Some(source) = source else {
            return Ok(skip(SkipReason::NoSource));
        };
        let Some(surface) = surface else {
            return Ok(skip(SkipReason::NoSurface));
        };

        let start_time = Instant::now();
        let (width, height) = (source.width(), source.height());
        surface.resize(width, height);

        // Brightness and contrast
        let src = engine.read(source.pixels());
        let dst = engine.convert_to(&src, params.alpha(), params.beta());

        // Saturation, scaled on the S channel of HSV
        let hsv = engine.cvt_color(&dst, ColorConversion::RgbToHsv)?;
        let mut channels = engine.split(&hsv);
        let mask = engine.filled(
            hsv.rows(),
            hsv.cols(),
            Depth::F32,
            f64::from(params.saturation_scale()),
        );
        channels[1] = engine.multiply(&channels[1], &mask)?;
        let merged = engine.merge(&channels)?;
        let rgb = engine.cvt_color(&merged, ColorConversion::HsvToRgb)?;

        engine.show(&rgb, surface)?;

        log::trace!(
            "rendered {}x{} with b={} c={} s={} in {:.2?}",
            width,
            height,
            params.brightness(),
            params.contrast(),
            params.saturation(),
            start_time.elapsed()
        );
        Ok(Outcome::Rendered { width, height })
    }
}

fn skip(reason: SkipReason) -> Outcome {
    log::debug!("adjustment skipped: {}", reason);
    Outcome::Skipped(reason)
}
