//! Processing engine: the pixel capabilities the pipeline is built from.
//!
//! The pipeline never touches pixels directly. It asks an [`Engine`] to ingest
//! the source, run the affine convert, switch colorspaces, split/merge
//! channels, multiply element-wise, and write the result back to a
//! [`Surface`]. Every `Mat` an engine hands out is counted until dropped, so
//! `live_buffers()` returning to zero proves an invocation released all of its
//! intermediates.

mod handle;
mod mat;
mod native;

pub use handle::{load_in_background, EngineHandle, EngineStatus, Readiness};
pub use mat::{Depth, Mat, MatData};
pub use native::{NativeEngine, MAX_THREADS};

use image::RgbaImage;

use crate::error::Result;
use crate::surface::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorConversion {
    /// 3 or 4 channel RGB(A) to 3 channel HSV (H in 0..180, S and V in 0..=255).
    RgbToHsv,
    /// 3 channel HSV back to 3 channel RGB.
    HsvToRgb,
}

pub trait Engine: Send + Sync {
    /// Ingests a displayable image as a 4 channel 8-bit mat.
    fn read(&self, image: &RgbaImage) -> Mat;

    /// `dst = src * alpha + beta` on every channel, saturating to the mat's depth.
    fn convert_to(&self, src: &Mat, alpha: f64, beta: f64) -> Mat;

    fn cvt_color(&self, src: &Mat, code: ColorConversion) -> Result<Mat>;

    fn split(&self, src: &Mat) -> Vec<Mat>;

    fn merge(&self, channels: &[Mat]) -> Result<Mat>;

    /// Element-wise product, saturating to the depth of `a`.
    fn multiply(&self, a: &Mat, b: &Mat) -> Result<Mat>;

    /// A `rows` x `cols` single channel mat with every element set to `value`.
    fn filled(&self, rows: usize, cols: usize, depth: Depth, value: f64) -> Mat;

    /// Writes an 8-bit mat (1, 3 or 4 channels) to the surface, replacing its
    /// content. Mats without alpha are written opaque.
    fn show(&self, mat: &Mat, surface: &mut Surface) -> Result<()>;

    /// Number of engine-allocated mats still alive.
    fn live_buffers(&self) -> usize;
}
