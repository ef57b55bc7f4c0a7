use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// The display raster the pipeline renders into. Every write replaces the
/// whole buffer.
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: RgbaImage,
    rendered: bool,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    pub fn new() -> Self {
        Self {
            pixels: RgbaImage::new(0, 0),
            rendered: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Resizes to `width` x `height`. Like a canvas, this drops any previous
    /// content.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pixels = RgbaImage::new(width, height);
        self.rendered = false;
    }

    /// Replaces the content with `pixels`, which must match the current size.
    pub fn replace(&mut self, pixels: RgbaImage) -> Result<()> {
        if pixels.dimensions() != self.pixels.dimensions() {
            return Err(Error::Engine(format!(
                "surface is {}x{} but rendered image is {}x{}",
                self.width(),
                self.height(),
                pixels.width(),
                pixels.height()
            )));
        }
        self.pixels = pixels;
        self.rendered = true;
        Ok(())
    }

    /// Whether the surface currently holds a pipeline result.
    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(
                self.pixels.as_raw(),
                self.width(),
                self.height(),
                ColorType::Rgba8,
            )
            .map_err(|e| Error::Encode(e.to_string()))?;
        Ok(buf)
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        let bytes = self.encode_png()?;
        fs::write(path, bytes).map_err(|e| Error::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn resize_clears_content() {
        let mut surface = Surface::new();
        surface.resize(2, 2);
        surface
            .replace(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])))
            .unwrap();
        assert!(surface.is_rendered());

        surface.resize(3, 1);
        assert!(!surface.is_rendered());
        assert_eq!((surface.width(), surface.height()), (3, 1));
        assert_eq!(surface.pixels().get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn replace_rejects_size_mismatch() {
        let mut surface = Surface::new();
        surface.resize(4, 4);
        assert!(surface.replace(RgbaImage::new(2, 2)).is_err());
        assert!(!surface.is_rendered());
    }

    #[test]
    fn png_export_keeps_dimensions() {
        let mut surface = Surface::new();
        surface.resize(5, 3);
        surface
            .replace(RgbaImage::from_pixel(5, 3, Rgba([200, 100, 50, 255])))
            .unwrap();

        let decoded = image::load_from_memory(&surface.encode_png().unwrap())
            .unwrap()
            .to_rgba8();
        assert_eq!(decoded.dimensions(), (5, 3));
        assert_eq!(decoded.get_pixel(4, 2).0, [200, 100, 50, 255]);
    }
}
