use image::{GenericImageView, RgbaImage};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// A decoded photo. Immutable once loaded; the shell replaces it wholesale.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        let (width, height) = img.dimensions();
        log::debug!("decoded {}x{} image ({} bytes)", width, height, bytes.len());
        Ok(Self {
            pixels: img.to_rgba8(),
        })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Extensions offered by the file picker and accepted by the CLI.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "ico", "tiff", "tif", "webp", "tga", "pnm", "qoi",
];

pub fn is_image_file(path: &Path) -> bool {
    if let Some(extension) = path.extension() {
        if let Some(ext_str) = extension.to_str() {
            IMAGE_EXTENSIONS.contains(&ext_str.to_lowercase().as_str())
        } else {
            false
        }
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decodes_native_dimensions() {
        let source = SourceImage::from_bytes(&png_bytes(7, 3)).unwrap();
        assert_eq!((source.width(), source.height()), (7, 3));
        assert_eq!(source.pixels().get_pixel(6, 2).0, [10, 20, 30, 255]);
    }

    #[test]
    fn malformed_bytes_are_a_decode_error() {
        let err = SourceImage::from_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SourceImage::open(Path::new("/nonexistent/photo.png")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn image_extensions() {
        assert!(is_image_file(Path::new("holiday.JPG")));
        assert!(is_image_file(Path::new("dir/scan.tiff")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("no_extension")));
    }
}
