use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Slider value that leaves an adjustment unchanged.
pub const NEUTRAL: u8 = 100;
/// Upper bound of every slider (the lower bound is 0).
pub const MAX: u8 = 200;

/// Brightness, contrast and saturation as the sliders hold them: 0..=200,
/// with 100 meaning "unchanged".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentParams {
    brightness: u8,
    contrast: u8,
    saturation: u8,
}

impl Default for AdjustmentParams {
    fn default() -> Self {
        Self {
            brightness: NEUTRAL,
            contrast: NEUTRAL,
            saturation: NEUTRAL,
        }
    }
}

impl AdjustmentParams {
    /// Builds a parameter set, clamping each value into 0..=200.
    pub fn new(brightness: u8, contrast: u8, saturation: u8) -> Self {
        Self {
            brightness: brightness.min(MAX),
            contrast: contrast.min(MAX),
            saturation: saturation.min(MAX),
        }
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn contrast(&self) -> u8 {
        self.contrast
    }

    pub fn saturation(&self) -> u8 {
        self.saturation
    }

    pub fn set_brightness(&mut self, value: u8) {
        self.brightness = value.min(MAX);
    }

    pub fn set_contrast(&mut self, value: u8) {
        self.contrast = value.min(MAX);
    }

    pub fn set_saturation(&mut self, value: u8) {
        self.saturation = value.min(MAX);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    /// Multiplicative gain of the brightness/contrast transform.
    pub fn alpha(&self) -> f64 {
        f64::from(self.contrast) / 100.0
    }

    /// Additive offset of the brightness/contrast transform.
    pub fn beta(&self) -> f64 {
        f64::from(self.brightness) - 100.0
    }

    /// Factor applied to the HSV saturation channel.
    pub fn saturation_scale(&self) -> f32 {
        f32::from(self.saturation) / 100.0
    }

    /// Checks a raw user-supplied value before it becomes a slider value.
    pub fn validate(name: &'static str, value: i64) -> Result<u8> {
        if (0..=i64::from(MAX)).contains(&value) {
            Ok(value as u8)
        } else {
            Err(Error::InvalidParameter { name, value })
        }
    }
}
