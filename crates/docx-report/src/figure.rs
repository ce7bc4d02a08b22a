//! Figure images supplied by the caller for one render.

use crate::error::{RenderError, Result};

/// Width used when the caller's dimensions are unusable
pub const FALLBACK_WIDTH: u32 = 480;
/// Height used when the caller's dimensions are unusable
pub const FALLBACK_HEIGHT: u32 = 320;
/// Largest display dimension; docx-rs converts pixels to EMU (9525 per
/// pixel) in `u32`.
pub const MAX_DIMENSION: u32 = u32::MAX / 9525;

/// Encoded image bytes plus display size in pixels, both within
/// `1..=MAX_DIMENSION`.
#[derive(Clone, PartialEq, Eq)]
pub struct FigureImage {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for FigureImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FigureImage")
            .field("bytes", &self.buffer.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl FigureImage {
    /// Finite dimensions are rounded and clamped to `1..=MAX_DIMENSION`; if
    /// either is NaN or infinite the fallback 480x320 is used.
    pub fn new(buffer: Vec<u8>, width: f64, height: f64) -> Result<Self> {
        if buffer.is_empty() {
            return Err(RenderError::InvalidImage("image buffer is empty".to_string()));
        }
        let (width, height) = if width.is_finite() && height.is_finite() {
            (clamp_dimension(width), clamp_dimension(height))
        } else {
            (FALLBACK_WIDTH, FALLBACK_HEIGHT)
        };
        Ok(Self {
            buffer,
            width,
            height,
        })
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

fn clamp_dimension(value: f64) -> u32 {
    value.round().clamp(1.0, MAX_DIMENSION as f64) as u32
}
