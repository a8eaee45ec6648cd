use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Identifier of a glyph class in the catalog. Always positive.
pub type ClassId = u32;

/// Pixel value marking ink in binary images.
pub const FOREGROUND: u8 = 255;
/// Pixel value marking paper in binary images.
pub const BACKGROUND: u8 = 0;

/// A decoded input image.
///
/// Transparent pixels have already been composited onto white, so the raster
/// is always three-channel; `channels` records the depth of the source file.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: RgbImage,
    channels: u8,
}

impl RasterImage {
    /// Returns `None` for zero-sized images.
    pub fn new(pixels: RgbImage, channels: u8) -> Option<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return None;
        }
        Some(Self { pixels, channels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Channel count of the source image (1 gray, 2 gray+alpha, 3 RGB, 4 RGBA).
    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Copy out the region described by `segment`.
    pub fn crop(&self, segment: &Segment) -> RasterImage {
        let region = image::imageops::crop_imm(
            &self.pixels,
            segment.x,
            segment.y,
            segment.width,
            segment.height,
        )
        .to_image();
        Self {
            pixels: region,
            channels: self.channels,
        }
    }
}

/// A binarized, cropped, fixed-resolution glyph.
///
/// Every pixel is either [`FOREGROUND`] or [`BACKGROUND`], and the image is
/// always `size × size`.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalImage {
    pixels: GrayImage,
}

impl CanonicalImage {
    pub(crate) fn from_binary(pixels: GrayImage) -> Self {
        debug_assert_eq!(pixels.width(), pixels.height());
        debug_assert!(pixels.pixels().all(|p| p[0] == FOREGROUND || p[0] == BACKGROUND));
        Self { pixels }
    }

    pub fn size(&self) -> u32 {
        self.pixels.width()
    }

    pub fn pixels(&self) -> &GrayImage {
        &self.pixels
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.pixels.get_pixel(x, y)[0] == FOREGROUND
    }

    pub fn foreground_count(&self) -> usize {
        self.pixels.pixels().filter(|p| p[0] == FOREGROUND).count()
    }

    /// Row-major 0/1 grid, one entry per pixel.
    pub fn to_grid(&self) -> Vec<u8> {
        self.pixels
            .pixels()
            .map(|p| u8::from(p[0] == FOREGROUND))
            .collect()
    }
}

/// Fixed-length glyph descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// One connected glyph region on a multi-glyph plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Number of ink pixels in the region
    pub area: u32,
}

/// A candidate class and its distance from the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub class_id: ClassId,
    pub distance: f64,
}
