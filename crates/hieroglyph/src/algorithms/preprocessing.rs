use image::{imageops::FilterType, GrayImage, Luma};
use imageproc::{
    distance_transform::Norm,
    region_labelling::{connected_components, Connectivity},
};
use crate::{
    config::AspectPolicy,
    error::PreprocessError,
    traits::ImagePreprocessor,
    types::{CanonicalImage, RasterImage, BACKGROUND, FOREGROUND},
};

/// Rec.601 luminance in integer arithmetic
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000) as u8
}

/// Green annotation ink: green exceeds 1.5x both red and blue
pub fn is_annotation_green(r: u8, g: u8, b: u8) -> bool {
    let g = 2 * g as u32;
    g > 3 * r as u32 && g > 3 * b as u32
}

/// Reduces a raster to gray levels
#[derive(Debug, Clone)]
pub struct GrayscaleConverter {
    pub suppress_green: bool,
}

impl Default for GrayscaleConverter {
    fn default() -> Self {
        Self { suppress_green: true }
    }
}

impl GrayscaleConverter {
    pub fn convert(&self, raster: &RasterImage) -> GrayImage {
        let rgb = raster.pixels();
        GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            let [r, g, b] = rgb.get_pixel(x, y).0;
            if self.suppress_green && is_annotation_green(r, g, b) {
                Luma([255])
            } else {
                Luma([luminance(r, g, b)])
            }
        })
    }
}

/// Mark pixels at or below `level` as ink.
///
/// Low-contrast images come back empty, and the brightest gray level is
/// always paper.
fn binarize(image: &GrayImage, level: u8, min_contrast: u8) -> GrayImage {
    let (min, max) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

    if max.saturating_sub(min) < min_contrast.max(1) {
        return GrayImage::new(image.width(), image.height());
    }

    let level = level.min(max - 1);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[0] <= level {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Fixed global threshold
#[derive(Debug, Clone)]
pub struct ThresholdPreprocessor {
    pub threshold: u8,
    pub min_contrast: u8,
}

impl Default for ThresholdPreprocessor {
    fn default() -> Self {
        Self { threshold: 128, min_contrast: 16 }
    }
}

impl ImagePreprocessor for ThresholdPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage, PreprocessError> {
        Ok(binarize(image, self.threshold, self.min_contrast))
    }

    fn name(&self) -> &'static str {
        "threshold"
    }
}

/// Otsu threshold chosen per image
#[derive(Debug, Clone)]
pub struct OtsuThresholdPreprocessor {
    pub min_contrast: u8,
}

impl Default for OtsuThresholdPreprocessor {
    fn default() -> Self {
        Self { min_contrast: 16 }
    }
}

impl ImagePreprocessor for OtsuThresholdPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage, PreprocessError> {
        let level = imageproc::contrast::otsu_level(image);
        Ok(binarize(image, level, self.min_contrast))
    }

    fn name(&self) -> &'static str {
        "otsu_threshold"
    }
}

/// Morphological closing of the ink
#[derive(Debug, Clone)]
pub struct ClosingPreprocessor {
    pub radius: u8,
}

impl Default for ClosingPreprocessor {
    fn default() -> Self {
        Self { radius: 1 }
    }
}

impl ImagePreprocessor for ClosingPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage, PreprocessError> {
        if self.radius == 0 {
            return Ok(image.clone());
        }
        Ok(imageproc::morphology::close(image, Norm::LInf, self.radius))
    }

    fn name(&self) -> &'static str {
        "closing"
    }
}

/// Erases small 8-connected ink components
#[derive(Debug, Clone)]
pub struct SpeckleFilter {
    pub min_area: u32,
    /// Fraction of the largest component below which a component is speckle
    pub min_ratio: f64,
}

impl Default for SpeckleFilter {
    fn default() -> Self {
        Self { min_area: 8, min_ratio: 0.02 }
    }
}

impl ImagePreprocessor for SpeckleFilter {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage, PreprocessError> {
        let labels = connected_components(image, Connectivity::Eight, Luma([BACKGROUND]));

        let mut areas: Vec<u32> = Vec::new();
        for label in labels.pixels() {
            let label = label[0] as usize;
            if label == 0 {
                continue;
            }
            if areas.len() <= label {
                areas.resize(label + 1, 0);
            }
            areas[label] += 1;
        }

        let largest = areas.iter().copied().max().unwrap_or(0);
        let relative_min = (self.min_ratio * largest as f64).ceil() as u32;
        let keep: Vec<bool> = areas
            .iter()
            .map(|&area| area >= self.min_area && area >= relative_min)
            .collect();

        Ok(GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let label = labels.get_pixel(x, y)[0] as usize;
            if label != 0 && keep[label] {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        }))
    }

    fn name(&self) -> &'static str {
        "speckle_filter"
    }
}

/// Tight bounding box of all ink as (x, y, width, height)
pub fn foreground_bounds(image: &GrayImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[0] != FOREGROUND {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds.map(|(x0, y0, x1, y1)| (x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}

/// Crop a binary image to its ink
pub fn crop_to_foreground(image: &GrayImage) -> Result<GrayImage, PreprocessError> {
    let (x, y, width, height) = foreground_bounds(image).ok_or(PreprocessError::Blank)?;
    Ok(image::imageops::crop_imm(image, x, y, width, height).to_image())
}

/// Scales a cropped binary glyph into the square canonical frame
#[derive(Debug, Clone)]
pub struct CanonicalResizer {
    pub size: u32,
    pub aspect: AspectPolicy,
    pub coverage_threshold: u8,
}

impl Default for CanonicalResizer {
    fn default() -> Self {
        Self {
            size: 48,
            aspect: AspectPolicy::PadToSquare,
            coverage_threshold: 64,
        }
    }
}

impl CanonicalResizer {
    pub fn resize(&self, cropped: &GrayImage) -> Result<CanonicalImage, PreprocessError> {
        if self.size == 0 {
            return Err(PreprocessError::InvalidConfig("canonical size must be positive".into()));
        }

        let framed = match self.aspect {
            AspectPolicy::PadToSquare => pad_to_square(cropped),
            AspectPolicy::Stretch => cropped.clone(),
        };
        let coverage = image::imageops::resize(&framed, self.size, self.size, FilterType::Triangle);

        let peak = coverage.pixels().map(|p| p[0]).max().unwrap_or(0);
        if peak == 0 {
            return Err(PreprocessError::Blank);
        }
        // Faint strokes can fall under the threshold entirely; keep their peaks then.
        let level = self.coverage_threshold.max(1).min(peak);

        let binary = GrayImage::from_fn(self.size, self.size, |x, y| {
            if coverage.get_pixel(x, y)[0] >= level {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        });
        Ok(CanonicalImage::from_binary(binary))
    }
}

fn pad_to_square(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let side = width.max(height);
    let mut canvas = GrayImage::new(side, side);
    image::imageops::overlay(
        &mut canvas,
        image,
        ((side - width) / 2) as i64,
        ((side - height) / 2) as i64,
    );
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gray_with_square() -> GrayImage {
        let mut img = GrayImage::from_pixel(40, 30, Luma([230u8]));
        for y in 10..20 {
            for x in 5..25 {
                img.put_pixel(x, y, Luma([20u8]));
            }
        }
        img
    }

    #[test]
    fn test_luminance_weights() {
        assert_eq!(luminance(255, 255, 255), 255);
        assert_eq!(luminance(0, 0, 0), 0);
        assert_eq!(luminance(255, 0, 0), 76);
        assert_eq!(luminance(0, 255, 0), 150);
    }

    #[test]
    fn test_green_annotations_are_whitened() {
        let mut rgb = RgbImage::from_pixel(3, 1, Rgb([255, 255, 255]));
        rgb.put_pixel(0, 0, Rgb([20, 200, 30]));
        rgb.put_pixel(1, 0, Rgb([10, 10, 10]));
        let raster = RasterImage::new(rgb, 3).expect("raster");

        let gray = GrayscaleConverter { suppress_green: true }.convert(&raster);
        assert_eq!(gray.get_pixel(0, 0)[0], 255);
        assert_eq!(gray.get_pixel(1, 0)[0], 10);

        let kept = GrayscaleConverter { suppress_green: false }.convert(&raster);
        assert_eq!(kept.get_pixel(0, 0)[0], luminance(20, 200, 30));
    }

    #[test]
    fn test_otsu_marks_dark_ink() {
        let binary = OtsuThresholdPreprocessor::default()
            .preprocess(&gray_with_square())
            .expect("Should threshold");
        assert_eq!(binary.get_pixel(10, 15)[0], FOREGROUND);
        assert_eq!(binary.get_pixel(0, 0)[0], BACKGROUND);
        assert_eq!(foreground_bounds(&binary), Some((5, 10, 20, 10)));
    }

    #[test]
    fn test_uniform_image_has_no_ink() {
        let flat = GrayImage::from_pixel(16, 16, Luma([255u8]));
        for step in [
            Box::new(OtsuThresholdPreprocessor::default()) as Box<dyn ImagePreprocessor>,
            Box::new(ThresholdPreprocessor { threshold: 255, min_contrast: 16 }),
        ] {
            let binary = step.preprocess(&flat).expect("Should threshold");
            assert_eq!(foreground_bounds(&binary), None, "{}", step.name());
        }
    }

    #[test]
    fn test_closing_bridges_single_pixel_gap() {
        let mut binary = GrayImage::new(20, 9);
        for x in 2..18 {
            if x != 10 {
                binary.put_pixel(x, 4, Luma([FOREGROUND]));
            }
        }
        let closed = ClosingPreprocessor { radius: 1 }.preprocess(&binary).expect("close");
        assert_eq!(closed.get_pixel(10, 4)[0], FOREGROUND);

        let untouched = ClosingPreprocessor { radius: 0 }.preprocess(&binary).expect("close");
        assert_eq!(untouched, binary);
    }

    #[test]
    fn test_speckle_filter_removes_isolated_pixels() {
        let mut binary = GrayImage::new(50, 50);
        for y in 20..30 {
            for x in 20..30 {
                binary.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        binary.put_pixel(2, 2, Luma([FOREGROUND]));
        binary.put_pixel(47, 5, Luma([FOREGROUND]));
        binary.put_pixel(48, 5, Luma([FOREGROUND]));

        let clean = SpeckleFilter::default().preprocess(&binary).expect("filter");
        assert_eq!(foreground_bounds(&clean), Some((20, 20, 10, 10)));
    }

    #[test]
    fn test_speckle_filter_drops_components_small_relative_to_largest() {
        let mut binary = GrayImage::new(120, 120);
        for y in 0..100 {
            for x in 0..100 {
                binary.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        // 3x3 = 9 pixels: above min_area but under 2% of 10000
        for y in 110..113 {
            for x in 110..113 {
                binary.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        let clean = SpeckleFilter::default().preprocess(&binary).expect("filter");
        assert_eq!(foreground_bounds(&clean), Some((0, 0, 100, 100)));
    }

    #[test]
    fn test_crop_of_blank_image_fails() {
        let blank = GrayImage::new(8, 8);
        assert_eq!(crop_to_foreground(&blank), Err(PreprocessError::Blank));
    }

    #[test]
    fn test_pad_to_square_keeps_aspect() {
        let mut bar = GrayImage::new(40, 10);
        for pixel in bar.pixels_mut() {
            *pixel = Luma([FOREGROUND]);
        }
        let canonical = CanonicalResizer::default().resize(&bar).expect("resize");
        assert_eq!(canonical.size(), 48);
        let (_, y, width, height) = foreground_bounds(canonical.pixels()).expect("ink");
        assert_eq!(width, 48);
        assert!((10..=14).contains(&height), "height {height}");
        assert!(y >= 16 && y <= 20, "y {y}");

        let stretched = CanonicalResizer {
            aspect: AspectPolicy::Stretch,
            ..CanonicalResizer::default()
        }
        .resize(&bar)
        .expect("resize");
        assert_eq!(stretched.foreground_count(), 48 * 48);
    }

    #[test]
    fn test_thin_stroke_survives_downsampling() {
        let mut line = GrayImage::new(600, 600);
        for y in 0..600 {
            line.put_pixel(300, y, Luma([FOREGROUND]));
            line.put_pixel(y, 0, Luma([FOREGROUND]));
        }
        let canonical = CanonicalResizer::default().resize(&line).expect("resize");
        assert!(canonical.foreground_count() > 0);
    }

    #[test]
    fn test_zero_canonical_size_is_invalid() {
        let resizer = CanonicalResizer { size: 0, ..CanonicalResizer::default() };
        let single = GrayImage::from_pixel(1, 1, Luma([FOREGROUND]));
        assert!(matches!(resizer.resize(&single), Err(PreprocessError::InvalidConfig(_))));
    }
}
