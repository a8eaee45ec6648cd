pub mod builder;

use image::GrayImage;
use tracing::debug;
use crate::{
    algorithms::{crop_to_foreground, foreground_bounds, CanonicalResizer, GrayscaleConverter},
    config::PreprocessConfig,
    error::PreprocessError,
    traits::ImagePreprocessor,
    types::{CanonicalImage, RasterImage},
};

/// Normalizes rasters into canonical glyph images.
///
/// Grayscale reduction runs first, then every preprocessor in order (the
/// first one must binarize), then the ink is cropped and resized.
pub struct Pipeline {
    grayscale: GrayscaleConverter,
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    resizer: CanonicalResizer,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Create a new pipeline with the given components
    pub fn new(
        grayscale: GrayscaleConverter,
        preprocessors: Vec<Box<dyn ImagePreprocessor>>,
        resizer: CanonicalResizer,
    ) -> Self {
        Self {
            grayscale,
            preprocessors,
            resizer,
        }
    }

    pub fn from_config(config: &PreprocessConfig) -> Self {
        builder::PipelineBuilder::from_config(config).build()
    }

    /// Grayscale, binarize and clean the raster without cropping
    pub fn binarize(&self, raster: &RasterImage) -> Result<GrayImage, PreprocessError> {
        let mut processed = self.grayscale.convert(raster);
        for preprocessor in &self.preprocessors {
            processed = preprocessor.preprocess(&processed)?;
        }
        Ok(processed)
    }

    /// Run the whole normalization
    pub fn normalize(&self, raster: &RasterImage) -> Result<CanonicalImage, PreprocessError> {
        let binary = self.binarize(raster)?;
        if let Some((x, y, width, height)) = foreground_bounds(&binary) {
            debug!("Glyph bounds {}x{} at ({}, {})", width, height, x, y);
        }
        let cropped = crop_to_foreground(&binary)?;
        self.resizer.resize(&cropped)
    }

    pub fn canonical_size(&self) -> u32 {
        self.resizer.size
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        let steps: Vec<&str> = self.preprocessors.iter().map(|p| p.name()).collect();
        format!(
            "Pipeline: grayscale (suppress_green={}), [{}], canonical {}x{} ({})",
            self.grayscale.suppress_green,
            steps.join(", "),
            self.resizer.size,
            self.resizer.size,
            self.resizer.aspect
        )
    }
}
