use crate::{
    pipeline::Pipeline,
    traits::ImagePreprocessor,
    config::{AspectPolicy, PreprocessConfig, ThresholdMethod},
    algorithms::{
        CanonicalResizer,
        ClosingPreprocessor,
        GrayscaleConverter,
        OtsuThresholdPreprocessor,
        SpeckleFilter,
        ThresholdPreprocessor,
    },
};

/// Builder for creating normalization pipelines with a fluent API
pub struct PipelineBuilder {
    grayscale: GrayscaleConverter,
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    resizer: CanonicalResizer,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            grayscale: GrayscaleConverter::default(),
            preprocessors: Vec::new(),
            resizer: CanonicalResizer::default(),
        }
    }

    /// Builder reproducing a [`PreprocessConfig`]
    pub fn from_config(config: &PreprocessConfig) -> Self {
        let builder = Self::new().suppress_green(config.suppress_green);

        let builder = match config.threshold {
            ThresholdMethod::Otsu => builder.with_otsu(config.min_contrast),
            ThresholdMethod::Fixed { level } => builder.with_fixed_threshold(level, config.min_contrast),
        };

        builder
            .with_closing(config.closing_radius)
            .with_speckle_filter(config.min_component_area, config.min_component_ratio)
            .canonical_size(config.canonical_size)
            .aspect_policy(config.aspect)
            .coverage_threshold(config.coverage_threshold)
    }

    /// Whether green annotation marks are painted out before thresholding
    pub fn suppress_green(mut self, suppress: bool) -> Self {
        self.grayscale.suppress_green = suppress;
        self
    }

    /// Add a preprocessor to the pipeline
    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Binarize with Otsu's threshold
    pub fn with_otsu(self, min_contrast: u8) -> Self {
        self.add_preprocessor(OtsuThresholdPreprocessor { min_contrast })
    }

    /// Binarize with a fixed threshold
    pub fn with_fixed_threshold(self, threshold: u8, min_contrast: u8) -> Self {
        self.add_preprocessor(ThresholdPreprocessor { threshold, min_contrast })
    }

    /// Close one-pixel gaps in strokes; radius 0 adds nothing
    pub fn with_closing(self, radius: u8) -> Self {
        if radius == 0 {
            return self;
        }
        self.add_preprocessor(ClosingPreprocessor { radius })
    }

    /// Erase small ink components
    pub fn with_speckle_filter(self, min_area: u32, min_ratio: f64) -> Self {
        self.add_preprocessor(SpeckleFilter { min_area, min_ratio })
    }

    pub fn canonical_size(mut self, size: u32) -> Self {
        self.resizer.size = size;
        self
    }

    pub fn aspect_policy(mut self, aspect: AspectPolicy) -> Self {
        self.resizer.aspect = aspect;
        self
    }

    pub fn coverage_threshold(mut self, threshold: u8) -> Self {
        self.resizer.coverage_threshold = threshold;
        self
    }

    /// Build the pipeline, using the default steps if none were added
    pub fn build(self) -> Pipeline {
        let preprocessors = if self.preprocessors.is_empty() {
            let defaults = PreprocessConfig::default();
            Self::new()
                .with_otsu(defaults.min_contrast)
                .with_closing(defaults.closing_radius)
                .with_speckle_filter(defaults.min_component_area, defaults.min_component_ratio)
                .preprocessors
        } else {
            self.preprocessors
        };

        Pipeline::new(self.grayscale, preprocessors, self.resizer)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
