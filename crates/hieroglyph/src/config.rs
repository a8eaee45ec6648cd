use std::{fs, path::{Path, PathBuf}};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ConfigError;

/// How the cropped glyph is fitted into the square canonical frame
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AspectPolicy {
    /// Centre the crop on a square canvas, keeping its aspect ratio
    #[default]
    PadToSquare,
    /// Scale width and height independently
    Stretch,
}

/// Binarization policy
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString,
    PartialEq, Eq
)]
#[serde(tag = "method", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ThresholdMethod {
    /// Otsu's method, chosen per image
    #[default]
    Otsu,
    /// Pixels at or below `level` are ink
    Fixed { level: u8 },
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Paint strongly green pixels white before grayscale reduction
    pub suppress_green: bool,
    pub threshold: ThresholdMethod,
    /// Images with a smaller gray range than this are blank
    #[schemars(range(max = 254))]
    pub min_contrast: u8,
    /// Radius of the morphological closing; 0 disables it
    pub closing_radius: u8,
    /// Components with fewer pixels are erased as speckle
    pub min_component_area: u32,
    /// Components smaller than this fraction of the largest are erased
    #[schemars(range(min = 0.0, max = 1.0))]
    pub min_component_ratio: f64,
    /// Side length of the canonical image
    #[schemars(range(min = 8, max = 256))]
    pub canonical_size: u32,
    pub aspect: AspectPolicy,
    /// Minimum resampled coverage (0-255) for a canonical pixel to be ink
    pub coverage_threshold: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            suppress_green: true,
            threshold: ThresholdMethod::Otsu,
            min_contrast: 16,
            closing_radius: 1,
            min_component_area: 8,
            min_component_ratio: 0.02,
            canonical_size: 48,
            aspect: AspectPolicy::PadToSquare,
            coverage_threshold: 64,
        }
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(8..=256).contains(&self.canonical_size) {
            return Err(ConfigError::Invalid(format!(
                "preprocess.canonical_size must be within 8..=256, got {}",
                self.canonical_size
            )));
        }
        if !(0.0..=1.0).contains(&self.min_component_ratio) {
            return Err(ConfigError::Invalid(format!(
                "preprocess.min_component_ratio must be within 0..=1, got {}",
                self.min_component_ratio
            )));
        }
        if self.min_contrast == u8::MAX {
            return Err(ConfigError::Invalid(
                "preprocess.min_contrast of 255 leaves every image blank".into(),
            ));
        }
        Ok(())
    }
}

/// Per-group weights of the distance metric
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct FeatureWeights {
    #[schemars(range(min = 0.0))]
    pub zoning: f64,
    #[schemars(range(min = 0.0))]
    pub direction: f64,
    #[schemars(range(min = 0.0))]
    pub shape: f64,
    #[schemars(range(min = 0.0))]
    pub moments: f64,
    #[schemars(range(min = 0.0))]
    pub topology: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            zoning: 1.0,
            direction: 1.0,
            shape: 1.0,
            moments: 2.0,
            topology: 2.0,
        }
    }
}

impl FeatureWeights {
    /// Weight for a feature group by its name, 1.0 for unknown groups
    pub fn for_group(&self, name: &str) -> f64 {
        match name {
            "zoning" => self.zoning,
            "direction" => self.direction,
            "shape" => self.shape,
            "moments" => self.moments,
            "topology" => self.topology,
            _ => 1.0,
        }
    }

    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("zoning", self.zoning),
            ("direction", self.direction),
            ("shape", self.shape),
            ("moments", self.moments),
            ("topology", self.topology),
        ]
    }

    /// Weights must be finite, non-negative and not all zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = self.named();
        if let Some((name, weight)) = weights.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::Invalid(format!(
                "features.{name} must be a finite non-negative weight, got {weight}"
            )));
        }
        if weights.iter().all(|(_, w)| *w == 0.0) {
            return Err(ConfigError::Invalid("all feature weights are zero".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Regions with this many ink pixels or fewer are ignored
    pub min_area: u32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self { min_area: 30 }
    }
}

/// Complete recognizer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct RecognizerConfig {
    pub preprocess: PreprocessConfig,
    pub features: FeatureWeights,
    pub segmentation: SegmentationConfig,
    /// JSON catalog file; relative paths resolve against the config file
    pub catalog_path: Option<PathBuf>,
}

impl RecognizerConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;

        if let (Some(catalog), Some(parent)) = (config.catalog_path.as_ref(), path.parent()) {
            if catalog.is_relative() {
                config.catalog_path = Some(parent.join(catalog));
            }
        }

        Ok(config)
    }

    /// Load and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every tunable is within its usable range
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.preprocess.validate()?;
        self.features.validate()
    }

    /// Get the JSON schema of the configuration
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RecognizerConfig)
    }
}
