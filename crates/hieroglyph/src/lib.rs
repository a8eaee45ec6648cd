//! # Hieroglyph Recognition Library
//!
//! Identifies a single hieroglyph in a raster image by comparing a
//! normalized shape descriptor against a catalog of labeled exemplars.
//!
//! ## Core Features
//!
//! - **Normalization Pipeline**: grayscale, binarization, closing, speckle removal,
//!   cropping and resizing to a canonical square, composed with a builder
//! - **Shape Descriptor**: zoning, stroke direction, aspect, moments and topology
//!   features in one fixed-length vector
//! - **Nearest-Neighbor Classification**: deterministic, with ties going to the
//!   lowest class ID
//! - **Catalog Enrollment**: build catalogs from TOML manifests, persist them as JSON
//! - **Plate Segmentation**: split a plate into glyph regions and recognize each one
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hieroglyph::{Catalog, Recognizer, RecognizerConfig};
//!
//! let catalog = Catalog::load_json("catalog.json")?;
//! let recognizer = Recognizer::new(RecognizerConfig::default(), catalog)?;
//!
//! let class_id = recognizer.recognize("glyph.png")?;
//! println!("class {class_id}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Building a Catalog
//!
//! ```rust,no_run
//! use hieroglyph::{CatalogBuilder, RecognizerConfig};
//!
//! let config = RecognizerConfig::default();
//! let mut builder = CatalogBuilder::from_config(&config);
//! builder.enroll_manifest("exemplars/manifest.toml")?;
//! builder.build()?.save_json("catalog.json")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod config;
pub mod algorithms;
pub mod pipeline;
pub mod catalog;
pub mod io;
pub mod recognizer;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use error::{ClassifyError, ConfigError, LoadError, PreprocessError, RecognitionError, Result};
pub use types::{CanonicalImage, ClassId, FeatureVector, Match, RasterImage, Segment};
pub use traits::*;
pub use config::{AspectPolicy, FeatureWeights, PreprocessConfig, RecognizerConfig, SegmentationConfig, ThresholdMethod};
pub use algorithms::FEATURE_DIM;
pub use pipeline::{Pipeline, builder::PipelineBuilder};
pub use catalog::{Catalog, CatalogBuilder, ClassTemplate};
pub use io::{Manifest, ManifestSample};
pub use recognizer::{recognize, Recognizer};
