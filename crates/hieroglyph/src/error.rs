use std::path::PathBuf;

use thiserror::Error;

/// Failures of the image loader. None of these are transient.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Image file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read image file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has zero width or height")]
    EmptyImage,
}

/// Failures while normalizing a raster into its canonical form.
#[derive(Error, Debug, PartialEq)]
pub enum PreprocessError {
    #[error("Image contains no foreground pixels")]
    Blank,

    #[error("Invalid preprocessing configuration: {0}")]
    InvalidConfig(String),
}

/// Failures of the classifier and its catalog.
#[derive(Error, Debug, PartialEq)]
pub enum ClassifyError {
    #[error("Catalog contains no templates")]
    EmptyCatalog,

    #[error("Corrupt catalog: {0}")]
    CorruptCatalog(String),

    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Catalog is incompatible with the recognizer: {0}")]
    IncompatibleCatalog(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("No catalog_path configured")]
    MissingCatalogPath,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Catalog serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write image: {0}")]
    ImageWrite(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, RecognitionError>;
