use std::{fs, path::{Path, PathBuf}};

use serde::Deserialize;
use tracing::info;
use crate::{
    catalog::{Catalog, ClassTemplate},
    config::PreprocessConfig,
    error::{ConfigError, Result},
    types::ClassId,
};

/// On-disk form of a catalog; validated into a [`Catalog`] after parsing
#[derive(Debug, Deserialize)]
struct CatalogFile {
    canonical_size: u32,
    dimension: usize,
    #[serde(default)]
    preprocess: Option<PreprocessConfig>,
    templates: Vec<ClassTemplate>,
}

impl Catalog {
    /// Parse and validate a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut catalog = Catalog::new(file.canonical_size, file.templates)?;
        if let Some(preprocess) = file.preprocess {
            catalog = catalog.with_preprocess(preprocess);
        }

        if catalog.dimension() != file.dimension {
            return Err(crate::error::ClassifyError::CorruptCatalog(format!(
                "declared dimension {} but templates have {}",
                file.dimension,
                catalog.dimension()
            ))
            .into());
        }
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let catalog = Self::from_json(&fs::read_to_string(path)?)?;
        info!(
            "Loaded catalog from {}: {} templates, {} classes",
            path.display(),
            catalog.len(),
            catalog.class_ids().len()
        );
        Ok(catalog)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        info!("Saved catalog with {} templates to {}", self.len(), path.display());
        Ok(())
    }
}

/// One labeled exemplar listed in an enrollment manifest
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ManifestSample {
    pub path: PathBuf,
    pub class_id: ClassId,
}

/// Enrollment manifest:
///
/// ```toml
/// [[sample]]
/// path = "0.png"
/// class_id = 5
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Manifest {
    #[serde(rename = "sample", default)]
    pub samples: Vec<ManifestSample>,
}

impl Manifest {
    pub fn from_toml(content: &str) -> std::result::Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        Self::from_toml(&fs::read_to_string(path)?)
    }
}
