use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    algorithms::GlyphDescriptor,
    config::{PreprocessConfig, RecognizerConfig},
    error::{ClassifyError, Result},
    io,
    pipeline::Pipeline,
    traits::FeatureExtractor,
    types::{ClassId, FeatureVector, RasterImage},
};

/// One reference exemplar of a glyph class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassTemplate {
    pub class_id: ClassId,
    pub vector: FeatureVector,
}

impl ClassTemplate {
    pub fn new(class_id: ClassId, vector: impl Into<FeatureVector>) -> Self {
        Self {
            class_id,
            vector: vector.into(),
        }
    }
}

/// The closed set of reference templates.
///
/// Always non-empty, with every vector of the same finite dimension. Templates
/// are ordered by class ID and then by enrollment order, so a catalog built
/// from the same exemplars is always identical.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    canonical_size: u32,
    dimension: usize,
    /// Preprocessing the templates were enrolled with, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    preprocess: Option<PreprocessConfig>,
    templates: Vec<ClassTemplate>,
}

impl Catalog {
    pub fn new(canonical_size: u32, mut templates: Vec<ClassTemplate>) -> std::result::Result<Self, ClassifyError> {
        let dimension = templates
            .first()
            .map(|t| t.vector.len())
            .ok_or(ClassifyError::EmptyCatalog)?;

        if canonical_size == 0 {
            return Err(ClassifyError::CorruptCatalog("canonical size is zero".into()));
        }
        if dimension == 0 {
            return Err(ClassifyError::CorruptCatalog("templates have no features".into()));
        }

        let mut owners: BTreeMap<Vec<u64>, ClassId> = BTreeMap::new();
        for (index, template) in templates.iter().enumerate() {
            if template.class_id == 0 {
                return Err(ClassifyError::CorruptCatalog(format!(
                    "template {index} has class id 0"
                )));
            }
            if template.vector.len() != dimension {
                return Err(ClassifyError::CorruptCatalog(format!(
                    "template {index} has {} features, expected {dimension}",
                    template.vector.len()
                )));
            }
            if !template.vector.is_finite() {
                return Err(ClassifyError::CorruptCatalog(format!(
                    "template {index} contains non-finite values"
                )));
            }

            let bits = template.vector.as_slice().iter().map(|v| v.to_bits()).collect();
            match owners.get(&bits) {
                Some(&owner) if owner != template.class_id => {
                    return Err(ClassifyError::CorruptCatalog(format!(
                        "identical templates registered for classes {owner} and {}",
                        template.class_id
                    )));
                }
                Some(_) => {}
                None => {
                    owners.insert(bits, template.class_id);
                }
            }
        }

        templates.sort_by_key(|t| t.class_id);

        Ok(Self {
            canonical_size,
            dimension,
            preprocess: None,
            templates,
        })
    }

    /// Record the preprocessing the templates were enrolled with
    pub fn with_preprocess(mut self, preprocess: PreprocessConfig) -> Self {
        self.preprocess = Some(preprocess);
        self
    }

    pub fn preprocess(&self) -> Option<&PreprocessConfig> {
        self.preprocess.as_ref()
    }

    pub fn canonical_size(&self) -> u32 {
        self.canonical_size
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn templates(&self) -> &[ClassTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// The closed set of class IDs, ascending
    pub fn class_ids(&self) -> Vec<ClassId> {
        self.templates
            .iter()
            .map(|t| t.class_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn contains(&self, class_id: ClassId) -> bool {
        self.templates.iter().any(|t| t.class_id == class_id)
    }

    pub fn templates_for(&self, class_id: ClassId) -> impl Iterator<Item = &ClassTemplate> {
        self.templates.iter().filter(move |t| t.class_id == class_id)
    }
}

/// Builds a catalog from labeled exemplar images
pub struct CatalogBuilder {
    pipeline: Pipeline,
    extractor: Box<dyn FeatureExtractor>,
    canonical_size: u32,
    preprocess: Option<PreprocessConfig>,
    templates: Vec<ClassTemplate>,
}

impl CatalogBuilder {
    pub fn new(pipeline: Pipeline, extractor: Box<dyn FeatureExtractor>) -> Self {
        let canonical_size = pipeline.canonical_size();
        Self {
            pipeline,
            extractor,
            canonical_size,
            preprocess: None,
            templates: Vec::new(),
        }
    }

    /// Builder using the same preprocessing and descriptor as a recognizer
    /// created from `config`
    pub fn from_config(config: &RecognizerConfig) -> Self {
        let mut builder = Self::new(
            Pipeline::from_config(&config.preprocess),
            Box::new(GlyphDescriptor::default()),
        );
        builder.preprocess = Some(config.preprocess.clone());
        builder
    }

    pub fn enroll_image(&mut self, class_id: ClassId, raster: &RasterImage) -> Result<()> {
        let canonical = self.pipeline.normalize(raster)?;
        let vector = self.extractor.extract(&canonical);
        self.templates.push(ClassTemplate { class_id, vector });
        Ok(())
    }

    pub fn enroll_file<P: AsRef<Path>>(&mut self, class_id: ClassId, path: P) -> Result<()> {
        let path = path.as_ref();
        debug!("Enrolling {} as class {}", path.display(), class_id);
        let raster = io::image::load(path)?;
        self.enroll_image(class_id, &raster)
    }

    /// Enroll every sample listed in a TOML manifest.
    ///
    /// Sample paths are relative to the manifest's directory.
    pub fn enroll_manifest<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let manifest = io::catalog::Manifest::from_toml_file(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        for sample in &manifest.samples {
            self.enroll_file(sample.class_id, base.join(&sample.path))?;
        }
        info!("Enrolled {} samples from {}", manifest.samples.len(), path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn build(self) -> std::result::Result<Catalog, ClassifyError> {
        let catalog = Catalog::new(self.canonical_size, self.templates)?;
        Ok(match self.preprocess {
            Some(preprocess) => catalog.with_preprocess(preprocess),
            None => catalog,
        })
    }
}
