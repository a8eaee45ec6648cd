use std::{path::Path, sync::Arc};

use image::Rgb;
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use tracing::{debug, info};

use crate::{
    algorithms::{ComponentSegmenter, GlyphDescriptor, NearestNeighborClassifier, WeightedEuclidean},
    catalog::Catalog,
    config::RecognizerConfig,
    error::{ClassifyError, ConfigError, Result},
    io,
    pipeline::Pipeline,
    traits::{Classifier, FeatureExtractor},
    types::{CanonicalImage, ClassId, FeatureVector, Match, RasterImage, Segment},
};

/// Paper margin kept around each segment when it is cropped for recognition
const SEGMENT_MARGIN: u32 = 2;

const OVERLAY_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// An initialized recognition engine.
///
/// Immutable once built; the catalog is shared behind an `Arc`, so one
/// recognizer can serve any number of threads.
pub struct Recognizer {
    config: RecognizerConfig,
    pipeline: Pipeline,
    descriptor: GlyphDescriptor,
    classifier: NearestNeighborClassifier<WeightedEuclidean>,
    segmenter: ComponentSegmenter,
    catalog: Arc<Catalog>,
}

impl Recognizer {
    pub fn new(config: RecognizerConfig, catalog: impl Into<Arc<Catalog>>) -> Result<Self> {
        config.validate()?;
        let catalog = catalog.into();
        let pipeline = Pipeline::from_config(&config.preprocess);
        let descriptor = GlyphDescriptor::default();

        if catalog.canonical_size() != pipeline.canonical_size() {
            return Err(ClassifyError::IncompatibleCatalog(format!(
                "catalog built at {}px, recognizer normalizes to {}px",
                catalog.canonical_size(),
                pipeline.canonical_size()
            ))
            .into());
        }
        if let Some(enrolled) = catalog.preprocess() {
            if *enrolled != config.preprocess {
                return Err(ClassifyError::IncompatibleCatalog(
                    "catalog was enrolled with different preprocessing settings".into(),
                )
                .into());
            }
        }
        if catalog.dimension() != descriptor.dimension() {
            return Err(ClassifyError::IncompatibleCatalog(format!(
                "catalog has {} features, recognizer extracts {}",
                catalog.dimension(),
                descriptor.dimension()
            ))
            .into());
        }

        let metric = WeightedEuclidean::from_layout(&descriptor.layout(), &config.features);
        let segmenter = ComponentSegmenter {
            min_area: config.segmentation.min_area,
        };
        debug!("{}", pipeline.info());

        Ok(Self {
            config,
            pipeline,
            descriptor,
            classifier: NearestNeighborClassifier::new(metric),
            segmenter,
            catalog,
        })
    }

    /// Build from a configuration naming its catalog file
    pub fn from_config(config: RecognizerConfig) -> Result<Self> {
        let path = config
            .catalog_path
            .clone()
            .ok_or(ConfigError::MissingCatalogPath)?;
        let catalog = Catalog::load_json(path)?;
        Self::new(config, catalog)
    }

    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_config(RecognizerConfig::from_toml_file(path)?)
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn canonicalize(&self, raster: &RasterImage) -> Result<CanonicalImage> {
        Ok(self.pipeline.normalize(raster)?)
    }

    pub fn features(&self, raster: &RasterImage) -> Result<FeatureVector> {
        Ok(self.descriptor.extract(&self.canonicalize(raster)?))
    }

    /// Class of the single glyph in the image file at `path`
    pub fn recognize<P: AsRef<Path>>(&self, path: P) -> Result<ClassId> {
        let raster = io::load(path.as_ref())?;
        let class_id = self.recognize_image(&raster)?;
        info!("Recognized {} as class {}", path.as_ref().display(), class_id);
        Ok(class_id)
    }

    pub fn recognize_image(&self, raster: &RasterImage) -> Result<ClassId> {
        let vector = self.features(raster)?;
        Ok(self.classifier.classify(&vector, &self.catalog)?)
    }

    /// The `k` closest classes for the glyph at `path`
    pub fn rank<P: AsRef<Path>>(&self, path: P, k: usize) -> Result<Vec<Match>> {
        let raster = io::load(path)?;
        let vector = self.features(&raster)?;
        Ok(self.classifier.rank(&vector, &self.catalog, k)?)
    }

    /// Glyph regions of a multi-glyph plate, in reading order
    pub fn segment(&self, raster: &RasterImage) -> Result<Vec<Segment>> {
        let binary = self.pipeline.binarize(raster)?;
        let segments = self.segmenter.segment(&binary);
        debug!("Found {} segments", segments.len());
        Ok(segments)
    }

    /// Recognize every glyph on a plate
    pub fn recognize_segments<P: AsRef<Path>>(&self, path: P) -> Result<Vec<(Segment, ClassId)>> {
        let raster = io::load(path)?;
        let mut recognized = Vec::new();
        for segment in self.segment(&raster)? {
            let region = raster.crop(&with_margin(&segment, &raster));
            recognized.push((segment, self.recognize_image(&region)?));
        }
        Ok(recognized)
    }

    /// Draw the segments of the plate at `path` and write the result as an
    /// image to `output`
    pub fn save_segment_overlay<P, Q>(&self, path: P, output: Q) -> Result<Vec<Segment>>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let raster = io::load(path)?;
        let segments = self.segment(&raster)?;

        let mut overlay = raster.pixels().clone();
        for segment in &segments {
            let rect = Rect::at(segment.x as i32, segment.y as i32).of_size(segment.width, segment.height);
            draw_hollow_rect_mut(&mut overlay, rect, OVERLAY_COLOR);
        }
        overlay.save(output.as_ref())?;
        info!("Saved {} segments to {}", segments.len(), output.as_ref().display());
        Ok(segments)
    }
}

fn with_margin(segment: &Segment, raster: &RasterImage) -> Segment {
    let x = segment.x.saturating_sub(SEGMENT_MARGIN);
    let y = segment.y.saturating_sub(SEGMENT_MARGIN);
    let right = (segment.x + segment.width + SEGMENT_MARGIN).min(raster.width());
    let bottom = (segment.y + segment.height + SEGMENT_MARGIN).min(raster.height());
    Segment {
        x,
        y,
        width: right - x,
        height: bottom - y,
        area: segment.area,
    }
}

/// Recognize one image file against `catalog` with the default configuration
pub fn recognize<P: AsRef<Path>>(path: P, catalog: &Arc<Catalog>) -> Result<ClassId> {
    Recognizer::new(RecognizerConfig::default(), Arc::clone(catalog))?.recognize(path)
}
