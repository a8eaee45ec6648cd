use image::GrayImage;
use crate::{
    catalog::Catalog,
    error::{ClassifyError, PreprocessError},
    types::{CanonicalImage, ClassId, FeatureVector, Match},
};

/// Trait for preprocessing steps between grayscale reduction and cropping
///
/// Steps after binarization receive and return binary images (ink 255).
pub trait ImagePreprocessor: Send + Sync {
    /// Transform the image (e.g., threshold, close, despeckle)
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage, PreprocessError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// One group of descriptor values computed from a canonical image
pub trait FeatureGroup: Send + Sync {
    fn name(&self) -> &'static str;

    /// Number of values this group appends
    fn len(&self) -> usize;

    /// Append exactly `len()` finite values to `out`
    fn extend(&self, image: &CanonicalImage, out: &mut Vec<f64>);
}

/// Trait for turning canonical images into descriptors
pub trait FeatureExtractor: Send + Sync {
    /// Dimension of every vector this extractor produces
    fn dimension(&self) -> usize;

    fn extract(&self, image: &CanonicalImage) -> FeatureVector;
}

/// Trait for distances between descriptors of equal length
pub trait DistanceMetric: Send + Sync {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64;
}

/// Trait for mapping a descriptor to a class of the catalog
pub trait Classifier: Send + Sync {
    fn classify(&self, vector: &FeatureVector, catalog: &Catalog) -> Result<ClassId, ClassifyError>;

    /// Best `k` distinct classes, closest first
    fn rank(&self, vector: &FeatureVector, catalog: &Catalog, k: usize) -> Result<Vec<Match>, ClassifyError>;
}
