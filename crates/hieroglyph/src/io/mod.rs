pub mod image;
pub mod catalog;

pub use self::image::{load, load_from_memory};
pub use self::catalog::{Manifest, ManifestSample};
