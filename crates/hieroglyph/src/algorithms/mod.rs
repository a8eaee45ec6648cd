pub mod preprocessing;
pub mod features;
pub mod classification;
pub mod segmentation;

pub use preprocessing::*;
pub use features::*;
pub use classification::*;
pub use segmentation::*;
