//! Imagery analysis algorithms
//!
//! - Vegetation index: scaled, masked normalized difference of NIR and Red
//! - Classification: vegetation / water / barren from index thresholds

mod classify;
mod index;

pub use classify::{class_counts, classify, ClassThresholds, Classifier, LandCover};
pub use index::{compute_index, IndexComputer, IndexParams};
