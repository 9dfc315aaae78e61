//! # vegtrace algorithms
//!
//! The three pipeline stages and their composition.
//!
//! ## Stages
//!
//! - **imagery**: vegetation index ([`imagery::compute_index`]) and land-cover
//!   classification ([`imagery::classify`])
//! - **vector**: polygon extraction from a label grid ([`vector::extract_polygons`])
//! - **pipeline**: index, classify and extract in one call ([`pipeline::run`])

pub mod imagery;
pub mod pipeline;
pub mod vector;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::imagery::{
        class_counts, classify, compute_index, ClassThresholds, Classifier, IndexComputer,
        IndexParams, LandCover,
    };
    pub use crate::pipeline::{run, PipelineConfig, PipelineOutput};
    pub use crate::vector::{
        extract_polygons, rasterize_polygon, validate_ring, ExtractParams, FeatureExtractor,
        GeometryRejection, PolygonSet,
    };
    pub use vegtrace_core::prelude::*;
}
