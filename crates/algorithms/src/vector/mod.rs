//! Raster-to-vector extraction
//!
//! - Regions: 4-connected components of one label, found with a worklist
//! - Tracing: region boundaries chained into rings on the pixel-corner lattice
//! - Validity: simple-ring checks that decide which polygons are kept
//! - Rasterize: burn a polygon back onto a grid

mod polygonize;
mod rasterize;
mod regions;
mod trace;
mod validity;

pub use polygonize::{
    extract_polygons, ExtractParams, ExtractedPolygon, FeatureExtractor, PolygonSet, RejectedRegion,
};
pub use rasterize::rasterize_polygon;
pub use regions::{label_regions, Region, RegionMap};
pub use validity::{validate_ring, GeometryRejection};
