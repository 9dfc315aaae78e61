//! I/O adapters for reading and writing geospatial data
//!
//! These sit outside the pure pipeline: the algorithms never touch the
//! filesystem.

mod features;
mod native;

pub use features::{read_geojson, to_geojson, write_geojson};
pub use native::{
    read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer,
    write_rgba_geotiff, GeoTiffOptions,
};
