//! Raster-to-polygon extraction of one land-cover class

use super::regions::{label_regions, RegionMap};
use super::trace::{trace_rings, PixelRing};
use super::validity::{validate_ring, GeometryRejection};
use crate::imagery::LandCover;
use crate::maybe_rayon::*;
use geo::orient::{Direction, Orient};
use geo::{Area, Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vegtrace_core::raster::{Connectivity, Raster};
use vegtrace_core::vector::{Feature, FeatureCollection};
use vegtrace_core::{Algorithm, Error, GeoTransform, Result, CRS};

/// Parameters for polygon extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractParams {
    /// Label code whose regions are traced (1, 2 or 3)
    pub target_label: u8,
}

impl Default for ExtractParams {
    fn default() -> Self {
        Self {
            target_label: LandCover::Vegetation.code(),
        }
    }
}

/// An accepted polygon and the region it came from
#[derive(Debug, Clone)]
pub struct ExtractedPolygon {
    pub polygon: Polygon<f64>,
    /// Region index in discovery order
    pub region: usize,
    /// Number of grid cells in the region
    pub cells: usize,
}

/// A region whose geometry failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectedRegion {
    pub region: usize,
    pub cells: usize,
    pub reason: GeometryRejection,
}

/// Result of polygon extraction.
///
/// Accepted polygons are in region discovery order (row-major order of each
/// region's top-left cell). Iterating does not consume or alter the labels.
#[derive(Debug, Clone)]
pub struct PolygonSet {
    pub class: LandCover,
    pub polygons: Vec<ExtractedPolygon>,
    pub rejections: Vec<RejectedRegion>,
}

impl PolygonSet {
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejections.len()
    }

    /// Accepted plus rejected regions
    pub fn region_count(&self) -> usize {
        self.polygons.len() + self.rejections.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Polygon<f64>> {
        self.polygons.iter().map(|p| &p.polygon)
    }

    /// Split into bare polygons and the reject count
    pub fn into_parts(self) -> (Vec<Polygon<f64>>, usize) {
        let rejected = self.rejections.len();
        (self.polygons.into_iter().map(|p| p.polygon).collect(), rejected)
    }

    /// Feature collection with `class`, `code`, `cells` and `area`
    /// attributes; `area` is in squared CRS units.
    pub fn into_features(self, crs: Option<CRS>) -> FeatureCollection {
        let mut collection = FeatureCollection::new(crs);
        for (id, extracted) in self.polygons.into_iter().enumerate() {
            let area = extracted.polygon.unsigned_area();
            let mut feature = Feature::new(extracted.polygon)
                .with_property("class", self.class.name())
                .with_property("code", i64::from(self.class.code()))
                .with_property("cells", extracted.cells as i64)
                .with_property("area", area);
            feature.id = Some(id as u64);
            collection.push(feature);
        }
        collection
    }
}

/// Trace every 4-connected region of `target_label` into a polygon.
///
/// Regions are found with 4-connectivity; diagonal neighbours are separate
/// regions. Enclosed cells of other labels become holes. A region whose
/// exterior or any hole fails [`validate_ring`] is rejected as a whole and
/// counted; rejection never aborts extraction.
///
/// Polygons are in world coordinates via the grid's transform, with the
/// exterior counter-clockwise and holes clockwise.
///
/// # Errors
/// * `EmptyLabelGrid` if the grid has no cells
/// * `InvalidLabel` if `target_label` is not 1, 2 or 3, or a cell holds a
///   code above 3
pub fn extract_polygons(labels: &Raster<u8>, target_label: u8) -> Result<PolygonSet> {
    if labels.is_empty() {
        return Err(Error::EmptyLabelGrid);
    }

    let class = LandCover::from_code(target_label)?;
    if class == LandCover::NoData {
        return Err(Error::InvalidLabel {
            label: i64::from(target_label),
            reason: "no-data is not an extractable class",
        });
    }

    let max_code = LandCover::Barren.code();
    if let Some(&bad) = labels.data().iter().find(|&&code| code > max_code) {
        return Err(Error::InvalidLabel {
            label: i64::from(bad),
            reason: "label grid holds a code outside 0..=3",
        });
    }

    let map = label_regions(labels, target_label, Connectivity::Four);
    let transform = *labels.transform();

    let outcomes: Vec<std::result::Result<ExtractedPolygon, RejectedRegion>> = (0..map.len())
        .into_par_iter()
        .map(|index| region_polygon(&map, index, &transform))
        .collect();

    let mut polygons = Vec::with_capacity(outcomes.len());
    let mut rejections = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(p) => polygons.push(p),
            Err(r) => {
                debug!(region = r.region, cells = r.cells, reason = %r.reason, "rejected region");
                rejections.push(r);
            }
        }
    }

    if !rejections.is_empty() {
        warn!(
            class = %class,
            rejected = rejections.len(),
            accepted = polygons.len(),
            "discarded invalid region geometry"
        );
    }
    debug!(class = %class, regions = map.len(), polygons = polygons.len(), "extracted polygons");

    Ok(PolygonSet {
        class,
        polygons,
        rejections,
    })
}

fn region_polygon(
    map: &RegionMap,
    index: usize,
    transform: &GeoTransform,
) -> std::result::Result<ExtractedPolygon, RejectedRegion> {
    let region = &map.regions()[index];
    let reject = |reason| RejectedRegion {
        region: index,
        cells: region.len(),
        reason,
    };

    let rings = trace_rings(map, index, region).ok_or_else(|| reject(GeometryRejection::Unclosed))?;
    let mut world = rings.iter().map(|ring| to_world(ring, transform));
    let exterior = world.next().ok_or_else(|| reject(GeometryRejection::Unclosed))?;
    let holes: Vec<LineString<f64>> = world.collect();

    for ring in std::iter::once(&exterior).chain(&holes) {
        validate_ring(ring).map_err(reject)?;
    }

    Ok(ExtractedPolygon {
        polygon: Polygon::new(exterior, holes).orient(Direction::Default),
        region: index,
        cells: region.len(),
    })
}

/// Closed world-coordinate ring from lattice corners
fn to_world(ring: &PixelRing, transform: &GeoTransform) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = ring
        .iter()
        .map(|&(row, col)| {
            let (x, y) = transform.pixel_to_geo_corner(col, row);
            Coord { x, y }
        })
        .collect();
    if let Some(&first) = coords.first() {
        coords.push(first);
    }
    LineString::new(coords)
}

/// FeatureExtractor pipeline stage
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor;

impl Algorithm for FeatureExtractor {
    type Input = Raster<u8>;
    type Output = PolygonSet;
    type Params = ExtractParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Feature Extraction"
    }

    fn description(&self) -> &'static str {
        "Trace connected regions of one class into valid polygons"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        extract_polygons(&input, params.target_label)
    }
}
