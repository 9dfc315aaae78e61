//! Index → classify → extract, as one fallible call

use crate::imagery::{class_counts, classify, compute_index, ClassThresholds, IndexParams, LandCover};
use crate::vector::{extract_polygons, PolygonSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vegtrace_core::raster::{MaskedRaster, Raster, RasterElement};
use vegtrace_core::{Error, Result};

/// Parameters for a full pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub index: IndexParams,
    pub thresholds: ClassThresholds,
    /// Class whose regions are extracted as polygons
    pub target: LandCover,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            index: IndexParams::default(),
            thresholds: ClassThresholds::default(),
            target: LandCover::Vegetation,
        }
    }
}

impl PipelineConfig {
    /// Check every parameter before any computation starts
    pub fn validate(&self) -> Result<()> {
        self.index.validate()?;
        self.thresholds.validate()?;
        if self.target == LandCover::NoData {
            return Err(Error::InvalidLabel {
                label: i64::from(self.target.code()),
                reason: "no-data is not an extractable class",
            });
        }
        Ok(())
    }
}

/// Everything one run produces; all grids share the Red band's grid
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub index: MaskedRaster<f64>,
    pub labels: Raster<u8>,
    pub polygons: PolygonSet,
}

impl PipelineOutput {
    /// Cells per land-cover code, indexed by code
    pub fn class_counts(&self) -> [usize; 4] {
        class_counts(&self.labels)
    }
}

/// Run the three stages on a Red/NIR band pair.
///
/// Either the complete output is returned or the first fatal error; no
/// stage runs with parameters that have not been validated. When the two
/// bands share a shape but disagree on transform or CRS, a warning is
/// logged and the Red band's georeferencing is used throughout.
pub fn run<A, B>(red: &MaskedRaster<A>, nir: &MaskedRaster<B>, config: &PipelineConfig) -> Result<PipelineOutput>
where
    A: RasterElement,
    B: RasterElement,
{
    config.validate()?;
    red.raster().check_shape(nir.raster())?;

    if !red.raster().same_grid(nir.raster()) {
        warn!(
            red_transform = ?red.transform(),
            nir_transform = ?nir.transform(),
            red_crs = ?red.crs().map(|c| c.identifier()),
            nir_crs = ?nir.crs().map(|c| c.identifier()),
            "band georeferencing differs; using the red band's"
        );
    }

    let index = compute_index(red, nir, config.index)?;
    let labels = classify(&index, config.thresholds)?;
    let polygons = extract_polygons(&labels, config.target.code())?;

    debug!(
        target = %config.target,
        polygons = polygons.len(),
        rejected = polygons.rejected_count(),
        "pipeline finished"
    );

    Ok(PipelineOutput {
        index,
        labels,
        polygons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vegtrace_core::{GeoTransform, CRS};

    fn band(values: Vec<u16>, rows: usize, cols: usize) -> MaskedRaster<u16> {
        let mut r = Raster::from_vec(values, rows, cols).unwrap();
        r.set_transform(GeoTransform::new(500_000.0, 4_000_000.0, 30.0, -30.0));
        r.set_crs(Some(CRS::from_epsg(32610)));
        r.set_nodata(Some(0));
        MaskedRaster::from_nodata(r)
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{ "thresholds": { "veg_min": 0.4 }, "target": "water" }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.thresholds.veg_min, 0.4);
        assert_eq!(config.thresholds.water_max, 0.1, "missing fields keep defaults");
        assert_eq!(config.index, IndexParams::default());
        assert_eq!(config.target, LandCover::Water);
    }

    #[test]
    fn test_nodata_target_rejected_before_work() {
        let config = PipelineConfig {
            target: LandCover::NoData,
            ..PipelineConfig::default()
        };
        let red = band(vec![100; 4], 2, 2);
        let nir = band(vec![100; 4], 2, 2);
        assert!(matches!(run(&red, &nir, &config), Err(Error::InvalidLabel { .. })));
    }

    #[test]
    fn test_shape_mismatch_aborts() {
        let red = band(vec![100; 4], 2, 2);
        let nir = band(vec![100; 6], 2, 3);
        assert!(matches!(
            run(&red, &nir, &PipelineConfig::default()),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_outputs_share_red_grid() {
        let red = band(vec![500, 500, 3000, 3000], 2, 2);
        let mut nir_raster = Raster::from_vec(vec![4000u16, 4000, 1000, 1000], 2, 2).unwrap();
        nir_raster.set_transform(GeoTransform::new(0.0, 0.0, 1.0, -1.0));
        let nir = MaskedRaster::from_nodata(nir_raster);

        let out = run(&red, &nir, &PipelineConfig::default()).unwrap();

        assert_eq!(out.index.transform(), red.transform());
        assert_eq!(out.labels.transform(), red.transform());
        assert_eq!(out.labels.crs(), red.crs());
        assert_eq!(out.class_counts(), [0, 2, 2, 0]);
        assert_eq!(out.polygons.len(), 1, "top row is one vegetation region");
    }
}
