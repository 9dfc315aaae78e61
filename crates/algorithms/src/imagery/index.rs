//! Normalized difference vegetation index from Red and NIR bands
//!
//! `NDVI = (NIR - Red) / (NIR + Red + epsilon)`, computed on reflectances
//! obtained by dividing the raw digital numbers by a sensor scale factor.

use crate::maybe_rayon::*;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vegtrace_core::raster::{MaskedRaster, RasterElement};
use vegtrace_core::{Algorithm, Error, Result};

/// Parameters for the index computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexParams {
    /// Divisor turning digital numbers into reflectance.
    /// 10000.0 suits typical 16-bit surface reflectance products.
    pub scale: f64,
    /// Added to the denominator so that two zero reflectances do not
    /// divide by exactly zero
    pub epsilon: f64,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            scale: 10_000.0,
            epsilon: 1e-10,
        }
    }
}

impl IndexParams {
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale == 0.0 {
            return Err(Error::invalid_parameter(
                "scale",
                self.scale,
                "must be finite and non-zero",
            ));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(Error::invalid_parameter(
                "epsilon",
                self.epsilon,
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Compute the vegetation index of a Red/NIR band pair.
///
/// Both bands hold raw digital numbers; their masks mark no-data cells
/// (see [`MaskedRaster::from_nodata`]). A cell is masked in the output when
/// it is masked in either input, or when the quotient is not finite (only
/// possible with `epsilon == 0` over a zero denominator). Masked output
/// cells hold NaN.
///
/// The output carries the Red band's transform and CRS.
///
/// # Errors
/// * `ShapeMismatch` if the bands differ in shape
/// * `InvalidParameter` for a zero/non-finite scale or a negative epsilon
pub fn compute_index<A, B>(
    red: &MaskedRaster<A>,
    nir: &MaskedRaster<B>,
    params: IndexParams,
) -> Result<MaskedRaster<f64>>
where
    A: RasterElement,
    B: RasterElement,
{
    params.validate()?;
    let input_mask = red.combined_mask(nir)?;

    let (rows, cols) = red.shape();
    let red_dn = red.raster().view();
    let nir_dn = nir.raster().view();
    let IndexParams { scale, epsilon } = params;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                if input_mask[(row, col)] {
                    continue;
                }
                let r = red_dn[(row, col)].to_f64().unwrap_or(f64::NAN) / scale;
                let n = nir_dn[(row, col)].to_f64().unwrap_or(f64::NAN) / scale;

                row_data[col] = (n - r) / (n + r + epsilon);
            }
            row_data
        })
        .collect();

    let values =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    let mask = Zip::from(&values)
        .and(&input_mask)
        .map_collect(|v, &m| m || !v.is_finite());

    let mut raster = red.raster().derive(values)?;
    raster.set_nodata(Some(f64::NAN));
    let index = MaskedRaster::with_mask(raster, mask)?;

    debug!(
        rows,
        cols,
        valid = index.valid_count(),
        masked = index.masked_count(),
        "computed vegetation index"
    );
    Ok(index)
}

/// IndexComputer pipeline stage
#[derive(Debug, Clone, Default)]
pub struct IndexComputer;

impl Algorithm for IndexComputer {
    /// (Red, NIR)
    type Input = (MaskedRaster<f64>, MaskedRaster<f64>);
    type Output = MaskedRaster<f64>;
    type Params = IndexParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Vegetation Index"
    }

    fn description(&self) -> &'static str {
        "Scaled, masked normalized difference of NIR and Red reflectance"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (red, nir) = input;
        compute_index(&red, &nir, params)
    }
}
