//! Raster with an explicit no-data mask

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use crate::CRS;
use ndarray::{Array2, Zip};

/// A raster paired with a boolean mask of the same shape.
///
/// `true` in the mask marks a cell excluded from arithmetic. Masked cells
/// propagate as masked into every grid derived from this one.
#[derive(Debug, Clone)]
pub struct MaskedRaster<T: RasterElement> {
    raster: Raster<T>,
    mask: Array2<bool>,
}

impl<T: RasterElement> MaskedRaster<T> {
    /// Mask every cell equal to the raster's no-data sentinel (and NaN cells
    /// for float rasters).
    pub fn from_nodata(raster: Raster<T>) -> Self {
        let nodata = raster.nodata();
        let mask = raster.data().mapv(|v| v.is_nodata(nodata));
        Self { raster, mask }
    }

    /// Pair a raster with an explicit mask
    pub fn with_mask(raster: Raster<T>, mask: Array2<bool>) -> Result<Self> {
        if mask.dim() != raster.shape() {
            return Err(Error::shape_mismatch(raster.shape(), mask.dim()));
        }
        Ok(Self { raster, mask })
    }

    /// Wrap a raster with nothing masked
    pub fn unmasked(raster: Raster<T>) -> Self {
        let mask = Array2::from_elem(raster.shape(), false);
        Self { raster, mask }
    }

    /// Underlying raster values (masked cells keep whatever value they had)
    pub fn raster(&self) -> &Raster<T> {
        &self.raster
    }

    /// The mask, `true` where a cell is excluded
    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    /// Whether the cell at (row, col) is masked
    pub fn is_masked(&self, row: usize, col: usize) -> Result<bool> {
        self.mask
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Value at (row, col), `None` when masked
    pub fn get(&self, row: usize, col: usize) -> Result<Option<T>> {
        let value = self.raster.get(row, col)?;
        Ok((!self.is_masked(row, col)?).then_some(value))
    }

    /// Number of masked cells
    pub fn masked_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Number of unmasked cells
    pub fn valid_count(&self) -> usize {
        self.len() - self.masked_count()
    }

    pub fn rows(&self) -> usize {
        self.raster.rows()
    }

    pub fn cols(&self) -> usize {
        self.raster.cols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.raster.shape()
    }

    pub fn len(&self) -> usize {
        self.raster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raster.is_empty()
    }

    pub fn transform(&self) -> &GeoTransform {
        self.raster.transform()
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.raster.crs()
    }

    /// Union of this mask with another of the same shape
    pub fn combined_mask<U: RasterElement>(&self, other: &MaskedRaster<U>) -> Result<Array2<bool>> {
        if self.shape() != other.shape() {
            return Err(Error::shape_mismatch(self.shape(), other.shape()));
        }
        Ok(Zip::from(&self.mask)
            .and(&other.mask)
            .map_collect(|&a, &b| a || b))
    }

    /// Split into raster and mask
    pub fn into_parts(self) -> (Raster<T>, Array2<bool>) {
        (self.raster, self.mask)
    }
}

impl MaskedRaster<f64> {
    /// Plain raster with masked cells set to NaN and NaN as the sentinel,
    /// the form written out as a single-band float raster.
    pub fn to_filled(&self) -> Raster<f64> {
        let mut filled = self.raster.clone();
        Zip::from(filled.data_mut())
            .and(&self.mask)
            .for_each(|v, &m| {
                if m {
                    *v = f64::NAN;
                }
            });
        filled.set_nodata(Some(f64::NAN));
        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_from_sentinel() {
        let mut r = Raster::from_vec(vec![0u16, 5000, 5000, 0], 2, 2).unwrap();
        r.set_nodata(Some(0));
        let m = MaskedRaster::from_nodata(r);

        assert!(m.is_masked(0, 0).unwrap());
        assert!(!m.is_masked(0, 1).unwrap());
        assert_eq!(m.get(1, 0).unwrap(), Some(5000));
        assert_eq!(m.get(1, 1).unwrap(), None);
        assert_eq!(m.masked_count(), 2);
        assert_eq!(m.valid_count(), 2);
    }

    #[test]
    fn test_no_sentinel_masks_nothing() {
        let r = Raster::from_vec(vec![0u16, 0, 0, 0], 2, 2).unwrap();
        let m = MaskedRaster::from_nodata(r);
        assert_eq!(m.masked_count(), 0);
    }

    #[test]
    fn test_with_mask_shape_checked() {
        let r: Raster<f64> = Raster::new(2, 3);
        assert!(MaskedRaster::with_mask(r.clone(), Array2::from_elem((2, 3), false)).is_ok());
        assert!(matches!(
            MaskedRaster::with_mask(r, Array2::from_elem((3, 2), false)),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_combined_mask_is_union() {
        let a = MaskedRaster::with_mask(
            Raster::<f64>::new(1, 3),
            Array2::from_shape_vec((1, 3), vec![true, false, false]).unwrap(),
        )
        .unwrap();
        let b = MaskedRaster::with_mask(
            Raster::<f64>::new(1, 3),
            Array2::from_shape_vec((1, 3), vec![false, false, true]).unwrap(),
        )
        .unwrap();

        let union = a.combined_mask(&b).unwrap();
        assert_eq!(union.as_slice().unwrap(), &[true, false, true]);
    }

    #[test]
    fn test_to_filled_sets_nan() {
        let m = MaskedRaster::with_mask(
            Raster::filled(1, 2, 0.25),
            Array2::from_shape_vec((1, 2), vec![false, true]).unwrap(),
        )
        .unwrap();
        let filled = m.to_filled();
        assert_eq!(filled.get(0, 0).unwrap(), 0.25);
        assert!(filled.get(0, 1).unwrap().is_nan());
    }
}
