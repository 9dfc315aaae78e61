//! Grid-to-RGBA rendering

use crate::palette::{evaluate_index, ClassPalette};
use vegtrace_core::raster::{MaskedRaster, Raster};

/// Convert a label grid to an RGBA pixel buffer.
///
/// Returns a `Vec<u8>` of length `rows * cols * 4` in row-major order.
pub fn labels_to_rgba(labels: &Raster<u8>, palette: &ClassPalette) -> Vec<u8> {
    labels
        .data()
        .iter()
        .flat_map(|&code| palette.color_of_code(code))
        .collect()
}

/// Convert an index grid to an RGBA pixel buffer.
///
/// Masked and non-finite cells are fully transparent.
pub fn index_to_rgba(index: &MaskedRaster<f64>) -> Vec<u8> {
    index
        .raster()
        .data()
        .iter()
        .zip(index.mask().iter())
        .flat_map(|(&v, &masked)| {
            if masked || !v.is_finite() {
                [0, 0, 0, 0]
            } else {
                evaluate_index(v).opaque()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Rgb;

    #[test]
    fn labels_to_rgba_basic() {
        let labels = Raster::from_vec(vec![0u8, 1, 2, 3], 2, 2).unwrap();
        let palette = ClassPalette::default();
        let rgba = labels_to_rgba(&labels, &palette);

        assert_eq!(rgba.len(), 16); // 4 pixels * 4 bytes
        assert_eq!(&rgba[0..4], &[0, 0, 0, 0]);
        assert_eq!(&rgba[4..8], &palette.vegetation.opaque());
        assert_eq!(&rgba[8..12], &palette.water.opaque());
        assert_eq!(&rgba[12..16], &palette.barren.opaque());
    }

    #[test]
    fn index_to_rgba_masks() {
        let mut r = Raster::from_vec(vec![-1.0, f64::NAN, 1.0], 1, 3).unwrap();
        r.set_nodata(Some(f64::NAN));
        let index = MaskedRaster::from_nodata(r);

        let rgba = index_to_rgba(&index);
        assert_eq!(rgba.len(), 12);
        assert_eq!(&rgba[0..4], &Rgb::new(120, 70, 20).opaque());
        assert_eq!(&rgba[4..8], &[0, 0, 0, 0]);
        assert_eq!(rgba[11], 255);
    }
}
