//! Burn a polygon back onto a raster grid

use geo::{BoundingRect, Contains, Point, Polygon};
use ndarray::Array2;
use vegtrace_core::raster::{Raster, RasterElement};
use vegtrace_core::Result;

/// Rasterize `polygon` onto the grid of `template`.
///
/// A cell is set to 1 when its centre lies inside the polygon (holes
/// excluded) and 0 otherwise. The output has the template's shape,
/// transform and CRS and no no-data sentinel.
pub fn rasterize_polygon<T: RasterElement>(
    polygon: &Polygon<f64>,
    template: &Raster<T>,
) -> Result<Raster<u8>> {
    let (rows, cols) = template.shape();
    let transform = template.transform();
    let mut burned = Array2::<u8>::zeros((rows, cols));

    if let Some((row_range, col_range)) = polygon.bounding_rect().and_then(|rect| {
        // Pixel-space window covering the polygon's bounding box
        let corners = [
            transform.geo_to_pixel(rect.min().x, rect.min().y),
            transform.geo_to_pixel(rect.min().x, rect.max().y),
            transform.geo_to_pixel(rect.max().x, rect.min().y),
            transform.geo_to_pixel(rect.max().x, rect.max().y),
        ];
        if corners.iter().any(|(c, r)| !c.is_finite() || !r.is_finite()) {
            return None;
        }
        let (min_c, max_c, min_r, max_r) = corners.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(a, b, c, d), &(col, row)| (a.min(col), b.max(col), c.min(row), d.max(row)),
        );
        let clamp = |v: f64, hi: usize| v.max(0.0).min(hi as f64) as usize;
        Some((
            clamp(min_r.floor(), rows)..clamp(max_r.ceil(), rows),
            clamp(min_c.floor(), cols)..clamp(max_c.ceil(), cols),
        ))
    }) {
        for row in row_range {
            for col in col_range.clone() {
                let (x, y) = transform.pixel_to_geo(col, row);
                if polygon.contains(&Point::new(x, y)) {
                    burned[(row, col)] = 1;
                }
            }
        }
    }

    template.derive(burned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;
    use vegtrace_core::GeoTransform;

    fn template(rows: usize, cols: usize) -> Raster<u8> {
        let mut r = Raster::new(rows, cols);
        r.set_transform(GeoTransform::new(0.0, rows as f64 * 2.0, 2.0, -2.0));
        r
    }

    #[test]
    fn test_square_with_hole() {
        // World extent of cells rows 0..3, cols 0..3, minus the centre cell
        let exterior = LineString::from(vec![(0.0, 6.0), (0.0, 0.0), (6.0, 0.0), (6.0, 6.0), (0.0, 6.0)]);
        let hole = LineString::from(vec![(2.0, 4.0), (4.0, 4.0), (4.0, 2.0), (2.0, 2.0), (2.0, 4.0)]);
        let polygon = Polygon::new(exterior, vec![hole]);

        let burned = rasterize_polygon(&polygon, &template(4, 4)).unwrap();

        #[rustfmt::skip]
        let expected = vec![
            0, 0, 0, 0,
            1, 1, 1, 0,
            1, 0, 1, 0,
            1, 1, 1, 0,
        ];
        assert_eq!(burned.data().iter().copied().collect::<Vec<u8>>(), expected);
    }

    #[test]
    fn test_polygon_outside_grid() {
        let exterior = LineString::from(vec![(100.0, 100.0), (110.0, 100.0), (110.0, 110.0), (100.0, 110.0)]);
        let burned = rasterize_polygon(&Polygon::new(exterior, vec![]), &template(3, 3)).unwrap();
        assert!(burned.data().iter().all(|&v| v == 0));
    }
}
