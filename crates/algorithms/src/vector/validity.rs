//! Ring validity checks for extracted polygons

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Area, Coord, Line, LineString, Polygon};
use std::cmp::Ordering;
use std::fmt;

/// Why a ring (and with it the whole region) was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryRejection {
    /// Boundary edges did not chain into a closed ring
    Unclosed,
    /// Fewer than three distinct vertices
    TooFewVertices,
    /// Zero or non-finite enclosed area
    ZeroArea,
    /// Two non-adjacent segments meet, or adjacent segments overlap
    SelfIntersection,
}

impl fmt::Display for GeometryRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GeometryRejection::Unclosed => "ring is not closed",
            GeometryRejection::TooFewVertices => "fewer than three distinct vertices",
            GeometryRejection::ZeroArea => "zero or non-finite area",
            GeometryRejection::SelfIntersection => "ring intersects itself",
        };
        f.write_str(text)
    }
}

/// Check that a closed ring is a simple polygon boundary.
///
/// Consecutive duplicate vertices are ignored. The ring must have at least
/// three distinct vertices, a non-zero finite area, and no two segments may
/// meet except consecutive segments at their shared vertex.
pub fn validate_ring(ring: &LineString<f64>) -> Result<(), GeometryRejection> {
    let mut coords: Vec<Coord<f64>> = ring.0.clone();
    coords.dedup();

    if coords.len() < 2 || coords.first() != coords.last() {
        return Err(GeometryRejection::Unclosed);
    }

    let mut distinct: Vec<Coord<f64>> = coords[..coords.len() - 1].to_vec();
    distinct.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    distinct.dedup();
    if distinct.len() < 3 {
        return Err(GeometryRejection::TooFewVertices);
    }

    if !has_area(&coords) {
        return Err(GeometryRejection::ZeroArea);
    }

    if self_intersects(&coords) {
        return Err(GeometryRejection::SelfIntersection);
    }

    Ok(())
}

/// Area test on the ring shifted so its first vertex sits at the origin.
///
/// The tolerance is relative to the shifted vertex products, so it follows
/// the size of the ring rather than its distance from the origin.
fn has_area(coords: &[Coord<f64>]) -> bool {
    let origin = coords[0];
    let shifted: LineString<f64> = coords.iter().map(|&c| c - origin).collect();
    let magnitude: f64 = shifted
        .0
        .windows(2)
        .map(|w| (w[0].x * w[1].y).abs() + (w[1].x * w[0].y).abs())
        .sum();
    let area = Polygon::new(shifted, vec![]).signed_area();

    area.is_finite() && 2.0 * area.abs() > magnitude * 1e-12
}

/// Sweep over segments ordered by their minimum x, testing only pairs whose
/// x-extents overlap.
fn self_intersects(coords: &[Coord<f64>]) -> bool {
    let segments: Vec<Line<f64>> = coords.windows(2).map(|w| Line::new(w[0], w[1])).collect();
    let n = segments.len();

    let min_x = |l: &Line<f64>| l.start.x.min(l.end.x);
    let max_x = |l: &Line<f64>| l.start.x.max(l.end.x);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        min_x(&segments[a])
            .partial_cmp(&min_x(&segments[b]))
            .unwrap_or(Ordering::Equal)
    });

    for (k, &i) in order.iter().enumerate() {
        let reach = max_x(&segments[i]);
        for &j in &order[k + 1..] {
            if min_x(&segments[j]) > reach {
                break;
            }

            let adjacent = i.abs_diff(j) == 1 || i.abs_diff(j) == n - 1;
            match line_intersection(segments[i], segments[j]) {
                None => {}
                Some(LineIntersection::SinglePoint { .. }) if adjacent => {}
                Some(_) => return true,
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[(f64, f64)]) -> LineString<f64> {
        LineString::from(points.to_vec())
    }

    #[test]
    fn test_square_is_valid() {
        let r = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
        assert_eq!(validate_ring(&r), Ok(()));
    }

    #[test]
    fn test_repeated_vertices_ignored() {
        let r = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        assert_eq!(validate_ring(&r), Ok(()));
    }

    #[test]
    fn test_unclosed() {
        let r = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        assert_eq!(validate_ring(&r), Err(GeometryRejection::Unclosed));
    }

    #[test]
    fn test_too_few_vertices() {
        let r = ring(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]);
        assert_eq!(validate_ring(&r), Err(GeometryRejection::TooFewVertices));
    }

    #[test]
    fn test_collinear_ring_has_zero_area() {
        let r = ring(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 0.0)]);
        assert_eq!(validate_ring(&r), Err(GeometryRejection::ZeroArea));
    }

    #[test]
    fn test_collapsed_transform_has_zero_area() {
        // Every vertex mapped onto x = 0
        let r = ring(&[(0.0, 0.0), (0.0, -1.0), (0.0, -2.0), (0.0, 0.0)]);
        assert_eq!(validate_ring(&r), Err(GeometryRejection::ZeroArea));
    }

    #[test]
    fn test_bow_tie() {
        let r = ring(&[(0.0, 0.0), (3.0, 3.0), (3.0, 0.0), (0.0, 1.0), (0.0, 0.0)]);
        assert_eq!(validate_ring(&r), Err(GeometryRejection::SelfIntersection));
    }

    #[test]
    fn test_ring_touching_itself_at_vertex() {
        // Two squares sharing the vertex (1, 1) in a single ring
        let r = ring(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (2.0, 1.0),
            (2.0, 2.0),
            (1.0, 2.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.0, 0.0),
        ]);
        assert_eq!(validate_ring(&r), Err(GeometryRejection::SelfIntersection));
    }

    #[test]
    fn test_spike_overlaps_adjacent_segment() {
        let r = ring(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (2.0, 1.0), (0.0, 2.0), (0.0, 0.0)]);
        assert_eq!(validate_ring(&r), Err(GeometryRejection::SelfIntersection));
    }

    #[test]
    fn test_small_cells_far_from_origin() {
        // One 0.0001 degree cell near lon 100 / lat 50
        let (x, y, d) = (100.0, 50.0, 1e-4);
        let r = ring(&[(x, y), (x + d, y), (x + d, y - d), (x, y - d), (x, y)]);
        assert_eq!(validate_ring(&r), Ok(()));

        // Two 0.1 m cells at UTM scale
        let (x, y, d) = (500_000.0, 5_000_000.0, 0.1);
        let r = ring(&[(x, y), (x + 2.0 * d, y), (x + 2.0 * d, y - d), (x, y - d), (x, y)]);
        assert_eq!(validate_ring(&r), Ok(()));
    }

    #[test]
    fn test_collinear_far_from_origin() {
        let (x, y) = (600_000.0, 5_200_000.0);
        let r = ring(&[(x, y), (x + 10.0, y), (x + 20.0, y), (x, y)]);
        assert_eq!(validate_ring(&r), Err(GeometryRejection::ZeroArea));
    }
}
