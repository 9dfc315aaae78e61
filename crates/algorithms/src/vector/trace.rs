//! Boundary tracing of a region on the pixel-corner lattice
//!
//! Lattice vertex `(row, col)` is the top-left corner of cell `(row, col)`.
//! Every cell side that faces a cell outside the region becomes a directed
//! edge, oriented so the region lies on its right (clockwise on screen).
//! Chaining the edges yields one closed ring per boundary component.

use super::regions::{Region, RegionMap};
use std::collections::HashMap;

/// Lattice vertex as (row, col)
pub(crate) type Vertex = (usize, usize);

/// Ring of lattice vertices at direction changes only; not closed
pub(crate) type PixelRing = Vec<Vertex>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Heading {
    East,
    South,
    West,
    North,
}

impl Heading {
    /// Screen-left turn
    fn left(self) -> Heading {
        match self {
            Heading::East => Heading::North,
            Heading::North => Heading::West,
            Heading::West => Heading::South,
            Heading::South => Heading::East,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    from: Vertex,
    heading: Heading,
}

impl Edge {
    fn to(&self) -> Vertex {
        let (r, c) = self.from;
        match self.heading {
            Heading::East => (r, c + 1),
            Heading::South => (r + 1, c),
            // West/North edges never start on row/col 0
            Heading::West => (r, c - 1),
            Heading::North => (r - 1, c),
        }
    }
}

/// Trace all boundary rings of region `index`.
///
/// The first ring is the exterior; the rest bound holes. At a vertex where
/// two diagonal region cells meet (two outgoing edges) the trace turns
/// left, crossing over to the other cell, so every ring visits each vertex
/// at most once and a hole touching the exterior shares a single point.
///
/// Returns `None` if the edges do not chain into closed rings.
pub(crate) fn trace_rings(map: &RegionMap, index: usize, region: &Region) -> Option<Vec<PixelRing>> {
    let edges = boundary_edges(map, index, region);
    if edges.is_empty() {
        return None;
    }

    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::with_capacity(edges.len());
    for (i, edge) in edges.iter().enumerate() {
        outgoing.entry(edge.from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }

        let mut chain = Vec::new();
        let mut current = start;
        loop {
            used[current] = true;
            let edge = edges[current];
            chain.push(edge);

            let next = match outgoing.get(&edge.to())?.as_slice() {
                [only] => *only,
                candidates => *candidates
                    .iter()
                    .find(|&&e| edges[e].heading == edge.heading.left())?,
            };

            if next == start {
                break;
            }
            if used[next] {
                return None;
            }
            current = next;
        }

        rings.push(corners(&chain));
    }

    Some(rings)
}

/// Directed boundary edges; the first edge is the top side of the region's
/// first (top-most, left-most) cell, which lies on the exterior ring.
fn boundary_edges(map: &RegionMap, index: usize, region: &Region) -> Vec<Edge> {
    let mut edges = Vec::new();
    for &(row, col) in &region.cells {
        let (r, c) = (row as isize, col as isize);
        if !map.contains(index, r - 1, c) {
            edges.push(Edge { from: (row, col), heading: Heading::East });
        }
        if !map.contains(index, r, c + 1) {
            edges.push(Edge { from: (row, col + 1), heading: Heading::South });
        }
        if !map.contains(index, r + 1, c) {
            edges.push(Edge { from: (row + 1, col + 1), heading: Heading::West });
        }
        if !map.contains(index, r, c - 1) {
            edges.push(Edge { from: (row + 1, col), heading: Heading::North });
        }
    }
    edges
}

/// Keep only the vertices where the heading changes
fn corners(chain: &[Edge]) -> PixelRing {
    let n = chain.len();
    (0..n)
        .filter(|&i| chain[i].heading != chain[(i + n - 1) % n].heading)
        .map(|i| chain[i].from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::regions::label_regions;
    use vegtrace_core::raster::{Connectivity, Raster};

    fn rings_of(values: Vec<u8>, rows: usize, cols: usize, target: u8) -> Vec<Vec<PixelRing>> {
        let labels = Raster::from_vec(values, rows, cols).unwrap();
        let map = label_regions(&labels, target, Connectivity::Four);
        map.regions()
            .iter()
            .enumerate()
            .map(|(i, region)| trace_rings(&map, i, region).unwrap())
            .collect()
    }

    #[test]
    fn test_single_cell() {
        let rings = rings_of(vec![1], 1, 1, 1);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0], vec![vec![(0, 0), (0, 1), (1, 1), (1, 0)]]);
    }

    #[test]
    fn test_rectangle_collapses_to_four_corners() {
        let rings = rings_of(vec![1; 12], 3, 4, 1);
        assert_eq!(rings[0].len(), 1);
        assert_eq!(rings[0][0], vec![(0, 0), (0, 4), (3, 4), (3, 0)]);
    }

    #[test]
    fn test_l_shape() {
        #[rustfmt::skip]
        let rings = rings_of(vec![
            1, 0,
            1, 1,
        ], 2, 2, 1);
        assert_eq!(rings[0].len(), 1);
        assert_eq!(rings[0][0].len(), 6);
    }

    #[test]
    fn test_ring_with_hole() {
        #[rustfmt::skip]
        let rings = rings_of(vec![
            1, 1, 1,
            1, 0, 1,
            1, 1, 1,
        ], 3, 3, 1);
        assert_eq!(rings[0].len(), 2, "exterior plus one hole");
        assert_eq!(rings[0][0], vec![(0, 0), (0, 3), (3, 3), (3, 0)]);

        let mut hole = rings[0][1].clone();
        hole.sort();
        assert_eq!(hole, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
    }

    #[test]
    fn test_pinch_vertex_visited_once_per_ring() {
        #[rustfmt::skip]
        let rings = rings_of(vec![
            1, 1, 1,
            1, 0, 1,
            1, 1, 0,
        ], 3, 3, 1);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 2);

        for ring in &rings[0] {
            let mut sorted = ring.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), ring.len(), "ring revisits a vertex: {:?}", ring);
            assert!(ring.contains(&(2, 2)), "both rings pass the pinch vertex");
        }
    }

    #[test]
    fn test_edge_of_grid_regions() {
        #[rustfmt::skip]
        let rings = rings_of(vec![
            2, 0, 2,
            0, 0, 0,
            2, 0, 2,
        ], 3, 3, 2);
        assert_eq!(rings.len(), 4);
        assert!(rings.iter().all(|r| r.len() == 1 && r[0].len() == 4));
        assert_eq!(rings[3][0][0], (2, 2));
    }
}
