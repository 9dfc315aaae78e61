//! Connected-region labelling of a label grid

use ndarray::Array2;
use vegtrace_core::raster::{Connectivity, Raster};

/// Identifier stored for cells outside every region
const NO_REGION: u32 = 0;

/// One maximal connected set of target cells
#[derive(Debug, Clone)]
pub struct Region {
    /// Cells as (row, col), in discovery order; the first cell is the
    /// region's top-most, then left-most cell
    pub cells: Vec<(usize, usize)>,
}

impl Region {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Regions of one label plus a per-cell lookup of region membership
#[derive(Debug, Clone)]
pub struct RegionMap {
    /// 0 for cells outside every region, `k + 1` for cells of region `k`
    ids: Array2<u32>,
    regions: Vec<Region>,
}

impl RegionMap {
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Region index of a cell, if it belongs to one
    pub fn region_of(&self, row: usize, col: usize) -> Option<usize> {
        match self.ids.get((row, col)) {
            Some(&id) if id != NO_REGION => Some(id as usize - 1),
            _ => None,
        }
    }

    /// Whether (row, col) is a cell of region `index`; false outside the grid
    pub fn contains(&self, index: usize, row: isize, col: isize) -> bool {
        if row < 0 || col < 0 {
            return false;
        }
        self.region_of(row as usize, col as usize) == Some(index)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.ids.dim()
    }
}

/// Find all maximal connected regions of cells equal to `target`.
///
/// Uses an explicit worklist, so region size is bounded by memory only.
/// Regions are numbered in row-major order of their first cell.
pub fn label_regions(labels: &Raster<u8>, target: u8, connectivity: Connectivity) -> RegionMap {
    let (rows, cols) = labels.shape();
    let data = labels.data();
    let mut ids = Array2::from_elem((rows, cols), NO_REGION);
    let mut regions = Vec::new();
    let mut worklist: Vec<(usize, usize)> = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            if data[(row, col)] != target || ids[(row, col)] != NO_REGION {
                continue;
            }

            let id = regions.len() as u32 + 1;
            let mut cells = Vec::new();
            ids[(row, col)] = id;
            worklist.push((row, col));

            while let Some((r, c)) = worklist.pop() {
                cells.push((r, c));
                for (nr, nc) in connectivity.neighbors(r, c, rows, cols) {
                    if data[(nr, nc)] == target && ids[(nr, nc)] == NO_REGION {
                        ids[(nr, nc)] = id;
                        worklist.push((nr, nc));
                    }
                }
            }

            regions.push(Region { cells });
        }
    }

    RegionMap { ids, regions }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(values: Vec<u8>, rows: usize, cols: usize) -> Raster<u8> {
        Raster::from_vec(values, rows, cols).unwrap()
    }

    #[test]
    fn test_single_region() {
        let labels = grid(vec![1, 1, 1, 1], 2, 2);
        let map = label_regions(&labels, 1, Connectivity::Four);
        assert_eq!(map.len(), 1);
        assert_eq!(map.regions()[0].len(), 4);
        assert_eq!(map.regions()[0].cells[0], (0, 0));
    }

    #[test]
    fn test_diagonal_cells_not_merged_with_four_connectivity() {
        #[rustfmt::skip]
        let labels = grid(vec![
            1, 0,
            0, 1,
        ], 2, 2);
        assert_eq!(label_regions(&labels, 1, Connectivity::Four).len(), 2);
        assert_eq!(label_regions(&labels, 1, Connectivity::Eight).len(), 1);
    }

    #[test]
    fn test_region_numbering_is_row_major() {
        #[rustfmt::skip]
        let labels = grid(vec![
            0, 0, 2,
            2, 0, 0,
            2, 0, 2,
        ], 3, 3);
        let map = label_regions(&labels, 2, Connectivity::Four);
        assert_eq!(map.len(), 3);
        assert_eq!(map.region_of(0, 2), Some(0));
        assert_eq!(map.region_of(2, 0), Some(1));
        assert_eq!(map.region_of(2, 2), Some(2));
        assert_eq!(map.region_of(1, 1), None);
    }

    #[test]
    fn test_contains_outside_grid() {
        let labels = grid(vec![1], 1, 1);
        let map = label_regions(&labels, 1, Connectivity::Four);
        assert!(map.contains(0, 0, 0));
        assert!(!map.contains(0, -1, 0));
        assert!(!map.contains(0, 0, 1));
    }

    #[test]
    fn test_large_region_does_not_overflow_stack() {
        let labels = Raster::filled(600, 600, 3u8);
        let map = label_regions(&labels, 3, Connectivity::Four);
        assert_eq!(map.len(), 1);
        assert_eq!(map.regions()[0].len(), 360_000);
    }
}
