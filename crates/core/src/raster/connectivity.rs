//! Cell adjacency rules for region growing

/// Adjacency rule deciding which cells count as neighbours of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Edge-sharing neighbours only (N, E, S, W)
    #[default]
    Four,
    /// Edge- and corner-sharing neighbours
    Eight,
}

const ROOK: [(isize, isize); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

const QUEEN: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

impl Connectivity {
    /// Relative (row, col) offsets of the neighbours
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &ROOK,
            Connectivity::Eight => &QUEEN,
        }
    }

    /// In-bounds neighbours of (row, col) in a `rows x cols` grid
    pub fn neighbors(
        &self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    ) -> impl Iterator<Item = (usize, usize)> {
        self.offsets().iter().filter_map(move |&(dr, dc)| {
            let r = row.checked_add_signed(dr)?;
            let c = col.checked_add_signed(dc)?;
            (r < rows && c < cols).then_some((r, c))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets() {
        assert_eq!(Connectivity::Four.offsets().len(), 4);
        assert_eq!(Connectivity::Eight.offsets().len(), 8);
    }

    #[test]
    fn test_corner_neighbors() {
        let n: Vec<_> = Connectivity::Four.neighbors(0, 0, 3, 3).collect();
        assert_eq!(n, vec![(0, 1), (1, 0)]);

        let n: Vec<_> = Connectivity::Eight.neighbors(2, 2, 3, 3).collect();
        assert_eq!(n, vec![(1, 1), (1, 2), (2, 1)]);
    }

    #[test]
    fn test_single_cell_grid_has_no_neighbors() {
        assert_eq!(Connectivity::Four.neighbors(0, 0, 1, 1).count(), 0);
    }
}
