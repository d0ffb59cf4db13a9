//! Uniform hash grid for near-range neighbor queries.
//!
//! Cells are keyed by `(floor(x / cell_size), floor(y / cell_size))` and hold
//! indices into the particle slice the grid was filled from. With a cell size
//! at least the largest particle diameter, any two overlapping circles lie in
//! the same cell or in 8-connected neighbors, so a 3×3 lookup finds every
//! touching pair.

use std::collections::HashMap;

use nalgebra::Point2;

/// Integer cell coordinate
pub type CellCoord = (i64, i64);

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<CellCoord, Vec<usize>>,
}

impl SpatialGrid {
    /// Creates an empty grid. `cell_size` must be positive.
    pub fn new(cell_size: f64) -> Self {
        debug_assert!(cell_size > 0.0, "cell size must be positive");
        SpatialGrid {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Empties every bucket.
    ///
    /// Buckets used since the previous clear keep their allocation; buckets
    /// that stayed empty are dropped, so the map tracks the occupied region.
    pub fn clear(&mut self) {
        self.cells.retain(|_, bucket| {
            let occupied = !bucket.is_empty();
            bucket.clear();
            occupied
        });
    }

    /// Cell containing a world position
    pub fn cell_of(&self, position: Point2<f64>) -> CellCoord {
        (
            (position.x / self.cell_size).floor() as i64,
            (position.y / self.cell_size).floor() as i64,
        )
    }

    pub fn insert(&mut self, index: usize, position: Point2<f64>) {
        let cell = self.cell_of(position);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Indices resident in the 3×3 block of cells around `position`,
    /// including any at `position` itself
    pub fn neighbors(&self, position: Point2<f64>) -> Vec<usize> {
        let mut out = Vec::new();
        self.neighbors_into(position, &mut out);
        out
    }

    /// Like [`SpatialGrid::neighbors`], reusing a caller-owned buffer
    pub fn neighbors_into(&self, position: Point2<f64>, out: &mut Vec<usize>) {
        out.clear();
        let (cx, cy) = self.cell_of(position);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
    }

    /// Indices in a single cell
    pub fn cell(&self, cell: CellCoord) -> &[usize] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of non-empty cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.values().filter(|bucket| !bucket.is_empty()).count()
    }

    /// Total number of entries across all cells
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values().all(Vec::is_empty)
    }
}
