//! Uniform 3D bucketing for neighbor queries
//!
//! Points are bucketed into cubic cells of a fixed edge length. A neighbor
//! query only ever looks at the point's own cell and the 26 cells around it,
//! so its cost follows local density rather than the total node count.

use crate::core::types::{NodeId, Position};
use ahash::AHashMap;

/// Integer coordinates of a grid cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellKey {
    /// Cell index along x
    pub x: i64,
    /// Cell index along y
    pub y: i64,
    /// Cell index along z
    pub z: i64,
}

/// The cell itself plus its 26 neighbors
const NEIGHBOR_OFFSETS: [[i64; 3]; 27] = neighbor_offsets();

const fn neighbor_offsets() -> [[i64; 3]; 27] {
    let mut out = [[0; 3]; 27];
    let mut i = 0;
    while i < 27 {
        let n = i as i64;
        out[i] = [n / 9 - 1, (n / 3) % 3 - 1, n % 3 - 1];
        i += 1;
    }
    out
}

impl CellKey {
    fn offset(&self, d: [i64; 3]) -> Self {
        Self {
            x: self.x + d[0],
            y: self.y + d[1],
            z: self.z + d[2],
        }
    }
}

/// Spatial hash of node ids by cell
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: AHashMap<CellKey, Vec<NodeId>>,
    len: usize,
}

impl SpatialGrid {
    /// Create an empty grid with the given cell edge length
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: AHashMap::new(),
            len: 0,
        }
    }

    /// Cell containing a position: `floor(pos / cell_size)` per axis
    pub fn cell_of(&self, position: &Position) -> CellKey {
        CellKey {
            x: (position.x / self.cell_size).floor() as i64,
            y: (position.y / self.cell_size).floor() as i64,
            z: (position.z / self.cell_size).floor() as i64,
        }
    }

    /// Bucket an id at a position
    pub fn insert(&mut self, id: NodeId, position: &Position) {
        let key = self.cell_of(position);
        self.cells.entry(key).or_default().push(id);
        self.len += 1;
    }

    /// Ids in the position's cell and the 26 adjacent cells.
    ///
    /// Ids come out cell by cell in a fixed offset order, and in insertion
    /// order within a cell.
    pub fn neighbors_of(&self, position: &Position) -> impl Iterator<Item = NodeId> + '_ {
        let center = self.cell_of(position);
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |d| self.cells.get(&center.offset(*d)))
            .flat_map(|ids| ids.iter().copied())
    }

    /// Ids bucketed in exactly one cell
    pub fn cell(&self, key: &CellKey) -> &[NodeId] {
        self.cells.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cell edge length
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of ids inserted
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been inserted
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of occupied cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
