use crate::geometry::direction::GridDirection;
use enum_iterator::all;
use serde::{Deserialize, Serialize};

/// Cell coordinates within a single storey grid.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct CellXY {
    pub row: usize,
    pub col: usize,
}

impl CellXY {
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        CellXY { row, col }
    }

    /// The cell one step away, if it stays within a `rows` x `cols` grid.
    #[inline]
    pub fn try_add(self, diff: (i64, i64), rows: usize, cols: usize) -> Option<CellXY> {
        let row = self.row as i64 + diff.0;
        let col = self.col as i64 + diff.1;
        (row >= 0 && col >= 0 && (row as usize) < rows && (col as usize) < cols)
            .then(|| CellXY::new(row as usize, col as usize))
    }

    /// 4-connected neighbors within a `rows` x `cols` grid.
    #[inline]
    pub fn around4(self, rows: usize, cols: usize) -> impl Iterator<Item = CellXY> {
        all::<GridDirection>()
            .filter(|d| !d.is_diagonal())
            .filter_map(move |d| self.try_add(d.offset(), rows, cols))
    }

    /// 8-connected neighbors within a `rows` x `cols` grid.
    #[inline]
    pub fn around8(self, rows: usize, cols: usize) -> impl Iterator<Item = CellXY> {
        all::<GridDirection>().filter_map(move |d| self.try_add(d.offset(), rows, cols))
    }

    pub fn on_boundary(self, rows: usize, cols: usize) -> bool {
        self.row == 0 || self.col == 0 || self.row + 1 == rows || self.col + 1 == cols
    }

    /// Squared Euclidean distance to a fractional point.
    pub fn dist2_to(self, (row, col): (f64, f64)) -> f64 {
        let dr = self.row as f64 - row;
        let dc = self.col as f64 - col;
        dr * dr + dc * dc
    }
}

impl From<(usize, usize)> for CellXY {
    fn from((row, col): (usize, usize)) -> Self {
        CellXY { row, col }
    }
}

impl From<CellXY> for (usize, usize) {
    fn from(xy: CellXY) -> Self {
        (xy.row, xy.col)
    }
}

/// A cell within the whole grid stack, i.e. a graph node coordinate.
/// Serialized as a `[row, col, floor]` triple.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(usize, usize, usize)", into = "(usize, usize, usize)")]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
    pub floor: usize,
}

impl GridPos {
    #[inline]
    pub fn new(row: usize, col: usize, floor: usize) -> Self {
        GridPos { row, col, floor }
    }

    #[inline]
    pub fn xy(self) -> CellXY {
        CellXY::new(self.row, self.col)
    }

    #[inline]
    pub fn on_floor(xy: CellXY, floor: usize) -> Self {
        GridPos::new(xy.row, xy.col, floor)
    }
}

impl From<(usize, usize, usize)> for GridPos {
    fn from((row, col, floor): (usize, usize, usize)) -> Self {
        GridPos { row, col, floor }
    }
}

impl From<GridPos> for (usize, usize, usize) {
    fn from(pos: GridPos) -> Self {
        (pos.row, pos.col, pos.floor)
    }
}
