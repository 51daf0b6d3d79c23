use crate::geometry::cell::CellXY;
use serde::{Deserialize, Serialize};
use std::cmp::{max, min};
use thiserror::Error;

/// An inclusive axis-aligned rectangle of cells.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellRect {
    pub top_left: CellXY,
    pub bottom_right: CellXY,
}

#[derive(Error, Debug, Clone, Copy, Eq, PartialEq)]
#[error("rectangle does not have a positive area")]
pub struct InvalidRectError;

impl CellRect {
    pub fn new(top_left: CellXY, bottom_right: CellXY) -> Result<Self, InvalidRectError> {
        let result = CellRect { top_left, bottom_right };
        if result.is_valid() {
            Ok(result)
        } else {
            Err(InvalidRectError)
        }
    }

    pub fn new_unordered(xy1: CellXY, xy2: CellXY) -> Self {
        CellRect {
            top_left: CellXY::new(min(xy1.row, xy2.row), min(xy1.col, xy2.col)),
            bottom_right: CellXY::new(max(xy1.row, xy2.row), max(xy1.col, xy2.col)),
        }
    }

    pub fn is_valid(self) -> bool {
        self.top_left.row <= self.bottom_right.row && self.top_left.col <= self.bottom_right.col
    }

    pub fn rows(self) -> usize {
        self.bottom_right.row - self.top_left.row + 1
    }

    pub fn cols(self) -> usize {
        self.bottom_right.col - self.top_left.col + 1
    }

    pub fn area(self) -> usize {
        self.rows() * self.cols()
    }

    pub fn contains(self, xy: CellXY) -> bool {
        self.top_left.row <= xy.row
            && xy.row <= self.bottom_right.row
            && self.top_left.col <= xy.col
            && xy.col <= self.bottom_right.col
    }

    pub fn extended(self, xy: CellXY) -> CellRect {
        CellRect {
            top_left: CellXY::new(min(self.top_left.row, xy.row), min(self.top_left.col, xy.col)),
            bottom_right: CellXY::new(max(self.bottom_right.row, xy.row), max(self.bottom_right.col, xy.col)),
        }
    }

    pub fn intersection(self, other: CellRect) -> Result<CellRect, InvalidRectError> {
        CellRect::new(
            CellXY::new(
                max(self.top_left.row, other.top_left.row),
                max(self.top_left.col, other.top_left.col),
            ),
            CellXY::new(
                min(self.bottom_right.row, other.bottom_right.row),
                min(self.bottom_right.col, other.bottom_right.col),
            ),
        )
    }

    pub fn iter(self) -> impl Iterator<Item = CellXY> {
        let top_row = self.top_left.row;
        let left_col = self.top_left.col;
        let cols = self.cols();
        (0..self.area()).map(move |i| CellXY::new(top_row + i / cols, left_col + i % cols))
    }
}

/// A square of cells with the given center and Chebyshev radius, clamped to a
/// `rows` x `cols` grid (r = 0 is a single cell, r = 1 is 3x3).
pub fn ball(center: CellXY, r: usize, rows: usize, cols: usize) -> CellRect {
    CellRect {
        top_left: CellXY::new(center.row.saturating_sub(r), center.col.saturating_sub(r)),
        bottom_right: CellXY::new(min(center.row + r, rows - 1), min(center.col + r, cols - 1)),
    }
}

/// Minimum rectangle containing all given cells, or None for an empty iterator.
pub fn bounding_rect<T>(mut cells: T) -> Option<CellRect>
where
    T: Iterator<Item = CellXY>,
{
    let first = cells.next()?;
    let mut result = CellRect {
        top_left: first,
        bottom_right: first,
    };
    for xy in cells {
        result = result.extended(xy);
    }
    Some(result)
}
