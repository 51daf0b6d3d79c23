use crate::geometry::cell::CellXY;
use crate::geometry::rect::CellRect;
use crate::grid::cell_kind::CellKind;
use serde::de::{Error, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Formatter;
use std::marker::PhantomData;

/// A row-major `rows` x `cols` matrix of cell values. Serialized as a nested
/// array, one inner array per row.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CellGrid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

/// A single storey's labelled occupancy grid.
pub type FloorGrid = CellGrid<CellKind>;

impl<T> CellGrid<T>
where
    T: Copy + PartialEq,
{
    pub fn new(rows: usize, cols: usize, fill: T) -> Self {
        CellGrid {
            rows,
            cols,
            data: vec![fill; rows * cols],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn get(&self, xy: CellXY) -> T {
        self.data[xy.row * self.cols + xy.col]
    }

    #[inline]
    pub fn set(&mut self, xy: CellXY, value: T) {
        self.data[xy.row * self.cols + xy.col] = value;
    }

    #[inline]
    pub fn contains(&self, xy: CellXY) -> bool {
        xy.row < self.rows && xy.col < self.cols
    }

    pub fn get_checked(&self, xy: CellXY) -> Option<T> {
        self.contains(xy).then(|| self.get(xy))
    }

    /// The rectangle covering the whole grid. Requires a nonempty grid.
    pub fn rect(&self) -> CellRect {
        CellRect::new_unordered(CellXY::new(0, 0), CellXY::new(self.rows - 1, self.cols - 1))
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellXY, T)> + '_ {
        self.data
            .iter()
            .enumerate()
            .map(|(i, value)| (CellXY::new(i / self.cols, i % self.cols), *value))
    }

    pub fn find<'a>(&'a self, value: T) -> impl Iterator<Item = CellXY> + 'a
    where
        T: 'a,
    {
        self.iter().filter_map(move |(xy, v)| (v == value).then_some(xy))
    }

    /// Copies the `source_rect` area of `source` into this grid, placing its
    /// top-left corner at `target_top_left`.
    pub fn blit(&mut self, source: &CellGrid<T>, source_rect: CellRect, target_top_left: CellXY) {
        for xy in source_rect.iter() {
            let target = CellXY::new(
                target_top_left.row + xy.row - source_rect.top_left.row,
                target_top_left.col + xy.col - source_rect.top_left.col,
            );
            self.set(target, source.get(xy));
        }
    }
}

impl<T> Serialize for CellGrid<T>
where
    T: Serialize + Copy,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq_serializer = serializer.serialize_seq(Some(self.rows))?;
        for row in 0..self.rows {
            seq_serializer.serialize_element(&self.data[row * self.cols..(row + 1) * self.cols])?;
        }
        seq_serializer.end()
    }
}

impl<'de, T> Deserialize<'de> for CellGrid<T>
where
    T: Deserialize<'de> + Copy + PartialEq,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(CellGridVisitor { marker: PhantomData })
    }
}

struct CellGridVisitor<T> {
    marker: PhantomData<T>,
}

impl<'de, T> Visitor<'de> for CellGridVisitor<T>
where
    T: Deserialize<'de> + Copy + PartialEq,
{
    type Value = CellGrid<T>;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        write!(formatter, "a sequence of equally long rows of cell values")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut data = Vec::new();
        let mut rows = 0usize;
        let mut cols = None;
        while let Some(row) = seq.next_element::<Vec<T>>()? {
            match cols {
                None => cols = Some(row.len()),
                Some(cols) if cols != row.len() => {
                    return Err(Error::custom("rows have differing lengths"));
                }
                _ => {}
            }
            data.extend(row);
            rows += 1;
        }
        Ok(CellGrid {
            rows,
            cols: cols.unwrap_or(0),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::geometry::cell::CellXY;
    use crate::grid::cell_kind::CellKind;
    use crate::grid::floor_grid::{CellGrid, FloorGrid};

    #[test]
    fn test_get_set_find() {
        let mut grid = FloorGrid::new(3, 4, CellKind::Empty);
        grid.set(CellXY::new(1, 2), CellKind::Wall);
        grid.set(CellXY::new(2, 3), CellKind::Wall);
        assert_eq!(grid.get(CellXY::new(1, 2)), CellKind::Wall);
        assert_eq!(grid.get(CellXY::new(0, 0)), CellKind::Empty);
        assert_eq!(
            grid.find(CellKind::Wall).collect::<Vec<_>>(),
            vec![CellXY::new(1, 2), CellXY::new(2, 3)]
        );
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut grid = FloorGrid::new(2, 2, CellKind::Floor);
        grid.set(CellXY::new(0, 1), CellKind::Door);
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(json, "[[\"floor\",\"door\"],[\"floor\",\"floor\"]]");
        let back: FloorGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result: Result<CellGrid<u8>, _> = serde_json::from_str("[[1,2],[3]]");
        assert!(result.is_err());
    }

    #[test]
    fn test_blit() {
        let mut source = CellGrid::new(3, 3, 0u8);
        source.set(CellXY::new(1, 1), 7);
        let mut target = CellGrid::new(5, 5, 9u8);
        target.blit(&source, source.rect(), CellXY::new(1, 1));
        assert_eq!(target.get(CellXY::new(2, 2)), 7);
        assert_eq!(target.get(CellXY::new(1, 1)), 0);
        assert_eq!(target.get(CellXY::new(0, 0)), 9);
    }
}
