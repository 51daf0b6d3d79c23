use enum_iterator::Sequence;

/// One of the eight grid directions, in clockwise order starting from north.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Sequence)]
pub enum GridDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl GridDirection {
    /// The `(drow, dcol)` offset of a single step in this direction.
    /// Rows grow southward and columns grow eastward.
    #[inline]
    pub fn offset(self) -> (i64, i64) {
        match self {
            GridDirection::North => (-1, 0),
            GridDirection::NorthEast => (-1, 1),
            GridDirection::East => (0, 1),
            GridDirection::SouthEast => (1, 1),
            GridDirection::South => (1, 0),
            GridDirection::SouthWest => (1, -1),
            GridDirection::West => (0, -1),
            GridDirection::NorthWest => (-1, -1),
        }
    }

    #[inline]
    pub fn is_diagonal(self) -> bool {
        let (dr, dc) = self.offset();
        dr != 0 && dc != 0
    }
}

#[cfg(test)]
mod tests {
    use crate::geometry::direction::GridDirection;
    use enum_iterator::all;

    #[test]
    fn test_offsets() {
        assert_eq!(GridDirection::North.offset(), (-1, 0));
        assert_eq!(GridDirection::NorthEast.offset(), (-1, 1));
        assert_eq!(GridDirection::East.offset(), (0, 1));
        assert_eq!(GridDirection::SouthEast.offset(), (1, 1));
        assert_eq!(GridDirection::South.offset(), (1, 0));
        assert_eq!(GridDirection::SouthWest.offset(), (1, -1));
        assert_eq!(GridDirection::West.offset(), (0, -1));
        assert_eq!(GridDirection::NorthWest.offset(), (-1, -1));
    }

    #[test]
    fn test_cardinal_and_diagonal_split() {
        let diagonals = all::<GridDirection>().filter(|d| d.is_diagonal()).count();
        assert_eq!(diagonals, 4);
        assert_eq!(all::<GridDirection>().count(), 8);
    }
}
