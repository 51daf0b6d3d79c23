use crate::consts::{PLAIN_COST, TRANSIT_COST};
use crate::model::ElementKind;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};

/// Classification of a single grid cell.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Sequence, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    #[default]
    Empty,
    Floor,
    Wall,
    Door,
    Stair,
    WallBuffer,
}

impl CellKind {
    /// Total order applied while painting elements. A paint action is
    /// suppressed when the cell already holds a strictly higher kind.
    #[inline]
    pub fn paint_priority(self) -> u8 {
        match self {
            CellKind::Door => 4,
            CellKind::Wall => 3,
            CellKind::Stair => 2,
            CellKind::Floor => 1,
            CellKind::Empty | CellKind::WallBuffer => 0,
        }
    }

    /// Whether a cell of this kind becomes a graph node.
    #[inline]
    pub fn is_passable(self) -> bool {
        !matches!(self, CellKind::Wall | CellKind::WallBuffer)
    }

    /// Base edge weight of leaving a cell of this kind when cost
    /// minimization is on.
    #[inline]
    pub fn traverse_cost(self) -> f64 {
        match self {
            CellKind::Door | CellKind::Stair => TRANSIT_COST,
            _ => PLAIN_COST,
        }
    }
}

impl From<ElementKind> for CellKind {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Wall => CellKind::Wall,
            ElementKind::Floor => CellKind::Floor,
            ElementKind::Door => CellKind::Door,
            ElementKind::Stair => CellKind::Stair,
        }
    }
}
