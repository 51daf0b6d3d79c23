use crate::errors::EgressError;
use crate::geometry::bbox::BBox;
use crate::geometry::cell::{CellXY, GridPos};
use crate::grid::cell_kind::CellKind;
use crate::grid::floor_grid::FloorGrid;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A single storey: its floor plane elevation and the clear height up to the
/// next storey, in working units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub elevation: f64,
    pub height: f64,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Floor {
    pub fn new(elevation: f64, height: f64) -> Self {
        Floor {
            elevation,
            height,
            id: None,
            name: None,
        }
    }
}

/// The stack of per-storey grids sharing one shape, plus the metadata needed
/// to map cells back to world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridStack {
    pub grids: Vec<FloorGrid>,
    pub cell_size: f64,
    pub unit_size: f64,
    pub bbox: BBox,
    pub floors: Vec<Floor>,
}

impl GridStack {
    /// Checks the structural invariants: positive cell size, at least one
    /// floor, one grid per floor, uniform grid shape and strictly ascending
    /// floor elevations.
    pub fn validate(&self) -> Result<(), EgressError> {
        if !(self.cell_size > 0.0) {
            return Err(EgressError::InvalidCellSize);
        }
        if self.floors.is_empty() || self.grids.is_empty() {
            return Err(EgressError::NoFloors);
        }
        if self.grids.len() != self.floors.len() {
            return Err(EgressError::GridShapeMismatch);
        }
        let shape = self.grids[0].shape();
        if self.grids.iter().any(|grid| grid.shape() != shape) {
            return Err(EgressError::GridShapeMismatch);
        }
        if self.floors.windows(2).any(|pair| pair[0].elevation >= pair[1].elevation) {
            return Err(EgressError::UnsortedFloors);
        }
        Ok(())
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.grids[0].rows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.grids[0].cols()
    }

    pub fn kind_at(&self, pos: GridPos) -> Option<CellKind> {
        self.grids.get(pos.floor)?.get_checked(pos.xy())
    }

    /// Overwrites one cell, keeping coordinates in bounds.
    pub fn set_kind(&mut self, pos: GridPos, kind: CellKind) -> Result<(), EgressError> {
        let out_of_bounds = EgressError::CellOutOfBounds {
            floor: pos.floor,
            row: pos.row,
            col: pos.col,
        };
        let grid = self.grids.get_mut(pos.floor).ok_or(out_of_bounds.clone())?;
        if !grid.contains(pos.xy()) {
            return Err(out_of_bounds);
        }
        grid.set(pos.xy(), kind);
        Ok(())
    }

    /// Content hash of the grid cells and shape, used as the graph cache key.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.grids.len().hash(&mut hasher);
        self.cell_size.to_bits().hash(&mut hasher);
        for grid in &self.grids {
            grid.shape().hash(&mut hasher);
            for (_, kind) in grid.iter() {
                kind.hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    /// All cells of the given kind on the given floor.
    pub fn find_on_floor<'a>(&'a self, floor: usize, kind: CellKind) -> impl Iterator<Item = CellXY> + 'a {
        self.grids[floor].find(kind)
    }
}

/// Builds an all-empty stack with unit cell size, one grid per elevation.
/// Shared fixture for unit tests across the crate.
#[cfg(test)]
pub(crate) fn test_stack(rows: usize, cols: usize, elevations: &[f64]) -> GridStack {
    let floors = elevations
        .iter()
        .enumerate()
        .map(|(i, &elevation)| {
            let next = elevations.get(i + 1).copied().unwrap_or(elevation + 3.0);
            Floor::new(elevation, next - elevation)
        })
        .collect::<Vec<_>>();
    GridStack {
        grids: vec![FloorGrid::new(rows, cols, CellKind::Empty); elevations.len()],
        cell_size: 1.0,
        unit_size: 1.0,
        bbox: BBox {
            min_x: 0.0,
            min_y: 0.0,
            min_z: elevations.first().copied().unwrap_or(0.0),
            max_x: cols as f64,
            max_y: rows as f64,
            max_z: elevations.last().copied().unwrap_or(0.0) + 3.0,
        },
        floors,
    }
}
