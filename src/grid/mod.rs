// The labelled occupancy grid layer: cell classification, per-storey
// matrices and the stacked multi-storey structure.
pub mod cell_kind;
pub mod floor_grid;
pub mod stack;
