use crate::geometry::rect::ball;
use crate::grid::cell_kind::CellKind;
use crate::grid::floor_grid::FloorGrid;
use crate::grid::stack::GridStack;

/// Dilates walls by `radius` cells (Chebyshev distance): every `Empty` or
/// `Floor` cell within the radius of a `Wall` becomes `WallBuffer`. Doors,
/// stairs and the walls themselves are preserved. Radius 0 is a plain copy.
pub fn buffer_walls(grid: &FloorGrid, radius: usize) -> FloorGrid {
    let mut result = grid.clone();
    if radius == 0 {
        return result;
    }
    let (rows, cols) = grid.shape();
    for wall in grid.find(CellKind::Wall) {
        for near in ball(wall, radius, rows, cols).iter() {
            if matches!(result.get(near), CellKind::Empty | CellKind::Floor) {
                result.set(near, CellKind::WallBuffer);
            }
        }
    }
    result
}

/// Buffers every grid of a stack, leaving the metadata untouched.
pub fn buffer_stack(stack: &GridStack, radius: usize) -> GridStack {
    GridStack {
        grids: stack.grids.iter().map(|grid| buffer_walls(grid, radius)).collect(),
        ..stack.clone()
    }
}
