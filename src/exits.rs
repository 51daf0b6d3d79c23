use crate::algorithms::flood_fill::label_components;
use crate::geometry::cell::{CellXY, GridPos};
use crate::geometry::direction::GridDirection;
use crate::grid::cell_kind::CellKind;
use crate::grid::floor_grid::FloorGrid;
use crate::grid::stack::GridStack;
use enum_iterator::all;
use log::debug;

/// Finds the exits of every storey. An exit is the rounded mean cell of a
/// 4-connected door group from which at least one straight 4-direction ray
/// reaches the grid boundary without crossing a wall or another door.
pub fn detect_exits(stack: &GridStack) -> Vec<GridPos> {
    let mut exits = Vec::new();
    for (floor, grid) in stack.grids.iter().enumerate() {
        let (_, door_groups) = label_components::<_, u32, _>(grid, |kind| kind == CellKind::Door);
        for group in door_groups {
            if group_reaches_boundary(grid, &group) {
                exits.push(GridPos::on_floor(mean_cell(&group), floor));
            }
        }
    }
    debug!("Detected {} exits.", exits.len());
    exits
}

/// Whether some ray cast from a group cell escapes the grid. A group cell
/// lying on the boundary escapes with a zero-length ray; otherwise the first
/// step must leave the door group, and after that the ray is blocked by
/// walls and doors only.
fn group_reaches_boundary(grid: &FloorGrid, group: &[CellXY]) -> bool {
    let (rows, cols) = grid.shape();
    for &cell in group {
        if cell.on_boundary(rows, cols) {
            return true;
        }
        for direction in all::<GridDirection>().filter(|d| !d.is_diagonal()) {
            let offset = direction.offset();
            let Some(mut ray) = cell.try_add(offset, rows, cols) else {
                continue;
            };
            if matches!(grid.get(ray), CellKind::Wall | CellKind::Door) {
                continue;
            }
            loop {
                if matches!(grid.get(ray), CellKind::Wall | CellKind::Door) {
                    break;
                }
                if ray.on_boundary(rows, cols) {
                    return true;
                }
                match ray.try_add(offset, rows, cols) {
                    Some(next) => ray = next,
                    None => break,
                }
            }
        }
    }
    false
}

fn mean_cell(group: &[CellXY]) -> CellXY {
    let row_sum: usize = group.iter().map(|xy| xy.row).sum();
    let col_sum: usize = group.iter().map(|xy| xy.col).sum();
    let n = group.len() as f64;
    CellXY::new(
        (row_sum as f64 / n).round() as usize,
        (col_sum as f64 / n).round() as usize,
    )
}

/// 5x5 single-storey stack with a wall ring, floor interior and a door at
/// (0, 2). Shared fixture for routing tests.
#[cfg(test)]
pub(crate) fn walled_room() -> GridStack {
    use crate::grid::stack::test_stack;

    let mut stack = test_stack(5, 5, &[0.0]);
    for xy in stack.grids[0].rect().iter() {
        let kind = if xy.on_boundary(5, 5) {
            CellKind::Wall
        } else {
            CellKind::Floor
        };
        stack.grids[0].set(xy, kind);
    }
    stack.grids[0].set(CellXY::new(0, 2), CellKind::Door);
    stack
}

#[cfg(test)]
mod tests {
    use crate::exits::{detect_exits, walled_room};
    use crate::geometry::cell::{CellXY, GridPos};
    use crate::grid::cell_kind::CellKind;
    use crate::grid::stack::test_stack;

    #[test]
    fn test_empty_grid_has_no_exits() {
        let stack = test_stack(10, 10, &[0.0]);
        assert_eq!(detect_exits(&stack), Vec::<GridPos>::new());
    }

    #[test]
    fn test_boundary_door_of_walled_room() {
        let exits = detect_exits(&walled_room());
        assert_eq!(exits, vec![GridPos::new(0, 2, 0)]);
    }

    #[test]
    fn test_enclosed_door_is_not_an_exit() {
        // The door sits in an internal wall; every ray hits the outer ring.
        let mut stack = test_stack(7, 7, &[0.0]);
        for xy in stack.grids[0].rect().iter() {
            let kind = if xy.on_boundary(7, 7) {
                CellKind::Wall
            } else if xy.col == 3 {
                CellKind::Wall
            } else {
                CellKind::Floor
            };
            stack.grids[0].set(xy, kind);
        }
        stack.grids[0].set(CellXY::new(3, 3), CellKind::Door);
        assert_eq!(detect_exits(&stack), Vec::<GridPos>::new());
    }

    #[test]
    fn test_exit_is_group_mean() {
        let mut stack = test_stack(6, 6, &[0.0]);
        stack.grids[0].set(CellXY::new(2, 0), CellKind::Door);
        stack.grids[0].set(CellXY::new(3, 0), CellKind::Door);
        stack.grids[0].set(CellXY::new(4, 0), CellKind::Door);
        let exits = detect_exits(&stack);
        assert_eq!(exits, vec![GridPos::new(3, 0, 0)]);
    }
}
