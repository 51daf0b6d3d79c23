use crate::algorithms::flood_fill::label_components;
use crate::geometry::cell::CellXY;
use crate::geometry::rect::{bounding_rect, CellRect};
use crate::grid::cell_kind::CellKind;
use crate::grid::stack::GridStack;
use log::debug;
use serde::{Deserialize, Serialize};

/// An enclosed space: one 4-connected component of walkable cells on a storey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    pub name: String,
    pub floor: usize,
    pub bounds: CellRect,
    pub points: Vec<CellXY>,
}

/// Segments every storey into spaces. `Floor` cells always count as interior;
/// `Empty` cells count too when `include_empty_tiles` is set. Space ids are
/// deterministic: `Space_{floor}_{k}` with k following row-major discovery
/// order, starting at 1 per storey.
pub fn detect_spaces(stack: &GridStack, include_empty_tiles: bool) -> Vec<Space> {
    let mut spaces = Vec::new();
    for (floor, grid) in stack.grids.iter().enumerate() {
        let (_, components) = label_components::<_, u32, _>(grid, |kind| {
            kind == CellKind::Floor || (include_empty_tiles && kind == CellKind::Empty)
        });
        for (i, points) in components.into_iter().enumerate() {
            let k = i + 1;
            // Components are nonempty by construction.
            let bounds = bounding_rect(points.iter().copied()).unwrap();
            spaces.push(Space {
                id: format!("Space_{}_{}", floor, k),
                name: format!("Space {}", k),
                floor,
                bounds,
                points,
            });
        }
    }
    debug!("Detected {} spaces.", spaces.len());
    spaces
}

#[cfg(test)]
mod tests {
    use crate::geometry::cell::CellXY;
    use crate::grid::cell_kind::CellKind;
    use crate::grid::stack::test_stack;
    use crate::spaces::detect_spaces;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_two_rooms_split_by_wall() {
        let mut stack = test_stack(5, 5, &[0.0]);
        for xy in stack.grids[0].rect().iter() {
            stack.grids[0].set(xy, CellKind::Floor);
        }
        for row in 0..5 {
            stack.grids[0].set(CellXY::new(row, 2), CellKind::Wall);
        }

        let spaces = detect_spaces(&stack, false);
        assert_eq!(spaces.len(), 2);
        assert_eq!(spaces[0].id, "Space_0_1");
        assert_eq!(spaces[1].id, "Space_0_2");
        assert_eq!(spaces[0].floor, 0);
        assert_eq!(spaces[0].points.len(), 10);
        assert_eq!(spaces[1].points.len(), 10);
        assert_eq!(spaces[0].bounds.cols(), 2);
        assert_eq!(spaces[0].bounds.rows(), 5);
    }

    #[test]
    fn test_partition_is_disjoint_and_kinds_match() {
        let mut stack = test_stack(4, 4, &[0.0]);
        for xy in [CellXY::new(0, 0), CellXY::new(0, 1), CellXY::new(3, 3)] {
            stack.grids[0].set(xy, CellKind::Floor);
        }

        let spaces = detect_spaces(&stack, false);
        let mut seen = FxHashSet::default();
        for space in &spaces {
            for &xy in &space.points {
                assert_eq!(stack.grids[space.floor].get(xy), CellKind::Floor);
                assert!(seen.insert((space.floor, xy)));
            }
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_include_empty_tiles_merges_unpainted_area() {
        let mut stack = test_stack(3, 3, &[0.0]);
        stack.grids[0].set(CellXY::new(1, 1), CellKind::Floor);

        assert_eq!(detect_spaces(&stack, false).len(), 1);
        let spaces = detect_spaces(&stack, true);
        assert_eq!(spaces.len(), 1);
        assert_eq!(spaces[0].points.len(), 9);
    }

    #[test]
    fn test_ids_restart_per_floor() {
        let mut stack = test_stack(3, 3, &[0.0, 3.0]);
        stack.grids[0].set(CellXY::new(0, 0), CellKind::Floor);
        stack.grids[1].set(CellXY::new(2, 2), CellKind::Floor);

        let spaces = detect_spaces(&stack, false);
        assert_eq!(spaces.len(), 2);
        assert_eq!(spaces[0].id, "Space_0_1");
        assert_eq!(spaces[1].id, "Space_1_1");
    }
}
