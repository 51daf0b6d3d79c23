use crate::geometry::cell::CellXY;
use crate::grid::floor_grid::CellGrid;
use num_traits::PrimInt;

/// Labels 4-connected components of the cells satisfying `included`.
/// Returns the label matrix (`L::zero()` marks cells outside any component)
/// and the member cells of each component. Components are numbered from 1 in
/// row-major discovery order; the point lists follow the same order.
pub fn label_components<T, L, F>(grid: &CellGrid<T>, included: F) -> (CellGrid<L>, Vec<Vec<CellXY>>)
where
    T: Copy + PartialEq,
    L: PrimInt,
    F: Fn(T) -> bool,
{
    let (rows, cols) = grid.shape();
    let mut labels = CellGrid::new(rows, cols, L::zero());
    let mut components = Vec::new();
    let mut next_label = L::one();

    for (start, value) in grid.iter() {
        if !included(value) || labels.get(start) != L::zero() {
            continue;
        }
        let mut points = Vec::new();
        let mut stack = vec![start];
        labels.set(start, next_label);
        while let Some(xy) = stack.pop() {
            points.push(xy);
            for near in xy.around4(rows, cols) {
                if labels.get(near) == L::zero() && included(grid.get(near)) {
                    labels.set(near, next_label);
                    stack.push(near);
                }
            }
        }
        components.push(points);
        next_label = next_label + L::one();
    }

    (labels, components)
}

#[cfg(test)]
mod tests {
    use crate::algorithms::flood_fill::label_components;
    use crate::geometry::cell::CellXY;
    use crate::grid::cell_kind::CellKind;
    use crate::grid::floor_grid::FloorGrid;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_two_components_split_by_wall() {
        let mut grid = FloorGrid::new(3, 3, CellKind::Floor);
        for row in 0..3 {
            grid.set(CellXY::new(row, 1), CellKind::Wall);
        }
        let (labels, components) = label_components::<_, u32, _>(&grid, |kind| kind == CellKind::Floor);
        assert_eq!(components.len(), 2);
        assert_eq!(labels.get(CellXY::new(0, 0)), 1);
        assert_eq!(labels.get(CellXY::new(2, 2)), 2);
        assert_eq!(labels.get(CellXY::new(1, 1)), 0);
        assert_eq!(components[0].len(), 3);
        assert_eq!(components[1].len(), 3);
    }

    #[test]
    fn test_components_partition_included_cells() {
        let mut grid = FloorGrid::new(4, 4, CellKind::Empty);
        for xy in [CellXY::new(0, 0), CellXY::new(0, 1), CellXY::new(3, 3), CellXY::new(2, 3)] {
            grid.set(xy, CellKind::Floor);
        }
        let (_, components) = label_components::<_, u8, _>(&grid, |kind| kind == CellKind::Floor);
        let all = components.iter().flatten().copied().collect::<FxHashSet<_>>();
        assert_eq!(all.len(), components.iter().map(Vec::len).sum::<usize>());
        assert_eq!(all.len(), 4);
        assert_eq!(components.len(), 2);
    }

    #[test]
    fn test_diagonal_cells_are_separate_components() {
        let mut grid = FloorGrid::new(2, 2, CellKind::Empty);
        grid.set(CellXY::new(0, 0), CellKind::Floor);
        grid.set(CellXY::new(1, 1), CellKind::Floor);
        let (_, components) = label_components::<_, u32, _>(&grid, |kind| kind == CellKind::Floor);
        assert_eq!(components.len(), 2);
    }
}
