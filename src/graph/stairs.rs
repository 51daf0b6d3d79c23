use crate::algorithms::line::line_cells;
use crate::consts::{PLAIN_COST, STAIR_ANGLE_DEG, STAIR_DIRECTIONS};
use crate::geometry::cell::{CellXY, GridPos};
use crate::grid::cell_kind::CellKind;
use crate::grid::stack::GridStack;
use log::debug;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::Undirected;
use rustc_hash::{FxHashMap, FxHashSet};
use std::f64::consts::PI;

/// Adds the inter-floor edges: one per stair-cell pair that passes the angle
/// check, or a complete bipartite fallback when no pair does.
pub(crate) fn connect_stairs(
    graph: &mut StableGraph<GridPos, f64, Undirected>,
    nodes: &FxHashMap<GridPos, NodeIndex>,
    buffered: &GridStack,
    minimize_cost: bool,
) {
    let base = if minimize_cost {
        CellKind::Stair.traverse_cost()
    } else {
        PLAIN_COST
    };
    for group in stair_groups(buffered) {
        connect_group(graph, nodes, buffered, &group, base);
    }
}

/// Maximal 3D-connected components of stair cells, where adjacency is a
/// same-floor 4-neighbor or the same cell on an adjacent floor. Groups are in
/// row-major discovery order of their first cell.
pub(crate) fn stair_groups(stack: &GridStack) -> Vec<Vec<GridPos>> {
    let (rows, cols) = (stack.rows(), stack.cols());
    let is_stair =
        |pos: GridPos| stack.grids.get(pos.floor).map_or(false, |grid| grid.get(pos.xy()) == CellKind::Stair);

    let mut visited: FxHashSet<GridPos> = FxHashSet::default();
    let mut groups = Vec::new();
    for (floor, grid) in stack.grids.iter().enumerate() {
        for xy in grid.find(CellKind::Stair) {
            let start = GridPos::on_floor(xy, floor);
            if visited.contains(&start) {
                continue;
            }
            let mut group = Vec::new();
            let mut pending = vec![start];
            visited.insert(start);
            while let Some(pos) = pending.pop() {
                group.push(pos);
                let mut neighbors: Vec<GridPos> = pos
                    .xy()
                    .around4(rows, cols)
                    .map(|near| GridPos::on_floor(near, pos.floor))
                    .collect();
                if pos.floor > 0 {
                    neighbors.push(GridPos::new(pos.row, pos.col, pos.floor - 1));
                }
                if pos.floor + 1 < stack.grids.len() {
                    neighbors.push(GridPos::new(pos.row, pos.col, pos.floor + 1));
                }
                for near in neighbors {
                    if is_stair(near) && visited.insert(near) {
                        pending.push(near);
                    }
                }
            }
            groups.push(group);
        }
    }
    groups
}

fn connect_group(
    graph: &mut StableGraph<GridPos, f64, Undirected>,
    nodes: &FxHashMap<GridPos, NodeIndex>,
    stack: &GridStack,
    group: &[GridPos],
    base: f64,
) {
    let mut floors: Vec<usize> = group.iter().map(|pos| pos.floor).collect();
    floors.sort_unstable();
    floors.dedup();

    for pair in floors.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        let dz = stack.floors[hi].elevation - stack.floors[lo].elevation;
        let cell = stack.cell_size;
        // Expected horizontal run of a stair flight at the assumed slope.
        let d = (dz / (STAIR_ANGLE_DEG.to_radians().tan() * cell)).round() as i64;
        let weight = base * (dz * dz + (d as f64 * cell) * (d as f64 * cell)).sqrt() / cell;

        let lower: Vec<CellXY> = group.iter().filter(|pos| pos.floor == lo).map(|pos| pos.xy()).collect();
        let upper: Vec<CellXY> = group.iter().filter(|pos| pos.floor == hi).map(|pos| pos.xy()).collect();
        let upper_set: FxHashSet<CellXY> = upper.iter().copied().collect();

        let mut connected = false;
        for &lower_xy in &lower {
            for k in 0..STAIR_DIRECTIONS {
                let theta = 2.0 * PI * k as f64 / STAIR_DIRECTIONS as f64;
                let offset = (
                    (d as f64 * theta.cos()).round() as i64,
                    (d as f64 * theta.sin()).round() as i64,
                );
                let Some(upper_xy) = lower_xy.try_add(offset, stack.rows(), stack.cols()) else {
                    continue;
                };
                if !upper_set.contains(&upper_xy) {
                    continue;
                }
                if !line_through_stairs(stack, lo, hi, lower_xy, upper_xy) {
                    continue;
                }
                graph.update_edge(
                    nodes[&GridPos::on_floor(lower_xy, lo)],
                    nodes[&GridPos::on_floor(upper_xy, hi)],
                    weight,
                );
                connected = true;
            }
        }

        if !connected {
            debug!(
                "No stair pair between floors {} and {} matched the angle check, fully connecting the group.",
                lo, hi
            );
            for &lower_xy in &lower {
                for &upper_xy in &upper {
                    graph.update_edge(
                        nodes[&GridPos::on_floor(lower_xy, lo)],
                        nodes[&GridPos::on_floor(upper_xy, hi)],
                        base,
                    );
                }
            }
        }
    }
}

/// The straight line between the two cells must run over cells that are
/// stairs on one of the two storeys.
fn line_through_stairs(stack: &GridStack, lo: usize, hi: usize, from: CellXY, to: CellXY) -> bool {
    line_cells(from, to).into_iter().all(|xy| {
        stack.grids[lo].get(xy) == CellKind::Stair || stack.grids[hi].get(xy) == CellKind::Stair
    })
}
