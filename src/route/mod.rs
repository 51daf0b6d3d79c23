use crate::geometry::cell::{CellXY, GridPos};
use crate::graph::RouteGraph;
use crate::grid::cell_kind::CellKind;
use crate::grid::stack::GridStack;
use crate::rules::Violations;
use crate::spaces::Space;
use log::debug;
use serde::{Deserialize, Serialize};

/// The worst-case egress result for one space. All route fields are None when
/// no candidate reaches any exit. Distances are in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub space_name: String,
    pub furthest_point: Option<GridPos>,
    pub optimal_exit: Option<GridPos>,
    pub optimal_path: Option<Vec<GridPos>>,
    pub distance: Option<f64>,
    /// Path length up to the first stair cell, or -1 when the path uses none.
    pub distance_to_stair: Option<f64>,
    /// Distance to the second-nearest reachable exit, when there is one.
    pub second_exit_distance: Option<f64>,
    /// Cell kind under each path node in the original (non-buffered) stack.
    pub path_kinds: Option<Vec<CellKind>>,
    /// Length of a dead-end corridor segment, when a caller reports one.
    #[serde(default)]
    pub dead_end_length: Option<f64>,
    /// Length of the stair corridor, when a caller reports one.
    #[serde(default)]
    pub stair_corridor_length: Option<f64>,
    #[serde(default)]
    pub violations: Violations,
}

impl Route {
    fn unreachable(space_name: String) -> Self {
        Route {
            space_name,
            furthest_point: None,
            optimal_exit: None,
            optimal_path: None,
            distance: None,
            distance_to_stair: None,
            second_exit_distance: None,
            path_kinds: None,
            dead_end_length: None,
            stair_corridor_length: None,
            violations: Violations::default(),
        }
    }
}

/// Worst-case egress search over a built route graph. Holds the graph and the
/// original stack for per-step kind tagging.
pub struct EscapeRouter<'a> {
    graph: &'a RouteGraph,
    original: &'a GridStack,
}

struct CandidateResult {
    candidate: GridPos,
    exit: GridPos,
    path: Vec<GridPos>,
    cost: f64,
    second_exit_cost: Option<f64>,
}

impl<'a> EscapeRouter<'a> {
    pub fn new(graph: &'a RouteGraph, original: &'a GridStack) -> Self {
        EscapeRouter { graph, original }
    }

    /// Finds the interior point whose best exit is furthest away and returns
    /// the realizing path. Raw graph distances scale by the cell size (and
    /// the unit scale) into meters.
    pub fn calculate_escape_route(&self, space: &Space, exits: &[GridPos]) -> Route {
        let candidates = candidate_points(space);
        debug!("Candidate points for {}: {:?}", space.id, candidates);

        let mut worst: Option<CandidateResult> = None;
        for candidate in candidates {
            let Some(result) = self.best_exit_for(candidate, exits) else {
                continue;
            };
            if worst.as_ref().map_or(true, |w| result.cost > w.cost) {
                worst = Some(result);
            }
        }

        let Some(worst) = worst else {
            debug!("No candidate of {} reaches any exit.", space.id);
            return Route::unreachable(space.name.clone());
        };

        let to_meters = self.original.cell_size * self.original.unit_size;
        let stair_distance = self.distance_to_first_stair(&worst.path);
        let path_kinds = worst
            .path
            .iter()
            .map(|&pos| self.original.kind_at(pos).unwrap_or(CellKind::Empty))
            .collect();

        Route {
            space_name: space.name.clone(),
            furthest_point: Some(worst.candidate),
            optimal_exit: Some(worst.exit),
            optimal_path: Some(worst.path),
            distance: Some(worst.cost * to_meters),
            distance_to_stair: Some(if stair_distance >= 0.0 {
                stair_distance * to_meters
            } else {
                stair_distance
            }),
            second_exit_distance: worst.second_exit_cost.map(|cost| cost * to_meters),
            path_kinds: Some(path_kinds),
            dead_end_length: None,
            stair_corridor_length: None,
            violations: Violations::default(),
        }
    }

    /// The nearest exit (and the second-nearest, for the two-exit rule) from
    /// one candidate.
    fn best_exit_for(&self, candidate: GridPos, exits: &[GridPos]) -> Option<CandidateResult> {
        let mut best: Option<(f64, GridPos, Vec<GridPos>)> = None;
        let mut second_cost: Option<f64> = None;
        for &exit in exits {
            let Some((cost, path)) = self.graph.astar(candidate, exit) else {
                continue;
            };
            match &mut best {
                Some((best_cost, best_exit, best_path)) => {
                    if cost < *best_cost {
                        second_cost = Some(*best_cost);
                        *best_cost = cost;
                        *best_exit = exit;
                        *best_path = path;
                    } else if second_cost.map_or(true, |second| cost < second) {
                        second_cost = Some(cost);
                    }
                }
                None => best = Some((cost, exit, path)),
            }
        }
        best.map(|(cost, exit, path)| CandidateResult {
            candidate,
            exit,
            path,
            cost,
            second_exit_cost: second_cost,
        })
    }

    /// Prefix weight sum up to the first node whose original cell kind is a
    /// stair, or -1 when the path has none.
    fn distance_to_first_stair(&self, path: &[GridPos]) -> f64 {
        let stair_index = path
            .iter()
            .position(|&pos| self.original.kind_at(pos) == Some(CellKind::Stair));
        match stair_index {
            Some(index) => path[..index + 1]
                .windows(2)
                .map(|pair| self.graph.edge_weight(pair[0], pair[1]).unwrap_or(0.0))
                .sum(),
            None => -1.0,
        }
    }
}

/// Up to four candidate cells of a space: in each quadrant around the
/// centroid of its interior, the cell furthest from the centroid.
pub fn candidate_points(space: &Space) -> Vec<GridPos> {
    if space.points.is_empty() {
        return Vec::new();
    }
    let n = space.points.len() as f64;
    let centroid_row = space.points.iter().map(|xy| xy.row as f64).sum::<f64>() / n;
    let centroid_col = space.points.iter().map(|xy| xy.col as f64).sum::<f64>() / n;
    let centroid = (centroid_row, centroid_col);

    let quadrant = |xy: CellXY| -> usize {
        match ((xy.row as f64) >= centroid_row, (xy.col as f64) >= centroid_col) {
            (true, true) => 0,
            (false, true) => 1,
            (false, false) => 2,
            (true, false) => 3,
        }
    };

    let mut candidates = Vec::new();
    for q in 0..4 {
        let furthest = space
            .points
            .iter()
            .copied()
            .filter(|&xy| quadrant(xy) == q)
            .max_by(|a, b| {
                (a.dist2_to(centroid), a.row, a.col)
                    .partial_cmp(&(b.dist2_to(centroid), b.row, b.col))
                    .unwrap()
            });
        if let Some(xy) = furthest {
            candidates.push(GridPos::on_floor(xy, space.floor));
        }
    }
    candidates
}
