use crate::consts::{FLOOR_CHANGE_PENALTY, PLAIN_COST};
use crate::errors::EgressError;
use crate::geometry::cell::GridPos;
use crate::grid::stack::GridStack;
use derive_more::Constructor;
use log::info;
use petgraph::prelude::EdgeRef;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::IntoEdgeReferences;
use petgraph::Undirected;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::f64::consts::SQRT_2;

pub mod stairs;

/// An inter-floor edge of the route graph, lower endpoint first.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Constructor, Serialize, Deserialize)]
pub struct StairConnection {
    pub start: GridPos,
    pub end: GridPos,
}

/// The weighted 3D connectivity graph over passable cells of the buffered
/// stack. Nodes are cell coordinates; edges are intra-floor 4/8-neighbor
/// steps and inter-floor stair links.
pub struct RouteGraph {
    graph: StableGraph<GridPos, f64, Undirected>,
    nodes: FxHashMap<GridPos, NodeIndex>,
    pub allow_diagonal: bool,
    pub minimize_cost: bool,
}

impl RouteGraph {
    /// Builds the graph from the buffered stack. Each intra-floor edge is
    /// written from both endpoints in row-major scan order, so the weight of
    /// the later endpoint survives: the traversal cost of that cell (unit
    /// cost when `minimize_cost` is off), times sqrt(2) for diagonal steps.
    pub fn build(
        buffered: &GridStack,
        allow_diagonal: bool,
        minimize_cost: bool,
    ) -> Result<RouteGraph, EgressError> {
        buffered.validate()?;
        let (rows, cols) = (buffered.rows(), buffered.cols());

        let mut graph = StableGraph::with_capacity(rows * cols, rows * cols * 2);
        let mut nodes = FxHashMap::default();
        for (floor, grid) in buffered.grids.iter().enumerate() {
            for (xy, kind) in grid.iter() {
                if kind.is_passable() {
                    let pos = GridPos::on_floor(xy, floor);
                    nodes.insert(pos, graph.add_node(pos));
                }
            }
        }

        let offsets: &[(i64, i64)] = if allow_diagonal {
            &[
                (0, 1),
                (1, 0),
                (0, -1),
                (-1, 0),
                (1, 1),
                (1, -1),
                (-1, 1),
                (-1, -1),
            ]
        } else {
            &[(0, 1), (1, 0), (0, -1), (-1, 0)]
        };
        for (floor, grid) in buffered.grids.iter().enumerate() {
            for (xy, kind) in grid.iter() {
                if !kind.is_passable() {
                    continue;
                }
                let node = nodes[&GridPos::on_floor(xy, floor)];
                let base = if minimize_cost { kind.traverse_cost() } else { PLAIN_COST };
                for &offset in offsets {
                    let Some(near) = xy.try_add(offset, rows, cols) else {
                        continue;
                    };
                    if !grid.get(near).is_passable() {
                        continue;
                    }
                    let near_node = nodes[&GridPos::on_floor(near, floor)];
                    let diagonal_step = offset.0 != 0 && offset.1 != 0;
                    let weight = base * if diagonal_step { SQRT_2 } else { 1.0 };
                    graph.update_edge(node, near_node, weight);
                }
            }
        }

        stairs::connect_stairs(&mut graph, &nodes, buffered, minimize_cost);
        info!(
            "Created a route graph with {} nodes and {} edges.",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(RouteGraph {
            graph,
            nodes,
            allow_diagonal,
            minimize_cost,
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        self.nodes.contains_key(&pos)
    }

    /// Shortest path between two cells by cumulative edge weight, or None
    /// when either endpoint is not a node or no path exists.
    pub fn astar(&self, start: GridPos, goal: GridPos) -> Option<(f64, Vec<GridPos>)> {
        let start_ix = *self.nodes.get(&start)?;
        let goal_ix = *self.nodes.get(&goal)?;
        let (cost, path) = petgraph::algo::astar(
            &self.graph,
            start_ix,
            |node| node == goal_ix,
            |edge| *edge.weight(),
            |node| heuristic(self.graph[node], goal),
        )?;
        Some((cost, path.into_iter().map(|ix| self.graph[ix]).collect()))
    }

    pub fn edge_weight(&self, a: GridPos, b: GridPos) -> Option<f64> {
        let edge = self.graph.find_edge(*self.nodes.get(&a)?, *self.nodes.get(&b)?)?;
        self.graph.edge_weight(edge).copied()
    }

    /// All inter-floor edges incident to the given storey.
    pub fn stair_connections(&self, floor: usize) -> Vec<StairConnection> {
        self.graph
            .edge_references()
            .filter_map(|edge| {
                let a = self.graph[edge.source()];
                let b = self.graph[edge.target()];
                (a.floor != b.floor && (a.floor == floor || b.floor == floor)).then(|| {
                    if a.floor <= b.floor {
                        StairConnection::new(a, b)
                    } else {
                        StairConnection::new(b, a)
                    }
                })
            })
            .collect()
    }
}

/// A* heuristic: planar Euclidean distance plus a penalty per storey of
/// vertical separation.
pub fn heuristic(a: GridPos, b: GridPos) -> f64 {
    let dr = a.row as f64 - b.row as f64;
    let dc = a.col as f64 - b.col as f64;
    (dr * dr + dc * dc).sqrt() + FLOOR_CHANGE_PENALTY * a.floor.abs_diff(b.floor) as f64
}
