use crate::algorithms::wall_buffer::buffer_stack;
use crate::errors::EgressError;
use crate::exits;
use crate::geometry::bbox::BBox;
use crate::geometry::cell::GridPos;
use crate::graph::{RouteGraph, StairConnection};
use crate::grid::cell_kind::CellKind;
use crate::grid::floor_grid::FloorGrid;
use crate::grid::stack::{Floor, GridStack};
use crate::model::BuildingModel;
use crate::raster::{Rasterizer, SkippedElement};
use crate::route::{EscapeRouter, Route};
use crate::rules;
use crate::spaces::{detect_spaces, Space};
use derive_more::Constructor;
use log::debug;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// One cell overwrite request.
#[derive(Debug, Clone, Copy, Constructor, Serialize, Deserialize)]
pub struct CellEdit {
    pub floor: usize,
    pub row: usize,
    pub col: usize,
    pub kind: CellKind,
}

impl CellEdit {
    fn pos(&self) -> GridPos {
        GridPos::new(self.row, self.col, self.floor)
    }
}

/// Original and buffered grids after a mutation.
#[derive(Debug, Clone, Serialize)]
pub struct GridPair {
    pub original_grids: Vec<FloorGrid>,
    pub buffered_grids: Vec<FloorGrid>,
}

/// Snapshot of a freshly processed building, as handed to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub grids: Vec<FloorGrid>,
    pub bbox: BBox,
    pub floors: Vec<Floor>,
    pub cell_size: f64,
    pub unit_size: f64,
    pub spaces: Vec<Space>,
    pub skipped_elements: Vec<SkippedElement>,
}

/// Whether `create_graph` rebuilt the graph or reused the cached one.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphStatus {
    Rebuilt,
    Cached,
}

/// Owner of one building's analysis state: the original and buffered grid
/// stacks, the derived spaces and the cached route graph. The cache is keyed
/// by the content hash of the buffered stack plus the build parameters; every
/// grid mutation sets a dirty bit that forces a rebuild. Loading another
/// building means constructing a new session.
pub struct Session {
    stack: GridStack,
    buffered: GridStack,
    buffer_radius: usize,
    include_empty_tiles: bool,
    spaces: Vec<Space>,
    skipped: Vec<SkippedElement>,
    graph: Option<RouteGraph>,
    graph_key: Option<u64>,
    dirty: bool,
}

impl Session {
    /// Rasterizes a building model and opens a session on the result.
    pub fn process_model(model: &BuildingModel, cell_size: f64) -> Result<Session, EgressError> {
        let result = Rasterizer::new(cell_size)?.process(model)?;
        let mut session = Session::from_stack(result.stack)?;
        session.skipped = result.skipped;
        Ok(session)
    }

    /// Opens a session on an already rasterized stack.
    pub fn from_stack(stack: GridStack) -> Result<Session, EgressError> {
        stack.validate()?;
        let spaces = detect_spaces(&stack, false);
        Ok(Session {
            buffered: stack.clone(),
            stack,
            buffer_radius: 0,
            include_empty_tiles: false,
            spaces,
            skipped: Vec::new(),
            graph: None,
            graph_key: None,
            dirty: true,
        })
    }

    pub fn stack(&self) -> &GridStack {
        &self.stack
    }

    pub fn buffered(&self) -> &GridStack {
        &self.buffered
    }

    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    pub fn snapshot(&self) -> ProcessResult {
        ProcessResult {
            grids: self.stack.grids.clone(),
            bbox: self.stack.bbox,
            floors: self.stack.floors.clone(),
            cell_size: self.stack.cell_size,
            unit_size: self.stack.unit_size,
            spaces: self.spaces.clone(),
            skipped_elements: self.skipped.clone(),
        }
    }

    /// Derived views are invalidated by any grid change.
    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.spaces = detect_spaces(&self.stack, self.include_empty_tiles);
    }

    /// Recomputes the buffered stack with a new wall buffer radius.
    pub fn apply_wall_buffer(&mut self, buffer_radius: usize) -> GridPair {
        self.buffer_radius = buffer_radius;
        self.buffered = buffer_stack(&self.stack, buffer_radius);
        self.mark_dirty();
        self.grid_pair()
    }

    /// Applies edits to the original stack and re-buffers with the current
    /// radius.
    pub fn edit_grid(&mut self, edits: &[CellEdit]) -> Result<Vec<FloorGrid>, EgressError> {
        for edit in edits {
            self.stack.set_kind(edit.pos(), edit.kind)?;
        }
        self.buffered = buffer_stack(&self.stack, self.buffer_radius);
        self.mark_dirty();
        Ok(self.stack.grids.clone())
    }

    pub fn update_cell(
        &mut self,
        floor: usize,
        row: usize,
        col: usize,
        kind: CellKind,
        buffer_radius: usize,
    ) -> Result<GridPair, EgressError> {
        self.batch_update_cells(&[CellEdit::new(floor, row, col, kind)], buffer_radius)
    }

    /// Applies the edits in order, then re-buffers with the given radius.
    pub fn batch_update_cells(
        &mut self,
        edits: &[CellEdit],
        buffer_radius: usize,
    ) -> Result<GridPair, EgressError> {
        for edit in edits {
            self.stack.set_kind(edit.pos(), edit.kind)?;
        }
        Ok(self.apply_wall_buffer(buffer_radius))
    }

    pub fn detect_exits(&self) -> Vec<GridPos> {
        exits::detect_exits(&self.stack)
    }

    /// Re-segments the spaces, optionally counting unpainted cells as
    /// interior.
    pub fn update_spaces(&mut self, include_empty_tiles: bool) -> &[Space] {
        self.include_empty_tiles = include_empty_tiles;
        self.spaces = detect_spaces(&self.stack, include_empty_tiles);
        &self.spaces
    }

    /// Builds the route graph, reusing the cached one when the buffered
    /// grids and parameters are unchanged.
    pub fn create_graph(&mut self, allow_diagonal: bool, minimize_cost: bool) -> Result<GraphStatus, EgressError> {
        let key = self.graph_key(allow_diagonal, minimize_cost);
        if !self.dirty && self.graph.is_some() && self.graph_key == Some(key) {
            debug!("Reusing the cached route graph.");
            return Ok(GraphStatus::Cached);
        }
        self.graph = Some(RouteGraph::build(&self.buffered, allow_diagonal, minimize_cost)?);
        self.graph_key = Some(key);
        self.dirty = false;
        Ok(GraphStatus::Rebuilt)
    }

    fn graph_key(&self, allow_diagonal: bool, minimize_cost: bool) -> u64 {
        let mut hasher = FxHasher::default();
        self.buffered.content_hash().hash(&mut hasher);
        allow_diagonal.hash(&mut hasher);
        minimize_cost.hash(&mut hasher);
        hasher.finish()
    }

    /// Inter-floor connections incident to a storey, from the built graph.
    pub fn stair_connections(&self, floor: usize) -> Result<Vec<StairConnection>, EgressError> {
        let graph = self.graph.as_ref().ok_or(EgressError::GraphNotCreated)?;
        Ok(graph.stair_connections(floor))
    }

    /// Worst-case egress for one space, with rule violations attached.
    pub fn calculate_escape_route(&self, space: &Space, exits: &[GridPos]) -> Result<Route, EgressError> {
        let graph = self.graph.as_ref().ok_or(EgressError::GraphNotCreated)?;
        let router = EscapeRouter::new(graph, &self.stack);
        let mut route = router.calculate_escape_route(space, exits);
        route.violations = rules::check_route(&route);
        Ok(route)
    }

    fn grid_pair(&self) -> GridPair {
        GridPair {
            original_grids: self.stack.grids.clone(),
            buffered_grids: self.buffered.grids.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::EgressError;
    use crate::exits::walled_room;
    use crate::geometry::cell::{CellXY, GridPos};
    use crate::grid::cell_kind::CellKind;
    use crate::grid::stack::test_stack;
    use crate::session::{GraphStatus, Session};

    #[test]
    fn test_update_cell_read_back_and_rebuffer() {
        let mut session = Session::from_stack(test_stack(5, 5, &[0.0])).unwrap();
        let pair = session.update_cell(0, 2, 2, CellKind::Wall, 1).unwrap();

        assert_eq!(pair.original_grids[0].get(CellXY::new(2, 2)), CellKind::Wall);
        assert_eq!(pair.buffered_grids[0].get(CellXY::new(2, 2)), CellKind::Wall);
        assert_eq!(pair.buffered_grids[0].get(CellXY::new(1, 1)), CellKind::WallBuffer);
        // The original stays unbuffered.
        assert_eq!(pair.original_grids[0].get(CellXY::new(1, 1)), CellKind::Empty);
    }

    #[test]
    fn test_buffer_round_trip() {
        let mut session = Session::from_stack(test_stack(5, 5, &[0.0])).unwrap();
        session.update_cell(0, 2, 2, CellKind::Wall, 0).unwrap();
        let buffered_once = session.apply_wall_buffer(1);
        let back = session.apply_wall_buffer(0);
        assert_eq!(back.original_grids, back.buffered_grids);
        assert_ne!(buffered_once.buffered_grids, back.buffered_grids);
    }

    #[test]
    fn test_graph_cache_and_dirty_bit() {
        let mut session = Session::from_stack(test_stack(5, 5, &[0.0])).unwrap();
        assert_eq!(session.create_graph(false, true).unwrap(), GraphStatus::Rebuilt);
        assert_eq!(session.create_graph(false, true).unwrap(), GraphStatus::Cached);

        // Changed parameters force a rebuild even without grid edits.
        assert_eq!(session.create_graph(true, true).unwrap(), GraphStatus::Rebuilt);

        session.update_cell(0, 0, 0, CellKind::Wall, 0).unwrap();
        assert_eq!(session.create_graph(true, true).unwrap(), GraphStatus::Rebuilt);
    }

    #[test]
    fn test_graph_required_before_queries() {
        let session = Session::from_stack(test_stack(5, 5, &[0.0])).unwrap();
        assert_eq!(session.stair_connections(0), Err(EgressError::GraphNotCreated));
    }

    #[test]
    fn test_edit_out_of_bounds_is_rejected() {
        let mut session = Session::from_stack(test_stack(5, 5, &[0.0])).unwrap();
        assert!(matches!(
            session.update_cell(0, 7, 0, CellKind::Wall, 0),
            Err(EgressError::CellOutOfBounds { .. })
        ));
        assert!(matches!(
            session.update_cell(3, 0, 0, CellKind::Wall, 0),
            Err(EgressError::CellOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_full_pipeline_on_walled_room() {
        let mut session = Session::from_stack(walled_room()).unwrap();
        let exits = session.detect_exits();
        assert_eq!(exits, vec![GridPos::new(0, 2, 0)]);

        let spaces = session.update_spaces(false).to_vec();
        assert_eq!(spaces.len(), 1);

        session.create_graph(false, true).unwrap();
        let route = session.calculate_escape_route(&spaces[0], &exits).unwrap();
        assert_eq!(route.distance, Some(4.0));
        // A 4 m escape with no stairs violates nothing.
        assert!(route.violations.is_empty());
    }

    #[test]
    fn test_process_model_snapshot() {
        use crate::model::{BuildingModel, Element, ElementKind, Storey};

        let wall = |id: &str, x0: f64, y0: f64, x1: f64, y1: f64| {
            Element::new(
                ElementKind::Wall,
                id.into(),
                vec![
                    [[x0, y0, 0.0], [x1, y1, 0.0], [x1, y1, 3.0]],
                    [[x0, y0, 0.0], [x0, y0, 3.0], [x1, y1, 3.0]],
                ],
            )
        };
        let model = BuildingModel {
            elements: vec![
                wall("north", 0.0, 0.0, 4.0, 0.2),
                wall("south", 0.0, 3.8, 4.0, 4.0),
            ],
            storeys: vec![Storey::new(0.0, Some("S0".into()), Some("Ground".into()))],
        };

        let session = Session::process_model(&model, 1.0).unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.floors.len(), 1);
        assert_eq!(snapshot.floors[0].name.as_deref(), Some("Ground"));
        assert_eq!(snapshot.cell_size, 1.0);
        assert_eq!(snapshot.unit_size, 1.0);
        assert!(snapshot.skipped_elements.is_empty());
        assert_eq!(snapshot.grids.len(), 1);
        assert!(snapshot.grids[0].find(CellKind::Wall).count() > 0);
    }

    #[test]
    fn test_update_spaces_include_empty_tiles() {
        let mut session = Session::from_stack(test_stack(3, 3, &[0.0])).unwrap();
        session.update_cell(0, 1, 1, CellKind::Floor, 0).unwrap();
        assert_eq!(session.update_spaces(false).len(), 1);
        assert_eq!(session.update_spaces(true).len(), 1);
        assert_eq!(session.update_spaces(true)[0].points.len(), 9);
    }
}
