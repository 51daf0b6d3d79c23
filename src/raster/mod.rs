use crate::consts::{
    DEFAULT_FLOOR_HEIGHT,
    DOOR_INFLATION,
    GRID_MARGIN,
    MAX_FLOOR_HEIGHT,
    MAX_GRID_CELLS,
    MAX_REASONABLE_SPAN,
    MIN_FLOOR_HEIGHT,
    SLAB_EXTENSION,
    STOREY_WINDOW_ABOVE_MIN,
    STOREY_WINDOW_BELOW_MAX,
    TRIM_PADDING,
};
use crate::errors::EgressError;
use crate::geometry::bbox::BBox;
use crate::geometry::cell::CellXY;
use crate::geometry::rect::CellRect;
use crate::grid::cell_kind::CellKind;
use crate::grid::floor_grid::FloorGrid;
use crate::grid::stack::{Floor, GridStack};
use crate::model::{BuildingModel, Element, ElementKind, Storey};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::cmp::min;

/// A building element dropped during rasterization, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedElement {
    pub element_id: String,
    pub reason: String,
}

/// The rasterized stack plus the per-element failures recovered on the way.
#[derive(Debug, Clone)]
pub struct RasterResult {
    pub stack: GridStack,
    pub skipped: Vec<SkippedElement>,
}

/// Turns a building model into a stack of labelled storey grids.
///
/// The working unit starts as meters; when the model turns out to be in
/// millimeters (see `determine_unit_size`), `unit_size` drops to 0.001 and
/// every meter-denominated tolerance is divided by it.
pub struct Rasterizer {
    cell_size: f64,
    unit_size: f64,
}

impl Rasterizer {
    pub fn new(cell_size: f64) -> Result<Self, EgressError> {
        if !(cell_size > 0.0) {
            return Err(EgressError::InvalidCellSize);
        }
        Ok(Rasterizer {
            cell_size,
            unit_size: 1.0,
        })
    }

    pub fn process(mut self, model: &BuildingModel) -> Result<RasterResult, EgressError> {
        let bbox = self.wall_bounding_box(&model.elements)?;
        info!("Calculated bounding box: {:?}", bbox);
        self.determine_unit_size(&bbox);
        let floors = self.derive_floors(&model.storeys, &bbox);
        info!("Created {} floors.", floors.len());

        let (rows, cols) = self.grid_shape(&bbox);
        info!("Creating grids with dimensions: {} x {}", rows, cols);
        if rows > MAX_GRID_CELLS || cols > MAX_GRID_CELLS {
            warn!("Very large grid size: {} x {}. This may cause performance issues.", rows, cols);
        }
        let mut grids = vec![FloorGrid::new(rows, cols, CellKind::Empty); floors.len()];

        let mut skipped = Vec::new();
        for element in &model.elements {
            if let Err(e) = self.paint_element(element, &bbox, &floors, &mut grids) {
                warn!("Error processing element {}: {}.", element.id, e);
                skipped.push(SkippedElement {
                    element_id: element.id.clone(),
                    reason: e.to_string(),
                });
            }
        }

        let mut stack = GridStack {
            grids,
            cell_size: self.cell_size,
            unit_size: self.unit_size,
            bbox,
            floors,
        };
        trim_stack(&mut stack, TRIM_PADDING);
        stack.validate()?;
        Ok(RasterResult { stack, skipped })
    }

    /// Bounding box over wall geometry only. Other element kinds often extend
    /// far outside the building envelope.
    fn wall_bounding_box(&self, elements: &[Element]) -> Result<BBox, EgressError> {
        let mut bbox = BBox::empty();
        for element in elements {
            if element.kind != ElementKind::Wall {
                continue;
            }
            for triangle in &element.triangles {
                for vertex in triangle {
                    bbox.extend(*vertex);
                }
            }
        }
        if bbox.is_degenerate() {
            return Err(EgressError::NoWallGeometry);
        }
        for (axis, span) in [("x", bbox.span_x()), ("y", bbox.span_y()), ("z", bbox.span_z())] {
            if span > MAX_REASONABLE_SPAN {
                warn!("Unreasonably large bounding box size for {}-axis: {} units.", axis, span);
            }
        }
        Ok(bbox)
    }

    /// Millimeter heuristic: a model measured in millimeters would need a
    /// grid thousands of cells across, so reinterpret the unit once.
    fn determine_unit_size(&mut self, bbox: &BBox) {
        let cols = (bbox.span_x() / self.cell_size).ceil() as usize + 2 * GRID_MARGIN;
        let rows = (bbox.span_y() / self.cell_size).ceil() as usize + 2 * GRID_MARGIN;
        if cols > MAX_GRID_CELLS || rows > MAX_GRID_CELLS {
            self.unit_size /= 1000.0;
            self.cell_size *= 1000.0;
        }
        info!("Determined unit scale: {}", self.unit_size);
    }

    fn grid_shape(&self, bbox: &BBox) -> (usize, usize) {
        let rows = (bbox.span_y() / self.cell_size).ceil() as usize + 2 * GRID_MARGIN;
        let cols = (bbox.span_x() / self.cell_size).ceil() as usize + 2 * GRID_MARGIN;
        (rows, cols)
    }

    /// Storey planes inside the bounding box become floors; each floor spans
    /// up to the next plane (the topmost up to the roof). Implausible storey
    /// heights are discarded.
    fn derive_floors(&self, storeys: &[Storey], bbox: &BBox) -> Vec<Floor> {
        let mut planes: Vec<f64> = storeys
            .iter()
            .map(|storey| storey.elevation)
            .filter(|&elevation| elevation >= bbox.min_z && elevation <= bbox.max_z)
            .collect();
        planes.sort_by(f64::total_cmp);
        planes.dedup();

        let synthesized = planes.is_empty();
        if synthesized {
            warn!("Storey elevations inconsistent with the bounding box, creating default floors.");
            let storey_height = DEFAULT_FLOOR_HEIGHT / self.unit_size;
            let count = ((bbox.span_z() / storey_height) as usize).max(1);
            planes = (0..count)
                .map(|i| bbox.min_z + bbox.span_z() * i as f64 / count as f64)
                .collect();
        }

        let min_height = MIN_FLOOR_HEIGHT / self.unit_size;
        let max_height = MAX_FLOOR_HEIGHT / self.unit_size;
        let mut floors = Vec::new();
        for (i, &elevation) in planes.iter().enumerate() {
            let next = planes.get(i + 1).copied().unwrap_or(bbox.max_z);
            let height = next - elevation;
            if height < min_height || height > max_height {
                continue;
            }
            let mut floor = Floor::new(elevation, height);
            if !synthesized {
                if let Some(storey) = storeys.iter().find(|storey| storey.elevation == elevation) {
                    floor.id = storey.id.clone();
                    floor.name = storey.name.clone();
                }
            }
            floors.push(floor);
        }

        if floors.is_empty() {
            warn!("No valid floors found, creating a single floor based on the bounding box.");
            floors.push(Floor::new(bbox.min_z, bbox.span_z()));
        }
        floors
    }

    fn paint_element(
        &self,
        element: &Element,
        bbox: &BBox,
        floors: &[Floor],
        grids: &mut [FloorGrid],
    ) -> Result<(), EgressError> {
        if element.triangles.is_empty() {
            return Err(EgressError::EmptyGeometry {
                element_id: element.id.clone(),
            });
        }

        let mut mesh = BBox::empty();
        for triangle in &element.triangles {
            for vertex in triangle {
                mesh.extend(*vertex);
            }
        }
        // Extend floors and stairs upward so they straddle their storey plane.
        if matches!(element.kind, ElementKind::Floor | ElementKind::Stair) {
            mesh.max_z += SLAB_EXTENSION / self.unit_size;
        }

        for (floor_index, floor) in floors.iter().enumerate() {
            let below_max = floor.elevation + STOREY_WINDOW_BELOW_MAX / self.unit_size;
            let above_min = floor.elevation + STOREY_WINDOW_ABOVE_MIN / self.unit_size;
            if mesh.min_z < below_max && mesh.max_z > above_min {
                if element.kind == ElementKind::Door {
                    self.paint_door(&mut grids[floor_index], bbox, &mesh);
                } else {
                    self.paint_triangles(&mut grids[floor_index], bbox, floor, element);
                }
            }
        }
        Ok(())
    }

    /// Doors rasterize as their horizontal bounding rectangle, inflated a bit
    /// on the shorter axis so slightly overlong walls do not seal the
    /// opening. Doors overwrite any other kind.
    fn paint_door(&self, grid: &mut FloorGrid, bbox: &BBox, mesh: &BBox) {
        let mut start_col = (mesh.min_x - bbox.min_x) / self.cell_size;
        let mut end_col = (mesh.max_x - bbox.min_x) / self.cell_size;
        let mut start_row = (mesh.min_y - bbox.min_y) / self.cell_size;
        let mut end_row = (mesh.max_y - bbox.min_y) / self.cell_size;

        let inflation = DOOR_INFLATION / self.unit_size / self.cell_size;
        if end_col - start_col > end_row - start_row {
            start_row -= inflation;
            end_row += inflation;
        } else {
            start_col -= inflation;
            end_col += inflation;
        }

        let (rows, cols) = grid.shape();
        if let (Some((row_lo, row_hi)), Some((col_lo, col_hi))) = (
            clamped_span(start_row, end_row, rows),
            clamped_span(start_col, end_col, cols),
        ) {
            for row in row_lo..=row_hi {
                for col in col_lo..=col_hi {
                    grid.set(CellXY::new(row, col), CellKind::Door);
                }
            }
        }
    }

    /// Walls, floors and stairs rasterize triangle by triangle under the
    /// paint priority rule.
    fn paint_triangles(&self, grid: &mut FloorGrid, bbox: &BBox, floor: &Floor, element: &Element) {
        let kind = CellKind::from(element.kind);
        let (rows, cols) = grid.shape();
        for triangle in &element.triangles {
            let mut tri = BBox::empty();
            for vertex in triangle {
                tri.extend(*vertex);
            }
            let paints = match element.kind {
                ElementKind::Stair => true,
                ElementKind::Floor if tri.max_z < floor.elevation + 1.0 / self.unit_size => true,
                _ => tri.min_z < floor.elevation + floor.height && tri.max_z > floor.elevation,
            };
            if !paints {
                continue;
            }
            let row_span = clamped_span(
                (tri.min_y - bbox.min_y) / self.cell_size,
                (tri.max_y - bbox.min_y) / self.cell_size,
                rows,
            );
            let col_span = clamped_span(
                (tri.min_x - bbox.min_x) / self.cell_size,
                (tri.max_x - bbox.min_x) / self.cell_size,
                cols,
            );
            if let (Some((row_lo, row_hi)), Some((col_lo, col_hi))) = (row_span, col_span) {
                for row in row_lo..=row_hi {
                    for col in col_lo..=col_hi {
                        let xy = CellXY::new(row, col);
                        if kind.paint_priority() >= grid.get(xy).paint_priority() {
                            grid.set(xy, kind);
                        }
                    }
                }
            }
        }
    }
}

/// Clamps a fractional cell interval to `[0, len)`, truncating like the grid
/// projection does. None when the interval misses the grid entirely.
fn clamped_span(start: f64, end: f64, len: usize) -> Option<(usize, usize)> {
    let hi = end.min(len as f64 - 1.0);
    if hi < 0.0 {
        return None;
    }
    let lo = start.max(0.0) as usize;
    let hi = hi as usize;
    (lo <= hi).then_some((lo, hi))
}

/// Clips all grids to the bounding rectangle of non-empty, non-floor cells
/// grown by `padding`, then wraps them in a `padding`-wide empty border.
/// The bounding box minima shift by `padding` cells; maxima follow the new
/// shape.
fn trim_stack(stack: &mut GridStack, padding: usize) {
    info!("Starting grid trimming process.");
    let mut occupied: Option<CellRect> = None;
    for grid in &stack.grids {
        for (xy, kind) in grid.iter() {
            if !matches!(kind, CellKind::Empty | CellKind::Floor) {
                occupied = Some(match occupied {
                    Some(rect) => rect.extended(xy),
                    None => CellRect::new_unordered(xy, xy),
                });
            }
        }
    }
    let Some(rect) = occupied else {
        warn!("All grids are empty or contain only floor cells. Skipping trimming.");
        return;
    };

    let (rows, cols) = stack.grids[0].shape();
    let slice = CellRect::new_unordered(
        CellXY::new(
            rect.top_left.row.saturating_sub(padding),
            rect.top_left.col.saturating_sub(padding),
        ),
        CellXY::new(
            min(rows - 1, rect.bottom_right.row + padding),
            min(cols - 1, rect.bottom_right.col + padding),
        ),
    );
    let new_rows = slice.rows() + 2 * padding;
    let new_cols = slice.cols() + 2 * padding;

    for grid in &mut stack.grids {
        let mut trimmed = FloorGrid::new(new_rows, new_cols, CellKind::Empty);
        trimmed.blit(grid, slice, CellXY::new(padding, padding));
        *grid = trimmed;
    }

    stack.bbox.min_x -= stack.cell_size * padding as f64;
    stack.bbox.min_y -= stack.cell_size * padding as f64;
    stack.bbox.max_x = stack.bbox.min_x + new_cols as f64 * stack.cell_size;
    stack.bbox.max_y = stack.bbox.min_y + new_rows as f64 * stack.cell_size;
    info!("Final grid dimensions: {} x {}", new_rows, new_cols);
}

#[cfg(test)]
mod tests {
    use crate::geometry::bbox::BBox;
    use crate::geometry::cell::CellXY;
    use crate::grid::cell_kind::CellKind;
    use crate::model::{BuildingModel, Element, ElementKind, Storey, Triangle};
    use crate::raster::Rasterizer;
    use more_asserts::assert_le;

    /// Two triangles spanning the `[x0, x1] x [y0, y1]` rectangle and the
    /// full `[z0, z1]` height each.
    fn box_mesh(x0: f64, y0: f64, x1: f64, y1: f64, z0: f64, z1: f64) -> Vec<Triangle> {
        vec![
            [[x0, y0, z0], [x1, y1, z0], [x1, y1, z1]],
            [[x0, y0, z0], [x0, y0, z1], [x1, y1, z1]],
        ]
    }

    fn storey(elevation: f64) -> Storey {
        Storey::new(elevation, None, None)
    }

    fn wall(id: &str, x0: f64, y0: f64, x1: f64, y1: f64, z1: f64) -> Element {
        Element::new(ElementKind::Wall, id.into(), box_mesh(x0, y0, x1, y1, 0.0, z1))
    }

    #[test]
    fn test_wall_painting_and_trim() {
        let model = BuildingModel {
            elements: vec![wall("w1", 0.0, 0.0, 4.0, 0.5, 3.0)],
            storeys: vec![storey(0.0)],
        };
        let result = Rasterizer::new(1.0).unwrap().process(&model).unwrap();
        let stack = &result.stack;

        assert!(result.skipped.is_empty());
        assert_eq!(stack.floors.len(), 1);
        // Occupied cells were rows 0..=0, cols 0..=4 before trimming.
        assert_eq!(stack.rows(), 4);
        assert_eq!(stack.cols(), 8);
        let walls = stack.grids[0].find(CellKind::Wall).collect::<Vec<_>>();
        assert_eq!(walls.len(), 5);
        assert!(walls.contains(&CellXY::new(1, 1)));
        assert!(walls.contains(&CellXY::new(1, 5)));
        assert_eq!(stack.bbox.min_x, -1.0);
        assert_eq!(stack.bbox.max_x, 7.0);
    }

    #[test]
    fn test_door_overwrites_wall_but_not_conversely() {
        let mut model = BuildingModel {
            elements: vec![
                Element::new(ElementKind::Door, "d1".into(), box_mesh(1.0, 0.0, 2.0, 0.5, 0.0, 2.0)),
                wall("w1", 0.0, 0.0, 4.0, 0.5, 3.0),
            ],
            storeys: vec![storey(0.0)],
        };
        // Door first, wall second: the wall must not repaint the door cells.
        let result = Rasterizer::new(1.0).unwrap().process(&model).unwrap();
        let doors = result.stack.grids[0].find(CellKind::Door).count();
        assert!(doors > 0);

        // Wall first, door second: the door overwrites the wall.
        model.elements.reverse();
        let result = Rasterizer::new(1.0).unwrap().process(&model).unwrap();
        assert_eq!(result.stack.grids[0].find(CellKind::Door).count(), doors);
    }

    #[test]
    fn test_stair_does_not_overwrite_wall() {
        let model = BuildingModel {
            elements: vec![
                wall("w1", 0.0, 0.0, 4.0, 0.5, 3.0),
                Element::new(ElementKind::Stair, "s1".into(), box_mesh(1.0, 0.0, 2.0, 0.5, 0.0, 1.0)),
            ],
            storeys: vec![storey(0.0)],
        };
        let result = Rasterizer::new(1.0).unwrap().process(&model).unwrap();
        assert_eq!(result.stack.grids[0].find(CellKind::Stair).count(), 0);
    }

    #[test]
    fn test_floor_heights_filtered() {
        let rasterizer = Rasterizer::new(0.5).unwrap();
        let mut bbox = BBox::empty();
        bbox.extend([0.0, 0.0, 0.0]);
        bbox.extend([10.0, 10.0, 6.0]);

        let floors = rasterizer.derive_floors(&[storey(0.0), storey(0.5), storey(3.0)], &bbox);
        assert_eq!(floors.len(), 2);
        assert_eq!(floors[0].elevation, 0.5);
        assert_eq!(floors[0].height, 2.5);
        assert_eq!(floors[1].elevation, 3.0);
        assert_eq!(floors[1].height, 3.0);
    }

    #[test]
    fn test_floors_synthesized_without_metadata() {
        let rasterizer = Rasterizer::new(0.5).unwrap();
        let mut bbox = BBox::empty();
        bbox.extend([0.0, 0.0, 0.0]);
        bbox.extend([10.0, 10.0, 9.0]);

        let floors = rasterizer.derive_floors(&[], &bbox);
        assert_eq!(floors.len(), 3);
        assert_eq!(floors[0].elevation, 0.0);
        assert_eq!(floors[1].elevation, 3.0);
        assert_eq!(floors[2].elevation, 6.0);
        assert!(floors.iter().all(|floor| floor.height == 3.0));

        // Same when every storey lies outside the bounding box.
        let floors = rasterizer.derive_floors(&[storey(100.0)], &bbox);
        assert_eq!(floors.len(), 3);
    }

    #[test]
    fn test_single_floor_fallback() {
        let rasterizer = Rasterizer::new(0.5).unwrap();
        let mut bbox = BBox::empty();
        bbox.extend([0.0, 0.0, 0.0]);
        bbox.extend([10.0, 10.0, 20.0]);

        // The only storey spans 20 units, which the height filter rejects.
        let floors = rasterizer.derive_floors(&[storey(0.0)], &bbox);
        assert_eq!(floors.len(), 1);
        assert_eq!(floors[0].elevation, 0.0);
        assert_eq!(floors[0].height, 20.0);
    }

    #[test]
    fn test_millimeter_heuristic() {
        let model = BuildingModel {
            elements: vec![wall("w1", 0.0, 0.0, 50_000.0, 500.0, 3000.0)],
            storeys: vec![storey(0.0)],
        };
        let result = Rasterizer::new(0.2).unwrap().process(&model).unwrap();
        let stack = &result.stack;
        assert_eq!(stack.unit_size, 0.001);
        assert_eq!(stack.cell_size, 200.0);
        assert_le!(stack.cols(), 300);
        assert!(stack.grids[0].find(CellKind::Wall).count() > 0);
    }

    #[test]
    fn test_element_without_geometry_is_skipped() {
        let model = BuildingModel {
            elements: vec![
                wall("w1", 0.0, 0.0, 4.0, 0.5, 3.0),
                Element::new(ElementKind::Stair, "broken".into(), vec![]),
            ],
            storeys: vec![storey(0.0)],
        };
        let result = Rasterizer::new(1.0).unwrap().process(&model).unwrap();
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].element_id, "broken");
    }

    #[test]
    fn test_rejects_nonpositive_cell_size() {
        assert!(Rasterizer::new(0.0).is_err());
        assert!(Rasterizer::new(-1.0).is_err());
    }

    #[test]
    fn test_rejects_model_without_walls() {
        let model = BuildingModel {
            elements: vec![Element::new(
                ElementKind::Floor,
                "f1".into(),
                box_mesh(0.0, 0.0, 5.0, 5.0, 0.0, 0.2),
            )],
            storeys: vec![storey(0.0)],
        };
        assert!(Rasterizer::new(1.0).unwrap().process(&model).is_err());
    }
}
