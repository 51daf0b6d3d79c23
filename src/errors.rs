use thiserror::Error;

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum EgressError {
    #[error("grids in a stack must all have the same shape")]
    GridShapeMismatch,
    #[error("cell size must be positive")]
    InvalidCellSize,
    #[error("a grid stack requires at least one floor")]
    NoFloors,
    #[error("floor elevations must be strictly increasing")]
    UnsortedFloors,
    #[error("cell ({row}, {col}) on floor {floor} is out of grid bounds")]
    CellOutOfBounds { floor: usize, row: usize, col: usize },
    #[error("no wall geometry to compute the bounding box from")]
    NoWallGeometry,
    #[error("element {element_id} has no usable geometry")]
    EmptyGeometry { element_id: String },
    #[error("graph has not been created yet")]
    GraphNotCreated,
}
