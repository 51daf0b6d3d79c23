/// Cells of empty margin added on each side of the rasterized footprint.
pub const GRID_MARGIN: usize = 3;

/// Cells of padding kept around the occupied area when trimming grids.
pub const TRIM_PADDING: usize = 1;

/// Largest building span along one axis (meters) considered plausible.
pub const MAX_REASONABLE_SPAN: f64 = 1000.0;

/// Horizontal grids larger than this per axis trigger the millimeter heuristic.
pub const MAX_GRID_CELLS: usize = 10_000;

/// Assumed storey height (meters) when synthesizing floors without metadata.
pub const DEFAULT_FLOOR_HEIGHT: f64 = 3.0;

/// Storeys with derived heights outside this range (meters) are discarded.
pub const MIN_FLOOR_HEIGHT: f64 = 1.6;
pub const MAX_FLOOR_HEIGHT: f64 = 10.0;

/// Vertical extension (meters) applied to floor and stair meshes so they
/// straddle their storey plane.
pub const SLAB_EXTENSION: f64 = 1.5;

/// Storey plane window: an element touches a storey when its z-range covers
/// `[elevation + STOREY_WINDOW_ABOVE_MIN, elevation + STOREY_WINDOW_BELOW_MAX]`.
pub const STOREY_WINDOW_BELOW_MAX: f64 = 2.0;
pub const STOREY_WINDOW_ABOVE_MIN: f64 = 0.1;

/// Inflation (meters) applied to the shorter axis of a door rectangle so
/// slightly overlong walls do not block the opening.
pub const DOOR_INFLATION: f64 = 0.1;

/// Stair slope used to estimate the horizontal run of a stair flight.
pub const STAIR_ANGLE_DEG: f64 = 55.0;

/// Number of evenly spaced compass directions probed by the stair angle check.
pub const STAIR_DIRECTIONS: usize = 16;

/// Base traversal cost of ordinary cells.
pub const PLAIN_COST: f64 = 1.0;

/// Base traversal cost of doors and stairs when cost minimization is on.
pub const TRANSIT_COST: f64 = 4.0;

/// Heuristic penalty per storey of vertical separation.
pub const FLOOR_CHANGE_PENALTY: f64 = 3.0;
