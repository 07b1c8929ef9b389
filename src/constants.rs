//! Shared application-wide constants.
//! Centralizes tweakable values used across hit-testing, rendering and history.

// Node dimensions
/// Side length of a node's square body in canvas pixels.
pub const NODE_SIZE: i32 = 50;
/// Half of [`NODE_SIZE`]; the body extends this far from the node position on each axis.
pub const NODE_HALF_SIZE: i32 = NODE_SIZE / 2;
/// Vertical gap between the node body and its label.
pub const LABEL_GAP: i32 = 5;

// Connector anchor
/// Horizontal distance from the node's right edge to the connector anchor centre.
pub const CONNECTOR_OFFSET: i32 = 15;
/// Radius of the connector anchor hit circle.
pub const CONNECTOR_RADIUS: i32 = 6;

// Connections
/// Maximum perpendicular distance for a point to count as "on" a connection.
pub const CONNECTION_TOLERANCE: f64 = 5.0;
/// Length of the arrowhead sides.
pub const ARROW_SIZE: f64 = 10.0;
/// Stroke width for connection lines.
pub const CONNECTION_STROKE_WIDTH: f32 = 2.0;

// Canvas
/// Positions are clamped to `-CANVAS_LIMIT..=CANVAS_LIMIT` on each axis.
pub const CANVAS_LIMIT: i32 = 1_000_000;

// Grid
/// Default grid cell size in canvas pixels.
pub const GRID_SIZE: i32 = 50;

// Undo/redo
/// Maximum number of undo history entries to retain.
pub const MAX_UNDO_HISTORY: usize = 100;

// Files
/// Version string written into saved diagrams.
pub const FILE_FORMAT_VERSION: &str = "1.0";
/// Extension used for saved diagrams.
pub const FILE_EXTENSION: &str = "kst";
