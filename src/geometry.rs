//! Hit-testing and grid quantization helpers.
//!
//! Everything here is a pure function of integer canvas coordinates so the
//! input layer and the renderer agree on where a node and its handle are.

use crate::constants::{
    CONNECTION_TOLERANCE, CONNECTOR_OFFSET, CONNECTOR_RADIUS, NODE_HALF_SIZE, NODE_SIZE,
};
use crate::types::Point;

/// Axis-aligned integer rectangle, min corner inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Horizontal extent
    pub width: i32,
    /// Vertical extent
    pub height: i32,
}

/// The square body of a node centred on `position`.
pub fn node_body(position: Point) -> Rect {
    Rect {
        x: position.x - NODE_HALF_SIZE,
        y: position.y - NODE_HALF_SIZE,
        width: NODE_SIZE,
        height: NODE_SIZE,
    }
}

/// Whether `point` falls strictly inside the body of a node at `position`.
pub fn node_contains(position: Point, point: Point) -> bool {
    (position.x - point.x).abs() < NODE_HALF_SIZE && (position.y - point.y).abs() < NODE_HALF_SIZE
}

/// Centre of the connector anchor: right edge plus the offset, vertically centred.
pub fn connector_anchor(position: Point) -> Point {
    let body = node_body(position);
    Point::new(body.x + body.width + CONNECTOR_OFFSET, body.y + body.height / 2)
}

/// Whether `point` is inside (or on) a circle.
pub fn circle_contains(center: Point, radius: i32, point: Point) -> bool {
    let r = i64::from(radius);
    center.distance_squared(point) <= r * r
}

/// Whether `point` hits the connector anchor of a node at `position`.
pub fn connector_contains(position: Point, point: Point) -> bool {
    circle_contains(connector_anchor(position), CONNECTOR_RADIUS, point)
}

/// Distance from `point` to the segment `start..end`.
///
/// Returns `None` for a zero-length segment, which cannot be hit.
pub fn point_to_segment_distance(point: Point, start: Point, end: Point) -> Option<f64> {
    let (sx, sy) = (f64::from(start.x), f64::from(start.y));
    let (lx, ly) = (f64::from(end.x) - sx, f64::from(end.y) - sy);
    let (px, py) = (f64::from(point.x) - sx, f64::from(point.y) - sy);

    let len_sq = lx * lx + ly * ly;
    if len_sq == 0.0 {
        return None;
    }

    // Project onto the segment, clamped to its endpoints
    let t = ((px * lx + py * ly) / len_sq).clamp(0.0, 1.0);
    let (dx, dy) = (px - lx * t, py - ly * t);
    Some((dx * dx + dy * dy).sqrt())
}

/// Whether `point` lies within the hit tolerance of the segment `start..end`.
pub fn segment_near(point: Point, start: Point, end: Point) -> bool {
    point_to_segment_distance(point, start, end).is_some_and(|d| d < CONNECTION_TOLERANCE)
}

/// Quantizes `point` to the nearest multiple of `grid_size` on each axis.
///
/// Halfway values round to the even multiple. A non-positive grid leaves the point unchanged.
pub fn snap(point: Point, grid_size: i32) -> Point {
    if grid_size <= 0 {
        return point;
    }
    let g = f64::from(grid_size);
    let quantize = |v: i32| ((f64::from(v) / g).round_ties_even() * g) as i32;
    Point::new(quantize(point.x), quantize(point.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_fifty_square_centred_on_position() {
        let body = node_body(Point::new(100, 100));
        assert_eq!(
            body,
            Rect {
                x: 75,
                y: 75,
                width: 50,
                height: 50
            }
        );
    }

    #[test]
    fn node_contains_is_strict_at_edges() {
        let pos = Point::new(100, 100);
        assert!(node_contains(pos, Point::new(100, 100)));
        assert!(node_contains(pos, Point::new(124, 76)));
        assert!(!node_contains(pos, Point::new(125, 100)));
        assert!(!node_contains(pos, Point::new(100, 75)));
    }

    #[test]
    fn connector_sits_right_of_body() {
        let anchor = connector_anchor(Point::new(100, 100));
        assert_eq!(anchor, Point::new(140, 100));
        assert!(connector_contains(Point::new(100, 100), Point::new(146, 100)));
        assert!(!connector_contains(Point::new(100, 100), Point::new(147, 100)));
        assert!(connector_contains(Point::new(100, 100), Point::new(144, 104)));
    }

    #[test]
    fn segment_distance_is_perpendicular_inside_and_clamped_outside() {
        let start = Point::new(0, 0);
        let end = Point::new(100, 0);
        assert_eq!(point_to_segment_distance(Point::new(50, 3), start, end), Some(3.0));
        assert_eq!(point_to_segment_distance(Point::new(110, 0), start, end), Some(10.0));
        assert!(segment_near(Point::new(50, 4), start, end));
        assert!(!segment_near(Point::new(50, 5), start, end));
    }

    #[test]
    fn degenerate_segment_never_matches() {
        let p = Point::new(10, 10);
        assert_eq!(point_to_segment_distance(p, p, p), None);
        assert!(!segment_near(p, p, p));
    }

    #[test]
    fn snap_rounds_to_grid() {
        assert_eq!(snap(Point::new(149, 101), 50), Point::new(150, 100));
        assert_eq!(snap(Point::new(-26, 24), 50), Point::new(-50, 0));
        // ties go to the even multiple
        assert_eq!(snap(Point::new(75, 125), 50), Point::new(100, 100));
        assert_eq!(snap(Point::new(7, 9), 0), Point::new(7, 9));
    }

    #[test]
    fn snap_is_idempotent() {
        for x in (-300..300).step_by(7) {
            for y in (-120..120).step_by(11) {
                let once = snap(Point::new(x, y), 50);
                assert_eq!(snap(once, 50), once);
                let once = snap(Point::new(x, y), 20);
                assert_eq!(snap(once, 20), once);
            }
        }
    }
}
