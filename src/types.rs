//! Core data types for the traffic topology diagram.
//!
//! This module defines the fundamental structures placed on the canvas: device nodes,
//! the directed connections between them, and the integer coordinates they live at.

use crate::constants::CANVAS_LIMIT;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for diagram nodes.
pub type NodeId = Uuid;

/// Unique identifier for connections.
pub type ConnectionId = Uuid;

/// Open property bag attached to a node (IP, port, credentials, per-kind metadata).
///
/// The diagram model never interprets its contents; the matching configuration
/// editor owns the field semantics.
pub type Characteristics = serde_json::Map<String, serde_json::Value>;

/// A canvas-local integer coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate, growing to the right
    pub x: i32,
    /// Vertical coordinate, growing downwards
    pub y: i32,
}

impl Point {
    /// Creates a point from its coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this point shifted by `(dx, dy)`.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// This point pulled inside the usable canvas area.
    pub fn clamp_to_canvas(self) -> Self {
        Self {
            x: self.x.clamp(-CANVAS_LIMIT, CANVAS_LIMIT),
            y: self.y.clamp(-CANVAS_LIMIT, CANVAS_LIMIT),
        }
    }

    /// Squared Euclidean distance to `other`, widened to avoid overflow.
    pub fn distance_squared(self, other: Point) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// The category of a placed device.
///
/// Each kind has its own icon and, for some kinds, its own configuration dialog.
/// Unknown names read from a file are preserved as [`DeviceKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceKind {
    /// Traffic camera
    Cctv,
    /// Red-light enforcement camera
    Redlight,
    /// Firn detector
    Firn,
    /// Traffic-phase electronics
    Tpe,
    /// Junction controller
    Controller,
    /// BasiQ optimisation algorithm module
    BasiQ,
    /// Any other device name found in a diagram file
    Other(String),
}

impl DeviceKind {
    /// Kinds offered by the device palette, in display order.
    pub const PALETTE: [DeviceKind; 6] = [
        DeviceKind::Cctv,
        DeviceKind::Redlight,
        DeviceKind::Firn,
        DeviceKind::Tpe,
        DeviceKind::Controller,
        DeviceKind::BasiQ,
    ];

    /// The canonical name, as written to diagram files.
    pub fn as_str(&self) -> &str {
        match self {
            DeviceKind::Cctv => "CCTV",
            DeviceKind::Redlight => "Redlight",
            DeviceKind::Firn => "Firn",
            DeviceKind::Tpe => "TPE",
            DeviceKind::Controller => "Controller",
            DeviceKind::BasiQ => "BasiQ",
            DeviceKind::Other(name) => name,
        }
    }

    /// Label given to a freshly placed node of this kind.
    pub fn default_label(&self) -> String {
        self.as_str().to_string()
    }

    /// Icon location, derived purely from the kind name.
    pub fn icon_path(&self) -> String {
        format!("assets/icons/{}.png", self.as_str().to_lowercase())
    }

    /// Whether double-clicking this kind opens a configuration dialog.
    pub fn has_config_dialog(&self) -> bool {
        matches!(
            self,
            DeviceKind::Cctv | DeviceKind::Tpe | DeviceKind::Controller | DeviceKind::BasiQ
        )
    }
}

impl From<String> for DeviceKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "CCTV" => DeviceKind::Cctv,
            "Redlight" => DeviceKind::Redlight,
            "Firn" => DeviceKind::Firn,
            "TPE" => DeviceKind::Tpe,
            "Controller" => DeviceKind::Controller,
            "BasiQ" => DeviceKind::BasiQ,
            _ => DeviceKind::Other(name),
        }
    }
}

impl From<&str> for DeviceKind {
    fn from(name: &str) -> Self {
        DeviceKind::from(name.to_string())
    }
}

impl From<DeviceKind> for String {
    fn from(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A device icon placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier, used for undo targeting and connection endpoints
    pub id: NodeId,
    /// Device category
    pub kind: DeviceKind,
    /// Centre of the node in canvas coordinates
    pub position: Point,
    /// User-visible name
    pub name: String,
    /// Configuration owned by the per-kind dialog
    pub characteristics: Characteristics,
}

impl Node {
    /// Creates a node with a fresh id, the kind's default label and no characteristics.
    pub fn new(kind: DeviceKind, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: kind.default_label(),
            kind,
            position,
            characteristics: Characteristics::new(),
        }
    }

    /// Builder-style override of the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder-style override of the characteristics bag.
    pub fn with_characteristics(mut self, characteristics: Characteristics) -> Self {
        self.characteristics = characteristics;
        self
    }
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Stable identifier
    pub id: ConnectionId,
    /// ID of the source node
    pub from: NodeId,
    /// ID of the destination node
    pub to: NodeId,
}

impl Connection {
    /// Creates a new connection between two nodes.
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
        }
    }

    /// Whether `node_id` is either endpoint.
    pub fn touches(&self, node_id: NodeId) -> bool {
        self.from == node_id || self.to == node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_creation_uses_kind_as_default_label() {
        let node = Node::new(DeviceKind::Cctv, Point::new(100, 200));

        assert_eq!(node.name, "CCTV");
        assert_eq!(node.position, Point::new(100, 200));
        assert!(node.characteristics.is_empty());
        assert!(!node.id.is_nil());
    }

    #[test]
    fn test_node_builders() {
        let mut bag = Characteristics::new();
        bag.insert("ip".into(), json!("10.0.0.7"));
        let node = Node::new(DeviceKind::Tpe, Point::default())
            .with_name("North junction")
            .with_characteristics(bag.clone());

        assert_eq!(node.name, "North junction");
        assert_eq!(node.characteristics, bag);
    }

    #[test]
    fn test_device_kind_string_mapping() {
        for kind in DeviceKind::PALETTE {
            let name: String = kind.clone().into();
            assert_eq!(DeviceKind::from(name), kind);
        }
        assert_eq!(
            DeviceKind::from("Radar"),
            DeviceKind::Other("Radar".to_string())
        );
        assert_eq!(DeviceKind::Other("Radar".into()).as_str(), "Radar");
    }

    #[test]
    fn test_icon_path_is_lowercased_kind() {
        assert_eq!(DeviceKind::Cctv.icon_path(), "assets/icons/cctv.png");
        assert_eq!(DeviceKind::BasiQ.icon_path(), "assets/icons/basiq.png");
        assert_eq!(
            DeviceKind::Other("Loop Sensor".into()).icon_path(),
            "assets/icons/loop sensor.png"
        );
    }

    #[test]
    fn test_config_dialog_kinds() {
        assert!(DeviceKind::Cctv.has_config_dialog());
        assert!(DeviceKind::Controller.has_config_dialog());
        assert!(!DeviceKind::Firn.has_config_dialog());
        assert!(!DeviceKind::Other("x".into()).has_config_dialog());
    }

    #[test]
    fn test_device_kind_serializes_as_string() {
        let value = serde_json::to_value(DeviceKind::Tpe).unwrap();
        assert_eq!(value, json!("TPE"));
        let kind: DeviceKind = serde_json::from_value(json!("Controller")).unwrap();
        assert_eq!(kind, DeviceKind::Controller);
    }

    #[test]
    fn test_connection_touches() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let connection = Connection::new(a, b);

        assert!(connection.touches(a));
        assert!(connection.touches(b));
        assert!(!connection.touches(Uuid::new_v4()));
    }

    #[test]
    fn test_point_helpers() {
        let p = Point::new(3, 4);
        assert_eq!(p.offset(1, -1), Point::new(4, 3));
        assert_eq!(Point::default().distance_squared(p), 25);
        assert_eq!(Point::from((7, 8)), Point::new(7, 8));
    }

    #[test]
    fn test_point_offset_saturates() {
        let p = Point::new(i32::MAX - 1, i32::MIN + 1).offset(10, -10);
        assert_eq!(p, Point::new(i32::MAX, i32::MIN));
        assert_eq!(p.clamp_to_canvas(), Point::new(1_000_000, -1_000_000));
    }
}
