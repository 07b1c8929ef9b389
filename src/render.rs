//! Render description: a plain-data snapshot of what the canvas should show.
//!
//! The snapshot is rebuilt from the diagram after every change and handed to a
//! drawing surface (the egui canvas, or the SVG exporter). Colours come from an
//! explicit [`Theme`] passed in by the caller.

use crate::constants::{ARROW_SIZE, CONNECTOR_RADIUS};
use crate::geometry::{self, Rect};
use crate::graph::Diagram;
use crate::interaction::Interaction;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// An opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `#rrggbb` notation.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Colour scheme of the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    /// Dark background, cyan accents
    #[default]
    Dark,
    /// White background, black lines
    Light,
}

/// Concrete colours for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Palette {
    pub background: Rgb,
    pub grid: Rgb,
    pub connection: Rgb,
    pub node_fill: Rgb,
    pub node_border: Rgb,
    /// Border of the node being dragged or connected from
    pub node_highlight: Rgb,
    pub text: Rgb,
    pub connector: Rgb,
}

impl Theme {
    /// The palette for this theme.
    pub fn palette(self) -> Palette {
        match self {
            Theme::Dark => Palette {
                background: Rgb(0x1a, 0x1a, 0x1a),
                grid: Rgb(0x33, 0x33, 0x33),
                connection: Rgb(0x00, 0xff, 0xff),
                node_fill: Rgb(0x2a, 0x2a, 0x2a),
                node_border: Rgb(0xff, 0xff, 0xff),
                node_highlight: Rgb(0x00, 0xff, 0xff),
                text: Rgb(0xff, 0xff, 0xff),
                connector: Rgb(0x00, 0xff, 0xff),
            },
            Theme::Light => Palette {
                background: Rgb(0xff, 0xff, 0xff),
                grid: Rgb(0x33, 0x33, 0x33),
                connection: Rgb(0x00, 0x00, 0x00),
                node_fill: Rgb(0xff, 0xff, 0xff),
                node_border: Rgb(0x00, 0x00, 0x00),
                node_highlight: Rgb(0x00, 0x78, 0xd7),
                text: Rgb(0x00, 0x00, 0x00),
                connector: Rgb(0x00, 0x78, 0xd7),
            },
        }
    }

    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// Grid lines to draw behind the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    /// Spacing between lines
    pub size: i32,
    /// Whether to draw the grid at all
    pub visible: bool,
    /// Whether placements snap to it
    pub snap_enabled: bool,
}

/// One node as it should appear.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct RenderNode {
    pub id: NodeId,
    pub kind: DeviceKind,
    pub label: String,
    pub icon_path: String,
    pub position: Point,
    pub body: Rect,
    /// Centre of the connector anchor, recomputed on every build
    pub connector: Point,
    pub connector_radius: i32,
    /// True for the source of a connection being drawn
    pub highlighted: bool,
}

/// A line between two points, optionally ending in an arrowhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct RenderLine {
    pub start: Point,
    pub end: Point,
    /// Triangle `[tip, left, right]`; `None` for provisional lines
    pub arrow_head: Option<[Point; 3]>,
}

impl RenderLine {
    /// A finished connection with an arrowhead at `end`.
    pub fn arrow(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            arrow_head: arrow_head(start, end),
        }
    }

    /// A provisional line without arrowhead.
    pub fn provisional(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            arrow_head: None,
        }
    }
}

/// Everything a drawing surface needs for one frame.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct RenderScene {
    pub palette: Palette,
    pub grid: GridSpec,
    pub nodes: Vec<RenderNode>,
    pub connections: Vec<(ConnectionId, RenderLine)>,
    /// The rubber-band line while a connection is being drawn
    pub rubber_band: Option<RenderLine>,
}

impl RenderScene {
    /// Builds the snapshot for the current diagram and gesture.
    pub fn build(diagram: &Diagram, interaction: &Interaction, theme: Theme, show_grid: bool) -> Self {
        let source = interaction.connection_source();

        let nodes = diagram
            .nodes()
            .iter()
            .map(|node| RenderNode {
                id: node.id,
                kind: node.kind.clone(),
                label: node.name.clone(),
                icon_path: node.kind.icon_path(),
                position: node.position,
                body: geometry::node_body(node.position),
                connector: geometry::connector_anchor(node.position),
                connector_radius: CONNECTOR_RADIUS,
                highlighted: source == Some(node.id),
            })
            .collect();

        let connections = diagram
            .resolved_connections()
            .map(|rc| (rc.connection.id, RenderLine::arrow(rc.start, rc.end)))
            .collect();

        let rubber_band = interaction
            .rubber_band(diagram)
            .map(|(start, end)| RenderLine::provisional(start, end));

        Self {
            palette: theme.palette(),
            grid: GridSpec {
                size: diagram.grid.size,
                visible: show_grid,
                snap_enabled: diagram.grid.snap_enabled,
            },
            nodes,
            connections,
            rubber_band,
        }
    }

    /// Smallest rectangle containing every node body and connector, if there are nodes.
    pub fn bounds(&self) -> Option<Rect> {
        let mut iter = self.nodes.iter();
        let first = iter.next()?;
        let extent = |n: &RenderNode| {
            (
                n.body.x,
                n.body.y,
                n.connector.x + n.connector_radius,
                n.body.y + n.body.height,
            )
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = extent(first);
        for node in iter {
            let (x0, y0, x1, y1) = extent(node);
            min_x = min_x.min(x0);
            min_y = min_y.min(y0);
            max_x = max_x.max(x1);
            max_y = max_y.max(y1);
        }
        Some(Rect {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }
}

/// Arrowhead triangle at `end`, pointing along `start -> end`. `None` for zero-length lines.
pub fn arrow_head(start: Point, end: Point) -> Option<[Point; 3]> {
    let dx = f64::from(end.x - start.x);
    let dy = f64::from(end.y - start.y);
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 {
        return None;
    }
    let (dx, dy) = (dx / length, dy / length);
    let (ex, ey) = (f64::from(end.x), f64::from(end.y));

    // Wings at 30 degrees either side of the line
    let left = Point::new(
        (ex - ARROW_SIZE * (dx * 0.866 + dy * 0.5)) as i32,
        (ey - ARROW_SIZE * (-dx * 0.5 + dy * 0.866)) as i32,
    );
    let right = Point::new(
        (ex - ARROW_SIZE * (dx * 0.866 - dy * 0.5)) as i32,
        (ey - ARROW_SIZE * (dx * 0.5 + dy * 0.866)) as i32,
    );
    Some([end, left, right])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::Modifiers;

    #[test]
    fn scene_lists_nodes_with_anchor_positions() {
        let mut diagram = Diagram::new();
        let id = diagram.add_node(DeviceKind::Cctv, Point::new(100, 100));

        let scene = RenderScene::build(&diagram, &Interaction::Idle, Theme::Dark, true);

        assert_eq!(scene.nodes.len(), 1);
        let node = &scene.nodes[0];
        assert_eq!(node.id, id);
        assert_eq!(node.label, "CCTV");
        assert_eq!(node.icon_path, "assets/icons/cctv.png");
        assert_eq!(node.connector, Point::new(140, 100));
        assert!(!node.highlighted);
        assert!(scene.grid.visible);
        assert_eq!(scene.grid.size, 50);
        assert!(scene.rubber_band.is_none());
    }

    #[test]
    fn connections_follow_node_positions_and_carry_arrows() {
        let mut diagram = Diagram::new();
        let a = diagram.add_node(DeviceKind::Cctv, Point::new(0, 0));
        let b = diagram.add_node(DeviceKind::Controller, Point::new(100, 0));
        diagram.add_connection(a, b).unwrap();

        let scene = RenderScene::build(&diagram, &Interaction::Idle, Theme::Light, false);

        let (_, line) = scene.connections[0];
        assert_eq!(line.start, Point::new(0, 0));
        assert_eq!(line.end, Point::new(100, 0));
        assert_eq!(
            line.arrow_head,
            Some([Point::new(100, 0), Point::new(91, 5), Point::new(91, -5)])
        );
        assert_eq!(scene.palette, Theme::Light.palette());
    }

    #[test]
    fn connecting_highlights_source_and_draws_rubber_band() {
        let mut diagram = Diagram::new();
        let a = diagram.add_node(DeviceKind::Cctv, Point::new(100, 100));
        let mut interaction = Interaction::Idle;
        interaction.pointer_down(&diagram, Point::new(140, 100), Modifiers::NONE);
        interaction.pointer_move(&mut diagram, Point::new(260, 180));

        let scene = RenderScene::build(&diagram, &interaction, Theme::Dark, true);

        assert!(scene.nodes.iter().find(|n| n.id == a).unwrap().highlighted);
        let band = scene.rubber_band.unwrap();
        assert_eq!(band.start, Point::new(140, 100));
        assert_eq!(band.end, Point::new(260, 180));
        assert!(band.arrow_head.is_none());
    }

    #[test]
    fn zero_length_line_has_no_arrow() {
        assert!(arrow_head(Point::new(5, 5), Point::new(5, 5)).is_none());
    }

    #[test]
    fn bounds_cover_bodies_and_connectors() {
        let mut diagram = Diagram::new();
        diagram.add_node(DeviceKind::Cctv, Point::new(0, 0));
        diagram.add_node(DeviceKind::Tpe, Point::new(100, 50));
        let scene = RenderScene::build(&diagram, &Interaction::Idle, Theme::Dark, true);

        assert_eq!(
            scene.bounds(),
            Some(Rect {
                x: -25,
                y: -25,
                width: 171,
                height: 100
            })
        );
        assert!(RenderScene::build(&Diagram::new(), &Interaction::Idle, Theme::Dark, true)
            .bounds()
            .is_none());
    }

    #[test]
    fn theme_toggles_and_formats_hex() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Dark.palette().connection.to_hex(), "#00ffff");
    }
}
