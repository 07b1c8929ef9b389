//! Pointer interaction state machine for the canvas.
//!
//! The machine is `Idle`, `Dragging` a node, or `Connecting` from a source node.
//! Pointer-down picks the mode, pointer-move updates it, pointer-up commits the
//! result to the diagram and records it in the undo history.

use crate::geometry;
use crate::graph::Diagram;
use crate::types::*;
use crate::undo::{UndoAction, UndoHistory};

/// Modifier keys held during a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Ctrl (Cmd on macOS)
    pub ctrl: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Modifiers = Modifiers { ctrl: false };
    /// Only Ctrl held.
    pub const CTRL: Modifiers = Modifiers { ctrl: true };
}

/// What the pointer is currently doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interaction {
    /// Nothing in progress
    #[default]
    Idle,
    /// A node follows the pointer
    Dragging {
        /// Node being dragged
        node: NodeId,
        /// Offset from the pointer to the node centre, kept for the whole drag
        anchor_offset: (i32, i32),
        /// Position before the drag started, recorded for undo on release
        origin: Point,
    },
    /// A connection is being drawn from `source`
    Connecting {
        /// Node the connection starts at
        source: NodeId,
        /// Latest pointer position, end of the rubber-band line
        pointer: Point,
    },
}

/// How much a pointer event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Nothing visible changed
    None,
    /// Only transient state (drag preview, rubber band) changed
    Transient,
    /// The diagram was edited and an undo record was pushed
    Edit,
}

impl Change {
    /// Whether the canvas needs repainting.
    pub fn needs_redraw(self) -> bool {
        self != Change::None
    }
}

impl Interaction {
    /// Whether no gesture is in progress.
    pub fn is_idle(&self) -> bool {
        matches!(self, Interaction::Idle)
    }

    /// The node a connection is being drawn from, if any.
    pub fn connection_source(&self) -> Option<NodeId> {
        match self {
            Interaction::Connecting { source, .. } => Some(*source),
            _ => None,
        }
    }

    /// The node being dragged, if any.
    pub fn dragged_node(&self) -> Option<NodeId> {
        match self {
            Interaction::Dragging { node, .. } => Some(*node),
            _ => None,
        }
    }

    /// Starts a gesture. Connector anchors win over node bodies; Ctrl on a body also connects.
    pub fn pointer_down(&mut self, diagram: &Diagram, point: Point, modifiers: Modifiers) -> Change {
        if !self.is_idle() {
            return Change::None;
        }
        let Some((node_id, on_connector)) = diagram.find_target_at(point) else {
            return Change::None;
        };
        let Some(node) = diagram.node(node_id) else {
            return Change::None;
        };

        *self = if on_connector || modifiers.ctrl {
            Interaction::Connecting {
                source: node_id,
                pointer: point,
            }
        } else {
            Interaction::Dragging {
                node: node_id,
                anchor_offset: (node.position.x - point.x, node.position.y - point.y),
                origin: node.position,
            }
        };
        Change::Transient
    }

    /// Continues a gesture: drags the node (snapping if enabled) or moves the rubber band.
    pub fn pointer_move(&mut self, diagram: &mut Diagram, point: Point) -> Change {
        match self {
            Interaction::Idle => Change::None,
            Interaction::Dragging {
                node,
                anchor_offset: (dx, dy),
                ..
            } => match diagram.move_node(*node, point.offset(*dx, *dy)) {
                Ok(_) => Change::Transient,
                Err(err) => {
                    log::warn!("drag target vanished: {err}");
                    *self = Interaction::Idle;
                    Change::Transient
                }
            },
            Interaction::Connecting { pointer, .. } => {
                *pointer = point;
                Change::Transient
            }
        }
    }

    /// Finishes a gesture, recording the move or the new connection.
    pub fn pointer_up(&mut self, diagram: &mut Diagram, history: &mut UndoHistory, point: Point) -> Change {
        match std::mem::take(self) {
            Interaction::Idle => Change::None,
            Interaction::Dragging { node, origin, .. } => {
                let moved = diagram.node(node).is_some_and(|n| n.position != origin);
                if moved {
                    history.push_action(UndoAction::NodeMoved {
                        node_id: node,
                        position: origin,
                    });
                    Change::Edit
                } else {
                    Change::Transient
                }
            }
            Interaction::Connecting { source, .. } => {
                let Some(target) = connection_target(diagram, source, point) else {
                    log::debug!("connection from {source} dropped on empty canvas");
                    return Change::Transient;
                };
                match diagram.add_connection(source, target) {
                    Ok(id) => {
                        if let Some(connection) = diagram.connection(id).cloned() {
                            history.push_action(UndoAction::ConnectionAdded { connection });
                        }
                        Change::Edit
                    }
                    Err(err) => {
                        log::warn!("could not connect {source} to {target}: {err}");
                        Change::Transient
                    }
                }
            }
        }
    }

    /// Abandons the current gesture, putting a dragged node back where it started.
    pub fn cancel(&mut self, diagram: &mut Diagram) -> Change {
        match std::mem::take(self) {
            Interaction::Idle => Change::None,
            Interaction::Dragging { node, origin, .. } => {
                if let Err(err) = diagram.set_node_position(node, origin) {
                    log::warn!("could not restore dragged node: {err}");
                }
                Change::Transient
            }
            Interaction::Connecting { .. } => Change::Transient,
        }
    }

    /// The provisional line from the source's connector anchor to the pointer.
    pub fn rubber_band(&self, diagram: &Diagram) -> Option<(Point, Point)> {
        match self {
            Interaction::Connecting { source, pointer } => diagram
                .node(*source)
                .map(|n| (geometry::connector_anchor(n.position), *pointer)),
            _ => None,
        }
    }
}

/// First node other than `source` whose body or connector contains `point`.
fn connection_target(diagram: &Diagram, source: NodeId, point: Point) -> Option<NodeId> {
    diagram
        .nodes()
        .iter()
        .filter(|n| n.id != source)
        .find(|n| {
            geometry::node_contains(n.position, point)
                || geometry::connector_contains(n.position, point)
        })
        .map(|n| n.id)
}

/// What a right-click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextTarget {
    /// A node body
    Node(NodeId),
    /// A connection line
    Connection(ConnectionId),
}

/// Entries offered by the canvas context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextAction {
    /// Rename the node
    Rename,
    /// Delete the node and its connections
    DeleteNode,
    /// Launch a terminal emulator
    OpenTerminal,
    /// Delete the connection
    DeleteConnection,
}

impl ContextAction {
    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            ContextAction::Rename => "Rename",
            ContextAction::DeleteNode => "Delete",
            ContextAction::OpenTerminal => "Open Terminal",
            ContextAction::DeleteConnection => "Delete Connection",
        }
    }
}

impl ContextTarget {
    /// Finds the context target under `point`; nodes win over connections.
    pub fn at(diagram: &Diagram, point: Point) -> Option<Self> {
        diagram
            .find_node_at(point)
            .map(ContextTarget::Node)
            .or_else(|| diagram.find_connection_near(point).map(ContextTarget::Connection))
    }

    /// Actions available for this target, in menu order.
    pub fn actions(self) -> &'static [ContextAction] {
        match self {
            ContextTarget::Node(_) => &[
                ContextAction::Rename,
                ContextAction::DeleteNode,
                ContextAction::OpenTerminal,
            ],
            ContextTarget::Connection(_) => &[ContextAction::DeleteConnection],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Diagram, UndoHistory, NodeId, NodeId) {
        let mut diagram = Diagram::new();
        let a = diagram.add_node(DeviceKind::Cctv, Point::new(100, 100));
        let b = diagram.add_node(DeviceKind::Controller, Point::new(300, 100));
        (diagram, UndoHistory::new(), a, b)
    }

    #[test]
    fn press_on_body_starts_drag() {
        let (diagram, _, a, _) = setup();
        let mut interaction = Interaction::Idle;

        interaction.pointer_down(&diagram, Point::new(110, 95), Modifiers::NONE);

        assert_eq!(
            interaction,
            Interaction::Dragging {
                node: a,
                anchor_offset: (-10, 5),
                origin: Point::new(100, 100),
            }
        );
    }

    #[test]
    fn press_on_connector_or_ctrl_body_starts_connecting() {
        let (diagram, _, a, _) = setup();
        let mut interaction = Interaction::Idle;
        interaction.pointer_down(&diagram, Point::new(140, 100), Modifiers::NONE);
        assert_eq!(interaction.connection_source(), Some(a));

        let mut interaction = Interaction::Idle;
        interaction.pointer_down(&diagram, Point::new(100, 100), Modifiers::CTRL);
        assert_eq!(interaction.connection_source(), Some(a));
    }

    #[test]
    fn press_on_empty_canvas_stays_idle() {
        let (diagram, _, _, _) = setup();
        let mut interaction = Interaction::Idle;
        let change = interaction.pointer_down(&diagram, Point::new(700, 700), Modifiers::NONE);
        assert_eq!(change, Change::None);
        assert!(interaction.is_idle());
    }

    #[test]
    fn drag_moves_live_and_records_one_undo_on_release() {
        let (mut diagram, mut history, a, b) = setup();
        let conn = diagram.add_connection(a, b).unwrap();
        let mut interaction = Interaction::Idle;

        interaction.pointer_down(&diagram, Point::new(100, 100), Modifiers::NONE);
        interaction.pointer_move(&mut diagram, Point::new(130, 160));
        assert_eq!(diagram.node(a).unwrap().position, Point::new(150, 150));
        let (start, _) = diagram.resolve(diagram.connection(conn).unwrap()).unwrap();
        assert_eq!(start, Point::new(150, 150));
        interaction.pointer_move(&mut diagram, Point::new(205, 210));
        assert_eq!(history.undo_len(), 0);

        let change = interaction.pointer_up(&mut diagram, &mut history, Point::new(205, 210));

        assert_eq!(change, Change::Edit);
        assert!(interaction.is_idle());
        assert_eq!(history.undo_len(), 1);
        assert_eq!(diagram.node(a).unwrap().position, Point::new(200, 200));
        history.undo(&mut diagram);
        assert_eq!(diagram.node(a).unwrap().position, Point::new(100, 100));
    }

    #[test]
    fn click_without_movement_records_nothing() {
        let (mut diagram, mut history, _, _) = setup();
        let mut interaction = Interaction::Idle;
        interaction.pointer_down(&diagram, Point::new(100, 100), Modifiers::NONE);
        let change = interaction.pointer_up(&mut diagram, &mut history, Point::new(100, 100));
        assert_eq!(change, Change::Transient);
        assert_eq!(history.undo_len(), 0);
    }

    #[test]
    fn connecting_creates_connection_on_release_over_node() {
        let (mut diagram, mut history, a, b) = setup();
        let mut interaction = Interaction::Idle;
        interaction.pointer_down(&diagram, Point::new(140, 100), Modifiers::NONE);
        interaction.pointer_move(&mut diagram, Point::new(250, 120));
        assert_eq!(
            interaction.rubber_band(&diagram),
            Some((Point::new(140, 100), Point::new(250, 120)))
        );
        assert!(diagram.connections().is_empty());

        let change = interaction.pointer_up(&mut diagram, &mut history, Point::new(305, 95));

        assert_eq!(change, Change::Edit);
        assert_eq!(diagram.connections().len(), 1);
        assert_eq!(diagram.connections()[0].from, a);
        assert_eq!(diagram.connections()[0].to, b);
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn release_on_target_connector_also_connects() {
        let (mut diagram, mut history, _, b) = setup();
        let mut interaction = Interaction::Idle;
        interaction.pointer_down(&diagram, Point::new(100, 100), Modifiers::CTRL);
        interaction.pointer_up(&mut diagram, &mut history, Point::new(340, 100));
        assert_eq!(diagram.connections()[0].to, b);
    }

    #[test]
    fn connecting_aborts_over_empty_canvas_or_source() {
        let (mut diagram, mut history, _, _) = setup();
        let mut interaction = Interaction::Idle;
        interaction.pointer_down(&diagram, Point::new(140, 100), Modifiers::NONE);
        interaction.pointer_up(&mut diagram, &mut history, Point::new(600, 600));
        assert!(diagram.connections().is_empty());

        interaction.pointer_down(&diagram, Point::new(100, 100), Modifiers::CTRL);
        interaction.pointer_up(&mut diagram, &mut history, Point::new(100, 100));
        assert!(diagram.connections().is_empty());
        assert_eq!(history.undo_len(), 0);
        assert!(interaction.is_idle());
    }

    #[test]
    fn cancel_restores_drag_origin() {
        let (mut diagram, _, a, _) = setup();
        let mut interaction = Interaction::Idle;
        interaction.pointer_down(&diagram, Point::new(100, 100), Modifiers::NONE);
        interaction.pointer_move(&mut diagram, Point::new(400, 400));
        interaction.cancel(&mut diagram);
        assert_eq!(diagram.node(a).unwrap().position, Point::new(100, 100));
        assert!(interaction.is_idle());
    }

    #[test]
    fn cancel_after_dragged_node_vanished_goes_idle() {
        let (mut diagram, _, a, b) = setup();
        let mut interaction = Interaction::Idle;
        interaction.pointer_down(&diagram, Point::new(100, 100), Modifiers::NONE);
        diagram.remove_node(a);

        assert_eq!(interaction.cancel(&mut diagram), Change::Transient);
        assert!(interaction.is_idle());
        assert_eq!(diagram.nodes().len(), 1);
        assert!(diagram.node(b).is_some());
    }

    #[test]
    fn context_target_prefers_nodes() {
        let (mut diagram, _, a, b) = setup();
        let conn = diagram.add_connection(a, b).unwrap();

        assert_eq!(
            ContextTarget::at(&diagram, Point::new(110, 100)),
            Some(ContextTarget::Node(a))
        );
        assert_eq!(
            ContextTarget::at(&diagram, Point::new(200, 102)),
            Some(ContextTarget::Connection(conn))
        );
        assert_eq!(ContextTarget::at(&diagram, Point::new(200, 300)), None);
        assert_eq!(
            ContextTarget::Node(a).actions(),
            &[
                ContextAction::Rename,
                ContextAction::DeleteNode,
                ContextAction::OpenTerminal
            ]
        );
        assert_eq!(ContextAction::DeleteConnection.label(), "Delete Connection");
    }
}
