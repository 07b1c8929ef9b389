//! The diagram graph store: placed nodes, the connections between them and grid snapping.
//!
//! Nodes are kept in insertion order because hit-testing resolves overlaps in favour of
//! the earliest node. Connections reference nodes by id; their endpoint positions are
//! looked up live, so moving a node always drags its connections along.

use crate::constants::GRID_SIZE;
use crate::error::{DiagramError, Result};
use crate::geometry;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Grid quantization settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    /// Cell size in canvas pixels
    pub size: i32,
    /// Whether positions are snapped to the grid
    pub snap_enabled: bool,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            size: GRID_SIZE,
            snap_enabled: true,
        }
    }
}

impl Grid {
    /// Keeps `point` on the canvas and snaps it when snapping is enabled.
    pub fn apply(&self, point: Point) -> Point {
        let point = point.clamp_to_canvas();
        if self.snap_enabled {
            geometry::snap(point, self.size)
        } else {
            point
        }
    }
}

/// A connection with both endpoint positions resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedConnection<'a> {
    /// The stored connection
    pub connection: &'a Connection,
    /// Current position of the source node
    pub start: Point,
    /// Current position of the destination node
    pub end: Point,
}

/// The node list and connection list that make up one diagram.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagram {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    /// Snap settings applied to placements and moves
    pub grid: Grid,
}

impl Diagram {
    /// Creates an empty diagram with default grid settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty diagram using the given grid settings.
    pub fn with_grid(grid: Grid) -> Self {
        Self {
            grid,
            ..Self::default()
        }
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All connections, in creation order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Whether the diagram has no nodes and no connections.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connections.is_empty()
    }

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Index of a node in insertion order.
    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    /// Looks up a connection by id.
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// Index of a connection in creation order.
    pub fn connection_index(&self, id: ConnectionId) -> Option<usize> {
        self.connections.iter().position(|c| c.id == id)
    }

    /// Places a new node of `kind`, snapping the position if enabled.
    ///
    /// The node gets a fresh id and the kind's default label.
    pub fn add_node(&mut self, kind: DeviceKind, position: Point) -> NodeId {
        let node = Node::new(kind, self.grid.apply(position));
        self.insert_node(node)
    }

    /// Appends an already constructed node without snapping it.
    pub fn insert_node(&mut self, mut node: Node) -> NodeId {
        node.position = node.position.clamp_to_canvas();
        let id = node.id;
        self.nodes.push(node);
        id
    }

    /// Inserts a node at `index` (clamped), used to restore deletions in place.
    pub(crate) fn insert_node_at(&mut self, index: usize, node: Node) {
        let index = index.min(self.nodes.len());
        self.nodes.insert(index, node);
    }

    /// Removes a node and every connection touching it.
    ///
    /// Returns the removed node together with the removed connections (in their
    /// original order), or `None` if the node does not exist.
    pub fn remove_node(&mut self, id: NodeId) -> Option<(Node, Vec<Connection>)> {
        let index = self.node_index(id)?;
        let node = self.nodes.remove(index);

        let (removed, kept): (Vec<Connection>, Vec<Connection>) =
            std::mem::take(&mut self.connections)
                .into_iter()
                .partition(|c| c.touches(id));
        self.connections = kept;

        Some((node, removed))
    }

    /// Moves a node, snapping the target if enabled.
    ///
    /// Connection endpoints follow automatically. Returns the previous position.
    pub fn move_node(&mut self, id: NodeId, position: Point) -> Result<Point> {
        let snapped = self.grid.apply(position);
        self.set_node_position(id, snapped)
    }

    /// Sets a node position, bypassing the grid. Returns the previous position.
    pub(crate) fn set_node_position(&mut self, id: NodeId, position: Point) -> Result<Point> {
        let node = self.node_mut(id).ok_or(DiagramError::UnknownNode(id))?;
        Ok(std::mem::replace(&mut node.position, position.clamp_to_canvas()))
    }

    /// Connects `from` to `to`. Both nodes must exist.
    pub fn add_connection(&mut self, from: NodeId, to: NodeId) -> Result<ConnectionId> {
        let connection = Connection::new(from, to);
        let id = connection.id;
        self.insert_connection(self.connections.len(), connection)?;
        Ok(id)
    }

    /// Inserts an existing connection at `index` (clamped) after validating its endpoints.
    pub(crate) fn insert_connection(&mut self, index: usize, connection: Connection) -> Result<()> {
        for endpoint in [connection.from, connection.to] {
            if self.node(endpoint).is_none() {
                return Err(DiagramError::UnknownNode(endpoint));
            }
        }
        let index = index.min(self.connections.len());
        self.connections.insert(index, connection);
        Ok(())
    }

    /// Removes a connection, returning it with its former index.
    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<(Connection, usize)> {
        let index = self.connection_index(id)?;
        Some((self.connections.remove(index), index))
    }

    /// Renames a node. Returns the previous name.
    pub fn rename_node(&mut self, id: NodeId, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DiagramError::EmptyName);
        }
        let node = self.node_mut(id).ok_or(DiagramError::UnknownNode(id))?;
        Ok(std::mem::replace(&mut node.name, name.to_string()))
    }

    /// Replaces a node's characteristics bag. Returns the previous bag.
    pub fn set_characteristics(
        &mut self,
        id: NodeId,
        characteristics: Characteristics,
    ) -> Result<Characteristics> {
        let node = self.node_mut(id).ok_or(DiagramError::UnknownNode(id))?;
        Ok(std::mem::replace(&mut node.characteristics, characteristics))
    }

    /// Turns snapping on or off. Turning it on re-snaps every existing node.
    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.grid.snap_enabled = enabled;
        if enabled {
            let grid = self.grid;
            for node in &mut self.nodes {
                node.position = grid.apply(node.position);
            }
        }
    }

    /// Resolves the endpoint positions of a connection.
    pub fn resolve(&self, connection: &Connection) -> Option<(Point, Point)> {
        let start = self.node(connection.from)?.position;
        let end = self.node(connection.to)?.position;
        Some((start, end))
    }

    /// Iterates over connections with their current endpoint positions.
    pub fn resolved_connections(&self) -> impl Iterator<Item = ResolvedConnection<'_>> {
        self.connections.iter().filter_map(move |connection| {
            self.resolve(connection).map(|(start, end)| ResolvedConnection {
                connection,
                start,
                end,
            })
        })
    }

    /// First node (in insertion order) whose body contains `point`.
    pub fn find_node_at(&self, point: Point) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| geometry::node_contains(n.position, point))
            .map(|n| n.id)
    }

    /// First node (in insertion order) whose connector anchor contains `point`.
    pub fn find_connector_at(&self, point: Point) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| geometry::connector_contains(n.position, point))
            .map(|n| n.id)
    }

    /// First node whose anchor or body contains `point`, anchors taking priority.
    pub fn find_target_at(&self, point: Point) -> Option<(NodeId, bool)> {
        self.find_connector_at(point)
            .map(|id| (id, true))
            .or_else(|| self.find_node_at(point).map(|id| (id, false)))
    }

    /// First connection whose segment passes within the hit tolerance of `point`.
    pub fn find_connection_near(&self, point: Point) -> Option<ConnectionId> {
        self.resolved_connections()
            .find(|rc| geometry::segment_near(point, rc.start, rc.end))
            .map(|rc| rc.connection.id)
    }

    /// Closest node of `kind` to `point`, excluding `exclude`. Earlier nodes win ties.
    pub fn nearest_of_kind(&self, kind: &DeviceKind, point: Point, exclude: NodeId) -> Option<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.id != exclude && &n.kind == kind)
            .fold(None::<(&Node, i64)>, |best, n| {
                let d = n.position.distance_squared(point);
                match best {
                    Some((_, best_d)) if best_d <= d => best,
                    _ => Some((n, d)),
                }
            })
            .map(|(n, _)| n.id)
    }

    /// First node (in insertion order) positioned exactly at `point`.
    pub fn node_at_position(&self, point: Point) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.position == point).map(|n| n.id)
    }
}
