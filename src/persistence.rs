//! Saving and loading diagrams in the `.kst` JSON format.
//!
//! ```json
//! {
//!     "nodes": [
//!         { "type": "CCTV", "pos": { "x": 100, "y": 100 }, "name": "CCTV", "characteristics": {} }
//!     ],
//!     "connections": [
//!         { "start": { "x": 100, "y": 100 }, "end": { "x": 300, "y": 100 } }
//!     ],
//!     "version": "1.0"
//! }
//! ```
//!
//! Connections are stored by endpoint position only. On load each endpoint is
//! matched to the first node sitting exactly at that position.

use crate::constants::FILE_FORMAT_VERSION;
use crate::error::Result;
use crate::graph::{Diagram, Grid};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// One node as written to disk. The icon is not stored; it follows from `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Device kind name
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    /// Node centre
    pub pos: Point,
    /// Display name; missing means "same as type"
    #[serde(default)]
    pub name: Option<String>,
    /// Configuration bag; missing means empty
    #[serde(default)]
    pub characteristics: Characteristics,
}

/// One connection as written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Position of the source node
    pub start: Point,
    /// Position of the destination node
    pub end: Point,
}

/// The top-level document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramFile {
    /// Placed nodes in insertion order
    pub nodes: Vec<NodeRecord>,
    /// Connections in creation order
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
    /// Format version
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    FILE_FORMAT_VERSION.to_string()
}

impl DiagramFile {
    /// Flattens a diagram into its on-disk form.
    pub fn from_diagram(diagram: &Diagram) -> Self {
        let nodes = diagram
            .nodes()
            .iter()
            .map(|node| NodeRecord {
                kind: node.kind.clone(),
                pos: node.position,
                name: Some(node.name.clone()),
                characteristics: node.characteristics.clone(),
            })
            .collect();

        let connections = diagram
            .resolved_connections()
            .map(|rc| ConnectionRecord {
                start: rc.start,
                end: rc.end,
            })
            .collect();

        Self {
            nodes,
            connections,
            version: default_version(),
        }
    }

    /// Rebuilds a diagram, assigning fresh ids and resolving connection endpoints by position.
    ///
    /// Connections whose endpoints match no node are dropped with a warning.
    pub fn into_diagram(self, grid: Grid) -> Diagram {
        if self.version != FILE_FORMAT_VERSION {
            log::warn!(
                "diagram file version {:?} differs from {FILE_FORMAT_VERSION}, loading anyway",
                self.version
            );
        }

        let mut diagram = Diagram::with_grid(grid);
        for record in self.nodes {
            let name = record
                .name
                .unwrap_or_else(|| record.kind.default_label());
            let position = record.pos.clamp_to_canvas();
            if position != record.pos {
                log::warn!(
                    "{} node at {:?} is off the canvas, moved to {position:?}",
                    record.kind,
                    record.pos
                );
            }
            let node = Node::new(record.kind, position)
                .with_name(name)
                .with_characteristics(record.characteristics);
            diagram.insert_node(node);
        }

        for record in self.connections {
            let from = diagram.node_at_position(record.start.clamp_to_canvas());
            let to = diagram.node_at_position(record.end.clamp_to_canvas());
            match (from, to) {
                (Some(from), Some(to)) => {
                    if let Err(err) = diagram.add_connection(from, to) {
                        log::warn!("skipping connection {record:?}: {err}");
                    }
                }
                _ => log::warn!("skipping dangling connection {record:?}"),
            }
        }
        diagram
    }

    /// Pretty JSON with four-space indentation.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(buf)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err).into())
    }

    /// Parses a document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Writes `diagram` to `path`, replacing any existing file.
///
/// The document is written to a sibling temporary file first and then renamed
/// over the target, so a failed save never leaves a truncated file behind.
pub fn save(diagram: &Diagram, path: &Path) -> Result<()> {
    let json = DiagramFile::from_diagram(diagram).to_json()?;
    let tmp = temp_path(path);
    fs::write(&tmp, json)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    log::info!(
        "saved {} node(s), {} connection(s) to {}",
        diagram.nodes().len(),
        diagram.connections().len(),
        path.display()
    );
    Ok(())
}

/// Reads a diagram from `path`. Nothing is returned unless the whole file parsed.
pub fn load(path: &Path, grid: Grid) -> Result<Diagram> {
    let json = fs::read_to_string(path)?;
    let diagram = DiagramFile::from_json(&json)?.into_diagram(grid);
    log::info!(
        "loaded {} node(s), {} connection(s) from {}",
        diagram.nodes().len(),
        diagram.connections().len(),
        path.display()
    );
    Ok(diagram)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
