//! Error types shared by the diagram core.

use crate::types::{ConnectionId, NodeId};
use thiserror::Error;

/// Errors produced by diagram editing, persistence and export.
///
/// Nothing here is fatal: callers either surface the message to the user
/// or ignore it, and the in-memory diagram is never left half-modified.
#[derive(Debug, Error)]
pub enum DiagramError {
    /// Reading or writing a file failed.
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),
    /// A diagram file could not be encoded or decoded.
    #[error("invalid diagram file: {0}")]
    Json(#[from] serde_json::Error),
    /// An operation referenced a node that is not in the diagram.
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    /// An operation referenced a connection that is not in the diagram.
    #[error("connection {0} does not exist")]
    UnknownConnection(ConnectionId),
    /// A rename was attempted with an empty label.
    #[error("node name cannot be empty")]
    EmptyName,
    /// Rendering the diagram to an image failed.
    #[error("export failed: {0}")]
    Export(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DiagramError>;
