//! Undo/redo functionality for tracking and reversing diagram edits.
//!
//! Every record describes how to reverse one forward edit. Applying a record
//! returns its own inverse, so undo and redo share a single code path: undo
//! applies a record from the undo stack and parks the inverse on the redo stack,
//! redo does the opposite.

use crate::constants::MAX_UNDO_HISTORY;
use crate::graph::Diagram;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Represents different types of edits that can be undone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UndoAction {
    /// A node was placed; reversing removes it
    NodeAdded {
        node: Node,
        index: usize,
    },
    /// A node was deleted; reversing puts it back at `index`.
    /// Incident connections are restored by their own records.
    NodeDeleted {
        node: Node,
        index: usize,
    },
    /// A node moved; reversing swaps `position` with the current one
    NodeMoved {
        node_id: NodeId,
        position: Point,
    },
    /// A connection was drawn
    ConnectionAdded {
        connection: Connection,
    },
    /// A connection was deleted, directly or as part of deleting a node
    ConnectionDeleted {
        connection: Connection,
        index: usize,
    },
    /// A node's name was changed
    NodeRenamed {
        node_id: NodeId,
        name: String,
    },
    /// A node's characteristics were replaced by its configuration dialog
    CharacteristicsChanged {
        node_id: NodeId,
        characteristics: Characteristics,
    },
}

/// Manages undo/redo history for a diagram.
#[derive(Debug, Clone, Default)]
pub struct UndoHistory {
    /// Stack of actions that can be undone
    undo_stack: Vec<UndoAction>,
    /// Stack of actions that can be redone
    redo_stack: Vec<UndoAction>,
}

impl UndoHistory {
    /// Creates a new empty undo history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a forward edit.
    ///
    /// This clears the redo stack since a new edit invalidates any previously undone ones.
    pub fn push_action(&mut self, action: UndoAction) {
        self.push_undo(action);
        self.redo_stack.clear();
    }

    /// Pushes onto the undo stack without touching the redo stack.
    pub fn push_undo(&mut self, action: UndoAction) {
        self.undo_stack.push(action);

        // Limit undo history size
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Pushes an action onto the redo stack.
    pub fn push_redo(&mut self, action: UndoAction) {
        self.redo_stack.push(action);
    }

    /// Pops the most recent action from the undo stack.
    pub fn pop_undo(&mut self) -> Option<UndoAction> {
        self.undo_stack.pop()
    }

    /// Pops the most recent action from the redo stack.
    pub fn pop_redo(&mut self) -> Option<UndoAction> {
        self.redo_stack.pop()
    }

    /// Returns true if there are actions that can be undone.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are actions that can be redone.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undoable records.
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redoable records.
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clears all undo and redo history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Reverses the most recent edit. Returns `false` when there was nothing to undo.
    pub fn undo(&mut self, diagram: &mut Diagram) -> bool {
        let Some(action) = self.pop_undo() else {
            return false;
        };
        match diagram.apply_undo(&action) {
            Some(inverse) => self.push_redo(inverse),
            None => log::warn!("discarding undo record that no longer applies: {action:?}"),
        }
        true
    }

    /// Re-applies the most recently undone edit. Returns `false` when there was nothing to redo.
    pub fn redo(&mut self, diagram: &mut Diagram) -> bool {
        let Some(action) = self.pop_redo() else {
            return false;
        };
        match diagram.apply_redo(&action) {
            Some(inverse) => self.push_undo(inverse),
            None => log::warn!("discarding redo record that no longer applies: {action:?}"),
        }
        true
    }
}

/// Extension methods for applying undo/redo actions to a diagram.
pub trait UndoableDiagram {
    /// Applies an undo action to reverse it, returning the action that reverses the reversal.
    fn apply_undo(&mut self, action: &UndoAction) -> Option<UndoAction>;

    /// Applies a redo action to re-apply it.
    fn apply_redo(&mut self, action: &UndoAction) -> Option<UndoAction>;
}

impl UndoableDiagram for Diagram {
    fn apply_undo(&mut self, action: &UndoAction) -> Option<UndoAction> {
        match action {
            UndoAction::NodeAdded { node, .. } => {
                let index = self.node_index(node.id)?;
                let (node, dropped) = self.remove_node(node.id)?;
                if !dropped.is_empty() {
                    log::debug!(
                        "removing node {} also dropped {} connection(s)",
                        node.id,
                        dropped.len()
                    );
                }
                Some(UndoAction::NodeDeleted { node, index })
            }
            UndoAction::NodeDeleted { node, index } => {
                if self.node(node.id).is_some() {
                    return None;
                }
                self.insert_node_at(*index, node.clone());
                Some(UndoAction::NodeAdded {
                    node: node.clone(),
                    index: *index,
                })
            }
            UndoAction::NodeMoved { node_id, position } => {
                let previous = self.set_node_position(*node_id, *position).ok()?;
                Some(UndoAction::NodeMoved {
                    node_id: *node_id,
                    position: previous,
                })
            }
            UndoAction::ConnectionAdded { connection } => {
                let (connection, index) = self.remove_connection(connection.id)?;
                Some(UndoAction::ConnectionDeleted { connection, index })
            }
            UndoAction::ConnectionDeleted { connection, index } => {
                if self.connection(connection.id).is_some() {
                    return None;
                }
                self.insert_connection(*index, connection.clone()).ok()?;
                Some(UndoAction::ConnectionAdded {
                    connection: connection.clone(),
                })
            }
            UndoAction::NodeRenamed { node_id, name } => {
                let node = self.node_mut(*node_id)?;
                let previous = std::mem::replace(&mut node.name, name.clone());
                Some(UndoAction::NodeRenamed {
                    node_id: *node_id,
                    name: previous,
                })
            }
            UndoAction::CharacteristicsChanged {
                node_id,
                characteristics,
            } => {
                let previous = self.set_characteristics(*node_id, characteristics.clone()).ok()?;
                Some(UndoAction::CharacteristicsChanged {
                    node_id: *node_id,
                    characteristics: previous,
                })
            }
        }
    }

    fn apply_redo(&mut self, action: &UndoAction) -> Option<UndoAction> {
        // Redo is just applying the reverse of an undo
        self.apply_undo(action)
    }
}
