//! The editing facade used by the front-end.
//!
//! [`DiagramEditor`] owns the diagram, its undo history, the pointer state machine
//! and the user's settings. Every user-visible edit goes through it so that each
//! one pushes exactly one group of undo records and raises the redraw flag.

use crate::error::{DiagramError, Result};
use crate::graph::Diagram;
use crate::interaction::{Change, ContextTarget, Interaction, Modifiers};
use crate::persistence;
use crate::render::{RenderScene, Theme};
use crate::settings::EditorSettings;
use crate::types::*;
use crate::undo::{UndoAction, UndoHistory};
use std::path::Path;

/// Something that can edit a node's characteristics, usually a modal dialog.
///
/// Returning `None` means the edit was cancelled and the node is left alone.
pub trait ConfigEditor {
    /// Shows the editor for a node of `kind` holding `current`.
    fn open(&mut self, kind: &DeviceKind, current: &Characteristics) -> Option<Characteristics>;
}

impl<F> ConfigEditor for F
where
    F: FnMut(&DeviceKind, &Characteristics) -> Option<Characteristics>,
{
    fn open(&mut self, kind: &DeviceKind, current: &Characteristics) -> Option<Characteristics> {
        self(kind, current)
    }
}

/// Diagram, history, gesture state and settings for one open document.
#[derive(Debug, Clone)]
pub struct DiagramEditor {
    diagram: Diagram,
    history: UndoHistory,
    interaction: Interaction,
    settings: EditorSettings,
    redraw_requested: bool,
    unsaved: bool,
    revision: u64,
}

impl Default for DiagramEditor {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

impl DiagramEditor {
    /// Creates an editor with an empty diagram.
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            diagram: Diagram::with_grid(settings.grid()),
            history: UndoHistory::new(),
            interaction: Interaction::Idle,
            settings,
            redraw_requested: true,
            unsaved: false,
            revision: 0,
        }
    }

    /// The current diagram.
    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    /// The undo history.
    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    /// The gesture in progress.
    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Current settings.
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Whether the diagram changed since it was last saved, loaded or created.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Bumped by every edit and by every diagram replacement.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Records that the diagram as of `revision` has been written out elsewhere.
    ///
    /// The unsaved flag is only cleared when nothing changed since that revision.
    /// Returns whether it was cleared.
    pub fn mark_saved(&mut self, revision: u64) -> bool {
        if revision != self.revision {
            return false;
        }
        self.unsaved = false;
        true
    }

    /// Returns and clears the redraw flag.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    fn mark_edited(&mut self) {
        self.mark_unsaved();
        self.request_redraw();
    }

    fn mark_unsaved(&mut self) {
        self.unsaved = true;
        self.revision += 1;
    }

    fn note_change(&mut self, change: Change) {
        match change {
            Change::None => {}
            Change::Transient => self.request_redraw(),
            Change::Edit => self.mark_edited(),
        }
    }

    /// Drops a node from the palette at `position`.
    ///
    /// A BasiQ module is wired to the nearest Controller automatically, if there is one.
    pub fn add_node(&mut self, kind: DeviceKind, position: Point) -> NodeId {
        let id = self.diagram.add_node(kind.clone(), position);
        if let (Some(node), Some(index)) = (self.diagram.node(id).cloned(), self.diagram.node_index(id)) {
            self.history.push_action(UndoAction::NodeAdded { node, index });
        }
        log::debug!("placed {kind} node {id}");

        if kind == DeviceKind::BasiQ {
            self.auto_link_basiq(id);
        }
        self.mark_edited();
        id
    }

    fn auto_link_basiq(&mut self, basiq: NodeId) {
        let Some(position) = self.diagram.node(basiq).map(|n| n.position) else {
            return;
        };
        let Some(controller) = self
            .diagram
            .nearest_of_kind(&DeviceKind::Controller, position, basiq)
        else {
            return;
        };
        match self.diagram.add_connection(basiq, controller) {
            Ok(conn) => {
                if let Some(connection) = self.diagram.connection(conn).cloned() {
                    self.history.push_action(UndoAction::ConnectionAdded { connection });
                }
                log::info!("linked BasiQ {basiq} to controller {controller}");
            }
            Err(err) => log::warn!("could not link BasiQ {basiq}: {err}"),
        }
    }

    /// Deletes a node together with its connections.
    ///
    /// One record is pushed per connection, highest index first, followed by the
    /// node record, so undoing restores the node before anything that refers to it
    /// and puts every connection back at its original index.
    pub fn delete_node(&mut self, id: NodeId) -> Result<()> {
        let index = self.diagram.node_index(id).ok_or(DiagramError::UnknownNode(id))?;
        if self.interaction.connection_source() == Some(id) || self.interaction.dragged_node() == Some(id) {
            self.interaction.cancel(&mut self.diagram);
        }

        let incident: Vec<(usize, Connection)> = self
            .diagram
            .connections()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.touches(id))
            .map(|(i, c)| (i, c.clone()))
            .collect();

        let Some((node, removed)) = self.diagram.remove_node(id) else {
            return Err(DiagramError::UnknownNode(id));
        };
        debug_assert_eq!(removed.len(), incident.len());

        for (index, connection) in incident.into_iter().rev() {
            self.history
                .push_action(UndoAction::ConnectionDeleted { connection, index });
        }
        log::debug!("deleted node {id} and {} connection(s)", removed.len());
        self.history.push_action(UndoAction::NodeDeleted { node, index });
        self.mark_edited();
        Ok(())
    }

    /// Moves a node, snapping if enabled. Returns `false` if the position did not change.
    pub fn move_node(&mut self, id: NodeId, position: Point) -> Result<bool> {
        let previous = self.diagram.move_node(id, position)?;
        let moved = self.diagram.node(id).is_some_and(|n| n.position != previous);
        if moved {
            self.history.push_action(UndoAction::NodeMoved {
                node_id: id,
                position: previous,
            });
            self.mark_edited();
        }
        Ok(moved)
    }

    /// Draws a connection from `from` to `to`.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<ConnectionId> {
        let id = self.diagram.add_connection(from, to)?;
        if let Some(connection) = self.diagram.connection(id).cloned() {
            self.history.push_action(UndoAction::ConnectionAdded { connection });
        }
        self.mark_edited();
        Ok(id)
    }

    /// Deletes one connection.
    pub fn delete_connection(&mut self, id: ConnectionId) -> Result<()> {
        let (connection, index) = self
            .diagram
            .remove_connection(id)
            .ok_or(DiagramError::UnknownConnection(id))?;
        self.history
            .push_action(UndoAction::ConnectionDeleted { connection, index });
        self.mark_edited();
        Ok(())
    }

    /// Renames a node. Blank names are rejected; an unchanged name records nothing.
    pub fn rename_node(&mut self, id: NodeId, name: &str) -> Result<()> {
        let previous = self.diagram.rename_node(id, name)?;
        if self.diagram.node(id).is_some_and(|n| n.name != previous) {
            self.history.push_action(UndoAction::NodeRenamed {
                node_id: id,
                name: previous,
            });
            self.mark_edited();
        }
        Ok(())
    }

    /// Replaces a node's characteristics. Returns `false` if the bag was already equal.
    pub fn set_characteristics(&mut self, id: NodeId, characteristics: Characteristics) -> Result<bool> {
        let current = self
            .diagram
            .node(id)
            .ok_or(DiagramError::UnknownNode(id))?;
        if current.characteristics == characteristics {
            return Ok(false);
        }
        let previous = self.diagram.set_characteristics(id, characteristics)?;
        self.history.push_action(UndoAction::CharacteristicsChanged {
            node_id: id,
            characteristics: previous,
        });
        self.mark_edited();
        Ok(true)
    }

    /// Opens `editor` for a node and stores the accepted result.
    ///
    /// Kinds without a configuration dialog are skipped. Returns whether the node changed.
    pub fn configure_node(&mut self, id: NodeId, editor: &mut impl ConfigEditor) -> Result<bool> {
        let node = self.diagram.node(id).ok_or(DiagramError::UnknownNode(id))?;
        if !node.kind.has_config_dialog() {
            log::debug!("{} nodes have no configuration dialog", node.kind);
            return Ok(false);
        }
        match editor.open(&node.kind, &node.characteristics) {
            Some(bag) => self.set_characteristics(id, bag),
            None => Ok(false),
        }
    }

    /// Double-click: configures the node under `point`, if any.
    pub fn double_click(&mut self, point: Point, editor: &mut impl ConfigEditor) -> Result<bool> {
        match self.diagram.find_node_at(point) {
            Some(id) => self.configure_node(id, editor),
            None => Ok(false),
        }
    }

    /// Turns grid snapping on or off. Turning it on re-snaps every node. Not undoable.
    pub fn set_snap_enabled(&mut self, enabled: bool) {
        if self.settings.snap_to_grid == enabled && self.diagram.grid.snap_enabled == enabled {
            return;
        }
        self.settings.snap_to_grid = enabled;
        let before: Vec<Point> = self.diagram.nodes().iter().map(|n| n.position).collect();
        self.diagram.set_snap_enabled(enabled);
        let resnapped = self
            .diagram
            .nodes()
            .iter()
            .zip(before)
            .any(|(n, old)| n.position != old);
        if resnapped {
            self.mark_unsaved();
        }
        log::info!("snap to grid {}", if enabled { "on" } else { "off" });
        self.request_redraw();
    }

    /// Flips grid snapping.
    pub fn toggle_snap(&mut self) {
        self.set_snap_enabled(!self.settings.snap_to_grid);
    }

    /// Shows or hides the background grid.
    pub fn set_show_grid(&mut self, visible: bool) {
        self.settings.show_grid = visible;
        self.request_redraw();
    }

    /// Switches the canvas colour scheme.
    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.theme = theme;
        self.request_redraw();
    }

    /// Reverses the most recent edit. Returns `false` when there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.interaction.cancel(&mut self.diagram);
        let undone = self.history.undo(&mut self.diagram);
        if undone {
            self.mark_edited();
        }
        undone
    }

    /// Re-applies the most recently undone edit. Returns `false` when there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        self.interaction.cancel(&mut self.diagram);
        let redone = self.history.redo(&mut self.diagram);
        if redone {
            self.mark_edited();
        }
        redone
    }

    /// Pointer pressed on the canvas.
    pub fn pointer_down(&mut self, point: Point, modifiers: Modifiers) -> Change {
        let change = self.interaction.pointer_down(&self.diagram, point, modifiers);
        self.note_change(change);
        change
    }

    /// Pointer moved over the canvas.
    pub fn pointer_move(&mut self, point: Point) -> Change {
        let change = self.interaction.pointer_move(&mut self.diagram, point);
        self.note_change(change);
        change
    }

    /// Pointer released over the canvas.
    pub fn pointer_up(&mut self, point: Point) -> Change {
        let change = self
            .interaction
            .pointer_up(&mut self.diagram, &mut self.history, point);
        self.note_change(change);
        change
    }

    /// Abandons the gesture in progress.
    pub fn cancel_gesture(&mut self) {
        let change = self.interaction.cancel(&mut self.diagram);
        self.note_change(change);
    }

    /// What a right-click at `point` would act on.
    pub fn context_target(&self, point: Point) -> Option<ContextTarget> {
        ContextTarget::at(&self.diagram, point)
    }

    /// Label of the node under the pointer, for tooltips.
    pub fn hover_label(&self, point: Point) -> Option<&str> {
        let id = self.diagram.find_node_at(point)?;
        self.diagram.node(id).map(|n| n.name.as_str())
    }

    /// Snapshot of what the canvas should show right now.
    pub fn scene(&self) -> RenderScene {
        RenderScene::build(
            &self.diagram,
            &self.interaction,
            self.settings.theme,
            self.settings.show_grid,
        )
    }

    /// Writes the diagram to `path`.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        persistence::save(&self.diagram, path)?;
        self.unsaved = false;
        Ok(())
    }

    /// Replaces the diagram with the contents of `path` and clears the history.
    ///
    /// On error the current diagram, history and settings are left exactly as they were.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let diagram = persistence::load(path, self.settings.grid())?;
        self.replace_diagram(diagram);
        Ok(())
    }

    /// Starts over with an empty diagram.
    pub fn new_diagram(&mut self) {
        self.replace_diagram(Diagram::with_grid(self.settings.grid()));
    }

    /// Installs an already loaded diagram, clearing the history.
    pub fn replace_diagram(&mut self, diagram: Diagram) {
        self.diagram = diagram;
        self.history.clear();
        self.interaction = Interaction::Idle;
        self.unsaved = false;
        self.revision += 1;
        self.request_redraw();
    }
}
