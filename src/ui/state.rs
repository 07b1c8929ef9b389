//! Application state management structures.
//!
//! This module contains the state structures that track the application's
//! current UI state: canvas placement, context menu, rename and properties
//! windows, and file operations.

use crate::editor::{ConfigEditor, DiagramEditor};
use crate::interaction::ContextTarget;
use crate::settings::EditorSettings;
use crate::types::*;
use eframe::egui;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};

/// State related to canvas placement and panning.
#[derive(Debug, Clone, Default)]
pub struct CanvasState {
    /// Pan offset in screen points, added on top of the canvas rect origin
    pub offset: egui::Vec2,
    /// Screen rect of the canvas during the last frame
    pub last_rect: Option<egui::Rect>,
    /// Last pointer position while panning with the middle button
    pub last_pan_pos: Option<egui::Pos2>,
}

impl CanvasState {
    /// Screen position of the canvas origin, given the canvas rect.
    pub fn origin(&self, rect: egui::Rect) -> egui::Pos2 {
        rect.min + self.offset
    }

    /// Converts a screen position to canvas coordinates.
    pub fn screen_to_canvas(&self, rect: egui::Rect, pos: egui::Pos2) -> Point {
        let local = pos - self.origin(rect);
        Point::new(local.x.round() as i32, local.y.round() as i32)
    }

    /// Converts canvas coordinates to a screen position.
    pub fn canvas_to_screen(&self, rect: egui::Rect, point: Point) -> egui::Pos2 {
        self.origin(rect) + egui::vec2(point.x as f32, point.y as f32)
    }

    /// Canvas coordinates of the middle of the visible canvas, if it has been drawn.
    pub fn visible_center(&self) -> Option<Point> {
        let rect = self.last_rect?;
        Some(self.screen_to_canvas(rect, rect.center()))
    }
}

/// State of the right-click context menu.
#[derive(Debug, Clone, Default)]
pub struct ContextMenuState {
    /// What the menu acts on; `None` while the menu is closed
    pub target: Option<ContextTarget>,
    /// Screen position where the menu should appear
    pub screen_pos: egui::Pos2,
    /// Prevents the menu from closing in the frame it was opened
    pub just_opened: bool,
}

/// State of the rename window.
#[derive(Debug, Clone, Default)]
pub struct RenameState {
    /// Node being renamed
    pub node: Option<NodeId>,
    /// Text being edited
    pub text: String,
    /// Validation message from the last attempt
    pub error: Option<String>,
}

/// A generic key/value characteristics form used in place of per-device dialogs.
#[derive(Debug, Clone, Default)]
pub struct PropertiesForm {
    /// Node whose characteristics are being edited
    pub node: Option<NodeId>,
    /// Rows as edited text; values are parsed as JSON when possible
    pub rows: Vec<(String, String)>,
    /// Key of the row being added
    pub new_key: String,
    /// Value of the row being added
    pub new_value: String,
}

impl PropertiesForm {
    /// Opens the form for a node, filling it from its current characteristics.
    pub fn open_for(&mut self, node: &Node) {
        self.node = Some(node.id);
        self.rows = node
            .characteristics
            .iter()
            .map(|(key, value)| (key.clone(), value_to_text(value)))
            .collect();
        self.new_key.clear();
        self.new_value.clear();
    }

    /// Closes the form, discarding edits.
    pub fn close(&mut self) {
        *self = Self::default();
    }

    /// Moves the pending new row into the table if it has a key.
    pub fn commit_new_row(&mut self) {
        let key = self.new_key.trim();
        if key.is_empty() {
            return;
        }
        let value = std::mem::take(&mut self.new_value);
        match self.rows.iter_mut().find(|(k, _)| k == key) {
            Some(row) => row.1 = value,
            None => self.rows.push((key.to_string(), value)),
        }
        self.new_key.clear();
    }

    /// The characteristics the form currently describes. Rows with blank keys are dropped.
    pub fn to_characteristics(&self) -> Characteristics {
        self.rows
            .iter()
            .filter(|(key, _)| !key.trim().is_empty())
            .map(|(key, value)| (key.trim().to_string(), text_to_value(value)))
            .collect()
    }
}

impl ConfigEditor for PropertiesForm {
    fn open(&mut self, _kind: &DeviceKind, _current: &Characteristics) -> Option<Characteristics> {
        Some(self.to_characteristics())
    }
}

// Strings are shown bare unless they would read back as another JSON type
fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => {
            let ambiguous = serde_json::from_str::<serde_json::Value>(s).is_ok_and(|v| !v.is_string());
            if ambiguous {
                value.to_string()
            } else {
                s.clone()
            }
        }
        other => other.to_string(),
    }
}

fn text_to_value(text: &str) -> serde_json::Value {
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
}

/// Image formats offered by the export menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Scalable vector graphics
    Svg,
    /// Raster image
    Png,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Png => "png",
        }
    }
}

/// Represents a pending save operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingSaveOperation {
    /// Save with a new file path (show file picker)
    SaveAs,
    /// Save to the existing file path
    Save,
}

/// Represents a pending load operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingLoadOperation {
    /// Load from a file (show file picker)
    Load,
}

/// Messages sent from async file operations back to the main app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// Save completed to the given path; carries the editor revision that was written
    SaveCompleted(PathBuf, u64),
    /// A file was read; the content still needs parsing
    LoadCompleted(PathBuf, String),
    /// An image was exported to the given path
    ExportCompleted(PathBuf),
    /// Operation failed with an error message
    OperationFailed(String),
}

/// Pending confirmation actions that may require user approval due to unsaved changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingConfirmAction {
    /// User is attempting to create a new diagram
    New,
    /// User is attempting to open a file
    Open,
    /// User is attempting to quit the application
    Quit,
}

/// State related to file operations.
#[derive(Debug)]
pub struct FileState {
    /// Current file path for save operations
    pub current_path: Option<PathBuf>,
    /// Save requested this frame
    pub pending_save_operation: Option<PendingSaveOperation>,
    /// Load requested this frame
    pub pending_load_operation: Option<PendingLoadOperation>,
    /// Export requested this frame
    pub pending_export: Option<ExportFormat>,
    /// Channel for receiving file operation results from async tasks
    pub file_operation_sender: Sender<FileOperationResult>,
    /// Receiving end, drained every frame
    pub file_operation_receiver: Receiver<FileOperationResult>,
    /// Whether to show the unsaved-changes confirmation dialog
    pub show_unsaved_dialog: bool,
    /// The action that needs confirmation
    pub pending_confirm_action: Option<PendingConfirmAction>,
    /// One-shot flag letting the next close request through after confirmation
    pub allow_close_on_next_request: bool,
}

impl Default for FileState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            current_path: None,
            pending_save_operation: None,
            pending_load_operation: None,
            pending_export: None,
            file_operation_sender: sender,
            file_operation_receiver: receiver,
            show_unsaved_dialog: false,
            pending_confirm_action: None,
            allow_close_on_next_request: false,
        }
    }
}

/// The main application structure.
///
/// Implements `eframe::App`; all diagram state lives in the [`DiagramEditor`],
/// everything else here is presentation state.
#[derive(Debug, Default)]
pub struct StudioApp {
    /// Diagram, history, gesture and settings
    pub editor: DiagramEditor,
    /// Canvas placement
    pub canvas: CanvasState,
    /// Right-click menu
    pub context_menu: ContextMenuState,
    /// Rename window
    pub rename: RenameState,
    /// Characteristics window
    pub properties: PropertiesForm,
    /// File operations
    pub file: FileState,
    /// Message shown in the blocking error window
    pub error_message: Option<String>,
}

impl StudioApp {
    /// Creates the app, restoring persisted settings if there are any.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = cc
            .storage
            .and_then(|storage| storage.get_string(crate::settings::SETTINGS_KEY))
            .map(|json| EditorSettings::from_json_or_default(&json))
            .unwrap_or_default();
        Self::with_settings(settings)
    }

    /// Creates the app with explicit settings.
    pub fn with_settings(settings: EditorSettings) -> Self {
        Self {
            editor: DiagramEditor::new(settings),
            ..Self::default()
        }
    }

    /// Shows `message` in the blocking error window.
    pub fn report_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{message}");
        self.error_message = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_round_trips_mixed_values() {
        let mut bag = Characteristics::new();
        bag.insert("ip".into(), json!("192.168.0.10"));
        bag.insert("port".into(), json!(554));
        bag.insert("enabled".into(), json!(true));
        let node = Node::new(DeviceKind::Cctv, Point::new(0, 0)).with_characteristics(bag.clone());

        let mut form = PropertiesForm::default();
        form.open_for(&node);

        assert_eq!(form.node, Some(node.id));
        assert_eq!(form.to_characteristics(), bag);
    }

    #[test]
    fn new_rows_replace_existing_keys() {
        let mut form = PropertiesForm::default();
        form.new_key = "user".into();
        form.new_value = "admin".into();
        form.commit_new_row();
        form.new_key = " user ".into();
        form.new_value = "operator".into();
        form.commit_new_row();
        form.new_key = "  ".into();
        form.commit_new_row();

        assert_eq!(form.rows, vec![("user".to_string(), "operator".to_string())]);
        assert_eq!(form.to_characteristics()["user"], json!("operator"));
    }

    #[test]
    fn quoted_numbers_stay_strings() {
        assert_eq!(text_to_value("\"42\""), json!("42"));
        assert_eq!(text_to_value("42"), json!(42));
        assert_eq!(text_to_value("not json"), json!("not json"));
        assert_eq!(value_to_text(&json!("42")), "\"42\"");
        assert_eq!(value_to_text(&json!("10.0.0.1")), "10.0.0.1");
    }

    #[test]
    fn canvas_conversion_respects_offset() {
        let canvas = CanvasState {
            offset: egui::vec2(10.0, 20.0),
            ..CanvasState::default()
        };
        let rect = egui::Rect::from_min_size(egui::pos2(100.0, 50.0), egui::vec2(400.0, 300.0));
        let point = canvas.screen_to_canvas(rect, egui::pos2(160.0, 120.0));
        assert_eq!(point, Point::new(50, 50));
        assert_eq!(canvas.canvas_to_screen(rect, point), egui::pos2(160.0, 120.0));
    }
}
