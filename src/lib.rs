//! # Konect Traffic Studio
//!
//! A desktop editor for drawing the topology of traffic-control installations:
//! cameras, detectors, phase electronics, junction controllers and BasiQ modules,
//! wired together with directed connections.
//!
//! ## Features
//! - Drag devices from the palette onto a grid-snapped canvas
//! - Draw connections from a node's connector anchor (or Ctrl+drag from its body)
//! - Per-device characteristics, rename, and a terminal shortcut from the context menu
//! - Undo/redo of every edit, up to 100 steps
//! - Save and load `.kst` diagram files, export the canvas to SVG or PNG
//!
//! The model ([`Diagram`]), the gesture state machine ([`Interaction`]) and the
//! editing facade ([`DiagramEditor`]) have no UI dependency and can be driven
//! directly, which is how most of the tests exercise them.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod editor;
pub mod error;
pub mod export;
pub mod geometry;
pub mod graph;
pub mod interaction;
pub mod persistence;
pub mod render;
pub mod settings;
pub mod terminal;
pub mod types;
pub mod undo;
mod ui;

pub use editor::{ConfigEditor, DiagramEditor};
pub use error::{DiagramError, Result};
pub use graph::{Diagram, Grid};
pub use interaction::{Interaction, Modifiers};
pub use render::{RenderScene, Theme};
pub use settings::EditorSettings;
pub use types::*;
pub use undo::{UndoAction, UndoHistory};
use ui::StudioApp;

/// Runs the editor window.
///
/// Settings saved by a previous session are restored from eframe storage.
///
/// # Returns
///
/// Returns `Ok(())` when the window is closed, or an `eframe::Error` if
/// initialization fails.
///
/// # Example
///
/// ```no_run
/// use traffic_studio::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
pub fn run_app() -> std::result::Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Konect Traffic Studio")
            .with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Konect Traffic Studio",
        options,
        Box::new(|cc| Ok(Box::new(StudioApp::new(cc)))),
    )
}
