//! File operations for saving, loading and exporting diagrams.
//!
//! Dialogs run on tokio tasks so the UI keeps painting; results come back
//! over the channel in [`FileState`](super::state::FileState) and are applied
//! at the start of the next frame.

use super::state::{
    ExportFormat, FileOperationResult, PendingConfirmAction, PendingLoadOperation,
    PendingSaveOperation, StudioApp,
};
use crate::constants::FILE_EXTENSION;
use crate::export::{self, ExportOptions};
use crate::graph::Diagram;
use crate::persistence::{self, DiagramFile};
use crate::render::RenderScene;
use eframe::egui;
use std::sync::mpsc::Sender;

const FILE_FILTER_NAME: &str = "Konect Studio diagram";
const DEFAULT_FILE_NAME: &str = "diagram.kst";

impl StudioApp {
    /// Applies finished file operations and starts requested ones.
    pub fn handle_pending_operations(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.file.file_operation_receiver.try_recv() {
            self.apply_file_result(result);
        }

        if let Some(save_op) = self.file.pending_save_operation.take() {
            self.start_save(ctx, save_op);
        }

        if let Some(PendingLoadOperation::Load) = self.file.pending_load_operation.take() {
            self.start_load(ctx);
        }

        if let Some(format) = self.file.pending_export.take() {
            self.start_export(ctx, format);
        }
    }

    /// Applies one message from a finished async operation.
    pub fn apply_file_result(&mut self, result: FileOperationResult) {
        match result {
            FileOperationResult::SaveCompleted(path, revision) => {
                log::info!("saved {}", path.display());
                if !self.editor.mark_saved(revision) {
                    log::info!("diagram changed while saving, keeping unsaved flag");
                }
                self.file.current_path = Some(path);
            }
            FileOperationResult::LoadCompleted(path, content) => {
                match DiagramFile::from_json(&content) {
                    Ok(file) => {
                        let diagram = file.into_diagram(self.editor.settings().grid());
                        log::info!(
                            "loaded {} node(s) from {}",
                            diagram.nodes().len(),
                            path.display()
                        );
                        self.editor.replace_diagram(diagram);
                        self.file.current_path = Some(path);
                        self.close_node_windows();
                    }
                    Err(err) => {
                        self.report_error(format!("Could not open {}: {err}", path.display()));
                    }
                }
            }
            FileOperationResult::ExportCompleted(path) => {
                log::info!("exported image to {}", path.display());
            }
            FileOperationResult::OperationFailed(message) => self.report_error(message),
        }
    }

    /// The diagram to write and the revision it was taken at.
    pub(crate) fn save_snapshot(&self) -> (Diagram, u64) {
        (self.editor.diagram().clone(), self.editor.revision())
    }

    fn start_save(&mut self, ctx: &egui::Context, save_op: PendingSaveOperation) {
        let (diagram, revision) = self.save_snapshot();
        let sender = self.file.file_operation_sender.clone();
        let ctx = ctx.clone();

        match (save_op, self.file.current_path.clone()) {
            (PendingSaveOperation::Save, Some(path)) => {
                tokio::spawn(async move {
                    let result = match persistence::save(&diagram, &path) {
                        Ok(()) => FileOperationResult::SaveCompleted(path, revision),
                        Err(e) => FileOperationResult::OperationFailed(format!("Failed to save file: {e}")),
                    };
                    let _ = sender.send(result);
                    ctx.request_repaint();
                });
            }
            _ => {
                tokio::spawn(async move {
                    if let Some(handle) = rfd::AsyncFileDialog::new()
                        .add_filter(FILE_FILTER_NAME, &[FILE_EXTENSION])
                        .set_file_name(DEFAULT_FILE_NAME)
                        .save_file()
                        .await
                    {
                        let path = handle.path().to_path_buf();
                        let result = match persistence::save(&diagram, &path) {
                            Ok(()) => FileOperationResult::SaveCompleted(path, revision),
                            Err(e) => {
                                FileOperationResult::OperationFailed(format!("Failed to save file: {e}"))
                            }
                        };
                        let _ = sender.send(result);
                    }
                    ctx.request_repaint();
                });
            }
        }
    }

    fn start_load(&mut self, ctx: &egui::Context) {
        let sender = self.file.file_operation_sender.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if let Some(handle) = rfd::AsyncFileDialog::new()
                .add_filter(FILE_FILTER_NAME, &[FILE_EXTENSION])
                .pick_file()
                .await
            {
                let path = handle.path().to_path_buf();
                let result = match std::fs::read_to_string(&path) {
                    Ok(content) => FileOperationResult::LoadCompleted(path, content),
                    Err(e) => FileOperationResult::OperationFailed(format!("Failed to read file: {e}")),
                };
                let _ = sender.send(result);
            }
            ctx.request_repaint();
        });
    }

    fn start_export(&mut self, ctx: &egui::Context, format: ExportFormat) {
        let scene = self.editor.scene();
        let options = ExportOptions {
            include_grid: self.editor.settings().show_grid,
            ..ExportOptions::default()
        };
        spawn_write_dialog(ctx, self.file.file_operation_sender.clone(), format, scene, options);
    }

    /// Opens a file dialog to save the diagram under a new name.
    pub fn save_as_diagram(&mut self) {
        self.file.pending_save_operation = Some(PendingSaveOperation::SaveAs);
    }

    /// Saves to the current path, or asks for one if there is none yet.
    pub fn save_diagram(&mut self) {
        if self.file.current_path.is_some() {
            self.file.pending_save_operation = Some(PendingSaveOperation::Save);
        } else {
            self.save_as_diagram();
        }
    }

    /// Opens a file dialog to load a diagram.
    pub fn load_diagram(&mut self) {
        self.file.pending_load_operation = Some(PendingLoadOperation::Load);
    }

    /// Asks where to export the current canvas as an image.
    pub fn export_image(&mut self, format: ExportFormat) {
        self.file.pending_export = Some(format);
    }

    /// Starts a new empty diagram.
    pub fn new_diagram(&mut self) {
        self.editor.new_diagram();
        self.file.current_path = None;
        self.canvas.offset = egui::Vec2::ZERO;
        self.close_node_windows();
    }

    /// Runs `action`, or asks for confirmation first when there are unsaved changes.
    pub fn confirm_then(&mut self, action: PendingConfirmAction) {
        if self.editor.has_unsaved_changes() {
            self.file.show_unsaved_dialog = true;
            self.file.pending_confirm_action = Some(action);
        } else {
            self.run_confirmed(action);
        }
    }

    /// Runs an action the user has confirmed (or that needed no confirmation).
    pub fn run_confirmed(&mut self, action: PendingConfirmAction) {
        match action {
            PendingConfirmAction::New => self.new_diagram(),
            PendingConfirmAction::Open => self.load_diagram(),
            PendingConfirmAction::Quit => self.file.allow_close_on_next_request = true,
        }
    }
}

fn spawn_write_dialog(
    ctx: &egui::Context,
    sender: Sender<FileOperationResult>,
    format: ExportFormat,
    scene: RenderScene,
    options: ExportOptions,
) {
    let ctx = ctx.clone();
    let extension = format.extension();
    tokio::spawn(async move {
        if let Some(handle) = rfd::AsyncFileDialog::new()
            .add_filter(extension.to_uppercase(), &[extension])
            .set_file_name(format!("diagram.{extension}"))
            .save_file()
            .await
        {
            let path = handle.path().to_path_buf();
            let written = match format {
                ExportFormat::Svg => export::write_svg(&scene, &options, &path),
                ExportFormat::Png => export::write_png(&scene, &options, &path),
            };
            let result = match written {
                Ok(()) => FileOperationResult::ExportCompleted(path),
                Err(e) => FileOperationResult::OperationFailed(format!("Failed to export image: {e}")),
            };
            let _ = sender.send(result);
        }
        ctx.request_repaint();
    });
}
