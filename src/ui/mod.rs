//! User interface for the diagram editor.
//!
//! # Module Organization
//!
//! - `state` - Presentation state and the main [`StudioApp`]
//! - `file_ops` - Async save, load and export through native file dialogs
//! - `canvas` - Panning, pointer gestures, palette drops and the context menu
//! - `rendering` - Painting a render scene with egui shapes

mod canvas;
mod file_ops;
mod rendering;
mod state;

#[cfg(test)]
mod tests;

pub use state::StudioApp;

use self::state::{ExportFormat, PendingConfirmAction};
use crate::interaction::{ContextAction, ContextTarget};
use crate::render::Theme;
use crate::settings::SETTINGS_KEY;
use crate::types::*;
use eframe::egui;

impl eframe::App for StudioApp {
    /// Persist editor settings between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.editor.settings().to_json() {
            Ok(json) => storage.set_string(SETTINGS_KEY, json),
            Err(err) => log::error!("Failed to serialize settings: {err}"),
        }
    }

    /// Lays out the toolbar, device palette and canvas, then any open windows.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let visuals = match self.editor.settings().theme {
            Theme::Dark => egui::Visuals::dark(),
            Theme::Light => egui::Visuals::light(),
        };
        ctx.set_visuals(visuals);

        self.handle_pending_operations(ctx);
        self.handle_undo_redo_keys(ctx);
        self.handle_editor_keys(ctx);
        self.handle_file_shortcuts(ctx);

        // Intercept native window close requests (titlebar X)
        if ctx.input(|i| i.viewport().close_requested()) {
            if self.editor.has_unsaved_changes() && !self.file.allow_close_on_next_request {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                if !self.file.show_unsaved_dialog {
                    self.file.show_unsaved_dialog = true;
                    self.file.pending_confirm_action = Some(PendingConfirmAction::Quit);
                }
            } else {
                self.file.allow_close_on_next_request = false;
            }
        }

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::SidePanel::left("device_palette")
            .resizable(false)
            .default_width(140.0)
            .show(ctx, |ui| {
                self.draw_device_palette(ui);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.draw_canvas(ui);
            });

        self.draw_rename_window(ctx);
        self.draw_properties_window(ctx);
        self.draw_unsaved_dialog(ctx);
        self.draw_error_window(ctx);

        if self.editor.take_redraw_request() {
            ctx.request_repaint();
        }
    }
}

impl StudioApp {
    /// Ctrl+Z undoes; Ctrl+Shift+Z and Ctrl+Y redo.
    fn handle_undo_redo_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Z) && i.modifiers.command && !i.modifiers.shift) {
            self.perform_undo();
        } else if ctx.input(|i| {
            (i.key_pressed(egui::Key::Z) && i.modifiers.command && i.modifiers.shift)
                || (i.key_pressed(egui::Key::Y) && i.modifiers.command)
        }) {
            self.perform_redo();
        }
    }

    /// Ctrl+G toggles snapping, Escape abandons the current gesture,
    /// Delete removes whatever is under the pointer.
    fn handle_editor_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        // Scan raw events too; headless input does not always update i.modifiers
        let toggle_snap = ctx.input(|i| {
            (i.key_pressed(egui::Key::G) && i.modifiers.command)
                || i.events.iter().any(|ev| {
                    matches!(
                        ev,
                        egui::Event::Key { key: egui::Key::G, pressed: true, modifiers, .. }
                            if modifiers.command || modifiers.ctrl
                    )
                })
        });
        if toggle_snap {
            self.editor.toggle_snap();
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.editor.cancel_gesture();
            self.context_menu.target = None;
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Delete)) {
            let hovered = ctx.input(|i| i.pointer.hover_pos()).and_then(|pos| {
                let rect = self.canvas.last_rect?;
                let point = self.canvas.screen_to_canvas(rect, pos);
                self.editor.context_target(point)
            });
            match hovered {
                Some(target @ ContextTarget::Node(_)) => {
                    self.run_context_action(target, ContextAction::DeleteNode);
                }
                Some(target @ ContextTarget::Connection(_)) => {
                    self.run_context_action(target, ContextAction::DeleteConnection);
                }
                None => {}
            }
        }
    }

    /// Ctrl+S, Ctrl+Shift+S, Ctrl+O, Ctrl+N and Ctrl+Q.
    fn handle_file_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let mut confirm = None;
        ctx.input(|i| {
            let cmd = i.modifiers.command;
            if i.key_pressed(egui::Key::S) && cmd && i.modifiers.shift {
                self.save_as_diagram();
            } else if i.key_pressed(egui::Key::S) && cmd {
                self.save_diagram();
            }
            if i.key_pressed(egui::Key::O) && cmd {
                confirm = Some(PendingConfirmAction::Open);
            }
            if i.key_pressed(egui::Key::N) && cmd {
                confirm = Some(PendingConfirmAction::New);
            }
            if i.key_pressed(egui::Key::Q) && cmd {
                confirm = Some(PendingConfirmAction::Quit);
            }
        });
        if let Some(action) = confirm {
            self.confirm_then(action);
            if self.file.allow_close_on_next_request {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    /// Undoes the last edit and drops windows whose node went away.
    pub fn perform_undo(&mut self) {
        if self.editor.undo() {
            self.close_stale_windows();
        }
    }

    /// Redoes the last undone edit and drops windows whose node went away.
    pub fn perform_redo(&mut self) {
        if self.editor.redo() {
            self.close_stale_windows();
        }
    }

    /// Closes every window tied to a node, and the context menu.
    pub fn close_node_windows(&mut self) {
        self.properties.close();
        self.rename = Default::default();
        self.context_menu.target = None;
    }

    /// Closes the windows editing `id`.
    fn close_node_windows_for(&mut self, id: NodeId) {
        if self.properties.node == Some(id) {
            self.properties.close();
        }
        if self.rename.node == Some(id) {
            self.rename = Default::default();
        }
    }

    fn close_stale_windows(&mut self) {
        let diagram = self.editor.diagram();
        let stale: Vec<NodeId> = [self.properties.node, self.rename.node]
            .into_iter()
            .flatten()
            .filter(|id| diagram.node(*id).is_none())
            .collect();
        for id in stale {
            self.close_node_windows_for(id);
        }
        self.context_menu.target = None;
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("New").clicked() {
                self.confirm_then(PendingConfirmAction::New);
            }
            if ui.button("Open").clicked() {
                self.confirm_then(PendingConfirmAction::Open);
            }
            if ui.button("Save").clicked() {
                self.save_diagram();
            }
            if ui.button("Save As").clicked() {
                self.save_as_diagram();
            }
            ui.menu_button("Export", |ui| {
                if ui.button("SVG image").clicked() {
                    self.export_image(ExportFormat::Svg);
                    ui.close();
                }
                if ui.button("PNG image").clicked() {
                    self.export_image(ExportFormat::Png);
                    ui.close();
                }
            });

            ui.separator();

            let history = self.editor.history();
            let (can_undo, can_redo) = (history.can_undo(), history.can_redo());
            if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                self.perform_undo();
            }
            if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
                self.perform_redo();
            }

            ui.separator();

            let mut snap = self.editor.settings().snap_to_grid;
            if ui.checkbox(&mut snap, "Snap to grid").changed() {
                self.editor.set_snap_enabled(snap);
            }
            let mut show_grid = self.editor.settings().show_grid;
            if ui.checkbox(&mut show_grid, "Show grid").changed() {
                self.editor.set_show_grid(show_grid);
            }
            let mut dark = self.editor.settings().theme == Theme::Dark;
            if ui.checkbox(&mut dark, "Dark mode").changed() {
                self.editor.set_theme(self.editor.settings().theme.toggled());
            }

            ui.separator();

            let name = self
                .file
                .current_path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Untitled".to_string());
            let marker = if self.editor.has_unsaved_changes() { " *" } else { "" };
            ui.label(format!("{name}{marker}"));
        });
    }

    fn draw_device_palette(&mut self, ui: &mut egui::Ui) {
        ui.heading("Devices");
        ui.label("Drag onto the canvas");
        ui.separator();
        let mut clicked = None;
        for kind in DeviceKind::PALETTE.iter() {
            ui.horizontal(|ui| {
                let id = egui::Id::new(("palette", kind.as_str()));
                ui.dnd_drag_source(id, kind.clone(), |ui| {
                    ui.label(kind.as_str());
                });
                if ui.small_button("+").on_hover_text("Add to canvas").clicked() {
                    clicked = Some(kind.clone());
                }
            });
        }
        if let Some(kind) = clicked {
            self.add_device_from_palette(kind);
        }
    }

    fn draw_rename_window(&mut self, ctx: &egui::Context) {
        let Some(id) = self.rename.node else {
            return;
        };
        let mut submit = false;
        let mut cancel = false;
        egui::Window::new("Rename")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                let response = ui.text_edit_singleline(&mut self.rename.text);
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submit = true;
                }
                if let Some(error) = &self.rename.error {
                    ui.colored_label(ui.visuals().error_fg_color, error);
                }
                ui.horizontal(|ui| {
                    submit |= ui.button("OK").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });

        if cancel {
            self.rename = Default::default();
        } else if submit {
            self.submit_rename(id);
        }
    }

    /// Applies the rename window's text; blank names keep the window open with an error.
    pub fn submit_rename(&mut self, id: NodeId) {
        match self.editor.rename_node(id, &self.rename.text) {
            Ok(()) => self.rename = Default::default(),
            Err(err) => self.rename.error = Some(err.to_string()),
        }
    }

    fn draw_properties_window(&mut self, ctx: &egui::Context) {
        let Some(id) = self.properties.node else {
            return;
        };
        let title = self
            .editor
            .diagram()
            .node(id)
            .map(|n| format!("{} characteristics", n.kind))
            .unwrap_or_else(|| "Characteristics".to_string());
        let mut accept = false;
        let mut cancel = false;

        egui::Window::new(title)
            .id(egui::Id::new("properties_window"))
            .collapsible(false)
            .resizable(true)
            .show(ctx, |ui| {
                let mut remove = None;
                egui::Grid::new("characteristics_grid")
                    .num_columns(3)
                    .striped(true)
                    .show(ui, |ui| {
                        for (index, (key, value)) in self.properties.rows.iter_mut().enumerate() {
                            ui.text_edit_singleline(key);
                            ui.text_edit_singleline(value);
                            if ui.small_button("x").clicked() {
                                remove = Some(index);
                            }
                            ui.end_row();
                        }
                        ui.add(egui::TextEdit::singleline(&mut self.properties.new_key).hint_text("key"));
                        ui.add(egui::TextEdit::singleline(&mut self.properties.new_value).hint_text("value"));
                        if ui.small_button("Add").clicked() {
                            self.properties.commit_new_row();
                        }
                        ui.end_row();
                    });
                if let Some(index) = remove {
                    self.properties.rows.remove(index);
                }
                ui.separator();
                ui.horizontal(|ui| {
                    accept = ui.button("OK").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });

        if cancel {
            self.properties.close();
        } else if accept {
            self.submit_properties(id);
        }
    }

    /// Stores the properties window's rows on the node and closes the window.
    pub fn submit_properties(&mut self, id: NodeId) {
        self.properties.commit_new_row();
        let mut form = std::mem::take(&mut self.properties);
        if let Err(err) = self.editor.configure_node(id, &mut form) {
            self.report_error(err.to_string());
        }
    }

    fn draw_unsaved_dialog(&mut self, ctx: &egui::Context) {
        if !self.file.show_unsaved_dialog {
            return;
        }
        let action = self.file.pending_confirm_action;
        let (title, confirm_label) = match action {
            Some(PendingConfirmAction::Quit) => ("Unsaved changes: quit?", "Discard and Quit"),
            Some(PendingConfirmAction::New) => ("Unsaved changes: new diagram?", "Discard and Create New"),
            Some(PendingConfirmAction::Open) => ("Unsaved changes: open file?", "Discard and Open"),
            None => ("Unsaved changes", "Discard"),
        };
        let mut confirmed = false;
        let mut cancelled = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("You have unsaved changes. Are you sure you want to continue?");
                ui.horizontal(|ui| {
                    confirmed = ui.button(confirm_label).clicked();
                    cancelled = ui.button("Cancel").clicked();
                });
            });

        if confirmed {
            if let Some(action) = action {
                self.run_confirmed(action);
                if action == PendingConfirmAction::Quit {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            }
        }
        if confirmed || cancelled {
            self.file.show_unsaved_dialog = false;
            self.file.pending_confirm_action = None;
        }
    }

    fn draw_error_window(&mut self, ctx: &egui::Context) {
        let Some(message) = self.error_message.clone() else {
            return;
        };
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    self.error_message = None;
                }
            });
    }
}
