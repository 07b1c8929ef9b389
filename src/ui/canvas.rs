//! Canvas input handling: panning, pointer gestures, palette drops and the context menu.
//!
//! Screen positions are converted to integer canvas coordinates and handed to the
//! [`DiagramEditor`](crate::editor::DiagramEditor), which owns the gesture state.

use super::state::StudioApp;
use crate::interaction::{ContextAction, ContextTarget, Modifiers};
use crate::terminal;
use crate::types::*;
use eframe::egui;

/// Converts egui modifiers; Cmd counts as Ctrl on macOS.
pub(super) fn to_modifiers(modifiers: egui::Modifiers) -> Modifiers {
    Modifiers {
        ctrl: modifiers.ctrl || modifiers.command,
    }
}

impl StudioApp {
    /// Renders the canvas and handles all pointer interaction on it.
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;
        self.canvas.last_rect = Some(rect);

        self.handle_canvas_panning(ui, &response);
        self.handle_palette_drop(&response);
        if self.context_menu.target.is_none() {
            self.handle_pointer(ui, rect);
            self.handle_secondary_click(ui, rect);
        }

        let scene = self.editor.scene();
        self.render_scene(&painter, rect, &scene);

        if self.editor.interaction().is_idle() {
            let label = ui
                .input(|i| i.pointer.hover_pos())
                .filter(|pos| rect.contains(*pos))
                .and_then(|pos| {
                    let point = self.canvas.screen_to_canvas(rect, pos);
                    self.editor.hover_label(point).map(str::to_string)
                });
            if let Some(label) = label {
                response.on_hover_text_at_pointer(label);
            }
        }

        if self.context_menu.target.is_some() {
            self.draw_context_menu(ui);
        }
    }

    /// Pans the canvas while the middle button is held.
    pub fn handle_canvas_panning(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let panning = ui.input(|i| i.pointer.middle_down());
        if !panning {
            self.canvas.last_pan_pos = None;
            return;
        }
        if let Some(current_pos) = response.interact_pointer_pos() {
            if let Some(last_pos) = self.canvas.last_pan_pos {
                self.canvas.offset += current_pos - last_pos;
            }
            self.canvas.last_pan_pos = Some(current_pos);
        }
    }

    /// Feeds primary-button press, drag, release and double-click to the editor.
    fn handle_pointer(&mut self, ui: &mut egui::Ui, rect: egui::Rect) {
        let (pressed, down, released, double, pos, modifiers) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.pointer.button_double_clicked(egui::PointerButton::Primary),
                i.pointer.interact_pos().or_else(|| i.pointer.latest_pos()),
                i.modifiers,
            )
        });
        let Some(pos) = pos else {
            return;
        };
        let point = self.canvas.screen_to_canvas(rect, pos);
        let over_canvas = rect.contains(pos)
            && ui
                .ctx()
                .layer_id_at(pos)
                .is_none_or(|layer| layer == ui.layer_id());

        if pressed && over_canvas {
            self.editor.pointer_down(point, to_modifiers(modifiers));
        } else if down && !self.editor.interaction().is_idle() {
            self.editor.pointer_move(point);
        }

        if released && !self.editor.interaction().is_idle() {
            self.editor.pointer_up(point);
        }

        if double && over_canvas {
            self.open_properties_at(point);
        }
    }

    /// Opens the characteristics window for the node at `point`, if its kind has one.
    pub fn open_properties_at(&mut self, point: Point) {
        let Some(node) = self
            .editor
            .diagram()
            .find_node_at(point)
            .and_then(|id| self.editor.diagram().node(id))
        else {
            return;
        };
        if node.kind.has_config_dialog() {
            let node = node.clone();
            self.properties.open_for(&node);
        }
    }

    /// Places a device dragged from the palette where it was released.
    fn handle_palette_drop(&mut self, response: &egui::Response) {
        let Some(kind) = response.dnd_release_payload::<DeviceKind>() else {
            return;
        };
        let Some(pos) = response.hover_pos().or_else(|| response.interact_pointer_pos()) else {
            return;
        };
        let point = self.canvas.screen_to_canvas(response.rect, pos);
        self.editor.add_node((*kind).clone(), point);
    }

    /// Places a device clicked in the palette in the middle of the visible canvas.
    pub fn add_device_from_palette(&mut self, kind: DeviceKind) -> NodeId {
        let point = self.canvas.visible_center().unwrap_or_default();
        self.editor.add_node(kind, point)
    }

    fn handle_secondary_click(&mut self, ui: &mut egui::Ui, rect: egui::Rect) {
        let clicked = ui.input(|i| {
            i.pointer
                .button_clicked(egui::PointerButton::Secondary)
                .then(|| i.pointer.interact_pos())
                .flatten()
        });
        let Some(pos) = clicked.filter(|pos| rect.contains(*pos)) else {
            return;
        };
        let point = self.canvas.screen_to_canvas(rect, pos);
        self.open_context_menu(point, pos);
    }

    /// Opens the context menu for whatever lies under `point`.
    pub fn open_context_menu(&mut self, point: Point, screen_pos: egui::Pos2) {
        if let Some(target) = self.editor.context_target(point) {
            self.context_menu.target = Some(target);
            self.context_menu.screen_pos = screen_pos;
            self.context_menu.just_opened = true;
        }
    }

    fn draw_context_menu(&mut self, ui: &mut egui::Ui) {
        let Some(target) = self.context_menu.target else {
            return;
        };
        let mut chosen = None;

        let area_response = egui::Area::new(egui::Id::new("context_menu"))
            .fixed_pos(self.context_menu.screen_pos)
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.vertical(|ui| {
                        for action in target.actions() {
                            if ui.button(action.label()).clicked() {
                                chosen = Some(*action);
                            }
                        }
                    });
                })
            });

        if let Some(action) = chosen {
            self.context_menu.target = None;
            self.run_context_action(target, action);
        } else if !self.context_menu.just_opened && ui.input(|i| i.pointer.any_click()) {
            if let Some(click_pos) = ui.input(|i| i.pointer.interact_pos()) {
                if !area_response.response.rect.contains(click_pos) {
                    self.context_menu.target = None;
                }
            }
        }
        self.context_menu.just_opened = false;
    }

    /// Carries out a context menu entry.
    pub fn run_context_action(&mut self, target: ContextTarget, action: ContextAction) {
        match (target, action) {
            (ContextTarget::Node(id), ContextAction::Rename) => {
                if let Some(node) = self.editor.diagram().node(id) {
                    self.rename.node = Some(id);
                    self.rename.text = node.name.clone();
                    self.rename.error = None;
                }
            }
            (ContextTarget::Node(id), ContextAction::DeleteNode) => {
                if let Err(err) = self.editor.delete_node(id) {
                    log::warn!("delete failed: {err}");
                }
                self.close_node_windows_for(id);
            }
            (ContextTarget::Node(_), ContextAction::OpenTerminal) => {
                if let Err(err) = terminal::open_terminal() {
                    self.report_error(format!("Failed to open terminal: {err}"));
                }
            }
            (ContextTarget::Connection(id), ContextAction::DeleteConnection) => {
                if let Err(err) = self.editor.delete_connection(id) {
                    log::warn!("delete failed: {err}");
                }
            }
            (target, action) => log::debug!("{action:?} does not apply to {target:?}"),
        }
    }
}
