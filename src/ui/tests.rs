use super::state::{FileOperationResult, PendingConfirmAction};
use super::*;
use crate::interaction::ContextTarget;
use eframe::egui;
use serde_json::json;
use std::path::PathBuf;

fn raw_input(events: Vec<egui::Event>, modifiers: egui::Modifiers) -> egui::RawInput {
    let mut raw = egui::RawInput::default();
    raw.screen_rect = Some(egui::Rect::from_min_size(
        egui::Pos2::ZERO,
        egui::vec2(1200.0, 800.0),
    ));
    raw.modifiers = modifiers;
    raw.events = events;
    raw
}

/// Draws the canvas alone, filling the screen so screen and canvas coordinates agree.
fn canvas_frame(ctx: &egui::Context, app: &mut StudioApp, events: Vec<egui::Event>) {
    let _ = ctx.run(raw_input(events, egui::Modifiers::NONE), |ctx| {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                app.draw_canvas(ui);
            });
    });
}

fn press(pos: egui::Pos2, button: egui::PointerButton, pressed: bool) -> egui::Event {
    egui::Event::PointerButton {
        pos,
        button,
        pressed,
        modifiers: egui::Modifiers::NONE,
    }
}

fn key(key: egui::Key, modifiers: egui::Modifiers) -> egui::Event {
    egui::Event::Key {
        key,
        physical_key: None,
        pressed: true,
        repeat: false,
        modifiers,
    }
}

/// Hover, press, move and release with the primary button.
fn primary_drag(ctx: &egui::Context, app: &mut StudioApp, from: egui::Pos2, to: egui::Pos2) {
    canvas_frame(ctx, app, vec![egui::Event::PointerMoved(from)]);
    canvas_frame(ctx, app, vec![press(from, egui::PointerButton::Primary, true)]);
    canvas_frame(ctx, app, vec![egui::Event::PointerMoved(to)]);
    canvas_frame(ctx, app, vec![press(to, egui::PointerButton::Primary, false)]);
}

#[test]
fn palette_device_is_added_and_undone() {
    let mut app = StudioApp::default();

    let id = app.add_device_from_palette(DeviceKind::Firn);
    assert!(app.editor.diagram().node(id).is_some());
    assert!(app.editor.has_unsaved_changes());

    app.perform_undo();
    assert!(app.editor.diagram().is_empty());
}

#[test]
fn palette_uses_centre_of_visible_canvas() {
    let mut app = StudioApp::default();
    let ctx = egui::Context::default();
    canvas_frame(&ctx, &mut app, Vec::new());

    let id = app.add_device_from_palette(DeviceKind::Cctv);
    let position = app.editor.diagram().node(id).unwrap().position;
    // 600x400 snapped to the 50px grid
    assert_eq!(position, Point::new(600, 400));
}

#[test]
fn dragging_a_node_moves_and_snaps_it() {
    let mut app = StudioApp::default();
    let id = app.editor.add_node(DeviceKind::Firn, Point::new(100, 100));
    let ctx = egui::Context::default();

    primary_drag(&ctx, &mut app, egui::pos2(100.0, 100.0), egui::pos2(205.0, 148.0));

    assert_eq!(app.editor.diagram().node(id).unwrap().position, Point::new(200, 150));
    assert!(app.editor.interaction().is_idle());
    assert_eq!(app.editor.history().undo_len(), 2);

    app.perform_undo();
    assert_eq!(app.editor.diagram().node(id).unwrap().position, Point::new(100, 100));
}

#[test]
fn dragging_from_the_connector_draws_a_connection() {
    let mut app = StudioApp::default();
    let a = app.editor.add_node(DeviceKind::Cctv, Point::new(100, 100));
    let b = app.editor.add_node(DeviceKind::Controller, Point::new(300, 100));
    let ctx = egui::Context::default();

    // Connector sits 15px right of the body, vertically centred
    primary_drag(&ctx, &mut app, egui::pos2(140.0, 100.0), egui::pos2(300.0, 100.0));

    let connections = app.editor.diagram().connections();
    assert_eq!(connections.len(), 1);
    assert_eq!((connections[0].from, connections[0].to), (a, b));
    assert_eq!(app.editor.diagram().node(a).unwrap().position, Point::new(100, 100));
}

#[test]
fn connection_dropped_on_empty_canvas_is_discarded() {
    let mut app = StudioApp::default();
    app.editor.add_node(DeviceKind::Cctv, Point::new(100, 100));
    let ctx = egui::Context::default();

    primary_drag(&ctx, &mut app, egui::pos2(140.0, 100.0), egui::pos2(500.0, 500.0));

    assert!(app.editor.diagram().connections().is_empty());
    assert_eq!(app.editor.history().undo_len(), 1);
}

#[test]
fn right_click_opens_menu_for_node() {
    let mut app = StudioApp::default();
    let id = app.editor.add_node(DeviceKind::Tpe, Point::new(200, 200));
    let ctx = egui::Context::default();
    let pos = egui::pos2(200.0, 200.0);

    canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(pos)]);
    canvas_frame(&ctx, &mut app, vec![press(pos, egui::PointerButton::Secondary, true)]);
    canvas_frame(&ctx, &mut app, vec![press(pos, egui::PointerButton::Secondary, false)]);

    assert_eq!(app.context_menu.target, Some(ContextTarget::Node(id)));
    assert!(app.editor.interaction().is_idle());
}

#[test]
fn right_click_on_empty_canvas_opens_nothing() {
    let mut app = StudioApp::default();
    let ctx = egui::Context::default();
    let pos = egui::pos2(700.0, 500.0);

    canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(pos)]);
    canvas_frame(&ctx, &mut app, vec![press(pos, egui::PointerButton::Secondary, true)]);
    canvas_frame(&ctx, &mut app, vec![press(pos, egui::PointerButton::Secondary, false)]);

    assert!(app.context_menu.target.is_none());
}

#[test]
fn context_delete_removes_node_and_its_connections() {
    let mut app = StudioApp::default();
    let a = app.editor.add_node(DeviceKind::Cctv, Point::new(100, 100));
    let b = app.editor.add_node(DeviceKind::Controller, Point::new(300, 100));
    app.editor.connect(a, b).unwrap();

    app.run_context_action(ContextTarget::Node(b), ContextAction::DeleteNode);

    assert_eq!(app.editor.diagram().nodes().len(), 1);
    assert!(app.editor.diagram().connections().is_empty());

    app.perform_undo();
    app.perform_undo();
    assert_eq!(app.editor.diagram().nodes().len(), 2);
    assert_eq!(app.editor.diagram().connections().len(), 1);
}

#[test]
fn ctrl_z_shortcut_undoes() {
    let mut app = StudioApp::default();
    app.add_device_from_palette(DeviceKind::Redlight);
    let ctx = egui::Context::default();

    let _ = ctx.run(
        raw_input(
            vec![key(egui::Key::Z, egui::Modifiers::COMMAND)],
            egui::Modifiers::COMMAND,
        ),
        |ctx| app.handle_undo_redo_keys(ctx),
    );
    assert!(app.editor.diagram().is_empty());

    let redo_mods = egui::Modifiers::COMMAND | egui::Modifiers::SHIFT;
    let _ = ctx.run(
        raw_input(vec![key(egui::Key::Z, redo_mods)], redo_mods),
        |ctx| app.handle_undo_redo_keys(ctx),
    );
    assert_eq!(app.editor.diagram().nodes().len(), 1);
}

#[test]
fn ctrl_g_toggles_snapping() {
    let mut app = StudioApp::default();
    assert!(app.editor.settings().snap_to_grid);
    let ctx = egui::Context::default();

    let _ = ctx.run(
        raw_input(
            vec![key(egui::Key::G, egui::Modifiers::COMMAND)],
            egui::Modifiers::COMMAND,
        ),
        |ctx| app.handle_editor_keys(ctx),
    );

    assert!(!app.editor.settings().snap_to_grid);
    assert!(!app.editor.diagram().grid.snap_enabled);
}

#[test]
fn rename_rejects_blank_names() {
    let mut app = StudioApp::default();
    let id = app.editor.add_node(DeviceKind::Controller, Point::new(100, 100));

    app.run_context_action(ContextTarget::Node(id), ContextAction::Rename);
    assert_eq!(app.rename.node, Some(id));
    assert_eq!(app.rename.text, "Controller");

    app.rename.text = "   ".into();
    app.submit_rename(id);
    assert!(app.rename.error.is_some());
    assert_eq!(app.rename.node, Some(id));

    app.rename.text = "Main St controller".into();
    app.submit_rename(id);
    assert!(app.rename.node.is_none());
    assert_eq!(app.editor.diagram().node(id).unwrap().name, "Main St controller");
}

#[test]
fn properties_window_stores_characteristics() {
    let mut app = StudioApp::default();
    let id = app.editor.add_node(DeviceKind::Cctv, Point::new(100, 100));

    app.open_properties_at(Point::new(105, 95));
    assert_eq!(app.properties.node, Some(id));
    assert!(app.properties.rows.is_empty());

    app.properties.rows.push(("ip".into(), "10.0.0.7".into()));
    app.properties.new_key = "port".into();
    app.properties.new_value = "554".into();
    app.submit_properties(id);

    assert!(app.properties.node.is_none());
    let bag = &app.editor.diagram().node(id).unwrap().characteristics;
    assert_eq!(bag["ip"], json!("10.0.0.7"));
    assert_eq!(bag["port"], json!(554));

    app.perform_undo();
    assert!(app.editor.diagram().node(id).unwrap().characteristics.is_empty());
}

#[test]
fn kinds_without_dialog_do_not_open_properties() {
    let mut app = StudioApp::default();
    app.editor.add_node(DeviceKind::Redlight, Point::new(100, 100));

    app.open_properties_at(Point::new(100, 100));
    assert!(app.properties.node.is_none());
}

#[test]
fn undo_closes_windows_of_removed_nodes() {
    let mut app = StudioApp::default();
    let id = app.editor.add_node(DeviceKind::Tpe, Point::new(100, 100));
    app.open_properties_at(Point::new(100, 100));
    assert_eq!(app.properties.node, Some(id));

    app.perform_undo();
    assert!(app.properties.node.is_none());
}

#[test]
fn loaded_file_replaces_diagram() {
    let mut app = StudioApp::default();
    app.editor.add_node(DeviceKind::Firn, Point::new(0, 0));
    let content = r#"{
        "nodes": [
            {"type": "CCTV", "pos": {"x": 100, "y": 100}, "name": "Gate cam"},
            {"type": "Controller", "pos": {"x": 300, "y": 100}}
        ],
        "connections": [{"start": {"x": 100, "y": 100}, "end": {"x": 300, "y": 100}}],
        "version": "1.0"
    }"#;

    app.apply_file_result(FileOperationResult::LoadCompleted(
        PathBuf::from("site.kst"),
        content.to_string(),
    ));

    let diagram = app.editor.diagram();
    assert_eq!(diagram.nodes().len(), 2);
    assert_eq!(diagram.nodes()[0].name, "Gate cam");
    assert_eq!(diagram.connections().len(), 1);
    assert!(!app.editor.has_unsaved_changes());
    assert!(!app.editor.history().can_undo());
    assert_eq!(app.file.current_path, Some(PathBuf::from("site.kst")));
    assert!(app.error_message.is_none());
}

#[test]
fn malformed_file_leaves_diagram_alone() {
    let mut app = StudioApp::default();
    let id = app.editor.add_node(DeviceKind::Firn, Point::new(0, 0));

    app.apply_file_result(FileOperationResult::LoadCompleted(
        PathBuf::from("broken.kst"),
        "{ not json".to_string(),
    ));

    assert!(app.editor.diagram().node(id).is_some());
    assert!(app.error_message.is_some());
    assert!(app.file.current_path.is_none());
}

#[test]
fn save_completion_clears_unsaved_flag() {
    let mut app = StudioApp::default();
    app.editor.add_node(DeviceKind::Firn, Point::new(0, 0));
    assert!(app.editor.has_unsaved_changes());

    let (_, revision) = app.save_snapshot();
    app.apply_file_result(FileOperationResult::SaveCompleted(PathBuf::from("a.kst"), revision));

    assert!(!app.editor.has_unsaved_changes());
    assert_eq!(app.file.current_path, Some(PathBuf::from("a.kst")));
}

#[test]
fn edits_made_while_saving_stay_unsaved() {
    let mut app = StudioApp::default();
    app.editor.add_node(DeviceKind::Cctv, Point::new(0, 0));
    let (written, revision) = app.save_snapshot();

    app.editor.add_node(DeviceKind::Tpe, Point::new(200, 0));
    app.apply_file_result(FileOperationResult::SaveCompleted(PathBuf::from("a.kst"), revision));

    assert_eq!(written.nodes().len(), 1);
    assert!(app.editor.has_unsaved_changes());
    assert_eq!(app.file.current_path, Some(PathBuf::from("a.kst")));
}

#[test]
fn new_with_unsaved_changes_asks_first() {
    let mut app = StudioApp::default();
    app.editor.add_node(DeviceKind::Firn, Point::new(0, 0));

    app.confirm_then(PendingConfirmAction::New);
    assert!(app.file.show_unsaved_dialog);
    assert_eq!(app.editor.diagram().nodes().len(), 1);

    app.run_confirmed(PendingConfirmAction::New);
    assert!(app.editor.diagram().is_empty());
}

#[test]
fn failed_operation_is_reported() {
    let mut app = StudioApp::default();
    app.apply_file_result(FileOperationResult::OperationFailed("disk full".into()));
    assert_eq!(app.error_message.as_deref(), Some("disk full"));
}
