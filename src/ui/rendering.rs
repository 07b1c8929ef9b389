//! Canvas painting: turns a [`RenderScene`] into egui shapes.
//!
//! Elements are drawn in layers: background and grid first, then connections,
//! then nodes, then the rubber-band line of a connection being drawn.

use super::state::StudioApp;
use crate::constants::{CONNECTION_STROKE_WIDTH, LABEL_GAP};
use crate::render::{RenderLine, RenderNode, RenderScene, Rgb};
use crate::types::Point;
use eframe::egui;
use eframe::epaint::StrokeKind;

fn color(rgb: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(rgb.0, rgb.1, rgb.2)
}

impl StudioApp {
    /// Renders a scene onto the canvas area.
    pub fn render_scene(&self, painter: &egui::Painter, canvas_rect: egui::Rect, scene: &RenderScene) {
        painter.rect_filled(canvas_rect, 0.0, color(scene.palette.background));

        if scene.grid.visible {
            self.draw_grid(painter, canvas_rect, scene);
        }

        let line_color = color(scene.palette.connection);
        for (_, line) in &scene.connections {
            self.draw_line(painter, canvas_rect, line, line_color, false);
        }

        for node in &scene.nodes {
            self.draw_node(painter, canvas_rect, scene, node);
        }

        if let Some(band) = &scene.rubber_band {
            self.draw_line(painter, canvas_rect, band, line_color, true);
        }
    }

    /// Draws grid lines over the visible part of the canvas.
    fn draw_grid(&self, painter: &egui::Painter, canvas_rect: egui::Rect, scene: &RenderScene) {
        let size = scene.grid.size;
        if size < 2 {
            return;
        }
        let stroke = egui::Stroke::new(1.0, color(scene.palette.grid));
        let top_left = self.canvas.screen_to_canvas(canvas_rect, canvas_rect.min);
        let bottom_right = self.canvas.screen_to_canvas(canvas_rect, canvas_rect.max);

        let mut x = top_left.x.div_euclid(size) * size;
        while x <= bottom_right.x {
            let screen_x = self.canvas.canvas_to_screen(canvas_rect, Point::new(x, 0)).x;
            painter.line_segment(
                [
                    egui::pos2(screen_x, canvas_rect.min.y),
                    egui::pos2(screen_x, canvas_rect.max.y),
                ],
                stroke,
            );
            x += size;
        }

        let mut y = top_left.y.div_euclid(size) * size;
        while y <= bottom_right.y {
            let screen_y = self.canvas.canvas_to_screen(canvas_rect, Point::new(0, y)).y;
            painter.line_segment(
                [
                    egui::pos2(canvas_rect.min.x, screen_y),
                    egui::pos2(canvas_rect.max.x, screen_y),
                ],
                stroke,
            );
            y += size;
        }
    }

    /// Draws a connection line with its arrowhead, or a dashed provisional line.
    fn draw_line(
        &self,
        painter: &egui::Painter,
        canvas_rect: egui::Rect,
        line: &RenderLine,
        line_color: egui::Color32,
        provisional: bool,
    ) {
        let to_screen = |p: Point| self.canvas.canvas_to_screen(canvas_rect, p);
        let start = to_screen(line.start);
        let end = to_screen(line.end);
        let stroke = egui::Stroke::new(CONNECTION_STROKE_WIDTH, line_color);

        if provisional {
            painter.extend(egui::Shape::dashed_line(&[start, end], stroke, 6.0, 4.0));
        } else {
            painter.line_segment([start, end], stroke);
        }

        if let Some(head) = line.arrow_head {
            painter.add(egui::Shape::convex_polygon(
                head.iter().map(|p| to_screen(*p)).collect(),
                line_color,
                egui::Stroke::NONE,
            ));
        }
    }

    /// Draws a node body, its kind, the connector dot and the label underneath.
    fn draw_node(&self, painter: &egui::Painter, canvas_rect: egui::Rect, scene: &RenderScene, node: &RenderNode) {
        let palette = scene.palette;
        let min = self
            .canvas
            .canvas_to_screen(canvas_rect, Point::new(node.body.x, node.body.y));
        let rect = egui::Rect::from_min_size(
            min,
            egui::vec2(node.body.width as f32, node.body.height as f32),
        );

        let (border, width) = if node.highlighted {
            (color(palette.node_highlight), 2.0)
        } else {
            (color(palette.node_border), 1.0)
        };
        painter.rect_filled(rect, 4.0, color(palette.node_fill));
        painter.rect_stroke(rect, 4.0, egui::Stroke::new(width, border), StrokeKind::Inside);

        // Icons are not loaded; the kind name stands in for them
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            node.kind.as_str(),
            egui::FontId::proportional(10.0),
            color(palette.text),
        );

        let dot = self.canvas.canvas_to_screen(canvas_rect, node.connector);
        painter.circle_filled(dot, node.connector_radius as f32, color(palette.connector));

        painter.text(
            egui::pos2(rect.center().x, rect.max.y + LABEL_GAP as f32),
            egui::Align2::CENTER_TOP,
            &node.label,
            egui::FontId::proportional(12.0),
            color(palette.text),
        );
    }
}
