//! Export utilities: render a [`RenderScene`] to SVG and PNG.
//!
//! The SVG is built by hand from the scene snapshot and then rasterised with
//! usvg/resvg for PNG output, so both formats show exactly the same picture.

use crate::constants::{CONNECTION_STROKE_WIDTH, LABEL_GAP};
use crate::error::{DiagramError, Result};
use crate::geometry::Rect;
use crate::render::{RenderLine, RenderScene, Rgb};
use crate::types::Point;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Vertical room reserved below a node body for its label.
const LABEL_HEIGHT: i32 = 14;

/// Options controlling an export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// Empty space around the diagram, in canvas pixels
    pub margin: i32,
    /// Raster scale factor for PNG output
    pub png_scale: f32,
    /// Fill the picture with the theme background
    pub include_background: bool,
    /// Draw grid lines (only if the grid is visible on the canvas)
    pub include_grid: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            margin: 20,
            png_scale: 1.0,
            include_background: true,
            include_grid: false,
        }
    }
}

/// Builds an SVG document for `scene`. Returns `(svg, width, height)`.
pub fn scene_to_svg(scene: &RenderScene, options: &ExportOptions) -> (String, u32, u32) {
    let margin = options.margin.max(0);
    let bounds = scene.bounds().unwrap_or(Rect {
        x: 0,
        y: 0,
        width: 1,
        height: 1,
    });
    let min_x = bounds.x - margin;
    let min_y = bounds.y - margin;
    let width = (bounds.width + 2 * margin).max(1) as u32;
    let height = (bounds.height + LABEL_GAP + LABEL_HEIGHT + 2 * margin).max(1) as u32;

    let map = |p: Point| (p.x - min_x, p.y - min_y);
    let palette = scene.palette;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    );

    if options.include_background {
        let _ = writeln!(
            out,
            "<rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"{}\" />",
            palette.background.to_hex()
        );
    }

    if options.include_grid && scene.grid.visible && scene.grid.size > 0 {
        let size = scene.grid.size;
        let _ = writeln!(out, "<g stroke=\"{}\" stroke-width=\"1\">", palette.grid.to_hex());
        let first_x = min_x.div_euclid(size) * size + size;
        for x in (first_x..min_x + width as i32).step_by(size as usize) {
            let sx = x - min_x;
            let _ = writeln!(out, "<line x1=\"{sx}\" y1=\"0\" x2=\"{sx}\" y2=\"{height}\" />");
        }
        let first_y = min_y.div_euclid(size) * size + size;
        for y in (first_y..min_y + height as i32).step_by(size as usize) {
            let sy = y - min_y;
            let _ = writeln!(out, "<line x1=\"0\" y1=\"{sy}\" x2=\"{width}\" y2=\"{sy}\" />");
        }
        let _ = writeln!(out, "</g>");
    }

    for (_, line) in &scene.connections {
        write_line(&mut out, line, palette.connection, &map);
    }

    for node in &scene.nodes {
        let (x, y) = map(Point::new(node.body.x, node.body.y));
        let border = if node.highlighted {
            palette.node_highlight
        } else {
            palette.node_border
        };
        let _ = writeln!(
            out,
            "<rect x=\"{x}\" y=\"{y}\" width=\"{}\" height=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\" />",
            node.body.width,
            node.body.height,
            palette.node_fill.to_hex(),
            border.to_hex(),
            if node.highlighted { 2 } else { 1 }
        );

        let (cx, cy) = map(node.position);
        let _ = writeln!(
            out,
            "<text x=\"{cx}\" y=\"{cy}\" font-family=\"sans-serif\" font-size=\"10\" text-anchor=\"middle\" dominant-baseline=\"middle\" fill=\"{}\">{}</text>",
            palette.text.to_hex(),
            escape_xml(node.kind.as_str())
        );

        let (dx, dy) = map(node.connector);
        let _ = writeln!(
            out,
            "<circle cx=\"{dx}\" cy=\"{dy}\" r=\"{}\" fill=\"{}\" />",
            node.connector_radius,
            palette.connector.to_hex()
        );

        let label_y = y + node.body.height + LABEL_GAP + LABEL_HEIGHT / 2;
        let _ = writeln!(
            out,
            "<text x=\"{cx}\" y=\"{label_y}\" font-family=\"sans-serif\" font-size=\"12\" text-anchor=\"middle\" dominant-baseline=\"middle\" fill=\"{}\">{}</text>",
            palette.text.to_hex(),
            escape_xml(&node.label)
        );
    }

    if let Some(band) = &scene.rubber_band {
        write_line(&mut out, band, palette.connection, &map);
    }

    let _ = writeln!(out, "</svg>");
    (out, width, height)
}

fn write_line(out: &mut String, line: &RenderLine, color: Rgb, map: &impl Fn(Point) -> (i32, i32)) {
    let (x1, y1) = map(line.start);
    let (x2, y2) = map(line.end);
    let color = color.to_hex();
    let _ = writeln!(
        out,
        "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\" stroke=\"{color}\" stroke-width=\"{CONNECTION_STROKE_WIDTH}\" />"
    );
    if let Some([tip, left, right]) = line.arrow_head {
        let points: Vec<String> = [tip, left, right]
            .into_iter()
            .map(|p| {
                let (x, y) = map(p);
                format!("{x},{y}")
            })
            .collect();
        let _ = writeln!(out, "<polygon points=\"{}\" fill=\"{color}\" />", points.join(" "));
    }
}

/// Rasterises an SVG document at `scale`.
pub fn rasterize(svg: &str, width: u32, height: u32, scale: f32) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    opt.fontdb = Arc::new(db);

    let tree = usvg::Tree::from_data(svg.as_bytes(), &opt)
        .map_err(|e| DiagramError::Export(format!("could not parse SVG: {e}")))?;

    let scale = scale.clamp(0.25, 8.0);
    let out_w = ((width as f32) * scale).round().max(1.0) as u32;
    let out_h = ((height as f32) * scale).round().max(1.0) as u32;
    let mut pixmap = tiny_skia::Pixmap::new(out_w, out_h)
        .ok_or_else(|| DiagramError::Export(format!("cannot allocate a {out_w}x{out_h} image")))?;

    let transform = tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Encodes `scene` as PNG bytes.
pub fn scene_to_png(scene: &RenderScene, options: &ExportOptions) -> Result<Vec<u8>> {
    let (svg, width, height) = scene_to_svg(scene, options);
    let pixmap = rasterize(&svg, width, height, options.png_scale)?;
    pixmap
        .encode_png()
        .map_err(|e| DiagramError::Export(format!("could not encode PNG: {e}")))
}

/// Writes `scene` as an SVG file.
pub fn write_svg(scene: &RenderScene, options: &ExportOptions, path: &Path) -> Result<()> {
    let (svg, _, _) = scene_to_svg(scene, options);
    std::fs::write(path, svg)?;
    log::info!("exported SVG to {}", path.display());
    Ok(())
}

/// Writes `scene` as a PNG file.
pub fn write_png(scene: &RenderScene, options: &ExportOptions, path: &Path) -> Result<()> {
    let bytes = scene_to_png(scene, options)?;
    std::fs::write(path, bytes)?;
    log::info!("exported PNG to {}", path.display());
    Ok(())
}

fn escape_xml(input: &str) -> String {
    let mut s = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            '"' => s.push_str("&quot;"),
            '\'' => s.push_str("&apos;"),
            _ => s.push(ch),
        }
    }
    s
}
