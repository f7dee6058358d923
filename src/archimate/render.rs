use crate::theme::Theme;
use crate::xml::escape_xml;

use super::types::{Diagram, FlatBox, NameLookup, Segment};

const LABEL_OFFSET_X: i64 = 5;
const LABEL_OFFSET_Y: i64 = 20;
const ARROW_MARKER_ID: &str = "arrow";

/// Style configuration for diagram rendering
#[derive(Debug, Clone)]
pub struct DiagramStyle {
    pub box_fill: String,
    pub box_stroke: String,
    pub box_stroke_width: f32,
    pub label_color: String,
    pub font_family: String,
    pub font_size: f32,
    pub connector_stroke: String,
    pub connector_stroke_width: f32,
    pub background: String,
    pub border: String,
}

impl Default for DiagramStyle {
    fn default() -> Self {
        Self::from_theme(&Theme::default())
    }
}

impl DiagramStyle {
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            box_fill: theme.box_fill.clone(),
            box_stroke: theme.box_stroke.clone(),
            box_stroke_width: theme.box_stroke_width,
            label_color: theme.label_color.clone(),
            font_family: theme.label_font_family.clone(),
            font_size: theme.label_font_size,
            connector_stroke: theme.connector_stroke.clone(),
            connector_stroke_width: theme.connector_stroke_width,
            background: theme.canvas_background.clone(),
            border: theme.canvas_border.clone(),
        }
    }
}

/// Render a diagram to a standalone SVG document.
///
/// Boxes are drawn in flattened order so nested objects paint over their
/// containers; connectors are drawn last.
pub fn render_diagram_svg(diagram: &Diagram, names: &NameLookup, style: &DiagramStyle) -> String {
    let (w, h) = (diagram.canvas_width, diagram.canvas_height);
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" style="border:1px solid {border};">"#,
        border = style.border
    );
    svg.push('\n');
    svg.push_str(&format!(
        r#"<rect width="{w}" height="{h}" fill="{}" />"#,
        style.background
    ));
    svg.push('\n');
    svg.push_str(&render_defs(style));

    for b in &diagram.boxes {
        svg.push_str(&render_box(b, names.label_for(b), style));
    }
    for segment in &diagram.segments {
        svg.push_str(&render_segment(segment, style));
    }

    svg.push_str("</svg>\n");
    svg
}

fn render_defs(style: &DiagramStyle) -> String {
    format!(
        r#"<defs><marker id="{ARROW_MARKER_ID}" markerWidth="10" markerHeight="10" refX="5" refY="3" orient="auto" markerUnits="strokeWidth"><path d="M0,0 L0,6 L9,3 z" fill="{}" /></marker></defs>
"#,
        style.connector_stroke
    )
}

fn render_box(b: &FlatBox, label: &str, style: &DiagramStyle) -> String {
    let mut svg = format!(
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="{}" stroke-width="{}" />"#,
        b.x, b.y, b.width, b.height, style.box_fill, style.box_stroke, style.box_stroke_width
    );
    svg.push('\n');

    if !label.is_empty() {
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}">{}</text>"#,
            b.x.saturating_add(LABEL_OFFSET_X),
            b.y.saturating_add(LABEL_OFFSET_Y),
            style.font_family,
            style.font_size,
            style.label_color,
            escape_xml(label)
        ));
        svg.push('\n');
    }

    svg
}

fn render_segment(segment: &Segment, style: &DiagramStyle) -> String {
    format!(
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" marker-end="url(#{ARROW_MARKER_ID})" />
"#,
        segment.x1,
        segment.y1,
        segment.x2,
        segment.y2,
        style.connector_stroke,
        style.connector_stroke_width
    )
}
