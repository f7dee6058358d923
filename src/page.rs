//! Static HTML pages for browsing a directory of models.

use crate::archimate::{DiagramStyle, NO_ENDPOINT, render_diagram_svg};
use crate::theme::Theme;
use crate::viewer::{ModelView, ViewOutcome};
use crate::xml::escape_xml;

pub const INDEX_PAGE: &str = "index.html";

/// File name of the page generated for a model file.
pub fn page_filename(model_file: &str) -> String {
    format!("{model_file}.html")
}

pub fn render_index(files: &[String], theme: &Theme) -> String {
    let mut body = String::from("<h1>ArchiMate Viewer</h1>\n");
    if files.is_empty() {
        body.push_str("<p>No .archimate files found.</p>\n");
    } else {
        body.push_str("<ul>\n");
        for file in files {
            body.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape_xml(&page_filename(file)),
                escape_xml(file)
            ));
        }
        body.push_str("</ul>\n");
    }
    document("ArchiMate Viewer", &body, theme)
}

pub fn render_outcome(outcome: &ViewOutcome, theme: &Theme) -> String {
    let title = outcome.filename();
    let body = match outcome {
        ViewOutcome::NotFound { filename } => {
            format!("<h2>File not found: {}</h2>\n", escape_xml(filename))
        }
        ViewOutcome::Failed { filename, message } => format!(
            "<h2>Error parsing {}: {}</h2>\n",
            escape_xml(filename),
            escape_xml(message)
        ),
        ViewOutcome::Rendered(view) => render_view_body(view, &DiagramStyle::from_theme(theme)),
    };
    document(title, &body, theme)
}

fn render_view_body(view: &ModelView, style: &DiagramStyle) -> String {
    let mut body = format!(
        "<h1>Viewing: {}</h1>\n<a href=\"{INDEX_PAGE}\">← Back to file list</a>\n",
        escape_xml(&view.filename)
    );
    body.push_str(&format!(
        "<p><strong>Elements:</strong> {} | <strong>Relationships:</strong> {}</p>\n",
        view.model.elements.len(),
        view.model.relationships.len()
    ));

    body.push_str("<ul>\n");
    for element in &view.model.elements {
        body.push_str(&format!(
            "<li>{} ({})</li>\n",
            escape_xml(&element.name),
            escape_xml(&element.kind)
        ));
    }
    body.push_str("</ul>\n<ul>\n");
    for rel in &view.model.relationships {
        let source = rel.source.as_deref().map(|id| view.names.name_or_id(id));
        let target = rel.target.as_deref().map(|id| view.names.name_or_id(id));
        body.push_str(&format!(
            "<li>{} from {} → {}</li>\n",
            escape_xml(&rel.kind),
            escape_xml(source.unwrap_or(NO_ENDPOINT)),
            escape_xml(target.unwrap_or(NO_ENDPOINT))
        ));
    }
    body.push_str("</ul>\n");

    for diagram in &view.diagrams {
        body.push_str(&format!("<h3>📊 Diagram: {}</h3>\n", escape_xml(&diagram.name)));
        body.push_str(&render_diagram_svg(diagram, &view.names, style));
    }

    body
}

fn document(title: &str, body: &str, theme: &Theme) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{}</title>
</head>
<body style="background:{};color:{};font-family:sans-serif;">
{}</body>
</html>
"#,
        escape_xml(title),
        theme.page_background,
        theme.page_text,
        body
    )
}
