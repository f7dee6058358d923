//! The per-file view operation: locate a model file, parse it, and build
//! every diagram view it contains.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::Serialize;

use crate::archimate::{Diagram, Model, NameLookup, build_diagrams, extract_model};
use crate::error::Result;
use crate::xml::Document;

pub const MODEL_EXTENSION: &str = ".archimate";

/// Everything derived from one model file.
#[derive(Debug, Clone, Serialize)]
pub struct ModelView {
    pub filename: String,
    pub model: Model,
    pub names: NameLookup,
    pub diagrams: Vec<Diagram>,
}

impl ModelView {
    /// Find a diagram by name, falling back to its id.
    pub fn diagram(&self, name_or_id: &str) -> Option<&Diagram> {
        self.diagrams
            .iter()
            .find(|d| d.name == name_or_id)
            .or_else(|| {
                self.diagrams
                    .iter()
                    .find(|d| d.id.as_deref() == Some(name_or_id))
            })
    }
}

/// Result of viewing a file by name. Failures are values, so a caller can
/// show them to the user without aborting.
#[derive(Debug)]
pub enum ViewOutcome {
    Rendered(ModelView),
    NotFound { filename: String },
    Failed { filename: String, message: String },
}

impl ViewOutcome {
    pub fn filename(&self) -> &str {
        match self {
            ViewOutcome::Rendered(view) => &view.filename,
            ViewOutcome::NotFound { filename } | ViewOutcome::Failed { filename, .. } => filename,
        }
    }
}

/// Model files in `dir`, sorted by name.
pub fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut files: Vec<String> = fs::read_dir(dir)?
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(MODEL_EXTENSION))
        .collect();
    files.sort();
    Ok(files)
}

pub fn build_view(source: &str, filename: &str) -> Result<ModelView> {
    let document = Document::parse(source)?;
    let model = extract_model(&document);
    let names = model.name_lookup();
    let diagrams = build_diagrams(&document);

    Ok(ModelView {
        filename: filename.to_string(),
        model,
        names,
        diagrams,
    })
}

pub fn load_view(path: &Path) -> Result<ModelView> {
    let source = fs::read_to_string(path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    build_view(&source, &filename)
}

/// View `filename` inside `dir`.
///
/// Names that would escape `dir` are reported as not found without any
/// filesystem access.
pub fn view_file(dir: &Path, filename: &str) -> ViewOutcome {
    if !is_plain_filename(filename) {
        warn!(filename; "Rejected file name outside the model directory");
        return ViewOutcome::NotFound {
            filename: filename.to_string(),
        };
    }

    let path = dir.join(filename);
    if !path.exists() {
        info!(filename; "Model file not found");
        return ViewOutcome::NotFound {
            filename: filename.to_string(),
        };
    }

    match load_view(&path) {
        Ok(view) => {
            info!(
                filename,
                elements = view.model.elements.len(),
                diagrams = view.diagrams.len();
                "Viewed model file"
            );
            ViewOutcome::Rendered(view)
        }
        Err(err) => {
            warn!(filename, error = err.to_string(); "Failed to view model file");
            ViewOutcome::Failed {
                filename: filename.to_string(),
                message: err.to_string(),
            }
        }
    }
}

fn is_plain_filename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
