use std::collections::HashMap;

use serde::Serialize;

/// Name given to elements that carry no `name` attribute.
pub const NO_NAME: &str = "[no name]";
/// Shown for a relationship end that carries no id.
pub const NO_ENDPOINT: &str = "[none]";
/// Type given to elements without an `xsi:type` annotation.
pub const UNKNOWN_TYPE: &str = "Unknown";
/// Name given to diagram views without a `name` attribute.
pub const UNNAMED_VIEW: &str = "Unnamed View";
/// `xsi:type` of a diagram view.
pub const DIAGRAM_MODEL_TYPE: &str = "archimate:ArchimateDiagramModel";
/// Marker that turns an element into a relationship.
pub const RELATIONSHIP_MARKER: &str = "Relationship";

pub const DEFAULT_BOX_WIDTH: i64 = 120;
pub const DEFAULT_BOX_HEIGHT: i64 = 55;
pub const DEFAULT_CANVAS_WIDTH: i64 = 800;
pub const DEFAULT_CANVAS_HEIGHT: i64 = 600;
pub const CANVAS_MARGIN: i64 = 100;

// ============================================
// Model
// ============================================

/// A semantic model element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A typed edge between two elements. Endpoints may name ids that do not
/// exist in the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Model {
    pub elements: Vec<Element>,
    pub relationships: Vec<Relationship>,
}

impl Model {
    pub fn name_lookup(&self) -> NameLookup {
        let names = self
            .elements
            .iter()
            .filter(|e| !e.id.is_empty())
            .map(|e| (e.id.clone(), e.name.clone()))
            .collect();
        NameLookup { names }
    }
}

/// Element id to element name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NameLookup {
    names: HashMap<String, String>,
}

impl NameLookup {
    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Resolved name, or the id itself when nothing matches.
    pub fn name_or_id<'a>(&'a self, id: &'a str) -> &'a str {
        self.resolve(id).unwrap_or(id)
    }

    /// Label drawn inside a diagram box.
    pub fn label_for<'a>(&'a self, b: &'a FlatBox) -> &'a str {
        match (b.element_id.as_deref(), b.name.as_deref()) {
            (Some(id), _) => self.name_or_id(id),
            (None, Some(name)) => name,
            (None, None) => "",
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ============================================
// Diagram geometry
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: DEFAULT_BOX_WIDTH,
            height: DEFAULT_BOX_HEIGHT,
        }
    }
}

/// A diagram object positioned relative to its parent container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualNode {
    pub id: Option<String>,
    pub element_id: Option<String>,
    pub name: Option<String>,
    pub bounds: Bounds,
    pub children: Vec<VisualNode>,
}

/// A diagram object in absolute canvas coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatBox {
    pub id: Option<String>,
    pub element_id: Option<String>,
    pub name: Option<String>,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl FlatBox {
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    pub fn right(&self) -> i64 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i64 {
        self.y.saturating_add(self.height)
    }
}

/// A `sourceConnection` as written in the file: two diagram object ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    pub source: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Segment {
    pub fn reversed(&self) -> Self {
        Self {
            x1: self.x2,
            y1: self.y2,
            x2: self.x1,
            y2: self.y1,
        }
    }
}

/// A renderable diagram view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagram {
    pub id: Option<String>,
    pub name: String,
    pub boxes: Vec<FlatBox>,
    pub segments: Vec<Segment>,
    pub canvas_width: i64,
    pub canvas_height: i64,
}
