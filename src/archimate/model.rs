use log::debug;

use crate::xml::{Document, XmlNode};

use super::types::{Element, Model, NO_NAME, RELATIONSHIP_MARKER, Relationship, UNKNOWN_TYPE};

/// Collect every `element` node in the document, at any depth, into
/// elements and relationships. Document order is preserved in both lists.
pub fn extract_model(document: &Document) -> Model {
    let mut model = Model::default();

    for node in document.descendants().filter(|n| n.is("element")) {
        match classify(node) {
            Classified::Element(e) => model.elements.push(e),
            Classified::Relationship(r) => model.relationships.push(r),
        }
    }

    debug!(
        elements = model.elements.len(),
        relationships = model.relationships.len();
        "Extracted model"
    );
    model
}

enum Classified {
    Element(Element),
    Relationship(Relationship),
}

fn classify(node: &XmlNode) -> Classified {
    let kind = node.type_annotation().unwrap_or(UNKNOWN_TYPE).to_string();
    let id = node.attr("id").unwrap_or_default().to_string();
    let name = node.attr("name").unwrap_or(NO_NAME).to_string();

    if kind.contains(RELATIONSHIP_MARKER) {
        Classified::Relationship(Relationship {
            id,
            name,
            kind,
            source: node.attr("source").map(str::to_string),
            target: node.attr("target").map(str::to_string),
        })
    } else {
        Classified::Element(Element { id, name, kind })
    }
}
