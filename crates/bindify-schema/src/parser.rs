use crate::ast::{SchemaChild, SchemaNode};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed markup: {0}")]
    Markup(String),
}

/// Parse registry markup into an owned [`SchemaNode`] tree.
///
/// Text runs are kept exactly as written, whitespace included, since
/// declaration text is rebuilt by concatenating them. Comments and
/// processing instructions are dropped.
pub fn parse_document(input: &str) -> Result<SchemaNode, ParseError> {
    let document =
        roxmltree::Document::parse(input).map_err(|e| ParseError::Markup(e.to_string()))?;
    Ok(convert(document.root_element()))
}

pub fn load_document(path: impl AsRef<Path>) -> Result<SchemaNode, ParseError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_document(&content)
}

fn convert(element: roxmltree::Node<'_, '_>) -> SchemaNode {
    let mut node = SchemaNode::new(element.tag_name().name());
    node.attributes = element
        .attributes()
        .map(|attr| (attr.name().to_string(), attr.value().to_string()))
        .collect();

    for child in element.children() {
        if child.is_element() {
            node.children.push(SchemaChild::Element(convert(child)));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                node.children.push(SchemaChild::Text(text.to_string()));
            }
        }
    }

    node
}
