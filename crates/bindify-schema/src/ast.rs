use serde::{Deserialize, Serialize};

/// Child of an element: a nested element or a run of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaChild {
    Element(SchemaNode),
    Text(String),
}

/// Element of an already-parsed registry document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaNode {
    pub tag: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    pub children: Vec<SchemaChild>,
}

impl SchemaNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: SchemaNode) -> Self {
        self.children.push(SchemaChild::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(SchemaChild::Text(text.into()));
        self
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Like [`attr`](Self::attr) but a blank value counts as missing
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|value| !value.trim().is_empty())
    }

    pub fn elements(&self) -> impl Iterator<Item = &SchemaNode> {
        self.children.iter().filter_map(|child| match child {
            SchemaChild::Element(node) => Some(node),
            SchemaChild::Text(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_accessors() {
        let node = SchemaNode::new("param")
            .with_attr("group", "")
            .with_child(SchemaNode::new("ptype").with_text("GLenum"))
            .with_text(" ")
            .with_child(SchemaNode::new("name").with_text("mode"));

        assert!(node.is("param"));
        assert_eq!(node.attr("group"), Some(""));
        assert_eq!(node.non_empty_attr("group"), None);
        assert_eq!(node.elements().count(), 2);
    }
}
