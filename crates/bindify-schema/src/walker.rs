//! Depth-first traversal of a [`SchemaNode`] tree with pruning.
//!
//! The walker calls [`Visitor::enter_root`] for the node it was started on
//! and [`Visitor::enter`] for every descendant element. Returning `false`
//! from either skips that node's children and text, but [`Visitor::exit`]
//! still fires so enter/exit stay paired. The tree is never mutated.

use crate::ast::{SchemaChild, SchemaNode};

/// Elements between the walk root and the node being visited.
///
/// For an element, the last entry is its parent. For text, the last entry
/// is the element that contains the text.
#[derive(Debug, Clone, Copy)]
pub struct Ancestry<'a> {
    nodes: &'a [&'a SchemaNode],
}

impl<'a> Ancestry<'a> {
    pub fn new(nodes: &'a [&'a SchemaNode]) -> Self {
        Self { nodes }
    }

    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent(&self) -> Option<&'a SchemaNode> {
        self.nodes.last().copied()
    }

    pub fn grandparent(&self) -> Option<&'a SchemaNode> {
        self.nodes.len().checked_sub(2).map(|i| self.nodes[i])
    }

    pub fn parent_is(&self, tag: &str) -> bool {
        self.parent().is_some_and(|node| node.is(tag))
    }

    /// Parent has tag `parent` and grandparent has tag `grandparent`
    pub fn stack_is(&self, parent: &str, grandparent: &str) -> bool {
        self.parent_is(parent) && self.grandparent().is_some_and(|node| node.is(grandparent))
    }
}

pub trait Visitor {
    fn enter_root(&mut self, _node: &SchemaNode) -> bool {
        true
    }

    fn enter(&mut self, node: &SchemaNode, ancestry: Ancestry<'_>) -> bool;

    fn text(&mut self, _text: &str, _ancestry: Ancestry<'_>) {}

    fn exit(&mut self, _node: &SchemaNode, _ancestry: Ancestry<'_>) {}
}

pub fn walk<V: Visitor + ?Sized>(root: &SchemaNode, visitor: &mut V) {
    let mut stack: Vec<&SchemaNode> = Vec::new();
    if visitor.enter_root(root) {
        stack.push(root);
        descend(root, &mut stack, visitor);
        stack.pop();
    }
    visitor.exit(root, Ancestry::new(&stack));
}

fn descend<'a, V: Visitor + ?Sized>(
    node: &'a SchemaNode,
    stack: &mut Vec<&'a SchemaNode>,
    visitor: &mut V,
) {
    for child in &node.children {
        match child {
            SchemaChild::Text(text) => visitor.text(text, Ancestry::new(stack)),
            SchemaChild::Element(element) => {
                if visitor.enter(element, Ancestry::new(stack)) {
                    stack.push(element);
                    descend(element, stack, visitor);
                    stack.pop();
                }
                visitor.exit(element, Ancestry::new(stack));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every callback as a line
    #[derive(Default)]
    struct Trace {
        events: Vec<String>,
        prune: &'static str,
    }

    impl Visitor for Trace {
        fn enter_root(&mut self, node: &SchemaNode) -> bool {
            self.events.push(format!("root {}", node.tag));
            node.tag != self.prune
        }

        fn enter(&mut self, node: &SchemaNode, ancestry: Ancestry<'_>) -> bool {
            self.events.push(format!("enter {}@{}", node.tag, ancestry.depth()));
            node.tag != self.prune
        }

        fn text(&mut self, text: &str, ancestry: Ancestry<'_>) {
            let parent = ancestry.parent().map(|n| n.tag.as_str()).unwrap_or("-");
            self.events.push(format!("text {} in {}", text, parent));
        }

        fn exit(&mut self, node: &SchemaNode, _ancestry: Ancestry<'_>) {
            self.events.push(format!("exit {}", node.tag));
        }
    }

    fn sample() -> SchemaNode {
        SchemaNode::new("command")
            .with_child(
                SchemaNode::new("proto")
                    .with_text("void ")
                    .with_child(SchemaNode::new("name").with_text("glFlush")),
            )
            .with_child(SchemaNode::new("glx").with_text("ignored"))
    }

    #[test]
    fn test_depth_first_order() {
        let mut trace = Trace::default();
        walk(&sample(), &mut trace);
        assert_eq!(
            trace.events,
            vec![
                "root command",
                "enter proto@1",
                "text void  in proto",
                "enter name@2",
                "text glFlush in name",
                "exit name",
                "exit proto",
                "enter glx@1",
                "text ignored in glx",
                "exit glx",
                "exit command",
            ]
        );
    }

    #[test]
    fn test_pruned_node_still_exits() {
        let mut trace = Trace {
            prune: "proto",
            ..Trace::default()
        };
        walk(&sample(), &mut trace);
        assert!(trace.events.contains(&"exit proto".to_string()));
        assert!(!trace.events.iter().any(|e| e.contains("glFlush")));
    }

    #[test]
    fn test_pruned_root_still_exits() {
        let mut trace = Trace {
            prune: "command",
            ..Trace::default()
        };
        walk(&sample(), &mut trace);
        assert_eq!(trace.events, vec!["root command", "exit command"]);
    }

    #[test]
    fn test_stack_is() {
        struct NameUnderProto(bool);
        impl Visitor for NameUnderProto {
            fn enter(&mut self, _node: &SchemaNode, _ancestry: Ancestry<'_>) -> bool {
                true
            }
            fn text(&mut self, text: &str, ancestry: Ancestry<'_>) {
                if ancestry.stack_is("name", "proto") {
                    self.0 = text == "glFlush";
                }
            }
        }

        let mut visitor = NameUnderProto(false);
        walk(&sample(), &mut visitor);
        assert!(visitor.0);
    }
}
