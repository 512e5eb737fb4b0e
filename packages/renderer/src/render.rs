//! # Renderer
//!
//! Pure projection from RichNode trees onto the editable surface's primitive
//! elements. Every produced node is keyed by its RichNode id, so rendering an
//! unchanged node twice yields identical output and the host's own diffing
//! leaves it alone.

use crate::vdom::{VNode, VirtualDomDocument};
use mutator_document::{DocumentTree, Label, NodeData, RichNode, StyledRun};

const DEFAULT_HEADING_LEVEL: u64 = 1;

/// Render one node and its descendants
pub fn render(node: &RichNode) -> VNode {
    let rendered = match &node.label {
        Label::Span if node.children.is_empty() => render_run(&node.data),
        Label::Span => block("span", node),
        Label::Paragraph => block("p", node),
        Label::Heading => block(&heading_tag(&node.data), node),
        Label::UnorderedList => block("ul", node),
        Label::OrderedList => block("ol", node),
        Label::ListItem => block("li", node),
        Label::Custom(name) => block("div", node).with_attr("data-label", name.as_str()),
    };

    match &node.id {
        Some(id) => rendered.with_key(id.as_str()),
        None => rendered,
    }
}

pub fn render_forest(nodes: &[RichNode]) -> VirtualDomDocument {
    VirtualDomDocument {
        nodes: nodes.iter().map(render).collect(),
    }
}

/// Render the live tree in document order
pub fn render_tree(tree: &DocumentTree) -> VirtualDomDocument {
    render_forest(&tree.to_list())
}

fn block(tag: &str, node: &RichNode) -> VNode {
    VNode::element(tag).with_children(node.children.iter().map(render).collect())
}

fn render_run(data: &NodeData) -> VNode {
    match data {
        NodeData::Text { text } => VNode::text(text.as_str()),
        NodeData::Styled(run) => styled_span(run),
        NodeData::Attributes(_) => VNode::text(""),
    }
}

fn styled_span(run: &StyledRun) -> VNode {
    let mut span = VNode::element("span");
    if run.bold == Some(true) {
        span = span.with_style("font-weight", "bold");
    }
    if run.italic == Some(true) {
        span = span.with_style("font-style", "italic");
    }
    if run.underline == Some(true) {
        span = span.with_style("text-decoration", "underline");
    }
    if let Some(color) = &run.color {
        span = span.with_style("color", color.as_str());
    }
    if let Some(background) = &run.background {
        span = span.with_style("background-color", background.as_str());
    }
    span.with_child(VNode::text(run.value.as_str()))
}

fn heading_tag(data: &NodeData) -> String {
    let level = data
        .attribute("level")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(DEFAULT_HEADING_LEVEL)
        .clamp(1, 6);
    format!("h{}", level)
}
