use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute carrying a node's stable key on the editable surface
pub const KEY_ATTRIBUTE: &str = "data-id";

/// Primitive element of the editable surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VNode {
    /// Block or inline element (p, h1, span, ...)
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        styles: BTreeMap<String, String>,
        children: Vec<VNode>,
        /// Stable identity shared with the document tree
        #[serde(skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },

    /// Literal text run
    Text {
        #[serde(skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        content: String,
    },
}

impl VNode {
    pub fn element(tag: impl Into<String>) -> Self {
        VNode::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            children: Vec::new(),
            key: None,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text {
            key: None,
            content: content.into(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let VNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(name.into(), value.into());
        }
        self
    }

    pub fn with_style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let VNode::Element { ref mut styles, .. } = self {
            styles.insert(name.into(), value.into());
        }
        self
    }

    pub fn with_child(mut self, child: VNode) -> Self {
        if let VNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: Vec<VNode>) -> Self {
        if let VNode::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    /// Key the node. Elements also expose the key as `data-id`.
    pub fn with_key(mut self, new_key: impl Into<String>) -> Self {
        let new_key = new_key.into();
        match self {
            VNode::Element {
                ref mut key,
                ref mut attributes,
                ..
            } => {
                attributes.insert(KEY_ATTRIBUTE.to_string(), new_key.clone());
                *key = Some(new_key);
            }
            VNode::Text { ref mut key, .. } => *key = Some(new_key),
        }
        self
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            VNode::Element { key, .. } | VNode::Text { key, .. } => key.as_deref(),
        }
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element { children, .. } => children,
            VNode::Text { .. } => &[],
        }
    }

    /// Text content as the surface would report it
    pub fn text_content(&self) -> String {
        match self {
            VNode::Text { content, .. } => content.clone(),
            VNode::Element { children, .. } => {
                children.iter().map(VNode::text_content).collect()
            }
        }
    }

    /// Depth-first search for a keyed node
    pub fn find(&self, key: &str) -> Option<&VNode> {
        if self.key() == Some(key) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(key))
    }
}

/// Rendered surface: the top-level nodes in document order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualDomDocument {
    pub nodes: Vec<VNode>,
}

impl VirtualDomDocument {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn add_node(&mut self, node: VNode) {
        self.nodes.push(node);
    }

    pub fn find(&self, key: &str) -> Option<&VNode> {
        self.nodes.iter().find_map(|node| node.find(key))
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut VNode> {
        find_in_mut(&mut self.nodes, key)
    }

    /// Detach a keyed node wherever it sits
    pub fn remove(&mut self, key: &str) -> Option<VNode> {
        remove_from(&mut self.nodes, key)
    }

    /// Every keyed node, depth-first
    pub fn keyed_nodes(&self) -> Vec<&VNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&VNode> = self.nodes.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if node.key().is_some() {
                out.push(node);
            }
            stack.extend(node.children().iter().rev());
        }
        out
    }
}

fn find_in_mut<'a>(nodes: &'a mut [VNode], key: &str) -> Option<&'a mut VNode> {
    for node in nodes {
        if node.key() == Some(key) {
            return Some(node);
        }
        if let VNode::Element { children, .. } = node {
            if let Some(found) = find_in_mut(children, key) {
                return Some(found);
            }
        }
    }
    None
}

fn remove_from(nodes: &mut Vec<VNode>, key: &str) -> Option<VNode> {
    if let Some(index) = nodes.iter().position(|node| node.key() == Some(key)) {
        return Some(nodes.remove(index));
    }
    nodes.iter_mut().find_map(|node| match node {
        VNode::Element { children, .. } => remove_from(children, key),
        VNode::Text { .. } => None,
    })
}
