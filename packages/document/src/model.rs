//! # RichNode Model
//!
//! The persisted, framework-agnostic representation of one document element.
//!
//! ```text
//! paragraph ─┬─ span { text: "plain " }
//!            └─ span { value: "bold", bold: true }
//! ```
//!
//! Blocks (`paragraph`, `heading`, lists) hold spans; spans are always leaves.
//! A node's `id` is assigned by the owning `DocumentTree` and is the join key
//! between the tree and the rendered surface.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Block/inline discriminator with an open extension point
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Label {
    Paragraph,
    Heading,
    UnorderedList,
    OrderedList,
    ListItem,
    Span,
    Custom(String),
}

impl Label {
    pub fn as_str(&self) -> &str {
        match self {
            Label::Paragraph => "paragraph",
            Label::Heading => "heading",
            Label::UnorderedList => "unordered-list",
            Label::OrderedList => "ordered-list",
            Label::ListItem => "list-item",
            Label::Span => "span",
            Label::Custom(name) => name,
        }
    }

    /// Everything except a text run is a block
    pub fn is_block(&self) -> bool {
        !matches!(self, Label::Span)
    }

    /// Level carried by a short heading alias (`h1`..`h6`)
    pub fn alias_level(value: &str) -> Option<u8> {
        match value.strip_prefix('h')?.parse::<u8>() {
            Ok(level @ 1..=6) => Some(level),
            _ => None,
        }
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        match value {
            "paragraph" | "p" => Label::Paragraph,
            "heading" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Label::Heading,
            "unordered-list" | "ul" => Label::UnorderedList,
            "ordered-list" | "ol" => Label::OrderedList,
            "list-item" | "li" => Label::ListItem,
            "span" => Label::Span,
            other => Label::Custom(other.to_string()),
        }
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Label::from(value.as_str())
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.as_str().to_string()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes of a styled run. `value` stands in for the literal text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledRun {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl StyledRun {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = Some(true);
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = Some(true);
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = Some(true);
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }
}

/// Payload of a node; its shape depends on the label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeData {
    /// Plain text run
    Text { text: String },

    /// Styled text run
    Styled(StyledRun),

    /// Free-form block payload (e.g. heading `level`)
    Attributes(BTreeMap<String, serde_json::Value>),
}

impl NodeData {
    pub fn text(text: impl Into<String>) -> Self {
        NodeData::Text { text: text.into() }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NodeData::Attributes(attrs) if attrs.is_empty())
    }

    /// Literal text of a run (`text` or `value`)
    pub fn run_text(&self) -> Option<&str> {
        match self {
            NodeData::Text { text } => Some(text),
            NodeData::Styled(run) => Some(&run.value),
            NodeData::Attributes(_) => None,
        }
    }

    /// Replace the literal text of a run in place, keeping its styling.
    /// A payload that carried no text becomes a plain run.
    pub fn set_run_text(&mut self, new_text: &str) {
        match self {
            NodeData::Text { text } => {
                text.clear();
                text.push_str(new_text);
            }
            NodeData::Styled(run) => {
                run.value.clear();
                run.value.push_str(new_text);
            }
            NodeData::Attributes(_) => *self = NodeData::text(new_text),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        match self {
            NodeData::Attributes(attrs) => attrs.get(key),
            _ => None,
        }
    }
}

impl Default for NodeData {
    fn default() -> Self {
        NodeData::Attributes(BTreeMap::new())
    }
}

/// One document element: a label, its payload, a stable id and its children
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RichNode {
    pub label: Label,

    #[serde(skip_serializing_if = "NodeData::is_empty")]
    pub data: NodeData,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub children: Vec<RichNode>,
}

impl<'de> Deserialize<'de> for RichNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        struct InnerNode {
            label: String,
            #[serde(default)]
            data: serde_json::Value,
            #[serde(default)]
            id: Option<String>,
            #[serde(default)]
            children: Vec<RichNode>,
        }

        let inner = InnerNode::deserialize(deserializer)?;
        let label = Label::from(inner.label.as_str());

        // Runs carry text; every block payload is a plain attribute map
        let mut data = match inner.data {
            serde_json::Value::Null => NodeData::default(),
            value if label.is_block() => {
                NodeData::Attributes(serde_json::from_value(value).map_err(D::Error::custom)?)
            }
            value => serde_json::from_value(value).map_err(D::Error::custom)?,
        };

        if let (Some(level), NodeData::Attributes(attrs)) =
            (Label::alias_level(&inner.label), &mut data)
        {
            attrs
                .entry("level".to_string())
                .or_insert_with(|| serde_json::Value::from(level));
        }

        Ok(RichNode {
            label,
            data,
            id: inner.id,
            children: inner.children,
        })
    }
}

impl RichNode {
    pub fn new(label: impl Into<Label>) -> Self {
        Self {
            label: label.into(),
            data: NodeData::default(),
            id: None,
            children: Vec::new(),
        }
    }

    pub fn paragraph(children: Vec<RichNode>) -> Self {
        Self::new(Label::Paragraph).with_children(children)
    }

    pub fn heading(level: u8, children: Vec<RichNode>) -> Self {
        let mut attrs = BTreeMap::new();
        attrs.insert("level".to_string(), serde_json::Value::from(level));
        Self::new(Label::Heading)
            .with_data(NodeData::Attributes(attrs))
            .with_children(children)
    }

    /// Plain text run
    pub fn span(text: impl Into<String>) -> Self {
        Self::new(Label::Span).with_data(NodeData::text(text))
    }

    /// Styled text run
    pub fn styled(run: StyledRun) -> Self {
        Self::new(Label::Span).with_data(NodeData::Styled(run))
    }

    /// A block of `label` holding one empty run (the minimum legal block)
    pub fn empty_block(label: Label) -> Self {
        Self::new(label).with_child(Self::span(""))
    }

    pub fn with_data(mut self, data: NodeData) -> Self {
        self.data = data;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_child(mut self, child: RichNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<RichNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Concatenated text of all descendant runs, in order
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = self.data.run_text() {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Copy of this subtree with every id cleared
    pub fn without_ids(&self) -> RichNode {
        RichNode {
            label: self.label.clone(),
            data: self.data.clone(),
            id: None,
            children: self.children.iter().map(RichNode::without_ids).collect(),
        }
    }
}
