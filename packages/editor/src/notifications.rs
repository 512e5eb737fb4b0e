//! # Edit Notifications
//!
//! Low-level records emitted by the editable surface for one user-visible
//! edit. The surface delivers them as a batch; nothing here interprets them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    /// A text node's content changed
    CharacterData,
    /// Nodes were added or removed under an element
    ChildList,
}

/// Snapshot of a surface node at the time the record was captured
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceNode {
    /// Opaque identity assigned by the surface
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<u64>,

    /// `data-id` of the node, if it carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub node_name: String,

    /// Text content of the node after the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// `data-id` of the closest keyed ancestor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl SurfaceNode {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            ..Self::default()
        }
    }

    pub fn text_node() -> Self {
        Self::new("#text")
    }

    pub fn with_handle(mut self, handle: u64) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Whether both snapshots describe the same surface node.
    /// Handles decide when both sides carry one.
    pub fn same_node(&self, other: &SurfaceNode) -> bool {
        match (self.handle, other.handle) {
            (Some(a), Some(b)) => a == b,
            _ => self.id.is_some() && self.id == other.id && self.node_name == other.node_name,
        }
    }

    /// Id of the run this node belongs to: its own id, else its keyed ancestor's
    pub fn span_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.parent_id.as_deref())
    }
}

/// One low-level edit notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRecord {
    #[serde(rename = "type")]
    pub kind: NotificationKind,

    pub target: SurfaceNode,

    #[serde(default)]
    pub added_nodes: Vec<SurfaceNode>,

    #[serde(default)]
    pub removed_nodes: Vec<SurfaceNode>,

    #[serde(default)]
    pub previous_sibling: Option<SurfaceNode>,

    #[serde(default)]
    pub next_sibling: Option<SurfaceNode>,

    #[serde(default)]
    pub old_value: Option<String>,
}

impl EditRecord {
    pub fn character_data(target: SurfaceNode) -> Self {
        Self::new(NotificationKind::CharacterData, target)
    }

    pub fn child_list(target: SurfaceNode) -> Self {
        Self::new(NotificationKind::ChildList, target)
    }

    fn new(kind: NotificationKind, target: SurfaceNode) -> Self {
        Self {
            kind,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            old_value: None,
        }
    }

    pub fn with_added(mut self, node: SurfaceNode) -> Self {
        self.added_nodes.push(node);
        self
    }

    pub fn with_removed(mut self, node: SurfaceNode) -> Self {
        self.removed_nodes.push(node);
        self
    }

    pub fn with_previous_sibling(mut self, node: SurfaceNode) -> Self {
        self.previous_sibling = Some(node);
        self
    }

    pub fn with_next_sibling(mut self, node: SurfaceNode) -> Self {
        self.next_sibling = Some(node);
        self
    }

    pub fn with_old_value(mut self, value: impl Into<String>) -> Self {
        self.old_value = Some(value.into());
        self
    }

    pub fn has_sibling_snapshot(&self) -> bool {
        self.previous_sibling.is_some() || self.next_sibling.is_some()
    }
}

/// Records delivered together for one edit, in order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationBatch {
    pub records: Vec<EditRecord>,
}

impl MutationBatch {
    pub fn new(records: Vec<EditRecord>) -> Self {
        Self { records }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.records.iter().map(|record| record.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<EditRecord>> for MutationBatch {
    fn from(records: Vec<EditRecord>) -> Self {
        Self::new(records)
    }
}
