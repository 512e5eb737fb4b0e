//! # Document Tree
//!
//! Arena-backed navigable structure over a RichNode forest.
//!
//! ## Design
//!
//! Every node lives in one `SlotMap` slot and refers to its relatives by key:
//!
//! ```text
//!            parent (lookup only)
//!                 ↑
//!   prev ←── [ node ] ──→ next
//!                 │
//!               child ──→ first child ──→ ... (owned chain)
//! ```
//!
//! Only the `child` chain expresses ownership: removing a node removes every
//! node reachable from its `child` chain. `parent`/`prev`/`next` are plain keys,
//! so there are no reference cycles to manage. An `id → key` index gives O(1)
//! lookup and removal by id.
//!
//! Structural edits never repair the "every block has a child" invariant on
//! their own; callers that batch removals repair afterwards.

use crate::error::{TreeError, TreeResult};
use crate::id_generator::IdGenerator;
use crate::model::{Label, NodeData, RichNode};
use slotmap::SlotMap;
use std::collections::HashMap;

slotmap::new_key_type! {
    /// Arena key of a tree node. Keys are generational, so a key to a removed
    /// node never aliases a later insertion.
    pub struct NodeKey;
}

#[derive(Debug, Clone)]
struct TreeNode {
    id: String,
    label: Label,
    data: NodeData,
    parent: Option<NodeKey>,
    prev: Option<NodeKey>,
    next: Option<NodeKey>,
    child: Option<NodeKey>,
    last_child: Option<NodeKey>,
}

/// Editable document: a RichNode forest with parent/sibling/child links
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: SlotMap<NodeKey, TreeNode>,
    index: HashMap<String, NodeKey>,
    head: Option<NodeKey>,
    tail: Option<NodeKey>,
    ids: IdGenerator,
}

impl DocumentTree {
    /// Create an empty tree that draws ids from `ids`
    pub fn new(ids: IdGenerator) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            index: HashMap::new(),
            head: None,
            tail: None,
            ids,
        }
    }

    /// Build the tree for a top-level sequence, assigning fresh ids depth-first.
    ///
    /// Any ids already present on `nodes` are ignored.
    pub fn construct(nodes: Vec<RichNode>, ids: IdGenerator) -> Self {
        let mut tree = Self::new(ids);
        for node in nodes {
            let key = tree.build(node);
            tree.link_last(None, key);
        }
        tracing::trace!(nodes = tree.len(), "constructed document tree");
        tree
    }

    /// Build with the default id generator
    pub fn from_forest(nodes: Vec<RichNode>) -> Self {
        Self::construct(nodes, IdGenerator::default())
    }

    /// Serialize the live structure back to plain RichNode trees, in document order
    pub fn to_list(&self) -> Vec<RichNode> {
        self.roots().map(|node| node.to_rich_node()).collect()
    }

    pub fn find_by_id(&self, id: &str) -> Option<NodeRef<'_>> {
        self.index
            .get(id)
            .map(|key| NodeRef { tree: self, key: *key })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Unlink a node and de-index its entire subtree.
    ///
    /// Adjacent siblings are re-linked. Removing a parent's only child leaves
    /// the parent childless; repairing that is the caller's job.
    pub fn remove_by_id(&mut self, id: &str) -> TreeResult<RichNode> {
        let key = self.key_of(id)?;
        let removed = NodeRef { tree: self, key }.to_rich_node();

        self.unlink(key);

        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.remove(current) else {
                continue;
            };
            self.index.remove(&node.id);

            let mut child = node.child;
            while let Some(child_key) = child {
                stack.push(child_key);
                child = self.nodes.get(child_key).and_then(|n| n.next);
            }
        }

        tracing::trace!(id, remaining = self.len(), "removed subtree");
        Ok(removed)
    }

    /// Insert `node` (with fresh ids) as the next sibling of `anchor_id`.
    /// Returns the id of the inserted subtree's root.
    pub fn insert_after(&mut self, anchor_id: &str, node: RichNode) -> TreeResult<String> {
        let anchor = self.key_of(anchor_id)?;
        let key = self.build(node);
        self.link_after(anchor, key);
        Ok(self.id_of(key))
    }

    /// Insert `node` (with fresh ids) as the previous sibling of `anchor_id`
    pub fn insert_before(&mut self, anchor_id: &str, node: RichNode) -> TreeResult<String> {
        let anchor = self.key_of(anchor_id)?;
        let key = self.build(node);
        self.link_before(anchor, key);
        Ok(self.id_of(key))
    }

    /// Insert `node` under a parent that currently has no children
    pub fn insert_as_only_child_of(&mut self, parent_id: &str, node: RichNode) -> TreeResult<String> {
        let parent = self.key_of(parent_id)?;
        if self.nodes[parent].child.is_some() {
            return Err(TreeError::ParentNotEmpty(parent_id.to_string()));
        }
        let key = self.build(node);
        self.link_last(Some(parent), key);
        Ok(self.id_of(key))
    }

    pub fn append_child(&mut self, parent_id: &str, node: RichNode) -> TreeResult<String> {
        let parent = self.key_of(parent_id)?;
        let key = self.build(node);
        self.link_last(Some(parent), key);
        Ok(self.id_of(key))
    }

    pub fn prepend_child(&mut self, parent_id: &str, node: RichNode) -> TreeResult<String> {
        let parent = self.key_of(parent_id)?;
        let key = self.build(node);
        match self.first_of(Some(parent)) {
            Some(first) => self.link_before(first, key),
            None => self.link_last(Some(parent), key),
        }
        Ok(self.id_of(key))
    }

    /// Append a new top-level node
    pub fn push(&mut self, node: RichNode) -> String {
        let key = self.build(node);
        self.link_last(None, key);
        self.id_of(key)
    }

    /// Replace the literal text of a leaf run without changing shape
    pub fn update_span_text(&mut self, span_id: &str, new_text: &str) -> TreeResult<()> {
        let key = self.key_of(span_id)?;
        let node = &mut self.nodes[key];
        if node.label != Label::Span || node.child.is_some() {
            return Err(TreeError::not_a_span(span_id));
        }
        node.data.set_run_text(new_text);
        Ok(())
    }

    /// Concatenated run text below (and including) `id`
    pub fn text_content(&self, id: &str) -> Option<String> {
        self.find_by_id(id).map(|node| node.text_content())
    }

    /// Ids of blocks that currently hold no children, in document order
    pub fn blocks_without_children(&self) -> Vec<String> {
        self.iter()
            .filter(|node| node.label().is_block() && node.is_leaf())
            .map(|node| node.id().to_string())
            .collect()
    }

    pub fn head(&self) -> Option<NodeRef<'_>> {
        self.head.map(|key| NodeRef { tree: self, key })
    }

    pub fn tail(&self) -> Option<NodeRef<'_>> {
        self.tail.map(|key| NodeRef { tree: self, key })
    }

    /// Top-level nodes in order
    pub fn roots(&self) -> Siblings<'_> {
        Siblings {
            tree: self,
            next: self.head,
        }
    }

    /// Every node in document (pre-)order
    pub fn iter(&self) -> Descendants<'_> {
        Descendants {
            tree: self,
            next: self.head,
            stop_at: None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    fn key_of(&self, id: &str) -> TreeResult<NodeKey> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| TreeError::not_found(id))
    }

    fn id_of(&self, key: NodeKey) -> String {
        self.nodes[key].id.clone()
    }

    fn allocate_id(&mut self) -> String {
        loop {
            let id = self.ids.new_id();
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }

    /// Allocate a detached subtree, ids assigned parent-first
    fn build(&mut self, node: RichNode) -> NodeKey {
        let id = self.allocate_id();
        let key = self.nodes.insert(TreeNode {
            id: id.clone(),
            label: node.label,
            data: node.data,
            parent: None,
            prev: None,
            next: None,
            child: None,
            last_child: None,
        });
        self.index.insert(id, key);

        for child in node.children {
            let child_key = self.build(child);
            self.link_last(Some(key), child_key);
        }
        key
    }

    fn first_of(&self, parent: Option<NodeKey>) -> Option<NodeKey> {
        match parent {
            Some(parent) => self.nodes.get(parent).and_then(|n| n.child),
            None => self.head,
        }
    }

    fn last_of(&self, parent: Option<NodeKey>) -> Option<NodeKey> {
        match parent {
            Some(parent) => self.nodes.get(parent).and_then(|n| n.last_child),
            None => self.tail,
        }
    }

    fn set_first(&mut self, parent: Option<NodeKey>, key: Option<NodeKey>) {
        match parent {
            Some(parent) => {
                if let Some(node) = self.nodes.get_mut(parent) {
                    node.child = key;
                }
            }
            None => self.head = key,
        }
    }

    fn set_last(&mut self, parent: Option<NodeKey>, key: Option<NodeKey>) {
        match parent {
            Some(parent) => {
                if let Some(node) = self.nodes.get_mut(parent) {
                    node.last_child = key;
                }
            }
            None => self.tail = key,
        }
    }

    fn link_last(&mut self, parent: Option<NodeKey>, key: NodeKey) {
        let last = self.last_of(parent);
        {
            let node = &mut self.nodes[key];
            node.parent = parent;
            node.prev = last;
            node.next = None;
        }
        match last {
            Some(last) => self.nodes[last].next = Some(key),
            None => self.set_first(parent, Some(key)),
        }
        self.set_last(parent, Some(key));
    }

    fn link_after(&mut self, anchor: NodeKey, key: NodeKey) {
        let (parent, next) = {
            let anchor = &self.nodes[anchor];
            (anchor.parent, anchor.next)
        };
        {
            let node = &mut self.nodes[key];
            node.parent = parent;
            node.prev = Some(anchor);
            node.next = next;
        }
        self.nodes[anchor].next = Some(key);
        match next {
            Some(next) => self.nodes[next].prev = Some(key),
            None => self.set_last(parent, Some(key)),
        }
    }

    fn link_before(&mut self, anchor: NodeKey, key: NodeKey) {
        let (parent, prev) = {
            let anchor = &self.nodes[anchor];
            (anchor.parent, anchor.prev)
        };
        {
            let node = &mut self.nodes[key];
            node.parent = parent;
            node.prev = prev;
            node.next = Some(anchor);
        }
        self.nodes[anchor].prev = Some(key);
        match prev {
            Some(prev) => self.nodes[prev].next = Some(key),
            None => self.set_first(parent, Some(key)),
        }
    }

    fn unlink(&mut self, key: NodeKey) {
        let (parent, prev, next) = {
            let node = &self.nodes[key];
            (node.parent, node.prev, node.next)
        };
        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.set_first(parent, next),
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.set_last(parent, prev),
        }
        let node = &mut self.nodes[key];
        node.parent = None;
        node.prev = None;
        node.next = None;
    }

    #[cfg(test)]
    fn assert_links_consistent(&self) {
        for (key, node) in &self.nodes {
            if let Some(next) = node.next {
                assert_eq!(self.nodes[next].prev, Some(key));
                assert_eq!(self.nodes[next].parent, node.parent);
            } else {
                assert_eq!(self.last_of(node.parent), Some(key));
            }
            if let Some(prev) = node.prev {
                assert_eq!(self.nodes[prev].next, Some(key));
            } else {
                assert_eq!(self.first_of(node.parent), Some(key));
            }
            assert_eq!(self.index.get(&node.id), Some(&key));
        }
        assert_eq!(self.index.len(), self.nodes.len());
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new(IdGenerator::default())
    }
}

/// Read-only cursor onto one node of a `DocumentTree`
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a DocumentTree,
    key: NodeKey,
}

impl<'a> NodeRef<'a> {
    fn node(&self) -> &'a TreeNode {
        &self.tree.nodes[self.key]
    }

    fn at(&self, key: Option<NodeKey>) -> Option<NodeRef<'a>> {
        key.map(|key| NodeRef {
            tree: self.tree,
            key,
        })
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn id(&self) -> &'a str {
        &self.node().id
    }

    pub fn label(&self) -> &'a Label {
        &self.node().label
    }

    pub fn data(&self) -> &'a NodeData {
        &self.node().data
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.at(self.node().parent)
    }

    pub fn prev_sibling(&self) -> Option<NodeRef<'a>> {
        self.at(self.node().prev)
    }

    pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
        self.at(self.node().next)
    }

    pub fn first_child(&self) -> Option<NodeRef<'a>> {
        self.at(self.node().child)
    }

    pub fn last_child(&self) -> Option<NodeRef<'a>> {
        self.at(self.node().last_child)
    }

    pub fn children(&self) -> Siblings<'a> {
        Siblings {
            tree: self.tree,
            next: self.node().child,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.node().child.is_none()
    }

    pub fn is_span(&self) -> bool {
        *self.label() == Label::Span && self.is_leaf()
    }

    /// Concatenated run text of this subtree
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        if let Some(text) = self.data().run_text() {
            out.push_str(text);
        }
        let descendants = Descendants {
            tree: self.tree,
            next: self.node().child,
            stop_at: Some(self.key),
        };
        for node in descendants {
            if let Some(text) = node.data().run_text() {
                out.push_str(text);
            }
        }
        out
    }

    /// Plain RichNode copy of this subtree, ids included
    pub fn to_rich_node(&self) -> RichNode {
        RichNode {
            label: self.label().clone(),
            data: self.data().clone(),
            id: Some(self.id().to_string()),
            children: self.children().map(|child| child.to_rich_node()).collect(),
        }
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id())
            .field("label", self.label())
            .finish()
    }
}

/// Iterator over a sibling chain
pub struct Siblings<'a> {
    tree: &'a DocumentTree,
    next: Option<NodeKey>,
}

impl<'a> Iterator for Siblings<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next?;
        self.next = self.tree.nodes.get(key).and_then(|n| n.next);
        Some(NodeRef {
            tree: self.tree,
            key,
        })
    }
}

/// Pre-order walk following the links; `stop_at` bounds the walk to a subtree
pub struct Descendants<'a> {
    tree: &'a DocumentTree,
    next: Option<NodeKey>,
    stop_at: Option<NodeKey>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next?;
        let node = self.tree.nodes.get(key)?;

        self.next = match node.child {
            Some(child) => Some(child),
            None => {
                let mut climb = Some(key);
                let mut found = None;
                while let Some(current) = climb {
                    if Some(current) == self.stop_at {
                        break;
                    }
                    let current_node = &self.tree.nodes[current];
                    if let Some(next) = current_node.next {
                        found = Some(next);
                        break;
                    }
                    climb = current_node.parent;
                    if climb == self.stop_at {
                        break;
                    }
                }
                found
            }
        };

        Some(NodeRef {
            tree: self.tree,
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StyledRun;

    fn sample() -> DocumentTree {
        DocumentTree::construct(
            vec![
                RichNode::paragraph(vec![RichNode::span("a"), RichNode::span("b")]),
                RichNode::heading(1, vec![RichNode::span("title")]),
            ],
            IdGenerator::new("t"),
        )
    }

    #[test]
    fn test_ids_assigned_depth_first() {
        let tree = sample();
        let ids: Vec<_> = tree.iter().map(|n| n.id().to_string()).collect();
        assert_eq!(ids, vec!["t-1", "t-2", "t-3", "t-4", "t-5"]);
        assert_eq!(tree.head().unwrap().id(), "t-1");
        assert_eq!(tree.tail().unwrap().id(), "t-4");
        tree.assert_links_consistent();
    }

    #[test]
    fn test_navigation_links() {
        let tree = sample();
        let a = tree.find_by_id("t-2").unwrap();
        let b = a.next_sibling().unwrap();

        assert_eq!(b.id(), "t-3");
        assert_eq!(b.prev_sibling().unwrap().id(), "t-2");
        assert!(b.next_sibling().is_none());
        assert_eq!(a.parent().unwrap().id(), "t-1");
        assert_eq!(a.parent().unwrap().last_child().unwrap().id(), "t-3");
        assert!(tree.find_by_id("t-1").unwrap().parent().is_none());
    }

    #[test]
    fn test_remove_middle_sibling_relinks() {
        let mut tree = DocumentTree::construct(
            vec![RichNode::paragraph(vec![
                RichNode::span("a"),
                RichNode::span("b"),
                RichNode::span("c"),
            ])],
            IdGenerator::new("t"),
        );

        let removed = tree.remove_by_id("t-3").unwrap();
        assert_eq!(removed.data.run_text(), Some("b"));

        let a = tree.find_by_id("t-2").unwrap();
        assert_eq!(a.next_sibling().unwrap().id(), "t-4");
        assert_eq!(tree.find_by_id("t-4").unwrap().prev_sibling().unwrap().id(), "t-2");
        assert!(!tree.contains("t-3"));
        tree.assert_links_consistent();
    }

    #[test]
    fn test_remove_cascades_to_subtree() {
        let mut tree = sample();
        tree.remove_by_id("t-1").unwrap();

        assert!(!tree.contains("t-1"));
        assert!(!tree.contains("t-2"));
        assert!(!tree.contains("t-3"));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.head().unwrap().id(), "t-4");
        tree.assert_links_consistent();
    }

    #[test]
    fn test_remove_only_child_leaves_parent_empty() {
        let mut tree = DocumentTree::construct(
            vec![RichNode::paragraph(vec![RichNode::span("x")])],
            IdGenerator::new("t"),
        );
        tree.remove_by_id("t-2").unwrap();

        let para = tree.find_by_id("t-1").unwrap();
        assert!(para.first_child().is_none());
        assert!(para.last_child().is_none());
        assert_eq!(tree.blocks_without_children(), vec!["t-1"]);
    }

    #[test]
    fn test_insert_after_and_before() {
        let mut tree = sample();
        let after = tree.insert_after("t-1", RichNode::empty_block(Label::Paragraph)).unwrap();
        let before = tree.insert_before("t-1", RichNode::empty_block(Label::Paragraph)).unwrap();

        let order: Vec<_> = tree.roots().map(|n| n.id().to_string()).collect();
        assert_eq!(order, vec![before.clone(), "t-1".to_string(), after.clone(), "t-4".to_string()]);
        assert_eq!(tree.head().unwrap().id(), before);
        tree.assert_links_consistent();
    }

    #[test]
    fn test_insert_after_tail_moves_tail() {
        let mut tree = sample();
        let id = tree.insert_after("t-4", RichNode::empty_block(Label::Paragraph)).unwrap();
        assert_eq!(tree.tail().unwrap().id(), id);
    }

    #[test]
    fn test_insert_as_only_child() {
        let mut tree = DocumentTree::construct(
            vec![RichNode::paragraph(vec![RichNode::span("x")])],
            IdGenerator::new("t"),
        );
        assert!(matches!(
            tree.insert_as_only_child_of("t-1", RichNode::span("")),
            Err(TreeError::ParentNotEmpty(_))
        ));

        tree.remove_by_id("t-2").unwrap();
        let id = tree.insert_as_only_child_of("t-1", RichNode::span("")).unwrap();
        assert_eq!(tree.find_by_id("t-1").unwrap().first_child().unwrap().id(), id);
        tree.assert_links_consistent();
    }

    #[test]
    fn test_prepend_and_append_child() {
        let mut tree = sample();
        let first = tree.prepend_child("t-1", RichNode::span("<")).unwrap();
        let last = tree.append_child("t-1", RichNode::span(">")).unwrap();

        assert_eq!(tree.text_content("t-1").unwrap(), "<ab>");
        let para = tree.find_by_id("t-1").unwrap();
        assert_eq!(para.first_child().unwrap().id(), first);
        assert_eq!(para.last_child().unwrap().id(), last);
        tree.assert_links_consistent();
    }

    #[test]
    fn test_update_span_text() {
        let mut tree = DocumentTree::construct(
            vec![RichNode::paragraph(vec![RichNode::styled(StyledRun::new("x").bold())])],
            IdGenerator::new("t"),
        );
        tree.update_span_text("t-2", "xyz").unwrap();
        assert_eq!(
            tree.find_by_id("t-2").unwrap().data(),
            &NodeData::Styled(StyledRun::new("xyz").bold())
        );

        assert!(matches!(
            tree.update_span_text("t-1", "nope"),
            Err(TreeError::NotASpan(_))
        ));
        assert!(matches!(
            tree.update_span_text("missing", "nope"),
            Err(TreeError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_ids_not_reused_after_removal() {
        let mut tree = sample();
        tree.remove_by_id("t-3").unwrap();
        let id = tree.push(RichNode::empty_block(Label::Paragraph));
        assert_eq!(id, "t-6");
        assert!(!tree.contains("t-3"));
    }

    #[test]
    fn test_subtree_text_content_stops_at_subtree() {
        let tree = sample();
        assert_eq!(tree.text_content("t-1").unwrap(), "ab");
        assert_eq!(tree.text_content("t-4").unwrap(), "title");
    }
}
