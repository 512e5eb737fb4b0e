use crate::vdom::{VNode, VirtualDomDocument};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Index path from the document root. Patches are applied in order, so an
/// index always refers to the list as left by the preceding patches.
pub type NodePath = Vec<u32>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Patch {
    CreateNode { path: NodePath, node: VNode },
    RemoveNode { path: NodePath },
    ReplaceNode { path: NodePath, node: VNode },
    UpdateText { path: NodePath, content: String },
    UpdateAttributes {
        path: NodePath,
        attributes: BTreeMap<String, String>,
    },
    UpdateStyles {
        path: NodePath,
        styles: BTreeMap<String, String>,
    },
}

impl Patch {
    pub fn path(&self) -> &[u32] {
        match self {
            Patch::CreateNode { path, .. }
            | Patch::RemoveNode { path }
            | Patch::ReplaceNode { path, .. }
            | Patch::UpdateText { path, .. }
            | Patch::UpdateAttributes { path, .. }
            | Patch::UpdateStyles { path, .. } => path,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum PatchError {
    #[error("Patch path does not resolve: {0:?}")]
    InvalidPath(NodePath),

    #[error("Patch does not apply to node at {0:?}")]
    KindMismatch(NodePath),
}

// Diff two rendered documents and generate patches
pub fn diff_vdocument(old: &VirtualDomDocument, new: &VirtualDomDocument) -> Vec<Patch> {
    let mut patches = Vec::new();
    diff_children(&old.nodes, &new.nodes, &[], &mut patches);
    tracing::trace!(patches = patches.len(), "diffed rendered documents");
    patches
}

/// Keyed children are matched by key; unkeyed ones positionally
fn diff_children(old: &[VNode], new: &[VNode], parent: &[u32], patches: &mut Vec<Patch>) {
    let mut i = 0;
    let mut j = 0;

    while i < old.len() || j < new.len() {
        let path = child_path(parent, j);

        match (old.get(i), new.get(j)) {
            (Some(old_node), Some(new_node)) if same_identity(old_node, new_node) => {
                diff_same_identity(old_node, new_node, path, patches);
                i += 1;
                j += 1;
            }
            (Some(old_node), Some(new_node)) => {
                if key_in(new_node.key(), &old[i..]) {
                    patches.push(Patch::RemoveNode { path });
                    i += 1;
                } else if key_in(old_node.key(), &new[j..]) {
                    patches.push(Patch::CreateNode {
                        path,
                        node: new_node.clone(),
                    });
                    j += 1;
                } else {
                    patches.push(Patch::ReplaceNode {
                        path,
                        node: new_node.clone(),
                    });
                    i += 1;
                    j += 1;
                }
            }
            (Some(_), None) => {
                patches.push(Patch::RemoveNode { path });
                i += 1;
            }
            (None, Some(new_node)) => {
                patches.push(Patch::CreateNode {
                    path,
                    node: new_node.clone(),
                });
                j += 1;
            }
            (None, None) => break,
        }
    }
}

fn diff_same_identity(old: &VNode, new: &VNode, path: NodePath, patches: &mut Vec<Patch>) {
    match (old, new) {
        (
            VNode::Element {
                tag: old_tag,
                attributes: old_attrs,
                styles: old_styles,
                children: old_children,
                ..
            },
            VNode::Element {
                tag: new_tag,
                attributes: new_attrs,
                styles: new_styles,
                children: new_children,
                ..
            },
        ) => {
            if old_tag != new_tag {
                patches.push(Patch::ReplaceNode {
                    path,
                    node: new.clone(),
                });
                return;
            }

            if old_attrs != new_attrs {
                patches.push(Patch::UpdateAttributes {
                    path: path.clone(),
                    attributes: new_attrs.clone(),
                });
            }

            if old_styles != new_styles {
                patches.push(Patch::UpdateStyles {
                    path: path.clone(),
                    styles: new_styles.clone(),
                });
            }

            diff_children(old_children, new_children, &path, patches);
        }
        (VNode::Text { content: old_text, .. }, VNode::Text { content: new_text, .. }) => {
            if old_text != new_text {
                patches.push(Patch::UpdateText {
                    path,
                    content: new_text.clone(),
                });
            }
        }
        _ => patches.push(Patch::ReplaceNode {
            path,
            node: new.clone(),
        }),
    }
}

fn same_identity(a: &VNode, b: &VNode) -> bool {
    match (a.key(), b.key()) {
        (Some(left), Some(right)) => left == right,
        (None, None) => matches!(
            (a, b),
            (VNode::Element { .. }, VNode::Element { .. }) | (VNode::Text { .. }, VNode::Text { .. })
        ),
        _ => false,
    }
}

fn key_in(key: Option<&str>, nodes: &[VNode]) -> bool {
    match key {
        Some(key) => nodes.iter().any(|node| node.key() == Some(key)),
        None => false,
    }
}

fn child_path(parent: &[u32], index: usize) -> NodePath {
    let mut path = parent.to_vec();
    path.push(index as u32);
    path
}

/// Apply patches produced by [`diff_vdocument`] in order
pub fn apply_patches(document: &mut VirtualDomDocument, patches: &[Patch]) -> Result<(), PatchError> {
    for patch in patches {
        apply_patch(&mut document.nodes, patch)?;
    }
    Ok(())
}

fn apply_patch(roots: &mut Vec<VNode>, patch: &Patch) -> Result<(), PatchError> {
    let invalid = || PatchError::InvalidPath(patch.path().to_vec());
    let (index, parent) = patch.path().split_last().ok_or_else(invalid)?;
    let index = *index as usize;
    let siblings = siblings_at(roots, parent).ok_or_else(invalid)?;

    match patch {
        Patch::CreateNode { node, .. } => {
            if index > siblings.len() {
                return Err(invalid());
            }
            siblings.insert(index, node.clone());
        }
        Patch::RemoveNode { .. } => {
            if index >= siblings.len() {
                return Err(invalid());
            }
            siblings.remove(index);
        }
        Patch::ReplaceNode { node, .. } => {
            let slot = siblings.get_mut(index).ok_or_else(invalid)?;
            *slot = node.clone();
        }
        Patch::UpdateText { content, .. } => match siblings.get_mut(index) {
            Some(VNode::Text { content: current, .. }) => *current = content.clone(),
            Some(_) => return Err(PatchError::KindMismatch(patch.path().to_vec())),
            None => return Err(invalid()),
        },
        Patch::UpdateAttributes { attributes, .. } => match siblings.get_mut(index) {
            Some(VNode::Element { attributes: current, .. }) => *current = attributes.clone(),
            Some(_) => return Err(PatchError::KindMismatch(patch.path().to_vec())),
            None => return Err(invalid()),
        },
        Patch::UpdateStyles { styles, .. } => match siblings.get_mut(index) {
            Some(VNode::Element { styles: current, .. }) => *current = styles.clone(),
            Some(_) => return Err(PatchError::KindMismatch(patch.path().to_vec())),
            None => return Err(invalid()),
        },
    }

    Ok(())
}

fn siblings_at<'a>(roots: &'a mut Vec<VNode>, parent: &[u32]) -> Option<&'a mut Vec<VNode>> {
    let mut current = roots;
    for index in parent {
        match current.get_mut(*index as usize)? {
            VNode::Element { children, .. } => current = children,
            VNode::Text { .. } => return None,
        }
    }
    Some(current)
}
