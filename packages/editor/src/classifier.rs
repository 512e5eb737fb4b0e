//! # Batch Classifier
//!
//! Maps the shape of a whole notification batch onto one structural intent.
//! A single keystroke may surface as one, two or three records depending on
//! the editing surface, so individual records are never interpreted alone.
//!
//! | Kinds                      | Extra predicate                                   | Intent                 |
//! |----------------------------|---------------------------------------------------|------------------------|
//! | `[characterData]`          |                                                   | `TextUpdate`           |
//! | `[childList]`              | nothing added, no sibling snapshot, no old value  | `Rollback`             |
//! | `[childList, characterData]` |                                                 | `TextUpdate` (2nd)     |
//! | `[childList, childList]`   | 2nd adds a line break into the 1st's added node   | `SplitAtEnd`           |
//! | `[characterData] x2`       | identical resulting text                          | `TextUpdate` (2nd)     |
//! | `[childList] x3`           | nested add chain ending in a line break           | `SplitAtEnd` / `SplitAtStart` |
//!
//! Everything else is `Unclassified`.

use crate::config::EditorConfig;
use crate::notifications::{EditRecord, MutationBatch, NotificationKind, SurfaceNode};
use serde::{Deserialize, Serialize};

/// Intent recognised from a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StructuralEdit {
    /// Replace the text of one run. `text` is absent when the record carried
    /// no snapshot and the surface must be asked.
    #[serde(rename_all = "camelCase")]
    TextUpdate { span_id: String, text: Option<String> },

    /// A run was deleted from the surface; the tree keeps it
    #[serde(rename_all = "camelCase")]
    Rollback { removed_id: String },

    /// New empty block after the anchor
    #[serde(rename_all = "camelCase")]
    SplitAtEnd { anchor_id: String },

    /// New empty block before the anchor
    #[serde(rename_all = "camelCase")]
    SplitAtStart { anchor_id: String },

    Unclassified { reason: UnclassifiedReason },
}

impl StructuralEdit {
    pub fn is_classified(&self) -> bool {
        !matches!(self, StructuralEdit::Unclassified { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UnclassifiedReason {
    EmptyBatch,

    UnrecognizedShape { kinds: Vec<NotificationKind> },

    /// A record expected to name an element did not
    MissingAnchor { record: usize },

    /// The named element is not in the document
    UnknownNode { id: String },

    /// Neither the record nor the surface supplied the new text
    MissingText { id: String },

    /// The document refused the edit
    Rejected { message: String },
}

pub fn classify(batch: &MutationBatch, config: &EditorConfig) -> StructuralEdit {
    use NotificationKind::{CharacterData, ChildList};

    let records = &batch.records;
    match batch.kinds().as_slice() {
        [] => unclassified(UnclassifiedReason::EmptyBatch),
        [CharacterData] => text_update(records, 0),
        [ChildList] if is_run_deletion(&records[0]) => rollback(&records[0]),
        [ChildList, CharacterData] => text_update(records, 1),
        [ChildList, ChildList] if is_empty_run_enter(&records[0], &records[1], config) => {
            empty_run_split(&records[0])
        }
        [CharacterData, CharacterData] if same_resulting_text(&records[0], &records[1]) => {
            text_update(records, 1)
        }
        [ChildList, ChildList, ChildList] if is_line_break_chain(records, config) => {
            chain_split(batch, &records[0])
        }
        kinds => unclassified(UnclassifiedReason::UnrecognizedShape {
            kinds: kinds.to_vec(),
        }),
    }
}

fn unclassified(reason: UnclassifiedReason) -> StructuralEdit {
    StructuralEdit::Unclassified { reason }
}

fn missing_anchor(record: usize) -> StructuralEdit {
    unclassified(UnclassifiedReason::MissingAnchor { record })
}

fn text_update(records: &[EditRecord], index: usize) -> StructuralEdit {
    let target = &records[index].target;
    match target.span_id() {
        Some(span_id) => StructuralEdit::TextUpdate {
            span_id: span_id.to_string(),
            text: target.text.clone(),
        },
        None => missing_anchor(index),
    }
}

fn is_run_deletion(record: &EditRecord) -> bool {
    record.added_nodes.is_empty() && !record.has_sibling_snapshot() && record.old_value.is_none()
}

fn rollback(record: &EditRecord) -> StructuralEdit {
    match record.removed_nodes.first().and_then(|node| node.id.clone()) {
        Some(removed_id) => StructuralEdit::Rollback { removed_id },
        None => missing_anchor(0),
    }
}

fn adds_line_break(record: &EditRecord, config: &EditorConfig) -> bool {
    record
        .added_nodes
        .iter()
        .any(|node| config.is_line_break(&node.node_name))
}

/// `child` was added into the node `parent` added
fn continues_chain(parent: &EditRecord, child: &EditRecord) -> bool {
    parent
        .added_nodes
        .first()
        .map_or(false, |added| child.target.same_node(added))
}

fn is_empty_run_enter(first: &EditRecord, second: &EditRecord, config: &EditorConfig) -> bool {
    adds_line_break(second, config) && continues_chain(first, second)
}

fn empty_run_split(first: &EditRecord) -> StructuralEdit {
    let anchor = first
        .added_nodes
        .first()
        .and_then(|added| added.id.clone())
        .or_else(|| sibling_id(&first.previous_sibling).map(str::to_string));

    match anchor {
        Some(anchor_id) => StructuralEdit::SplitAtEnd { anchor_id },
        None => missing_anchor(0),
    }
}

fn same_resulting_text(first: &EditRecord, second: &EditRecord) -> bool {
    match (&first.target.text, &second.target.text) {
        (Some(a), Some(b)) => a == b && first.target.span_id() == second.target.span_id(),
        _ => false,
    }
}

fn is_line_break_chain(records: &[EditRecord], config: &EditorConfig) -> bool {
    match records {
        [first, second, third] => {
            continues_chain(first, second)
                && continues_chain(second, third)
                && adds_line_break(third, config)
        }
        _ => false,
    }
}

fn chain_split(batch: &MutationBatch, first: &EditRecord) -> StructuralEdit {
    let previous = sibling_id(&first.previous_sibling);
    let next = sibling_id(&first.next_sibling);
    let added = first.added_nodes.first().and_then(|node| node.id.as_deref());

    match added {
        // No enclosing block was identified; anchor on what precedes it
        None => match previous {
            Some(anchor) => StructuralEdit::SplitAtEnd {
                anchor_id: anchor.to_string(),
            },
            None => missing_anchor(0),
        },
        Some(id) if Some(id) == next => StructuralEdit::SplitAtStart {
            anchor_id: id.to_string(),
        },
        Some(id) if Some(id) == previous => StructuralEdit::SplitAtEnd {
            anchor_id: id.to_string(),
        },
        Some(_) => unclassified(UnclassifiedReason::UnrecognizedShape {
            kinds: batch.kinds(),
        }),
    }
}

fn sibling_id(sibling: &Option<SurfaceNode>) -> Option<&str> {
    sibling.as_ref().and_then(|node| node.id.as_deref())
}
