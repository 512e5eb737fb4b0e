//! # Reconciler
//!
//! Applies a classified batch to the document tree. A batch is either fully
//! applied or leaves the tree untouched; nothing here returns an error to the
//! surface. Batches that cannot be applied are logged and kept for inspection.

use crate::classifier::{classify, StructuralEdit, UnclassifiedReason};
use crate::config::EditorConfig;
use crate::notifications::{MutationBatch, NotificationKind};
use crate::surface::EditableSurface;
use mutator_document::{DocumentTree, Label, RichNode, TreeError, TreeResult};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InsertPosition {
    Before,
    After,
}

/// What one batch did to the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ReconcileOutcome {
    #[serde(rename_all = "camelCase")]
    TextUpdated { span_id: String },

    /// The surface lost a run the tree still holds; the next render restores it
    #[serde(rename_all = "camelCase")]
    RolledBack { focus_target: String },

    #[serde(rename_all = "camelCase")]
    BlockInserted {
        position: InsertPosition,
        anchor_block: String,
        new_block: String,
        focus_target: String,
    },

    Unclassified { reason: UnclassifiedReason },
}

impl ReconcileOutcome {
    /// Element that must receive focus after the next paint
    pub fn focus_target(&self) -> Option<&str> {
        match self {
            ReconcileOutcome::RolledBack { focus_target }
            | ReconcileOutcome::BlockInserted { focus_target, .. } => Some(focus_target),
            ReconcileOutcome::TextUpdated { .. } | ReconcileOutcome::Unclassified { .. } => None,
        }
    }

    pub fn mutated_tree(&self) -> bool {
        matches!(
            self,
            ReconcileOutcome::TextUpdated { .. } | ReconcileOutcome::BlockInserted { .. }
        )
    }
}

/// A batch that was not applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kinds: Vec<NotificationKind>,
    pub reason: UnclassifiedReason,
    pub batch: MutationBatch,
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: EditorConfig,
    diagnostics: VecDeque<Diagnostic>,
}

impl Reconciler {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            diagnostics: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Most recent unapplied batches, oldest first
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain(..).collect()
    }

    pub fn reconcile<S>(
        &mut self,
        tree: &mut DocumentTree,
        batch: &MutationBatch,
        surface: &S,
    ) -> ReconcileOutcome
    where
        S: EditableSurface + ?Sized,
    {
        let edit = classify(batch, &self.config);
        let outcome = match self.apply(tree, edit, surface) {
            Ok(outcome) => outcome,
            Err(reason) => ReconcileOutcome::Unclassified { reason },
        };

        match &outcome {
            ReconcileOutcome::Unclassified { reason } => self.record(batch, reason.clone()),
            applied => tracing::debug!(outcome = ?applied, "reconciled batch"),
        }

        outcome
    }

    fn apply<S>(
        &self,
        tree: &mut DocumentTree,
        edit: StructuralEdit,
        surface: &S,
    ) -> Result<ReconcileOutcome, UnclassifiedReason>
    where
        S: EditableSurface + ?Sized,
    {
        match edit {
            StructuralEdit::TextUpdate { span_id, text } => {
                let text = match text {
                    Some(text) => text,
                    None => surface
                        .text_content(&span_id)
                        .ok_or_else(|| UnclassifiedReason::MissingText {
                            id: span_id.clone(),
                        })?,
                };
                tree.update_span_text(&span_id, &text).map_err(rejected)?;
                Ok(ReconcileOutcome::TextUpdated { span_id })
            }

            StructuralEdit::Rollback { removed_id } => {
                // The tree is left alone; the next render paints the run back
                if !tree.contains(&removed_id) {
                    return Err(UnclassifiedReason::UnknownNode { id: removed_id });
                }
                Ok(ReconcileOutcome::RolledBack {
                    focus_target: removed_id,
                })
            }

            StructuralEdit::SplitAtEnd { anchor_id } => {
                let block = enclosing_block(tree, &anchor_id)?;
                let (new_block, span) =
                    insert_empty_block(tree, &block, &self.config.block_label, InsertPosition::After)
                        .map_err(rejected)?;
                Ok(ReconcileOutcome::BlockInserted {
                    position: InsertPosition::After,
                    anchor_block: block,
                    new_block,
                    focus_target: span,
                })
            }

            StructuralEdit::SplitAtStart { anchor_id } => {
                let block = enclosing_block(tree, &anchor_id)?;
                let (new_block, _) = insert_empty_block(
                    tree,
                    &block,
                    &self.config.block_label,
                    InsertPosition::Before,
                )
                .map_err(rejected)?;

                // The caret stays in the block the user was typing in
                let focus_target = tree
                    .find_by_id(&block)
                    .and_then(|node| node.first_child())
                    .map(|child| child.id().to_string())
                    .unwrap_or_else(|| block.clone());

                Ok(ReconcileOutcome::BlockInserted {
                    position: InsertPosition::Before,
                    anchor_block: block,
                    new_block,
                    focus_target,
                })
            }

            StructuralEdit::Unclassified { reason } => Err(reason),
        }
    }

    fn record(&mut self, batch: &MutationBatch, reason: UnclassifiedReason) {
        let kinds = batch.kinds();

        if self.config.log_unclassified {
            tracing::warn!(
                records = batch.len(),
                kinds = ?kinds,
                reason = ?reason,
                "unhandled mutations"
            );
        }

        if self.config.diagnostics_capacity == 0 {
            return;
        }
        while self.diagnostics.len() >= self.config.diagnostics_capacity {
            self.diagnostics.pop_front();
        }
        self.diagnostics.push_back(Diagnostic {
            kinds,
            reason,
            batch: batch.clone(),
        });
    }
}

fn rejected(error: TreeError) -> UnclassifiedReason {
    match error {
        TreeError::NodeNotFound(id) => UnclassifiedReason::UnknownNode { id },
        other => UnclassifiedReason::Rejected {
            message: other.to_string(),
        },
    }
}

/// The block a caret anchor belongs to: a span's parent, or the node itself
fn enclosing_block(tree: &DocumentTree, anchor_id: &str) -> Result<String, UnclassifiedReason> {
    let node = tree
        .find_by_id(anchor_id)
        .ok_or_else(|| UnclassifiedReason::UnknownNode {
            id: anchor_id.to_string(),
        })?;

    let block = match node.parent() {
        Some(parent) if node.is_span() => parent,
        _ => node,
    };
    Ok(block.id().to_string())
}

/// Returns (new block id, its span id)
fn insert_empty_block(
    tree: &mut DocumentTree,
    block_id: &str,
    label: &Label,
    position: InsertPosition,
) -> TreeResult<(String, String)> {
    let block = RichNode::empty_block(label.clone());
    let new_block = match position {
        InsertPosition::After => tree.insert_after(block_id, block)?,
        InsertPosition::Before => tree.insert_before(block_id, block)?,
    };

    let span = tree
        .find_by_id(&new_block)
        .and_then(|node| node.first_child())
        .map(|child| child.id().to_string())
        .ok_or_else(|| TreeError::not_found(new_block.as_str()))?;

    tracing::trace!(anchor = block_id, new_block = %new_block, ?position, "inserted empty block");
    Ok((new_block, span))
}

/// New empty block after `block_id`; returns the id of its span
pub fn insert_enter_at_end(tree: &mut DocumentTree, block_id: &str, label: &Label) -> TreeResult<String> {
    insert_empty_block(tree, block_id, label, InsertPosition::After).map(|(_, span)| span)
}

/// New empty block before `block_id`; returns the id of its span
pub fn insert_enter_at_start(tree: &mut DocumentTree, block_id: &str, label: &Label) -> TreeResult<String> {
    insert_empty_block(tree, block_id, label, InsertPosition::Before).map(|(_, span)| span)
}

/// Give a childless block an empty span. Returns the new span's id, or
/// `None` if the block already had children or is itself a span.
pub fn restore_minimum_shape(tree: &mut DocumentTree, block_id: &str) -> TreeResult<Option<String>> {
    let needs_span = {
        let node = tree
            .find_by_id(block_id)
            .ok_or_else(|| TreeError::not_found(block_id))?;
        !node.is_span() && node.is_leaf()
    };

    if !needs_span {
        return Ok(None);
    }
    tree.insert_as_only_child_of(block_id, RichNode::span(""))
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{EditRecord, SurfaceNode};
    use crate::surface::MemorySurface;
    use mutator_document::IdGenerator;

    fn tree() -> DocumentTree {
        // t-1 paragraph [t-2 "a", t-3 "b"], t-4 paragraph [t-5 "c"]
        DocumentTree::construct(
            vec![
                RichNode::paragraph(vec![RichNode::span("a"), RichNode::span("b")]),
                RichNode::paragraph(vec![RichNode::span("c")]),
            ],
            IdGenerator::new("t"),
        )
    }

    fn text_batch(span_id: &str, text: Option<&str>) -> MutationBatch {
        let mut target = SurfaceNode::text_node().with_parent_id(span_id);
        if let Some(text) = text {
            target = target.with_text(text);
        }
        MutationBatch::new(vec![EditRecord::character_data(target)])
    }

    #[test]
    fn test_text_update_from_record() {
        let mut tree = tree();
        let mut reconciler = Reconciler::default();

        let outcome = reconciler.reconcile(&mut tree, &text_batch("t-3", Some("bee")), &MemorySurface::new());
        assert_eq!(
            outcome,
            ReconcileOutcome::TextUpdated {
                span_id: "t-3".to_string()
            }
        );
        assert_eq!(tree.text_content("t-1").as_deref(), Some("abee"));
        assert_eq!(outcome.focus_target(), None);
    }

    #[test]
    fn test_text_update_reads_surface_when_record_has_no_text() {
        let mut tree = tree();
        let mut reconciler = Reconciler::default();
        let mut surface = MemorySurface::new();
        surface
            .paint(&mutator_renderer::diff_vdocument(
                &Default::default(),
                &mutator_renderer::render_tree(&tree),
            ))
            .unwrap();
        surface.type_text("t-5", "cd");

        let outcome = reconciler.reconcile(&mut tree, &text_batch("t-5", None), &surface);
        assert!(outcome.mutated_tree());
        assert_eq!(tree.text_content("t-4").as_deref(), Some("cd"));
    }

    #[test]
    fn test_text_update_on_block_is_rejected() {
        let mut tree = tree();
        let before = tree.to_list();
        let mut reconciler = Reconciler::default();

        let outcome = reconciler.reconcile(&mut tree, &text_batch("t-1", Some("x")), &MemorySurface::new());
        assert!(matches!(
            outcome,
            ReconcileOutcome::Unclassified {
                reason: UnclassifiedReason::Rejected { .. }
            }
        ));
        assert_eq!(tree.to_list(), before);
    }

    #[test]
    fn test_rollback_of_unknown_node() {
        let mut tree = tree();
        let mut reconciler = Reconciler::default();
        let batch = MutationBatch::new(vec![EditRecord::child_list(SurfaceNode::new("P"))
            .with_removed(SurfaceNode::new("SPAN").with_id("t-99"))]);

        assert_eq!(
            reconciler.reconcile(&mut tree, &batch, &MemorySurface::new()),
            ReconcileOutcome::Unclassified {
                reason: UnclassifiedReason::UnknownNode {
                    id: "t-99".to_string()
                }
            }
        );
    }

    #[test]
    fn test_split_at_start_keeps_focus_in_original_block() {
        let mut tree = tree();
        let mut reconciler = Reconciler::default();

        let outcome = reconciler
            .apply(
                &mut tree,
                StructuralEdit::SplitAtStart {
                    anchor_id: "t-4".to_string(),
                },
                &MemorySurface::new(),
            )
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::BlockInserted {
                position: InsertPosition::Before,
                anchor_block: "t-4".to_string(),
                new_block: "t-6".to_string(),
                focus_target: "t-5".to_string(),
            }
        );
        let order: Vec<_> = tree.roots().map(|node| node.id().to_string()).collect();
        assert_eq!(order, vec!["t-1", "t-6", "t-4"]);
        assert!(reconciler.take_diagnostics().is_empty());
    }

    #[test]
    fn test_split_anchored_on_span_uses_its_block() {
        let mut tree = tree();
        let reconciler = Reconciler::default();

        let outcome = reconciler
            .apply(
                &mut tree,
                StructuralEdit::SplitAtEnd {
                    anchor_id: "t-3".to_string(),
                },
                &MemorySurface::new(),
            )
            .unwrap();

        match outcome {
            ReconcileOutcome::BlockInserted {
                anchor_block,
                focus_target,
                ..
            } => {
                assert_eq!(anchor_block, "t-1");
                assert_eq!(focus_target, "t-7");
            }
            other => panic!("Expected BlockInserted, got {:?}", other),
        }
    }

    #[test]
    fn test_split_uses_configured_label() {
        let mut tree = tree();
        let reconciler = Reconciler::new(EditorConfig {
            block_label: Label::ListItem,
            ..EditorConfig::default()
        });

        reconciler
            .apply(
                &mut tree,
                StructuralEdit::SplitAtEnd {
                    anchor_id: "t-1".to_string(),
                },
                &MemorySurface::new(),
            )
            .unwrap();
        assert_eq!(tree.find_by_id("t-6").unwrap().label(), &Label::ListItem);
    }

    #[test]
    fn test_diagnostics_are_bounded() {
        let mut tree = tree();
        let mut reconciler = Reconciler::new(EditorConfig {
            diagnostics_capacity: 2,
            log_unclassified: false,
            ..EditorConfig::default()
        });

        for _ in 0..3 {
            reconciler.reconcile(&mut tree, &MutationBatch::default(), &MemorySurface::new());
        }
        reconciler.reconcile(&mut tree, &text_batch("t-42", Some("x")), &MemorySurface::new());

        let kept: Vec<_> = reconciler.diagnostics().map(|d| d.reason.clone()).collect();
        assert_eq!(
            kept,
            vec![
                UnclassifiedReason::EmptyBatch,
                UnclassifiedReason::UnknownNode {
                    id: "t-42".to_string()
                }
            ]
        );
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut tree = tree();
        let mut reconciler = Reconciler::new(EditorConfig {
            diagnostics_capacity: 0,
            ..EditorConfig::default()
        });
        reconciler.reconcile(&mut tree, &MutationBatch::default(), &MemorySurface::new());
        assert_eq!(reconciler.diagnostics().count(), 0);
    }

    #[test]
    fn test_enter_helpers_return_new_span() {
        let mut tree = tree();
        let span = insert_enter_at_end(&mut tree, "t-4", &Label::Paragraph).unwrap();
        assert_eq!(span, "t-7");
        assert_eq!(tree.tail().unwrap().id(), "t-6");

        let span = insert_enter_at_start(&mut tree, "t-1", &Label::Paragraph).unwrap();
        assert_eq!(span, "t-9");
        assert_eq!(tree.head().unwrap().id(), "t-8");
        assert_eq!(tree.text_content("t-8").as_deref(), Some(""));

        assert!(matches!(
            insert_enter_at_end(&mut tree, "t-100", &Label::Paragraph),
            Err(TreeError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_restore_minimum_shape() {
        let mut tree = tree();
        tree.remove_by_id("t-5").unwrap();
        assert_eq!(tree.blocks_without_children(), vec!["t-4".to_string()]);

        let span = restore_minimum_shape(&mut tree, "t-4").unwrap();
        assert_eq!(span.as_deref(), Some("t-6"));
        assert!(tree.blocks_without_children().is_empty());

        assert_eq!(restore_minimum_shape(&mut tree, "t-4").unwrap(), None);
        assert_eq!(restore_minimum_shape(&mut tree, "t-2").unwrap(), None);
    }
}
