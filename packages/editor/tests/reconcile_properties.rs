//! Behavioural guarantees of the reconciler against a bare document tree

use mutator_document::{DocumentTree, IdGenerator, Label, RichNode, StyledRun};
use mutator_editor::{
    EditRecord, MemorySurface, MutationBatch, NotificationKind, ReconcileOutcome, Reconciler,
    SurfaceNode,
};

fn two_blocks() -> DocumentTree {
    // p-1 [p-2 "A", p-3 "B"], p-4 [p-5 "C" (styled)]
    DocumentTree::construct(
        vec![
            RichNode::paragraph(vec![RichNode::span("A"), RichNode::span("B")]),
            RichNode::paragraph(vec![RichNode::styled(StyledRun::new("C").italic())]),
        ],
        IdGenerator::new("p"),
    )
}

fn subtree(tree: &DocumentTree, id: &str) -> RichNode {
    tree.find_by_id(id).map(|node| node.to_rich_node()).unwrap()
}

fn enter_at_end(anchor: &str) -> MutationBatch {
    let block = SurfaceNode::new("P").with_id(anchor);
    MutationBatch::new(vec![
        EditRecord::child_list(SurfaceNode::new("DIV").with_handle(1))
            .with_added(block.clone().with_handle(2))
            .with_previous_sibling(block.clone().with_handle(3)),
        EditRecord::child_list(block.with_handle(2)).with_added(SurfaceNode::new("SPAN").with_handle(4)),
        EditRecord::child_list(SurfaceNode::new("SPAN").with_handle(4))
            .with_added(SurfaceNode::new("BR").with_handle(5)),
    ])
}

#[test]
fn test_text_edit_touches_only_its_span() {
    let mut tree = two_blocks();
    let before = tree.to_list();
    let mut reconciler = Reconciler::default();

    let batch = MutationBatch::new(vec![EditRecord::character_data(
        SurfaceNode::text_node().with_parent_id("p-3").with_text("Bee"),
    )]);
    reconciler.reconcile(&mut tree, &batch, &MemorySurface::new());

    let after = tree.to_list();
    assert_eq!(after[1], before[1]);
    assert_eq!(after[0].id, before[0].id);
    assert_eq!(after[0].label, before[0].label);
    assert_eq!(after[0].children[0], before[0].children[0]);

    let edited = &after[0].children[1];
    assert_eq!(edited.id.as_deref(), Some("p-3"));
    assert_eq!(edited.data.run_text(), Some("Bee"));
    assert!(edited.children.is_empty());
}

#[test]
fn test_styled_text_edit_keeps_styling() {
    let mut tree = two_blocks();
    let mut reconciler = Reconciler::default();

    let batch = MutationBatch::new(vec![EditRecord::character_data(
        SurfaceNode::new("SPAN").with_id("p-5").with_text("Cee"),
    )]);
    reconciler.reconcile(&mut tree, &batch, &MemorySurface::new());

    assert_eq!(
        subtree(&tree, "p-5"),
        RichNode::styled(StyledRun::new("Cee").italic()).with_id("p-5")
    );
}

#[test]
fn test_enter_at_end_splits_after_block() {
    let mut tree = two_blocks();
    let original = subtree(&tree, "p-1");
    let mut reconciler = Reconciler::default();

    // Caret anchored at B
    let outcome = reconciler.reconcile(&mut tree, &enter_at_end("p-3"), &MemorySurface::new());

    let roots: Vec<_> = tree.roots().map(|node| node.to_rich_node()).collect();
    assert_eq!(roots.len(), 3);
    assert_eq!(roots[0], original);

    let inserted = &roots[1];
    assert_eq!(inserted.label, Label::Paragraph);
    assert_eq!(inserted.children.len(), 1);
    assert_eq!(inserted.children[0].label, Label::Span);
    assert_eq!(inserted.children[0].data.run_text(), Some(""));
    assert_eq!(roots[2].id.as_deref(), Some("p-4"));

    assert_eq!(outcome.focus_target(), inserted.children[0].id.as_deref());
}

#[test]
fn test_deleting_only_run_rolls_back_without_mutation() {
    let mut tree = DocumentTree::construct(
        vec![RichNode::paragraph(vec![RichNode::span("x")])],
        IdGenerator::new("r"),
    );
    let before = tree.to_list();
    let mut reconciler = Reconciler::default();

    let batch = MutationBatch::new(vec![EditRecord::child_list(
        SurfaceNode::new("P").with_id("r-1"),
    )
    .with_removed(SurfaceNode::new("SPAN").with_id("r-2"))]);
    let outcome = reconciler.reconcile(&mut tree, &batch, &MemorySurface::new());

    assert_eq!(
        outcome,
        ReconcileOutcome::RolledBack {
            focus_target: "r-2".to_string()
        }
    );
    assert_eq!(tree.to_list(), before);
}

#[test]
fn test_unclassified_batches_leave_document_byte_identical() {
    let mut tree = two_blocks();
    let before = serde_json::to_string(&tree.to_list()).unwrap();
    let mut reconciler = Reconciler::default();

    let unrecognised = vec![
        MutationBatch::default(),
        // Backspace merging two runs
        MutationBatch::new(vec![
            EditRecord::child_list(SurfaceNode::new("P").with_id("p-1"))
                .with_removed(SurfaceNode::new("SPAN").with_id("p-3"))
                .with_previous_sibling(SurfaceNode::new("SPAN").with_id("p-2")),
            EditRecord::character_data(SurfaceNode::text_node().with_parent_id("p-2").with_text("AB")),
            EditRecord::character_data(SurfaceNode::text_node().with_parent_id("p-2").with_text("AB")),
        ]),
        MutationBatch::new(vec![
            EditRecord::character_data(SurfaceNode::text_node().with_parent_id("p-2").with_text("A1")),
            EditRecord::character_data(SurfaceNode::text_node().with_parent_id("p-2").with_text("A12")),
        ]),
        // Enter anchored on a node the document never had
        enter_at_end("p-77"),
    ];

    for batch in &unrecognised {
        let outcome = reconciler.reconcile(&mut tree, batch, &MemorySurface::new());
        assert!(
            matches!(outcome, ReconcileOutcome::Unclassified { .. }),
            "{:?} was applied",
            batch.kinds()
        );
    }

    assert_eq!(serde_json::to_string(&tree.to_list()).unwrap(), before);

    let diagnostics: Vec<_> = reconciler.take_diagnostics();
    assert_eq!(diagnostics.len(), unrecognised.len());
    assert_eq!(
        diagnostics[1].kinds,
        vec![
            NotificationKind::ChildList,
            NotificationKind::CharacterData,
            NotificationKind::CharacterData
        ]
    );
}
