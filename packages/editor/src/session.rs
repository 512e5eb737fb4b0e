//! # Edit Session
//!
//! One editor instance: exclusive owner of a document tree, fed batches from
//! the surface one at a time.
//!
//! ```text
//! batch ─► Reconciler ─► DocumentTree ─► render ─► diff ─► patches ─► surface
//!                │                                                    │
//!                └──── focus target ──► FocusTracker ◄── after paint ─┘
//! ```

use crate::config::EditorConfig;
use crate::focus::{FocusRequest, FocusTracker};
use crate::notifications::MutationBatch;
use crate::reconciler::{restore_minimum_shape, Diagnostic, ReconcileOutcome, Reconciler};
use crate::surface::EditableSurface;
use crate::EditorError;
use mutator_document::{forest_from_json, forest_to_json, DocumentTree, IdGenerator, RichNode};
use mutator_renderer::{diff_vdocument, render_tree, Patch, VirtualDomDocument};
use serde::Serialize;

pub struct EditSession {
    tree: DocumentTree,
    reconciler: Reconciler,
    focus: FocusTracker,
    last_vdom: Option<VirtualDomDocument>,

    /// Bumped on every tree mutation
    version: u64,
}

/// Output of one render pass
#[derive(Debug, Clone, Serialize)]
pub struct RenderResult {
    pub version: u64,

    /// Full surface (for the first paint or recovery)
    pub vdom: VirtualDomDocument,

    /// Changes since the previous render
    pub patches: Vec<Patch>,
}

impl EditSession {
    /// Start editing a persisted forest. Ids are assigned fresh.
    pub fn new(forest: Vec<RichNode>, config: EditorConfig) -> Result<Self, EditorError> {
        let mut tree = DocumentTree::construct(forest, IdGenerator::new(config.id_seed.as_str()));

        if config.repair_on_load {
            for block_id in tree.blocks_without_children() {
                restore_minimum_shape(&mut tree, &block_id)?;
            }
        }

        tracing::debug!(nodes = tree.len(), seed = %config.id_seed, "edit session started");

        Ok(Self {
            tree,
            reconciler: Reconciler::new(config),
            focus: FocusTracker::new(),
            last_vdom: None,
            version: 0,
        })
    }

    pub fn from_json(json: &str, config: EditorConfig) -> Result<Self, EditorError> {
        let forest = forest_from_json(json)?;
        Self::new(forest, config)
    }

    /// Reconcile one batch from the surface
    pub fn handle_batch<S>(&mut self, batch: &MutationBatch, surface: &S) -> ReconcileOutcome
    where
        S: EditableSurface + ?Sized,
    {
        let outcome = self.reconciler.reconcile(&mut self.tree, batch, surface);

        if outcome.mutated_tree() {
            self.version += 1;
        }
        if let ReconcileOutcome::RolledBack { focus_target } = &outcome {
            // The surface no longer shows the run; drop it from the last render
            // so the next diff paints it back
            if let Some(last) = self.last_vdom.as_mut() {
                last.remove(focus_target);
            }
        }
        if let Some(target) = outcome.focus_target() {
            self.focus.schedule(target);
        }

        outcome
    }

    /// Render the current tree and diff it against the previous render
    pub fn render(&mut self) -> RenderResult {
        let vdom = render_tree(&self.tree);
        let empty = VirtualDomDocument::new();
        let previous = self.last_vdom.as_ref().unwrap_or(&empty);
        let patches = diff_vdocument(previous, &vdom);

        self.last_vdom = Some(vdom.clone());

        RenderResult {
            version: self.version,
            vdom,
            patches,
        }
    }

    /// Honour a pending focus target once the surface has painted it
    pub fn after_paint<S>(&mut self, surface: &mut S) -> Option<FocusRequest>
    where
        S: EditableSurface + ?Sized,
    {
        self.focus.after_paint(surface)
    }

    /// Forget the previous render; the next one is diffed against nothing
    pub fn clear_cache(&mut self) {
        self.last_vdom = None;
    }

    /// The persisted shape of the document
    pub fn document(&self) -> Vec<RichNode> {
        self.tree.to_list()
    }

    pub fn to_json(&self) -> Result<String, EditorError> {
        Ok(forest_to_json(&self.tree.to_list())?)
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn config(&self) -> &EditorConfig {
        self.reconciler.config()
    }

    pub fn pending_focus(&self) -> Option<&str> {
        self.focus.pending()
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reconciler.diagnostics()
    }
}
