//! # Mutator Editor
//!
//! Keeps a document tree and its editable surface consistent while the user
//! types freely into the surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ surface: batches of edit notifications      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: classify batch → apply to tree      │
//! │  - Text updates in place                    │
//! │  - Enter at start/end of a block            │
//! │  - Rollback of deleted runs                 │
//! │  - Unrecognised batches logged, not applied │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ renderer: tree → keyed surface + patches    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Tree is source of truth**: the surface is re-derived from it
//! 2. **Whole batches**: a batch is classified by its shape, never record by record
//! 3. **No partial edits**: a batch is fully applied or not applied at all
//! 4. **Focus after paint**: caret moves only once the target element exists
//!
//! ## Usage
//!
//! ```rust
//! use mutator_editor::{EditRecord, EditSession, EditorConfig, MemorySurface, MutationBatch, SurfaceNode};
//!
//! let mut session = EditSession::from_json(
//!     r#"[{"label": "p", "children": [{"label": "span", "data": {"text": "ab"}}]}]"#,
//!     EditorConfig::default(),
//! )?;
//!
//! let mut surface = MemorySurface::new();
//! surface.paint(&session.render().patches)?;
//!
//! let batch = MutationBatch::new(vec![EditRecord::character_data(
//!     SurfaceNode::text_node().with_parent_id("node-2").with_text("abc"),
//! )]);
//! session.handle_batch(&batch, &surface);
//!
//! assert_eq!(session.tree().text_content("node-1").as_deref(), Some("abc"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod classifier;
mod config;
mod errors;
mod focus;
mod notifications;
mod reconciler;
mod session;
mod surface;

pub use classifier::{classify, StructuralEdit, UnclassifiedReason};
pub use config::EditorConfig;
pub use errors::EditorError;
pub use focus::{FocusRequest, FocusTracker};
pub use notifications::{EditRecord, MutationBatch, NotificationKind, SurfaceNode};
pub use reconciler::{
    insert_enter_at_end, insert_enter_at_start, restore_minimum_shape, Diagnostic, InsertPosition,
    ReconcileOutcome, Reconciler,
};
pub use session::{EditSession, RenderResult};
pub use surface::{Caret, EditableSurface, MemorySurface};

// Re-export common types for convenience
pub use mutator_document::{DocumentTree, RichNode};
pub use mutator_renderer::{Patch, VirtualDomDocument};
