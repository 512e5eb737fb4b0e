//! # Mutator Renderer
//!
//! Projects a document tree onto keyed surface elements and diffs successive
//! renders so only nodes whose content changed are touched.

pub mod render;
pub mod vdom;
pub mod vdom_differ;

pub use render::{render, render_forest, render_tree};
pub use vdom::{VNode, VirtualDomDocument, KEY_ATTRIBUTE};
pub use vdom_differ::{apply_patches, diff_vdocument, NodePath, Patch, PatchError};
