//! # Mutator Document
//!
//! Editable rich-document model.
//!
//! - [`RichNode`] - persisted representation of one element (label, data, id, children)
//! - [`DocumentTree`] - arena-backed navigable structure with an id index
//! - [`IdGenerator`] - per-tree sequential id source
//!
//! ```rust
//! use mutator_document::{DocumentTree, IdGenerator, RichNode};
//!
//! let tree = DocumentTree::construct(
//!     vec![RichNode::paragraph(vec![RichNode::span("ab")])],
//!     IdGenerator::new("doc"),
//! );
//! assert_eq!(tree.text_content("doc-1").as_deref(), Some("ab"));
//! ```

pub mod error;
pub mod id_generator;
pub mod model;
pub mod serializer;
pub mod tree;

pub use error::{TreeError, TreeResult};
pub use id_generator::{get_document_seed, IdGenerator, DEFAULT_SEED};
pub use model::{Label, NodeData, RichNode, StyledRun};
pub use serializer::{forest_from_json, forest_to_json};
pub use tree::{Descendants, DocumentTree, NodeKey, NodeRef, Siblings};
