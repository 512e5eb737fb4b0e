//! # Editable Surface
//!
//! The only commands the editor issues to the host surface: ask whether an
//! element exists, read its text, and put the caret in it.

use mutator_renderer::{apply_patches, Patch, PatchError, VNode, VirtualDomDocument};
use serde::{Deserialize, Serialize};

pub trait EditableSurface {
    /// Whether an element keyed by `id` is currently painted
    fn has_element(&self, id: &str) -> bool;

    /// Current text content of the element keyed by `id`
    fn text_content(&self, id: &str) -> Option<String>;

    /// Focus the element and place the caret at `offset`. Returns false when
    /// the element is not painted.
    fn place_caret(&mut self, id: &str, offset: usize) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caret {
    pub id: String,
    pub offset: usize,
}

/// Surface kept in memory, painted from rendered patches. Hosts without a
/// real editable element (tests, headless tooling) drive the editor with it.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    document: VirtualDomDocument,
    caret: Option<Caret>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the patches of one render pass
    pub fn paint(&mut self, patches: &[Patch]) -> Result<(), PatchError> {
        apply_patches(&mut self.document, patches)
    }

    pub fn document(&self) -> &VirtualDomDocument {
        &self.document
    }

    pub fn caret(&self) -> Option<&Caret> {
        self.caret.as_ref()
    }

    /// Overwrite a text run the way a user's typing would, without telling
    /// the editor. Returns false when no such run is painted.
    pub fn type_text(&mut self, id: &str, text: &str) -> bool {
        match self.document.find_mut(id) {
            Some(VNode::Text { content, .. }) => {
                *content = text.to_string();
                true
            }
            Some(VNode::Element { children, .. }) => {
                *children = vec![VNode::text(text)];
                true
            }
            None => false,
        }
    }

    /// Drop a painted node, as a user deleting a whole run would
    pub fn delete(&mut self, id: &str) -> bool {
        self.document.remove(id).is_some()
    }
}

impl EditableSurface for MemorySurface {
    fn has_element(&self, id: &str) -> bool {
        self.document.find(id).is_some()
    }

    fn text_content(&self, id: &str) -> Option<String> {
        self.document.find(id).map(VNode::text_content)
    }

    fn place_caret(&mut self, id: &str, offset: usize) -> bool {
        if !self.has_element(id) {
            return false;
        }
        self.caret = Some(Caret {
            id: id.to_string(),
            offset,
        });
        true
    }
}
