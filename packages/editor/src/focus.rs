//! # Focus Re-anchoring
//!
//! A structural edit can move the user's caret into an element the surface
//! has not painted yet. The target is recorded when the edit is applied and
//! honoured after the next paint, once the element exists.

use crate::surface::EditableSurface;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRequest {
    pub id: String,
    pub offset: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FocusTracker {
    pending: Option<String>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the element to focus after the next paint. A later schedule
    /// replaces an earlier one.
    pub fn schedule(&mut self, id: impl Into<String>) {
        self.pending = Some(id.into());
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Place the caret at the start of the pending element. The target stays
    /// pending while the surface does not have it yet.
    pub fn after_paint<S>(&mut self, surface: &mut S) -> Option<FocusRequest>
    where
        S: EditableSurface + ?Sized,
    {
        let id = self.pending.as_deref()?;

        if !surface.place_caret(id, 0) {
            tracing::trace!(id, "focus target not painted yet");
            return None;
        }

        let id = self.pending.take()?;
        tracing::debug!(id = %id, "focus re-anchored");
        Some(FocusRequest { id, offset: 0 })
    }
}
