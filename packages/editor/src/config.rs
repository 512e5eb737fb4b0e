use crate::EditorError;
use mutator_document::{Label, DEFAULT_SEED};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Label of blocks created by Enter
    #[serde(default = "default_block_label")]
    pub block_label: Label,

    /// Node name of the surface's line-break element (case-insensitive)
    #[serde(default = "default_line_break_tag")]
    pub line_break_tag: String,

    /// Emit a warning for every unclassified batch
    #[serde(default = "default_true")]
    pub log_unclassified: bool,

    /// Unclassified batches retained for inspection
    #[serde(default = "default_diagnostics_capacity")]
    pub diagnostics_capacity: usize,

    /// Give childless blocks an empty span when a document is loaded
    #[serde(default = "default_true")]
    pub repair_on_load: bool,

    /// Seed of the session's id generator
    #[serde(default = "default_id_seed")]
    pub id_seed: String,
}

fn default_block_label() -> Label {
    Label::Paragraph
}

fn default_line_break_tag() -> String {
    "BR".to_string()
}

fn default_true() -> bool {
    true
}

fn default_diagnostics_capacity() -> usize {
    32
}

fn default_id_seed() -> String {
    DEFAULT_SEED.to_string()
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file, falling back to defaults if it doesn't exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EditorError> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), EditorError> {
        if !self.block_label.is_block() {
            return Err(EditorError::Config(format!(
                "blockLabel must be a block label, got `{}`",
                self.block_label
            )));
        }
        if self.line_break_tag.trim().is_empty() {
            return Err(EditorError::Config("lineBreakTag must not be empty".to_string()));
        }
        if self.id_seed.is_empty() {
            return Err(EditorError::Config("idSeed must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn is_line_break(&self, node_name: &str) -> bool {
        node_name.eq_ignore_ascii_case(&self.line_break_tag)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            block_label: default_block_label(),
            line_break_tag: default_line_break_tag(),
            log_unclassified: true,
            diagnostics_capacity: default_diagnostics_capacity(),
            repair_on_load: true,
            id_seed: default_id_seed(),
        }
    }
}
