//! JSON persistence for RichNode forests.
//!
//! `to_list()` output is the exact shape persisted; loading feeds it back into
//! `DocumentTree::construct`, which assigns fresh ids.

use crate::error::TreeResult;
use crate::id_generator::IdGenerator;
use crate::model::RichNode;
use crate::tree::DocumentTree;

pub fn forest_to_json(nodes: &[RichNode]) -> TreeResult<String> {
    Ok(serde_json::to_string_pretty(nodes)?)
}

pub fn forest_from_json(json: &str) -> TreeResult<Vec<RichNode>> {
    Ok(serde_json::from_str(json)?)
}

impl DocumentTree {
    pub fn to_json(&self) -> TreeResult<String> {
        forest_to_json(&self.to_list())
    }

    pub fn from_json(json: &str, ids: IdGenerator) -> TreeResult<Self> {
        let nodes = forest_from_json(json)?;
        Ok(Self::construct(nodes, ids))
    }
}
