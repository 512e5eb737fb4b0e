use crc32fast::Hasher;

pub const DEFAULT_SEED: &str = "node";

/// Derive a stable id seed from a document name using CRC32
pub fn get_document_seed(name: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential ID generator scoped to a single document tree.
///
/// Each tree owns its generator, so two trees built from the same payload
/// never share counter state.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u32,
}

impl IdGenerator {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Generator seeded from a document name (CRC32 of the name)
    pub fn for_document(name: &str) -> Self {
        Self::new(get_document_seed(name))
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u32 {
        self.count
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_seed_generation() {
        let seed1 = get_document_seed("journal/entry-1");
        let seed2 = get_document_seed("journal/entry-1");
        assert_eq!(seed1, seed2);

        let seed3 = get_document_seed("journal/entry-2");
        assert_ne!(seed1, seed3);
    }

    #[test]
    fn test_sequential_ids() {
        let mut gen = IdGenerator::new("doc");

        assert_eq!(gen.new_id(), "doc-1");
        assert_eq!(gen.new_id(), "doc-2");
        assert_eq!(gen.new_id(), "doc-3");
        assert_eq!(gen.issued(), 3);
    }

    #[test]
    fn test_generators_do_not_share_state() {
        let mut a = IdGenerator::default();
        let mut b = IdGenerator::default();

        a.new_id();
        a.new_id();

        assert_eq!(b.new_id(), "node-1");
        assert_eq!(a.new_id(), "node-3");
    }
}
