/// Result of replacing, undoing or redoing document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Byte ranges of the new text that differ from the old text
    pub changed: Vec<std::ops::Range<usize>>,
    pub version: u64,
}

impl Patch {
    /// Patch for an edit that left the text unchanged
    pub fn unchanged(version: u64) -> Self {
        Self {
            changed: Vec::new(),
            version,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}
