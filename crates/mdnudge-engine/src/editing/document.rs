use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::Patch;

/// Number of full-text replacements kept for undo.
pub const HISTORY_LIMIT: usize = 256;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ApplyError {
    #[error("Document was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict { expected: u64, actual: u64 },
}

/// Editable buffer for one markdown document
///
/// Document is the in-memory copy that position/size updates are applied
/// to. It keeps:
///
/// - **Buffer**: the full text in an `xi_rope::Rope`; every replacement is
///   applied as a single `Delta` covering only the bytes that differ
/// - **Version**: incremented on every change, so a caller that read the
///   text at version `n` can only write it back at version `n`
/// - **History**: previous ropes for undo and redo. Ropes share structure,
///   so a history entry costs little more than the edited region
/// - **Saved snapshot**: the text last read from or written to disk
///
/// ```rust
/// # use mdnudge_engine::editing::Document;
/// let mut doc = Document::from_text("![](a.png){.absolute top=1% left=1%}");
/// let version = doc.version();
///
/// doc.replace_all("![](a.png){.absolute top=5% left=1%}", version).unwrap();
/// assert!(doc.is_dirty());
///
/// doc.undo();
/// assert_eq!(doc.text(), "![](a.png){.absolute top=1% left=1%}");
/// ```
#[derive(Clone)]
pub struct Document {
    buffer: Rope,
    saved: Rope,
    version: u64,
    undo_stack: Vec<Rope>,
    redo_stack: Vec<Rope>,
}

impl Document {
    pub fn from_text(text: &str) -> Self {
        let buffer = Rope::from(text);
        Self {
            saved: buffer.clone(),
            buffer,
            version: 0,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Get the current text content
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    /// Get the current version
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether the buffer differs from the last saved/loaded text
    pub fn is_dirty(&self) -> bool {
        self.buffer.to_string() != self.saved.to_string()
    }

    /// Text as last saved to or loaded from disk
    pub fn saved_text(&self) -> String {
        self.saved.to_string()
    }

    pub fn mark_saved(&mut self) {
        self.saved = self.buffer.clone();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Replace the whole text in one step.
    ///
    /// Fails if the document changed since `expected_version` was read.
    /// Replacing with identical text succeeds without touching history.
    pub fn replace_all(&mut self, new_text: &str, expected_version: u64) -> Result<Patch, ApplyError> {
        if expected_version != self.version {
            return Err(ApplyError::VersionConflict {
                expected: expected_version,
                actual: self.version,
            });
        }

        Ok(self.apply_text(new_text))
    }

    /// Take `text` as read from disk: one undoable replacement that also
    /// becomes the saved snapshot.
    pub fn reload(&mut self, text: &str) -> Patch {
        let patch = self.apply_text(text);
        self.mark_saved();
        patch
    }

    fn apply_text(&mut self, new_text: &str) -> Patch {
        let old_text = self.buffer.to_string();
        if old_text == new_text {
            return Patch::unchanged(self.version);
        }

        let (start, old_end, new_end) = changed_region(&old_text, new_text);
        let delta: Delta<RopeInfo> = Delta::simple_edit(
            start..old_end,
            Rope::from(&new_text[start..new_end]),
            old_text.len(),
        );
        let updated = delta.apply(&self.buffer);
        let previous = std::mem::replace(&mut self.buffer, updated);

        self.undo_stack.push(previous);
        if self.undo_stack.len() > HISTORY_LIMIT {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
        self.version += 1;

        Patch {
            changed: vec![start..new_end],
            version: self.version,
        }
    }

    /// Restore the text before the last replacement
    pub fn undo(&mut self) -> Option<Patch> {
        let previous = self.undo_stack.pop()?;
        let current = std::mem::replace(&mut self.buffer, previous);
        let patch = self.patch_from(&current);
        self.redo_stack.push(current);
        Some(patch)
    }

    /// Re-apply the last undone replacement
    pub fn redo(&mut self) -> Option<Patch> {
        let next = self.redo_stack.pop()?;
        let current = std::mem::replace(&mut self.buffer, next);
        let patch = self.patch_from(&current);
        self.undo_stack.push(current);
        Some(patch)
    }

    fn patch_from(&mut self, old: &Rope) -> Patch {
        self.version += 1;
        let old_text = old.to_string();
        let new_text = self.buffer.to_string();
        let changed = if old_text == new_text {
            Vec::new()
        } else {
            let (start, _, new_end) = changed_region(&old_text, &new_text);
            vec![start..new_end]
        };
        Patch {
            changed,
            version: self.version,
        }
    }
}

/// Common-prefix/suffix diff, snapped to char boundaries.
///
/// Returns `(start, old_end, new_end)` such that `old[start..old_end]` was
/// replaced by `new[start..new_end]`.
fn changed_region(old: &str, new: &str) -> (usize, usize, usize) {
    let mut prefix = old
        .bytes()
        .zip(new.bytes())
        .take_while(|(a, b)| a == b)
        .count();
    while !old.is_char_boundary(prefix) || !new.is_char_boundary(prefix) {
        prefix -= 1;
    }

    let max_suffix = old.len().min(new.len()) - prefix;
    let mut suffix = old
        .bytes()
        .rev()
        .zip(new.bytes().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();
    while !old.is_char_boundary(old.len() - suffix) || !new.is_char_boundary(new.len() - suffix) {
        suffix -= 1;
    }

    (prefix, old.len() - suffix, new.len() - suffix)
}
