//! Open documents and file lookup for one set of workspace roots.
//!
//! The workspace plays the part an editor host plays for a preview
//! plugin: it owns the editable buffers, knows which one was touched last
//! and notices when a file changes on disk underneath it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::editing::Document;
use crate::io::{self, DEFAULT_EXCLUDED_DIRS, IoError};

/// Shared, lockable buffer for one document.
///
/// Holding the lock for the whole read-rewrite-replace cycle serializes
/// concurrent updates to the same document.
pub type DocumentHandle = Arc<Mutex<Document>>;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("File not found: {base_name}.qmd or {base_name}.md. Workspace: {roots}")]
    NotFound { base_name: String, roots: String },
    #[error(transparent)]
    Io(#[from] IoError),
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The file on disk no longer holds the text the buffer was loaded from.
    #[error("{} changed on disk since it was loaded; not saved", .0.display())]
    ChangedOnDisk(PathBuf),
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Outcome of [`Workspace::observe_disk_change`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskChange {
    /// The file has no open buffer; nothing to do.
    NotOpen,
    /// Disk already matches the saved snapshot (e.g. our own save).
    Unchanged,
    /// The clean buffer was replaced with the disk content.
    Reloaded,
    /// The buffer has unsaved edits, so the disk content was ignored.
    /// Saving is refused until the disk matches the buffer's origin again.
    KeptUnsavedEdits,
}

struct LastEdit {
    path: PathBuf,
    text: String,
}

pub struct Workspace {
    roots: Vec<PathBuf>,
    excluded_dirs: Vec<String>,
    documents: Mutex<HashMap<PathBuf, DocumentHandle>>,
    active: Mutex<Option<PathBuf>>,
    last_edit: Mutex<Option<LastEdit>>,
}

/// Lock a mutex, recovering the data if another thread panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

impl Workspace {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots: roots.iter().map(|root| normalize(root)).collect(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect(),
            documents: Mutex::new(HashMap::new()),
            active: Mutex::new(None),
            last_edit: Mutex::new(None),
        }
    }

    pub fn with_excluded_dirs(mut self, excluded_dirs: Vec<String>) -> Self {
        self.excluded_dirs = excluded_dirs;
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Roots as shown in "file not found" messages
    pub fn describe_roots(&self) -> String {
        if self.roots.is_empty() {
            return "No workspace open".to_string();
        }
        self.roots
            .iter()
            .map(|root| root.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Find the document a preview calls `file_name`.
    ///
    /// When several files share the base name, the active document wins;
    /// otherwise the first match in path order.
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf, ResolveError> {
        let base = io::base_name(file_name);
        let found: Vec<PathBuf> = io::find_documents(base, &self.roots, &self.excluded_dirs)?
            .iter()
            .map(|path| normalize(path))
            .collect();

        let active = lock(&self.active).clone();
        if let Some(active) = active
            && found.contains(&active)
        {
            log::debug!("Preferring active document {}", active.display());
            return Ok(active);
        }

        found.into_iter().next().ok_or_else(|| ResolveError::NotFound {
            base_name: base.to_string(),
            roots: self.describe_roots(),
        })
    }

    /// Handle for the buffer of `path`, read from disk on first use.
    ///
    /// The document becomes the active one.
    pub fn document(&self, path: &Path) -> Result<DocumentHandle, IoError> {
        let key = normalize(path);
        let handle = {
            let mut documents = lock(&self.documents);
            match documents.get(&key) {
                Some(handle) => Arc::clone(handle),
                None => {
                    let text = io::read_file(&key)?;
                    let handle = Arc::new(Mutex::new(Document::from_text(&text)));
                    documents.insert(key.clone(), Arc::clone(&handle));
                    log::info!("Opened {}", key.display());
                    handle
                }
            }
        };
        *lock(&self.active) = Some(key);
        Ok(handle)
    }

    pub fn is_open(&self, path: &Path) -> bool {
        lock(&self.documents).contains_key(&normalize(path))
    }

    pub fn active_document(&self) -> Option<PathBuf> {
        lock(&self.active).clone()
    }

    /// Remember `text` as the last text this service wrote into `path`.
    pub fn record_edit(&self, path: &Path, text: &str) {
        *lock(&self.last_edit) = Some(LastEdit {
            path: normalize(path),
            text: text.to_string(),
        });
    }

    /// Write the buffer of `path` to disk and mark it clean.
    ///
    /// Refuses to write when the file was changed by someone else since it
    /// was last loaded or saved, so hand edits are never overwritten.
    pub fn save(&self, path: &Path) -> Result<(), SaveError> {
        let key = normalize(path);
        let handle = self.document(&key)?;
        let mut document = lock(&handle);
        match io::read_file(&key) {
            Ok(disk_text) if disk_text != document.saved_text() => {
                log::warn!(
                    "Not saving {}: it changed on disk since it was loaded",
                    key.display()
                );
                return Err(SaveError::ChangedOnDisk(key));
            }
            Ok(_) | Err(IoError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        io::write_file(&key, &document.text())?;
        document.mark_saved();
        log::info!("Saved {}", path.display());
        Ok(())
    }

    /// React to `path` changing on disk.
    ///
    /// A clean buffer is reloaded (as one undoable step); a dirty one is
    /// left alone so unsaved moves are not lost.
    pub fn observe_disk_change(&self, path: &Path) -> Result<DiskChange, IoError> {
        let key = normalize(path);
        let Some(handle) = lock(&self.documents).get(&key).cloned() else {
            return Ok(DiskChange::NotOpen);
        };

        let disk_text = io::read_file(&key)?;
        let mut document = lock(&handle);
        if disk_text == document.saved_text() {
            return Ok(DiskChange::Unchanged);
        }
        if document.is_dirty() {
            log::warn!(
                "{} changed on disk but has unsaved edits; keeping the buffer and refusing to save over it",
                key.display()
            );
            return Ok(DiskChange::KeptUnsavedEdits);
        }

        document.reload(&disk_text);
        self.note_external_change(&key, &disk_text);
        log::info!("Reloaded {} from disk", key.display());
        Ok(DiskChange::Reloaded)
    }

    fn note_external_change(&self, path: &Path, text: &str) {
        let mut last_edit = lock(&self.last_edit);
        if let Some(edit) = last_edit.as_mut()
            && edit.path == path
            && edit.text != text
        {
            log::info!(
                "Document changed outside of mdnudge: {}",
                path.display()
            );
            edit.text = text.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_file, create_test_workspace_dir};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::thread;

    #[test]
    fn test_resolve_reports_base_name_and_roots() {
        // Given a workspace without the requested deck
        let root = create_test_workspace_dir();
        let workspace = Workspace::new(vec![root.path().to_path_buf()]);

        // When resolving it
        let err = workspace.resolve("missing.qmd").unwrap_err();

        // Then the message names both extensions and the root
        let message = err.to_string();
        assert!(message.starts_with("File not found: missing.qmd or missing.md. Workspace: "));
        assert!(message.contains(&normalize(root.path()).display().to_string()));
    }

    #[test]
    fn test_resolve_without_roots() {
        let workspace = Workspace::new(Vec::new());

        let err = workspace.resolve("deck").unwrap_err();

        assert_eq!(
            err.to_string(),
            "File not found: deck.qmd or deck.md. Workspace: No workspace open"
        );
    }

    #[test]
    fn test_resolve_prefers_active_document() {
        // Given two decks with the same base name, the second one opened
        let root = create_test_workspace_dir();
        create_test_file(&root, "a/deck.qmd", "");
        let second = create_test_file(&root, "b/deck.qmd", "");
        let workspace = Workspace::new(vec![root.path().to_path_buf()]);
        workspace.document(&second).unwrap();

        // When resolving by base name
        let resolved = workspace.resolve("deck").unwrap();

        // Then the active one wins over path order
        assert_eq!(resolved, normalize(&second));
    }

    #[test]
    fn test_resolve_first_match_without_active() {
        let root = create_test_workspace_dir();
        let first = create_test_file(&root, "a/deck.qmd", "");
        create_test_file(&root, "b/deck.qmd", "");
        let workspace = Workspace::new(vec![root.path().to_path_buf()]);

        assert_eq!(workspace.resolve("deck.qmd").unwrap(), normalize(&first));
    }

    #[test]
    fn test_document_handle_is_shared() {
        let root = create_test_workspace_dir();
        let path = create_test_file(&root, "deck.qmd", "text");
        let workspace = Workspace::new(vec![root.path().to_path_buf()]);

        let a = workspace.document(&path).unwrap();
        let b = workspace.document(&path).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(workspace.is_open(&path));
        assert_eq!(workspace.active_document(), Some(normalize(&path)));
    }

    #[test]
    fn test_save_writes_buffer_and_marks_clean() {
        let root = create_test_workspace_dir();
        let path = create_test_file(&root, "deck.qmd", "old");
        let workspace = Workspace::new(vec![root.path().to_path_buf()]);
        let handle = workspace.document(&path).unwrap();
        lock(&handle).replace_all("new", 0).unwrap();

        workspace.save(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!lock(&handle).is_dirty());
    }

    #[test]
    fn test_disk_change_reloads_clean_buffer() {
        // Given an open, unedited document
        let root = create_test_workspace_dir();
        let path = create_test_file(&root, "deck.qmd", "v1");
        let workspace = Workspace::new(vec![root.path().to_path_buf()]);
        let handle = workspace.document(&path).unwrap();

        // When the file changes on disk
        fs::write(&path, "v2").unwrap();
        let change = workspace.observe_disk_change(&path).unwrap();

        // Then the buffer follows the disk
        assert_eq!(change, DiskChange::Reloaded);
        assert_eq!(lock(&handle).text(), "v2");
        assert!(!lock(&handle).is_dirty());
    }

    #[test]
    fn test_disk_change_keeps_unsaved_edits() {
        let root = create_test_workspace_dir();
        let path = create_test_file(&root, "deck.qmd", "v1");
        let workspace = Workspace::new(vec![root.path().to_path_buf()]);
        let handle = workspace.document(&path).unwrap();
        lock(&handle).replace_all("edited", 0).unwrap();

        fs::write(&path, "v2").unwrap();
        let change = workspace.observe_disk_change(&path).unwrap();

        assert_eq!(change, DiskChange::KeptUnsavedEdits);
        assert_eq!(lock(&handle).text(), "edited");
    }

    #[test]
    fn test_save_refuses_to_overwrite_hand_edit() {
        // Given an open document with an unsaved move
        let root = create_test_workspace_dir();
        let path = create_test_file(&root, "deck.qmd", "![](a.png){.absolute top=1% left=1%}\n");
        let workspace = Workspace::new(vec![root.path().to_path_buf()]);
        let handle = workspace.document(&path).unwrap();
        lock(&handle)
            .replace_all("![](a.png){.absolute top=30% left=40%}\n", 0)
            .unwrap();

        // When someone edits the file by hand and the change is observed
        let hand_edited = "# Added by hand\n![](a.png){.absolute top=1% left=1%}\n";
        fs::write(&path, hand_edited).unwrap();
        assert_eq!(
            workspace.observe_disk_change(&path).unwrap(),
            DiskChange::KeptUnsavedEdits
        );
        let result = workspace.save(&path);

        // Then the save is refused and the hand edit survives
        assert!(matches!(result, Err(SaveError::ChangedOnDisk(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), hand_edited);
        assert!(lock(&handle).is_dirty());
    }

    #[test]
    fn test_disk_change_after_own_save_is_unchanged() {
        let root = create_test_workspace_dir();
        let path = create_test_file(&root, "deck.qmd", "v1");
        let workspace = Workspace::new(vec![root.path().to_path_buf()]);
        let handle = workspace.document(&path).unwrap();
        lock(&handle).replace_all("v2", 0).unwrap();
        workspace.save(&path).unwrap();

        assert_eq!(workspace.observe_disk_change(&path).unwrap(), DiskChange::Unchanged);
    }

    #[test]
    fn test_disk_change_for_unopened_file() {
        let root = create_test_workspace_dir();
        let path = create_test_file(&root, "deck.qmd", "v1");
        let workspace = Workspace::new(vec![root.path().to_path_buf()]);

        assert_eq!(workspace.observe_disk_change(&path).unwrap(), DiskChange::NotOpen);
    }

    #[test]
    fn test_concurrent_updates_are_serialized() {
        // Given one document shared by several threads
        let root = create_test_workspace_dir();
        let path = create_test_file(&root, "deck.qmd", "");
        let workspace = Arc::new(Workspace::new(vec![root.path().to_path_buf()]));

        // When each thread appends under the document lock
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let workspace = Arc::clone(&workspace);
                let path = path.clone();
                thread::spawn(move || {
                    let handle = workspace.document(&path).unwrap();
                    let mut doc = lock(&handle);
                    let text = format!("{}x", doc.text());
                    let version = doc.version();
                    doc.replace_all(&text, version).unwrap();
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        // Then no update was lost
        let handle = workspace.document(&path).unwrap();
        assert_eq!(lock(&handle).text(), "xxxxxxxx");
    }
}
