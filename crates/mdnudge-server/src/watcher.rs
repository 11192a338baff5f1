//! Disk watching for open documents.
//!
//! Uses notify to hear about files changed by other programs and lets the
//! workspace reload clean buffers.
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use mdnudge_engine::io::is_document_path;
use mdnudge_engine::{DiskChange, Workspace};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Keeps the OS watches alive; dropping it stops forwarding events.
pub struct DiskWatcher {
    _watcher: RecommendedWatcher,
}

impl DiskWatcher {
    /// Watch every workspace root recursively.
    ///
    /// # Errors
    /// Returns an error if the watcher cannot be created or a root cannot be watched.
    pub fn start(workspace: Arc<Workspace>) -> notify::Result<Self> {
        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        for root in workspace.roots() {
            watcher.watch(root, RecursiveMode::Recursive)?;
            log::info!("Watching {}", root.display());
        }

        thread::Builder::new()
            .name("mdnudge-watch".to_string())
            .spawn(move || {
                for event in rx {
                    match event {
                        Ok(event) => {
                            for path in relevant_paths(&event) {
                                forward(&workspace, path);
                            }
                        }
                        Err(e) => log::warn!("Watcher error: {e}"),
                    }
                }
            })?;

        Ok(Self { _watcher: watcher })
    }
}

fn relevant_paths(event: &Event) -> Vec<PathBuf> {
    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter(|path| is_document_path(path))
        .cloned()
        .collect()
}

fn forward(workspace: &Workspace, path: PathBuf) {
    match workspace.observe_disk_change(&path) {
        Ok(DiskChange::NotOpen | DiskChange::Unchanged) => {}
        Ok(change) => log::debug!("{}: {change:?}", path.display()),
        Err(e) => log::debug!("Ignoring change to {}: {e}", path.display()),
    }
}
