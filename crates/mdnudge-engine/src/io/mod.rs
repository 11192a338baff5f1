use std::fs;
use std::path::{Path, PathBuf};

/// Extensions tried in order when resolving a document by base name.
pub const DOCUMENT_EXTENSIONS: [&str; 2] = ["qmd", "md"];

/// Directories never searched for documents.
pub const DEFAULT_EXCLUDED_DIRS: [&str; 1] = ["node_modules"];

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid workspace root: {0}")]
    InvalidRoot(String),
    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Strip one trailing `.qmd` or `.md` from a file name.
pub fn base_name(file_name: &str) -> &str {
    DOCUMENT_EXTENSIONS
        .iter()
        .find_map(|ext| file_name.strip_suffix(&format!(".{ext}")))
        .unwrap_or(file_name)
}

/// Find documents named `<base>.qmd` anywhere under `roots`, falling back to
/// `<base>.md` when no `.qmd` exists. Paths inside `excluded_dirs` are skipped.
pub fn find_documents(
    base: &str,
    roots: &[PathBuf],
    excluded_dirs: &[String],
) -> Result<Vec<PathBuf>, IoError> {
    for ext in DOCUMENT_EXTENSIONS {
        let found = glob_under_roots(&format!("{base}.{ext}"), roots, excluded_dirs)?;
        log::debug!("Search for **/{base}.{ext} found {found:?}");
        if !found.is_empty() {
            return Ok(found);
        }
    }
    Ok(Vec::new())
}

fn glob_under_roots(
    file_name: &str,
    roots: &[PathBuf],
    excluded_dirs: &[String],
) -> Result<Vec<PathBuf>, IoError> {
    let mut files = Vec::new();
    for root in roots {
        let pattern = format!(
            "{}/**/{}",
            glob::Pattern::escape(&root.to_string_lossy()),
            glob::Pattern::escape(file_name)
        );
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) if path.is_file() && !is_excluded(&path, root, excluded_dirs) => {
                    files.push(path);
                }
                Ok(_) => {}
                Err(e) => log::debug!("Skipping unreadable path during search: {e}"),
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn is_excluded(path: &Path, root: &Path, excluded_dirs: &[String]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|component| {
        excluded_dirs
            .iter()
            .any(|dir| component.as_os_str() == dir.as_str())
    })
}

/// Whether `path` names a document this service edits
pub fn is_document_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
}

/// Read a markdown file and return its content
pub fn read_file(path: &Path) -> Result<String, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(IoError::Io)
}

/// Write content to a markdown file
pub fn write_file(path: &Path, content: &str) -> Result<(), IoError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(path, content).map_err(IoError::Io)
}

pub fn validate_root(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidRoot(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    Ok(())
}
