/*!
 * # Service Module
 *
 * The operations a preview calls while the user drags or resizes an
 * element: update position, update size, undo, redo, save and health.
 *
 * Each update resolves the document, takes its lock, relocates the element
 * in the live text and writes the full replacement back at the version it
 * read. Nothing is written to disk until `save`.
 */

pub mod request;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use request::{
    ErrorResponse, FileRequest, HealthResponse, PercentValue, UpdatePositionRequest,
    UpdateResponse, UpdateSizeRequest,
};

use crate::editing::{Document, Patch};
use crate::io::IoError;
use crate::locate::{
    ClassList, DEFAULT_MARKER, LocateError, Placement, PositionQuery, Relocation, SizeQuery,
    is_signed_decimal, locate_and_rewrite,
};
use crate::workspace::{ResolveError, SaveError, Workspace, lock};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Missing required parameters")]
    MissingParameters,
    #[error("Missing fileName parameter")]
    MissingFileName,
    #[error("Invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },
    #[error("File not found: {base_name}.qmd or {base_name}.md. Workspace: {roots}")]
    FileNotFound { base_name: String, roots: String },
    #[error("Element not found")]
    ElementNotFound,
    #[error("Failed to apply edit")]
    ApplyFailed(String),
    #[error("File changed on disk since it was loaded; not saved")]
    SaveConflict,
    #[error(transparent)]
    Io(#[from] IoError),
}

impl ServiceError {
    /// HTTP status code for this error
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::MissingParameters
            | ServiceError::MissingFileName
            | ServiceError::InvalidParameter { .. } => 400,
            ServiceError::FileNotFound { .. } | ServiceError::ElementNotFound => 404,
            ServiceError::SaveConflict => 409,
            ServiceError::ApplyFailed(_) | ServiceError::Io(_) => 500,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
        }
    }
}

impl From<ResolveError> for ServiceError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound { base_name, roots } => {
                ServiceError::FileNotFound { base_name, roots }
            }
            ResolveError::Io(e) => ServiceError::Io(e),
        }
    }
}

impl From<SaveError> for ServiceError {
    fn from(err: SaveError) -> Self {
        match err {
            SaveError::ChangedOnDisk(_) => ServiceError::SaveConflict,
            SaveError::Io(e) => ServiceError::Io(e),
        }
    }
}

pub const POSITION_UPDATED: &str = "Position updated (not saved)";
pub const SIZE_UPDATED: &str = "Size updated (not saved)";

pub struct Service {
    workspace: Arc<Workspace>,
    marker: String,
}

impl Service {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self {
            workspace,
            marker: DEFAULT_MARKER.to_string(),
        }
    }

    /// Use `marker` instead of `absolute` as the positioned-element class.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn workspace(&self) -> &Arc<Workspace> {
        &self.workspace
    }

    pub fn update_position(
        &self,
        request: &UpdatePositionRequest,
    ) -> Result<UpdateResponse, ServiceError> {
        let (Some(file_name), Some(md_index), Some(top), Some(left)) = (
            request.file_name.as_deref(),
            request.md_index.as_ref(),
            request.top.as_ref(),
            request.left.as_ref(),
        ) else {
            return Err(ServiceError::MissingParameters);
        };
        log::info!(
            "Update position: file={file_name} mdIndex={md_index} top={top} left={left}"
        );

        let placement = Placement::position(new_value("top", top)?, new_value("left", left)?);
        let relocation = Relocation::new(placement)
            .with_marker(self.marker.as_str())
            .with_classes(class_list(&request.class_list))
            .with_current(PositionQuery::new(
                current(&request.current_top),
                current(&request.current_left),
                current(&request.current_bottom),
                current(&request.current_right),
            ));

        self.relocate(file_name, md_index, &relocation)?;
        Ok(UpdateResponse::ok(POSITION_UPDATED))
    }

    pub fn update_size(&self, request: &UpdateSizeRequest) -> Result<UpdateResponse, ServiceError> {
        let (Some(file_name), Some(md_index), Some(top), Some(left), Some(width), Some(height)) = (
            request.file_name.as_deref(),
            request.md_index.as_ref(),
            request.top.as_ref(),
            request.left.as_ref(),
            request.width.as_ref(),
            request.height.as_ref(),
        ) else {
            return Err(ServiceError::MissingParameters);
        };
        log::info!(
            "Update size: file={file_name} mdIndex={md_index} top={top} left={left} width={width} height={height}"
        );

        let placement = Placement::with_size(
            new_value("top", top)?,
            new_value("left", left)?,
            new_value("width", width)?,
            new_value("height", height)?,
        );
        let relocation = Relocation::new(placement)
            .with_marker(self.marker.as_str())
            .with_classes(class_list(&request.class_list))
            .with_current(PositionQuery::new(
                current(&request.current_top),
                current(&request.current_left),
                current(&request.current_bottom),
                current(&request.current_right),
            ))
            .with_current_size(SizeQuery::new(
                current(&request.current_width),
                current(&request.current_height),
            ));

        self.relocate(file_name, md_index, &relocation)?;
        Ok(UpdateResponse::ok(SIZE_UPDATED))
    }

    /// Revert the last replacement in the named document.
    pub fn undo(&self, request: &FileRequest) -> Result<UpdateResponse, ServiceError> {
        let path = self.resolve_file(request)?;
        let changed = self.with_history(&path, Document::undo)?;
        Ok(UpdateResponse::ok(if changed {
            "Undo executed"
        } else {
            "Nothing to undo"
        }))
    }

    pub fn redo(&self, request: &FileRequest) -> Result<UpdateResponse, ServiceError> {
        let path = self.resolve_file(request)?;
        let changed = self.with_history(&path, Document::redo)?;
        Ok(UpdateResponse::ok(if changed {
            "Redo executed"
        } else {
            "Nothing to redo"
        }))
    }

    /// Write the named document's buffer to disk, unless the file was
    /// edited by hand since it was loaded.
    pub fn save(&self, request: &FileRequest) -> Result<UpdateResponse, ServiceError> {
        let path = self.resolve_file(request)?;
        self.workspace.save(&path)?;
        Ok(UpdateResponse::ok("Saved"))
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "ok".to_string(),
        }
    }

    fn resolve_file(&self, request: &FileRequest) -> Result<PathBuf, ServiceError> {
        let file_name = request
            .file_name
            .as_deref()
            .ok_or(ServiceError::MissingFileName)?;
        Ok(self.workspace.resolve(file_name)?)
    }

    fn with_history(
        &self,
        path: &Path,
        step: fn(&mut Document) -> Option<Patch>,
    ) -> Result<bool, ServiceError> {
        let handle = self.workspace.document(path)?;
        let mut document = lock(&handle);
        let Some(patch) = step(&mut *document) else {
            log::info!("No history to step through in {}", path.display());
            return Ok(false);
        };
        log::info!(
            "History step in {} (version {})",
            path.display(),
            patch.version
        );
        self.workspace.record_edit(path, &document.text());
        Ok(true)
    }

    fn relocate(
        &self,
        file_name: &str,
        md_index: &serde_json::Value,
        relocation: &Relocation,
    ) -> Result<(), ServiceError> {
        let path = self.workspace.resolve(file_name)?;
        log::info!("Resolved {file_name} to {}", path.display());

        let handle = self.workspace.document(&path)?;
        let mut document = lock(&handle);
        let version = document.version();

        let relocated = match locate_and_rewrite(&document.text(), relocation) {
            Ok(relocated) => relocated,
            Err(LocateError::NotFound) => {
                log::warn!("Element not found in {} (mdIndex {md_index})", path.display());
                return Err(ServiceError::ElementNotFound);
            }
            Err(LocateError::Rewrite(e)) => {
                log::error!("Rewrite failed in {}: {e}", path.display());
                return Err(ServiceError::ApplyFailed(e.to_string()));
            }
        };

        if !index_hint_matches(md_index, relocated.candidate.ordinal) {
            log::info!(
                "Matched element {} although the preview sent mdIndex {md_index}",
                relocated.candidate.ordinal
            );
        }
        log::info!(
            "Rewriting line {}: {}",
            relocated.candidate.line_number + 1,
            relocated.line
        );

        document
            .replace_all(&relocated.text, version)
            .map_err(|e| {
                log::error!("Failed to apply edit to {}: {e}", path.display());
                ServiceError::ApplyFailed(e.to_string())
            })?;
        self.workspace.record_edit(&path, &relocated.text);
        Ok(())
    }
}

/// Whether the preview's `mdIndex` names `ordinal`. The hint may arrive as
/// a number or as a string read from a data attribute.
fn index_hint_matches(hint: &serde_json::Value, ordinal: usize) -> bool {
    let number = match hint {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number == Some(ordinal as f64)
}

fn new_value(name: &'static str, value: &PercentValue) -> Result<String, ServiceError> {
    let text = value.as_text();
    if is_signed_decimal(&text) {
        Ok(text)
    } else {
        Err(ServiceError::InvalidParameter { name, value: text })
    }
}

fn current(value: &Option<PercentValue>) -> Option<String> {
    value.as_ref().map(PercentValue::as_text)
}

fn class_list(classes: &Option<Vec<String>>) -> ClassList {
    classes
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(String::as_str)
        .collect()
}
