//! Find and rewrite the attribute line of an absolutely positioned element
//! in a Quarto/markdown document, so a live preview can drag and resize it.
//!
//! - [`locate`]: pure indexing, matching and rewriting of candidate lines
//! - [`editing`]: versioned document buffers with undo/redo
//! - [`workspace`]: file lookup and the set of open documents
//! - [`service`]: the request-level operations a preview calls

pub mod editing;
pub mod io;
pub mod locate;
pub mod service;
pub mod workspace;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{ApplyError, Document, Patch};
pub use io::IoError;
pub use locate::{LocateError, Placement, PositionQuery, Relocation, locate_and_rewrite};
pub use service::{Service, ServiceError};
pub use workspace::{DiskChange, DocumentHandle, ResolveError, SaveError, Workspace};
