//! Local HTTP bridge between a slide preview and `mdnudge-engine`.
//!
//! The preview posts drag and resize results as JSON; the engine rewrites
//! the matching attribute line in the open document.

pub mod http;
pub mod routes;
pub mod server;
pub mod watcher;

pub use server::{Server, ServerHandle};
pub use watcher::DiskWatcher;
