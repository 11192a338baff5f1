/*!
 * # Editing Module
 *
 * In-memory document buffers that relocations are applied to.
 *
 * - **`document`**: `Document`, an xi-rope buffer with versioned full-text
 *   replacement and undo/redo history
 * - **`patch`**: what a replacement, undo or redo changed
 *
 * Every position/size update reads the full text, computes the full
 * replacement and writes it back through `Document::replace_all` with the
 * version it read. One replacement is one undo step, so undoing after a
 * move restores exactly the text before that move.
 */

pub mod document;
pub mod patch;

pub use document::{ApplyError, Document, HISTORY_LIMIT};
pub use patch::Patch;
