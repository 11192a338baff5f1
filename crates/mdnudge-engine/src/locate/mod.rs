/*!
 * # Locate Module
 *
 * Finds the source line of a positioned element and rewrites its
 * position/size attributes.
 *
 * A request flows through three pure steps, all recomputed from the live
 * text every time:
 *
 * 1. **`indexer`**: every line with the marker class and a `{` becomes a
 *    [`CandidateLine`] with a dense ordinal.
 * 2. **`matcher`**: the first candidate whose classes and last-known anchors
 *    agree with the request is selected. The ordinal hint sent by a preview
 *    is never trusted on its own.
 * 3. **`rewrite`**: the selected line's `top`/`left` (and optionally
 *    `width`/`height`) tokens are replaced or inserted via the
 *    **`attributes`** tokenizer.
 *
 * ```rust
 * use mdnudge_engine::locate::*;
 *
 * let text = "# Slide\n\n![](a.png){.absolute top=10% left=20%}\n";
 * let request = Relocation::new(Placement::position("25", "40"))
 *     .with_classes(["absolute"].into_iter().collect())
 *     .with_current(PositionQuery::top_left("10", "20"));
 *
 * let relocated = locate_and_rewrite(text, &request).unwrap();
 * assert_eq!(relocated.text, "# Slide\n\n![](a.png){.absolute top=25% left=40%}\n");
 * ```
 */

pub mod attributes;
pub mod indexer;
pub mod matcher;
pub mod rewrite;

pub use attributes::{Attribute, AttributeBlock, is_signed_decimal};
pub use indexer::{CandidateLine, DEFAULT_MARKER, index, index_with_marker};
pub use matcher::{
    ClassList, MatchOutcome, PositionPattern, PositionQuery, SizeQuery, find_candidate,
    find_candidate_sized,
};
pub use rewrite::{AxisEdit, Placement, RewriteError, rewrite_document, rewrite_line};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LocateError {
    /// The text no longer contains an element with the caller's attributes.
    #[error("Element not found")]
    NotFound,
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

/// Everything needed to find one element and move or resize it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub marker: String,
    pub classes: ClassList,
    pub current: PositionQuery,
    /// Present for resizes; only informs logging, never the match.
    pub current_size: Option<SizeQuery>,
    pub placement: Placement,
}

impl Relocation {
    pub fn new(placement: Placement) -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            classes: ClassList::default(),
            current: PositionQuery::default(),
            current_size: None,
            placement,
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn with_classes(mut self, classes: ClassList) -> Self {
        self.classes = classes;
        self
    }

    pub fn with_current(mut self, current: PositionQuery) -> Self {
        self.current = current;
        self
    }

    pub fn with_current_size(mut self, size: SizeQuery) -> Self {
        self.current_size = Some(size);
        self
    }
}

/// Result of a successful relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocated {
    /// Full replacement text for the document.
    pub text: String,
    pub candidate: CandidateLine,
    pub pattern: PositionPattern,
    /// The rewritten line, trimmed.
    pub line: String,
}

/// Index `text`, match `request` against it and rewrite the matched line.
pub fn locate_and_rewrite(text: &str, request: &Relocation) -> Result<Relocated, LocateError> {
    let candidates = index_with_marker(text, &request.marker);
    log::debug!("Indexed {} candidate lines", candidates.len());

    let outcome = match &request.current_size {
        Some(size) => find_candidate_sized(&candidates, &request.classes, &request.current, size),
        None => find_candidate(&candidates, &request.classes, &request.current),
    }
    .ok_or(LocateError::NotFound)?;

    let candidate = outcome.candidate.clone();
    let text = rewrite_document(
        text,
        &candidate,
        &request.marker,
        &request.current,
        request.placement.edits(),
    )?;
    let line = indexer::split_lines(&text)
        .nth(candidate.line_number)
        .unwrap_or_default()
        .trim()
        .to_string();

    Ok(Relocated {
        text,
        candidate,
        pattern: outcome.pattern,
        line,
    })
}
