//! Rewriter: edits position/size tokens on one line of the document.
//!
//! Each [`AxisEdit`] is applied in order with the same policy:
//! replace the key in place, else turn the axis-opposite token into the key,
//! else insert ` key=value%` before the block's closing brace.

use std::ops::Range;

use super::attributes::AttributeBlock;
use super::indexer::{CandidateLine, marker_token, split_lines};
use super::matcher::PositionQuery;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error("Line {line_number} is out of range (document has {line_count} lines)")]
    LineOutOfRange {
        line_number: usize,
        line_count: usize,
    },
    #[error("Line {line_number} no longer matches the indexed candidate")]
    StaleCandidate { line_number: usize },
    #[error("Line {line_number} has no attribute block")]
    NoAttributeBlock { line_number: usize },
}

/// One attribute to set: `key`, the key it displaces on the same axis,
/// and the value to write verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisEdit {
    pub key: &'static str,
    pub opposite: Option<&'static str>,
    pub value: String,
}

impl AxisEdit {
    pub fn top(value: impl Into<String>) -> Self {
        Self {
            key: "top",
            opposite: Some("bottom"),
            value: value.into(),
        }
    }

    pub fn left(value: impl Into<String>) -> Self {
        Self {
            key: "left",
            opposite: Some("right"),
            value: value.into(),
        }
    }

    pub fn width(value: impl Into<String>) -> Self {
        Self {
            key: "width",
            opposite: None,
            value: value.into(),
        }
    }

    pub fn height(value: impl Into<String>) -> Self {
        Self {
            key: "height",
            opposite: None,
            value: value.into(),
        }
    }

    fn token(&self) -> String {
        format!("{}={}%", self.key, self.value)
    }
}

/// The ordered set of edits for a move or a resize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    edits: Vec<AxisEdit>,
}

impl Placement {
    /// New `top`/`left` only.
    pub fn position(top: impl Into<String>, left: impl Into<String>) -> Self {
        Self {
            edits: vec![AxisEdit::top(top), AxisEdit::left(left)],
        }
    }

    /// New `top`/`left` plus `width`/`height`.
    pub fn with_size(
        top: impl Into<String>,
        left: impl Into<String>,
        width: impl Into<String>,
        height: impl Into<String>,
    ) -> Self {
        Self {
            edits: vec![
                AxisEdit::top(top),
                AxisEdit::left(left),
                AxisEdit::width(width),
                AxisEdit::height(height),
            ],
        }
    }

    pub fn edits(&self) -> &[AxisEdit] {
        &self.edits
    }
}

/// Apply `edits` to a single line. Text outside the touched tokens is kept
/// byte for byte.
///
/// The edited block is the marker block whose anchors satisfy `current`,
/// so a line holding several positioned elements rewrites the one that
/// was matched.
pub fn rewrite_line(
    line: &str,
    marker: &str,
    current: &PositionQuery,
    edits: &[AxisEdit],
) -> Option<String> {
    let block = AttributeBlock::locate(line, &marker_token(marker), |text| {
        current.matches(text).is_some()
    })?
    .index();
    let mut updated = line.to_string();
    for edit in edits {
        updated = apply_edit(&updated, block, edit)?;
    }
    Some(updated)
}

fn apply_edit(line: &str, block: usize, edit: &AxisEdit) -> Option<String> {
    let block = AttributeBlock::nth(line, block)?;
    let replacement = edit.token();
    let own = block.get(edit.key);
    let opposite = edit.opposite.and_then(|key| block.get(key));

    let line = match (own, opposite) {
        (Some(own), Some(opposite)) => {
            let dropped = block.with_leading_whitespace(opposite.span);
            splice(line, vec![(own.span, replacement.as_str()), (dropped, "")])
        }
        (Some(own), None) => splice(line, vec![(own.span, replacement.as_str())]),
        (None, Some(opposite)) => splice(line, vec![(opposite.span, replacement.as_str())]),
        (None, None) => {
            let at = block.closing_brace();
            let inserted = format!(" {replacement}");
            splice(line, vec![(at..at, inserted.as_str())])
        }
    };
    Some(line)
}

/// Replace non-overlapping byte ranges of `line`.
fn splice(line: &str, mut edits: Vec<(Range<usize>, &str)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(line.len() + 16);
    let mut cursor = 0;
    for (range, text) in edits {
        out.push_str(&line[cursor..range.start]);
        out.push_str(text);
        cursor = range.end;
    }
    out.push_str(&line[cursor..]);
    out
}

/// Rewrite the candidate's line inside `text`, returning the whole new text.
///
/// All other lines are copied unchanged and rejoined with `\n`.
pub fn rewrite_document(
    text: &str,
    candidate: &CandidateLine,
    marker: &str,
    current: &PositionQuery,
    edits: &[AxisEdit],
) -> Result<String, RewriteError> {
    let line_number = candidate.line_number;
    let original = split_lines(text)
        .nth(line_number)
        .ok_or_else(|| RewriteError::LineOutOfRange {
            line_number,
            line_count: split_lines(text).count(),
        })?;
    if original.trim() != candidate.raw_text {
        return Err(RewriteError::StaleCandidate { line_number });
    }
    let updated = rewrite_line(original, marker, current, edits)
        .ok_or(RewriteError::NoAttributeBlock { line_number })?;

    let mut out = String::with_capacity(text.len() + updated.len().saturating_sub(original.len()));
    for (i, line) in split_lines(text).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(if i == line_number { updated.as_str() } else { line });
    }
    Ok(out)
}
