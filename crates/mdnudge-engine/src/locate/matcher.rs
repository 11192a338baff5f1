//! Matcher: picks the candidate line a browser-side element came from.
//!
//! The scan is first-match over candidates in ordinal order. A candidate is
//! accepted when its class tokens and its stored position both agree with
//! what the preview last observed for the element.

use std::sync::OnceLock;

use regex::Regex;

use super::indexer::CandidateLine;

/// Class names that must all appear as `.name` on the line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList(Vec<String>);

impl ClassList {
    pub fn new(classes: Vec<String>) -> Self {
        Self(classes)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// An empty list matches every line.
    pub fn matches(&self, line: &str) -> bool {
        self.0
            .iter()
            .all(|class| line.contains(&format!(".{class}")))
    }
}

impl<S: Into<String>> FromIterator<S> for ClassList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Last-known anchor attributes of an element, as percent values without `%`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionQuery {
    pub top: Option<String>,
    pub left: Option<String>,
    pub bottom: Option<String>,
    pub right: Option<String>,
}

/// Last-known size attributes of an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeQuery {
    pub width: Option<String>,
    pub height: Option<String>,
}

/// Which rule accepted the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionPattern {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    /// Element without explicit anchors, rendered at the container origin.
    DefaultOrigin,
}

/// A successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome<'c> {
    pub candidate: &'c CandidateLine,
    pub pattern: PositionPattern,
    /// `None` for position-only matching. Informational: size never gates.
    pub size_agrees: Option<bool>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn has_attribute(line: &str, key: &str, value: &str) -> bool {
    line.contains(&format!("{key}={value}%"))
}

fn any_position_key_regex() -> &'static Regex {
    static POSITION_KEY: OnceLock<Regex> = OnceLock::new();
    POSITION_KEY
        .get_or_init(|| Regex::new(r"\b(top|left|bottom|right)=").expect("Invalid position regex"))
}

impl PositionQuery {
    pub fn new(
        top: Option<String>,
        left: Option<String>,
        bottom: Option<String>,
        right: Option<String>,
    ) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// `top`/`left` pair, the common case.
    pub fn top_left(top: impl Into<String>, left: impl Into<String>) -> Self {
        Self {
            top: Some(top.into()),
            left: Some(left.into()),
            ..Self::default()
        }
    }

    /// True when the caller reports no anchors, or reports the `0`/`0`
    /// origin that previews display for unpositioned elements.
    ///
    /// The two readings cannot be told apart: an element really placed at
    /// `top=0% left=0%` and one with no anchors both satisfy this.
    pub fn is_default_origin(&self) -> bool {
        let top = present(&self.top);
        let left = present(&self.left);
        let bottom = present(&self.bottom);
        let right = present(&self.right);
        let none_supplied = top.is_none() && left.is_none() && bottom.is_none() && right.is_none();
        let zero_origin =
            top == Some("0") && left == Some("0") && bottom.is_none() && right.is_none();
        none_supplied || zero_origin
    }

    /// Evaluate the anchor patterns against `line` in priority order.
    pub fn matches(&self, line: &str) -> Option<PositionPattern> {
        let top = present(&self.top);
        let left = present(&self.left);
        let bottom = present(&self.bottom);
        let right = present(&self.right);

        if let (Some(top), Some(left)) = (top, left)
            && has_attribute(line, "top", top)
            && has_attribute(line, "left", left)
        {
            return Some(PositionPattern::TopLeft);
        }
        if let (Some(top), Some(right)) = (top, right)
            && has_attribute(line, "top", top)
            && has_attribute(line, "right", right)
        {
            return Some(PositionPattern::TopRight);
        }
        if let (Some(bottom), Some(left)) = (bottom, left)
            && has_attribute(line, "bottom", bottom)
            && has_attribute(line, "left", left)
        {
            return Some(PositionPattern::BottomLeft);
        }
        if let (Some(bottom), Some(right)) = (bottom, right)
            && has_attribute(line, "bottom", bottom)
            && has_attribute(line, "right", right)
        {
            return Some(PositionPattern::BottomRight);
        }
        if self.is_default_origin() && line_at_default_origin(line) {
            return Some(PositionPattern::DefaultOrigin);
        }
        None
    }
}

/// A line sits at the origin when it carries no anchor keys at all, or
/// carries an explicit `top=0% left=0%`.
fn line_at_default_origin(line: &str) -> bool {
    !any_position_key_regex().is_match(line)
        || (line.contains("top=0%") && line.contains("left=0%"))
}

impl SizeQuery {
    pub fn new(width: Option<String>, height: Option<String>) -> Self {
        Self { width, height }
    }

    /// Whether every supplied size value is present on `line`.
    pub fn agrees(&self, line: &str) -> bool {
        let width_ok = present(&self.width).is_none_or(|w| has_attribute(line, "width", w));
        let height_ok = present(&self.height).is_none_or(|h| has_attribute(line, "height", h));
        width_ok && height_ok
    }
}

/// Find the first candidate whose classes and anchors match.
pub fn find_candidate<'c>(
    candidates: &'c [CandidateLine],
    classes: &ClassList,
    position: &PositionQuery,
) -> Option<MatchOutcome<'c>> {
    scan(candidates, classes, position, None)
}

/// Like [`find_candidate`], additionally recording whether the line's
/// width/height agree with `size`. A freshly created element may not carry
/// a size yet, so disagreement does not reject the candidate.
pub fn find_candidate_sized<'c>(
    candidates: &'c [CandidateLine],
    classes: &ClassList,
    position: &PositionQuery,
    size: &SizeQuery,
) -> Option<MatchOutcome<'c>> {
    scan(candidates, classes, position, Some(size))
}

fn scan<'c>(
    candidates: &'c [CandidateLine],
    classes: &ClassList,
    position: &PositionQuery,
    size: Option<&SizeQuery>,
) -> Option<MatchOutcome<'c>> {
    for candidate in candidates {
        let line = candidate.raw_text.as_str();
        if !classes.matches(line) {
            continue;
        }
        let Some(pattern) = position.matches(line) else {
            continue;
        };
        let size_agrees = size.map(|size| size.agrees(line));
        if size_agrees == Some(false) {
            log::debug!(
                "Candidate {} matched by position but size differs: {line}",
                candidate.ordinal
            );
        }
        log::debug!(
            "Matched candidate {} (line {}) by {pattern:?}",
            candidate.ordinal,
            candidate.line_number + 1
        );
        return Some(MatchOutcome {
            candidate,
            pattern,
            size_agrees,
        });
    }

    log::debug!("No candidate matched classes {:?} at {position:?}", classes.names());
    if !classes.is_empty() {
        for candidate in candidates.iter().filter(|c| classes.matches(&c.raw_text)) {
            log::debug!("  class match {}: {}", candidate.ordinal, candidate.raw_text);
        }
    }
    None
}
