//! Tokenizer for the brace-delimited attribute block of a candidate line.
//!
//! Only `key=<signed decimal>%` tokens are recognised. Class tokens, quoted
//! values and anything else inside the braces are left as opaque text.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

/// A `key=value%` token inside an attribute block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub key: &'a str,
    pub value: &'a str,
    /// Byte span of `key=value%` within the whole line.
    pub span: Range<usize>,
}

/// The `{...}` region of a line that holds an element's attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeBlock<'a> {
    line: &'a str,
    /// Position among the complete blocks of the line.
    index: usize,
    /// From the opening `{` through the closing `}` inclusive.
    span: Range<usize>,
}

fn percent_attribute_regex() -> &'static Regex {
    static PERCENT_ATTRIBUTE: OnceLock<Regex> = OnceLock::new();
    PERCENT_ATTRIBUTE.get_or_init(|| {
        Regex::new(r"(?:^|[\s{])([A-Za-z_][\w-]*)=(-?(?:\d+(?:\.\d*)?|\.\d+))%")
            .expect("Invalid attribute regex")
    })
}

fn signed_decimal_regex() -> &'static Regex {
    static SIGNED_DECIMAL: OnceLock<Regex> = OnceLock::new();
    SIGNED_DECIMAL.get_or_init(|| {
        Regex::new(r"^-?(?:\d+(?:\.\d*)?|\.\d+)$").expect("Invalid decimal regex")
    })
}

/// Whether `value` is a signed decimal such as `12`, `-3.5` or `.25`.
pub fn is_signed_decimal(value: &str) -> bool {
    signed_decimal_regex().is_match(value)
}

impl<'a> AttributeBlock<'a> {
    /// Find the attribute block to edit on `line`.
    ///
    /// Among the complete `{...}` blocks containing `marker_token`, prefers
    /// the first one whose text satisfies `accept`, then the first of them.
    /// Without any marker block, falls back to the first complete `{...}`.
    pub fn locate(line: &'a str, marker_token: &str, accept: impl Fn(&str) -> bool) -> Option<Self> {
        let mut first_marked = None;
        let mut first = None;
        for (index, span) in brace_spans(line).enumerate() {
            let text = &line[span.clone()];
            if text.contains(marker_token) {
                if accept(text) {
                    return Some(Self { line, index, span });
                }
                first_marked.get_or_insert((index, span.clone()));
            }
            first.get_or_insert((index, span));
        }
        first_marked
            .or(first)
            .map(|(index, span)| Self { line, index, span })
    }

    /// The `index`th complete block on `line`.
    pub fn nth(line: &'a str, index: usize) -> Option<Self> {
        brace_spans(line)
            .nth(index)
            .map(|span| Self { line, index, span })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_str(&self) -> &'a str {
        &self.line[self.span.clone()]
    }

    /// Byte offset of the closing `}` within the line.
    pub fn closing_brace(&self) -> usize {
        self.span.end - 1
    }

    /// All percent attributes in textual order.
    pub fn attributes(&self) -> Vec<Attribute<'a>> {
        let offset = self.span.start;
        percent_attribute_regex()
            .captures_iter(self.as_str())
            .filter_map(|caps| {
                let key = caps.get(1)?;
                let value = caps.get(2)?;
                let whole = caps.get(0)?;
                Some(Attribute {
                    key: key.as_str(),
                    value: value.as_str(),
                    span: offset + key.start()..offset + whole.end(),
                })
            })
            .collect()
    }

    /// First attribute named `key`.
    pub fn get(&self, key: &str) -> Option<Attribute<'a>> {
        self.attributes().into_iter().find(|attr| attr.key == key)
    }

    /// Extend `span` backwards over the whitespace that separates it from
    /// the previous token, without leaving the block.
    pub fn with_leading_whitespace(&self, span: Range<usize>) -> Range<usize> {
        let floor = self.span.start + 1;
        let before = &self.line[floor..span.start];
        let trimmed = before.trim_end();
        floor + trimmed.len()..span.end
    }
}

fn brace_spans(line: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    let mut cursor = 0;
    std::iter::from_fn(move || {
        let open = cursor + line[cursor..].find('{')?;
        let close = open + line[open..].find('}')?;
        cursor = close + 1;
        Some(open..close + 1)
    })
}
