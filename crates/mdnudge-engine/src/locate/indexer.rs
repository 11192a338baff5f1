//! Line indexer: collects positioned-element declarations from raw text.
//!
//! Ordinals are only meaningful for the text they were computed from. Every
//! request re-indexes the live buffer instead of caching a previous pass.

/// Class name that marks an absolutely positioned element (`.absolute`).
pub const DEFAULT_MARKER: &str = "absolute";

/// A line that looks like a positioned-element declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLine {
    /// Zero-based rank among candidate lines, in document order.
    pub ordinal: usize,
    /// Zero-based index into the `\n`-split line sequence.
    pub line_number: usize,
    /// The source line, trimmed.
    pub raw_text: String,
}

/// Render a marker class name as the `.class` token searched for in lines.
pub fn marker_token(marker: &str) -> String {
    format!(".{marker}")
}

/// Split text into lines on `\n` only.
///
/// A `\r` before the newline stays on its line, so [`join_lines`] restores
/// CRLF documents byte for byte.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
}

/// Inverse of [`split_lines`].
pub fn join_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for (i, line) in lines.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

/// Index candidate lines using the default `.absolute` marker.
pub fn index(text: &str) -> Vec<CandidateLine> {
    index_with_marker(text, DEFAULT_MARKER)
}

/// Index every line that contains `.<marker>` and an opening `{`.
pub fn index_with_marker(text: &str, marker: &str) -> Vec<CandidateLine> {
    let token = marker_token(marker);
    split_lines(text)
        .enumerate()
        .filter(|(_, line)| is_candidate(line, &token))
        .enumerate()
        .map(|(ordinal, (line_number, line))| CandidateLine {
            ordinal,
            line_number,
            raw_text: line.trim().to_string(),
        })
        .collect()
}

fn is_candidate(line: &str, token: &str) -> bool {
    line.contains(token) && line.contains('{')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const SLIDE: &str = "\
## Slide

![](a.png){.absolute top=10% left=20%}

Some text with {braces} but no marker.

.absolute mentioned without a brace

![](b.png){.absolute .card bottom=5% right=10%}
";

    #[test]
    fn test_index_collects_marker_lines_in_order() {
        let candidates = index(SLIDE);

        assert_eq!(
            candidates,
            vec![
                CandidateLine {
                    ordinal: 0,
                    line_number: 2,
                    raw_text: "![](a.png){.absolute top=10% left=20%}".to_string(),
                },
                CandidateLine {
                    ordinal: 1,
                    line_number: 8,
                    raw_text: "![](b.png){.absolute .card bottom=5% right=10%}".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_index_is_idempotent() {
        assert_eq!(index(SLIDE), index(SLIDE));
    }

    #[test]
    fn test_ordinals_are_dense_and_line_numbers_increase() {
        let text = (0..25)
            .map(|i| {
                if i % 3 == 0 {
                    format!("![](img{i}.png){{.absolute top={i}% left=0%}}")
                } else {
                    format!("plain line {i}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        let candidates = index(&text);

        assert_eq!(candidates.len(), 9);
        for (expected, candidate) in candidates.iter().enumerate() {
            assert_eq!(candidate.ordinal, expected);
        }
        assert!(
            candidates
                .windows(2)
                .all(|pair| pair[0].line_number < pair[1].line_number)
        );
    }

    #[test]
    fn test_raw_text_is_trimmed_including_carriage_return() {
        let text = "intro\r\n   ![](x.png){.absolute top=1% left=2%}  \r\nend";

        let candidates = index(text);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].line_number, 1);
        assert_eq!(candidates[0].raw_text, "![](x.png){.absolute top=1% left=2%}");
    }

    #[test]
    fn test_custom_marker() {
        let text = "![](a.png){.absolute}\n![](b.png){.floating top=1% left=1%}";

        let candidates = index_with_marker(text, "floating");

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].line_number, 1);
    }

    #[rstest]
    #[case("")]
    #[case("single line")]
    #[case("a\nb\n")]
    #[case("\n\n")]
    #[case("crlf\r\nlines\r\n")]
    fn test_split_join_roundtrip(#[case] text: &str) {
        assert_eq!(join_lines(split_lines(text)), text);
    }
}
