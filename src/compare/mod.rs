//! Comparison of original and round-tripped sources
//!
//! Two modes are supported:
//! - `Exact` - the byte sequences must be identical
//! - `Normalized` - both texts are normalized first (see [`normalize`]), so
//!   trailing whitespace and the presence of a final newline do not matter
//!
//! A mismatch carries a unified diff for the diagnostic channel. The diff is
//! rendered after the verdict is decided and never influences it.

mod diff;

pub use diff::{DIFF_CONTEXT, LineMatcher, Opcode, OpcodeTag, unified_diff};

use std::fmt;

/// How two sources are judged equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComparisonMode {
    /// Byte-for-byte equality
    Exact,
    /// Equality after [`normalize`]
    #[default]
    Normalized,
}

impl ComparisonMode {
    /// Diff labels for the original and round-tripped side.
    pub fn diff_labels(self) -> (&'static str, &'static str) {
        match self {
            ComparisonMode::Exact => ("input", "decompiled"),
            ComparisonMode::Normalized => ("input(norm)", "decompiled(norm)"),
        }
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonMode::Exact => write!(f, "exact"),
            ComparisonMode::Normalized => write!(f, "normalized"),
        }
    }
}

/// Result of judging a round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonVerdict {
    Equal { mode: ComparisonMode },
    Mismatch { mode: ComparisonMode, diff: String },
}

impl ComparisonVerdict {
    pub fn is_equal(&self) -> bool {
        matches!(self, ComparisonVerdict::Equal { .. })
    }

    pub fn mode(&self) -> ComparisonMode {
        match self {
            ComparisonVerdict::Equal { mode } | ComparisonVerdict::Mismatch { mode, .. } => *mode,
        }
    }
}

/// Compare with the given mode.
pub fn compare(mode: ComparisonMode, original: &[u8], round_tripped: &[u8]) -> ComparisonVerdict {
    match mode {
        ComparisonMode::Exact => compare_exact(original, round_tripped),
        ComparisonMode::Normalized => compare_normalized(
            &String::from_utf8_lossy(original),
            &String::from_utf8_lossy(round_tripped),
        ),
    }
}

/// Byte-for-byte comparison; no decoding takes part in the verdict.
pub fn compare_exact(original: &[u8], round_tripped: &[u8]) -> ComparisonVerdict {
    let mode = ComparisonMode::Exact;
    if original == round_tripped {
        return ComparisonVerdict::Equal { mode };
    }

    let a = String::from_utf8_lossy(original);
    let b = String::from_utf8_lossy(round_tripped);
    let (from, to) = mode.diff_labels();
    let mut diff = unified_diff(&split_lines(&a), &split_lines(&b), from, to, DIFF_CONTEXT);

    // Line sequences can agree while the bytes differ: line terminators or
    // the final newline changed.
    if diff.is_empty() {
        diff = format!(
            "--- {from}\n+++ {to}\n(no line differences; line terminators or the final newline differ: {} bytes vs {} bytes)",
            original.len(),
            round_tripped.len()
        );
    }

    ComparisonVerdict::Mismatch { mode, diff }
}

/// Comparison after normalizing both texts.
pub fn compare_normalized(original: &str, round_tripped: &str) -> ComparisonVerdict {
    let mode = ComparisonMode::Normalized;
    let a = normalize(original);
    let b = normalize(round_tripped);
    if a == b {
        return ComparisonVerdict::Equal { mode };
    }

    let (from, to) = mode.diff_labels();
    let diff = unified_diff(&split_lines(&a), &split_lines(&b), from, to, DIFF_CONTEXT);
    ComparisonVerdict::Mismatch { mode, diff }
}

/// Canonicalize source text for comparison.
///
/// Splits on line boundaries, strips trailing whitespace from every line,
/// joins with `\n` and appends exactly one `\n`. Leading whitespace, blank
/// lines, line count and line order are all kept. Empty input becomes `"\n"`.
pub fn normalize(text: &str) -> String {
    let mut out = split_lines(text)
        .into_iter()
        .map(trim_trailing_whitespace)
        .collect::<Vec<_>>()
        .join("\n");
    out.push('\n');
    out
}

/// Split text into lines, dropping the terminators.
///
/// Recognizes `\r\n`, `\n`, `\r` and the other Unicode line boundaries. A
/// terminator at the very end does not produce a trailing empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_boundary(c) {
            continue;
        }
        lines.push(&text[start..i]);
        let mut end = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                end = j + 1;
                chars.next();
            }
        }
        start = end;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// `str::trim_end`, also dropping the unit separator `\x1f`.
fn trim_trailing_whitespace(line: &str) -> &str {
    line.trim_end_matches(|c: char| c.is_whitespace() || c == '\x1f')
}

fn is_line_boundary(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}
