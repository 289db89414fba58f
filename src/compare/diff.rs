//! Unified diff rendering
//!
//! Lines are matched with the longest-matching-block algorithm: find the
//! longest run of equal lines, then recurse on the regions to either side.
//! For long right-hand inputs, lines that occur in more than 1% of it are
//! treated as "popular" and only matched by extending neighbouring blocks,
//! which keeps repetitive sources from dominating the match.
//!
//! Output follows the classic unified format with `lineterm` left empty, so
//! lines are joined with `\n` and there is no trailing newline.

use std::collections::HashMap;

/// Lines of context shown around each change.
pub const DIFF_CONTEXT: usize = 3;

/// Below this many lines on the right-hand side nothing is considered popular.
const POPULAR_MIN_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeTag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// `a[i1..i2]` relates to `b[j1..j2]` as described by `tag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub tag: OpcodeTag,
    pub i1: usize,
    pub i2: usize,
    pub j1: usize,
    pub j2: usize,
}

impl Opcode {
    fn new(tag: OpcodeTag, i1: usize, i2: usize, j1: usize, j2: usize) -> Self {
        Self { tag, i1, i2, j1, j2 }
    }
}

/// Matches two sequences of lines.
pub struct LineMatcher<'a> {
    a: &'a [&'a str],
    b: &'a [&'a str],
    /// Line of `b` -> every index it occurs at, popular lines removed
    b2j: HashMap<&'a str, Vec<usize>>,
}

impl<'a> LineMatcher<'a> {
    pub fn new(a: &'a [&'a str], b: &'a [&'a str]) -> Self {
        let mut b2j: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (j, line) in b.iter().enumerate() {
            b2j.entry(*line).or_default().push(j);
        }

        if b.len() >= POPULAR_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, indices| indices.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Longest block with `a[i..i+k] == b[j..j+k]` inside the given ranges.
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0);
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(indices) = self.b2j.get(self.a[i]) {
                for &j in indices {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j.checked_sub(1).and_then(|prev| j2len.get(&prev)).copied().unwrap_or(0) + 1;
                    next.insert(j, k);
                    if k > bestsize {
                        besti = i + 1 - k;
                        bestj = j + 1 - k;
                        bestsize = k;
                    }
                }
            }
            j2len = next;
        }

        // Popular lines never enter b2j; pick them up at the block edges.
        while besti > alo && bestj > blo && self.a[besti - 1] == self.b[bestj - 1] {
            besti -= 1;
            bestj -= 1;
            bestsize += 1;
        }
        while besti + bestsize < ahi && bestj + bestsize < bhi && self.a[besti + bestsize] == self.b[bestj + bestsize] {
            bestsize += 1;
        }

        (besti, bestj, bestsize)
    }

    /// Non-adjacent matching blocks in order, ending with `(len(a), len(b), 0)`.
    pub fn matching_blocks(&self) -> Vec<(usize, usize, usize)> {
        let (la, lb) = (self.a.len(), self.b.len());
        let mut pending = vec![(0, la, 0, lb)];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            blocks.push((i, j, k));
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                pending.push((i + k, ahi, j + k, bhi));
            }
        }
        blocks.sort_unstable();

        let mut merged = Vec::with_capacity(blocks.len() + 1);
        let (mut i1, mut j1, mut k1) = (0, 0, 0);
        for (i2, j2, k2) in blocks {
            if i1 + k1 == i2 && j1 + k1 == j2 {
                k1 += k2;
            } else {
                if k1 > 0 {
                    merged.push((i1, j1, k1));
                }
                (i1, j1, k1) = (i2, j2, k2);
            }
        }
        if k1 > 0 {
            merged.push((i1, j1, k1));
        }
        merged.push((la, lb, 0));
        merged
    }

    /// Edit script turning `a` into `b`.
    pub fn opcodes(&self) -> Vec<Opcode> {
        let mut codes = Vec::new();
        let (mut i, mut j) = (0, 0);

        for (ai, bj, size) in self.matching_blocks() {
            let tag = match (i < ai, j < bj) {
                (true, true) => Some(OpcodeTag::Replace),
                (true, false) => Some(OpcodeTag::Delete),
                (false, true) => Some(OpcodeTag::Insert),
                (false, false) => None,
            };
            if let Some(tag) = tag {
                codes.push(Opcode::new(tag, i, ai, j, bj));
            }
            i = ai + size;
            j = bj + size;
            if size > 0 {
                codes.push(Opcode::new(OpcodeTag::Equal, ai, i, bj, j));
            }
        }
        codes
    }

    /// Opcodes split into hunks with at most `context` equal lines around each change.
    pub fn grouped_opcodes(&self, context: usize) -> Vec<Vec<Opcode>> {
        let mut codes = self.opcodes();
        if codes.is_empty() {
            codes.push(Opcode::new(OpcodeTag::Equal, 0, 1, 0, 1));
        }

        if let Some(first) = codes.first_mut() {
            if first.tag == OpcodeTag::Equal {
                first.i1 = first.i1.max(first.i2.saturating_sub(context));
                first.j1 = first.j1.max(first.j2.saturating_sub(context));
            }
        }
        if let Some(last) = codes.last_mut() {
            if last.tag == OpcodeTag::Equal {
                last.i2 = last.i2.min(last.i1 + context);
                last.j2 = last.j2.min(last.j1 + context);
            }
        }

        let mut groups = Vec::new();
        let mut group = Vec::new();
        for mut code in codes {
            if code.tag == OpcodeTag::Equal && code.i2 - code.i1 > 2 * context {
                group.push(Opcode::new(
                    OpcodeTag::Equal,
                    code.i1,
                    code.i2.min(code.i1 + context),
                    code.j1,
                    code.j2.min(code.j1 + context),
                ));
                groups.push(std::mem::take(&mut group));
                code.i1 = code.i1.max(code.i2.saturating_sub(context));
                code.j1 = code.j1.max(code.j2.saturating_sub(context));
            }
            group.push(code);
        }

        let only_equal = group.len() == 1 && group[0].tag == OpcodeTag::Equal;
        if !group.is_empty() && !only_equal {
            groups.push(group);
        }
        groups
    }
}

/// Render a unified diff of two line sequences.
///
/// Returns an empty string when the sequences are equal.
pub fn unified_diff(a: &[&str], b: &[&str], from_label: &str, to_label: &str, context: usize) -> String {
    let matcher = LineMatcher::new(a, b);
    let mut out: Vec<String> = Vec::new();

    for group in matcher.grouped_opcodes(context) {
        if out.is_empty() {
            out.push(format!("--- {from_label}"));
            out.push(format!("+++ {to_label}"));
        }

        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        out.push(format!(
            "@@ -{} +{} @@",
            format_range(first.i1, last.i2),
            format_range(first.j1, last.j2)
        ));

        for code in &group {
            if code.tag == OpcodeTag::Equal {
                out.extend(a[code.i1..code.i2].iter().map(|line| format!(" {line}")));
                continue;
            }
            if matches!(code.tag, OpcodeTag::Replace | OpcodeTag::Delete) {
                out.extend(a[code.i1..code.i2].iter().map(|line| format!("-{line}")));
            }
            if matches!(code.tag, OpcodeTag::Replace | OpcodeTag::Insert) {
                out.extend(b[code.j1..code.j2].iter().map(|line| format!("+{line}")));
            }
        }
    }

    out.join("\n")
}

/// `start,len` range of a hunk header, 1-based.
///
/// A single line is written without its length; an empty range points at the
/// line before it.
fn format_range(start: usize, stop: usize) -> String {
    let length = stop - start;
    match length {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{length}", start + 1),
    }
}
