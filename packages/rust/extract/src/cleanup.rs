//! Line cleanup pipeline applied to the joined fragment text.
//!
//! Each pass maps a line list to a new line list. The passes are repeated
//! until the output stops changing, so cleaning already-clean text is a no-op.
//! Every pass only deletes lines or strips whitespace, which bounds the loop.
//!
//! Whether a line is prose, a fence delimiter, or code is decided once from
//! the input and travels with the line. No pass removes one fence of a block
//! without the other, so the output classifies the same way on a second run.

use std::sync::LazyLock;

use pagemark_shared::ExtractProfile;
use regex::Regex;

/// Lines shorter than this among the first few kept lines are dropped.
const MIN_LEADING_LINE_CHARS: usize = 10;

/// How many leading kept lines [`MIN_LEADING_LINE_CHARS`] applies to.
const LEADING_WINDOW: usize = 3;

/// Edge lines shorter than this are trimmed from both ends.
const MIN_EDGE_LINE_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Prose,
    Fence,
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    text: String,
    kind: LineKind,
}

impl Line {
    fn chars(&self) -> usize {
        self.text.chars().count()
    }

    fn is_prose(&self) -> bool {
        self.kind == LineKind::Prose
    }
}

/// Run the full cleanup pipeline and join the surviving lines.
pub fn cleanup_lines(text: &str, profile: ExtractProfile) -> String {
    let mut lines = classify(text);

    loop {
        let next = run_passes(lines.clone(), profile);
        if next == lines {
            break;
        }
        lines = next;
    }

    lines
        .into_iter()
        .map(|line| line.text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn run_passes(lines: Vec<Line>, profile: ExtractProfile) -> Vec<Line> {
    let lines = collapse_blank_runs(lines, profile);
    let lines = drop_navigation_lines(lines);
    let lines = drop_short_leading_lines(lines);
    trim_short_edges(lines)
}

/// Whether a line opens or closes a fenced code block.
fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Split `text` into lines tagged by their position relative to code fences.
/// An unterminated fence runs to the end of the text.
fn classify(text: &str) -> Vec<Line> {
    let mut in_fence = false;
    text.split('\n')
        .map(|raw| {
            let kind = if is_fence(raw) {
                in_fence = !in_fence;
                LineKind::Fence
            } else if in_fence {
                LineKind::Code
            } else {
                LineKind::Prose
            };
            Line {
                text: raw.to_string(),
                kind,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Pass 1: Strip lines and collapse blank runs
// ---------------------------------------------------------------------------

/// Trim every line and cap runs of blank lines.
///
/// Standard keeps runs of one or two blank lines and caps longer runs at one;
/// strict caps every run at one. Blank lines are only written ahead of the
/// next non-blank line, so trailing blanks disappear. Code lines keep their
/// indentation, and blanks re-emitted inside a block stay code.
fn collapse_blank_runs(lines: Vec<Line>, profile: ExtractProfile) -> Vec<Line> {
    let max_run = if profile.is_strict() { 1 } else { 2 };

    let mut out = Vec::with_capacity(lines.len());
    let mut blanks = 0usize;
    let mut blank_kind = LineKind::Prose;

    for line in lines {
        let kept = match line.kind {
            LineKind::Code => line.text.trim_end(),
            LineKind::Prose | LineKind::Fence => line.text.trim(),
        };

        if kept.is_empty() {
            if blanks == 0 {
                blank_kind = line.kind;
            }
            blanks += 1;
            continue;
        }

        let run = if blanks > max_run { 1 } else { blanks };
        out.extend(std::iter::repeat_n(
            Line {
                text: String::new(),
                kind: blank_kind,
            },
            run,
        ));
        out.push(Line {
            text: kept.to_string(),
            kind: line.kind,
        });
        blanks = 0;
    }

    out
}

// ---------------------------------------------------------------------------
// Pass 2: Drop navigation labels
// ---------------------------------------------------------------------------

/// Remove prose lines consisting solely of a navigation word.
fn drop_navigation_lines(lines: Vec<Line>) -> Vec<Line> {
    static NAV_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^(home|menu|navigation|previous|next|back|forward)\s*$")
            .expect("valid regex")
    });

    lines
        .into_iter()
        .filter(|line| !line.is_prose() || !NAV_LINE_RE.is_match(&line.text))
        .collect()
}

// ---------------------------------------------------------------------------
// Pass 3: Drop stray header fragments
// ---------------------------------------------------------------------------

/// Skip short lines while fewer than [`LEADING_WINDOW`] lines have been kept.
///
/// Fence delimiters and code lines are never treated as stray fragments,
/// but they do count toward the window.
fn drop_short_leading_lines(lines: Vec<Line>) -> Vec<Line> {
    let mut kept = Vec::with_capacity(lines.len());
    for line in lines {
        if line.is_prose() && kept.len() < LEADING_WINDOW && line.chars() < MIN_LEADING_LINE_CHARS
        {
            continue;
        }
        kept.push(line);
    }
    kept
}

// ---------------------------------------------------------------------------
// Pass 4: Trim boilerplate edges
// ---------------------------------------------------------------------------

/// Drop units from both ends until each end reaches [`MIN_EDGE_LINE_CHARS`].
///
/// A prose line is its own unit. A fenced block, delimiters included, is one
/// unit that counts as long when any of its lines is, and is kept or dropped
/// whole.
fn trim_short_edges(lines: Vec<Line>) -> Vec<Line> {
    let units = edge_units(&lines);
    let is_long = |&(from, to): &(usize, usize)| {
        lines[from..=to]
            .iter()
            .any(|line| line.chars() >= MIN_EDGE_LINE_CHARS)
    };

    let Some(first) = units.iter().find(|u| is_long(*u)) else {
        return Vec::new();
    };
    let last = units.iter().rfind(|u| is_long(*u)).unwrap_or(first);
    let (start, end) = (first.0, last.1);

    lines.into_iter().skip(start).take(end - start + 1).collect()
}

/// Inclusive `(from, to)` index ranges of the edge-trimming units.
fn edge_units(lines: &[Line]) -> Vec<(usize, usize)> {
    let mut units = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let mut end = i;
        if lines[i].kind == LineKind::Fence {
            while end + 1 < lines.len() && lines[end + 1].kind == LineKind::Code {
                end += 1;
            }
            if end + 1 < lines.len() && lines[end + 1].kind == LineKind::Fence {
                end += 1;
            }
        }
        units.push((i, end));
        i = end + 1;
    }
    units
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
