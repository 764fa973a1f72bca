//! Heuristic PDF text extraction.
//!
//! PDF has no single "extract all text" operation without a full
//! content-stream interpreter (font encodings, operators, graphics state).
//! This module pattern-matches the raw content stream instead: it runs a
//! cumulative series of regex passes over the byte stream, from the most
//! structured text-show operator forms down to loose printable runs, and
//! joins every unique surviving segment in discovery order. Used as the
//! fallback behind the `pdf-extract`-backed library extractor.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Segments longer than this are extraction noise (font blobs, encoded data).
const MAX_SEGMENT_LEN: usize = 300;
/// Below this many unique segments the permissive fallback pass runs.
const FALLBACK_THRESHOLD: usize = 10;

// Parenthesized literal strings, honoring backslash-escaped parens.
static PAREN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(((?:[^()\\]|\\.)*)\)").unwrap());
// BT ... ET text-object blocks.
static TEXT_OBJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)BT(.*?)ET").unwrap());
// Literal string immediately followed by the Tj show-text operator.
static TJ_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(((?:[^()\\]|\\.)*)\)\s*Tj").unwrap());
// [...] TJ array-show operator (strings interleaved with kerning numbers).
static TJ_ARRAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[(.*?)\]\s*TJ").unwrap());
// Literal string followed by Tj or Td (position+show producer variants).
static TJ_TD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(((?:[^()\\]|\\.)*)\)\s*T[jd]").unwrap());
// stream ... endstream content blocks.
static STREAM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)stream\r?\n(.*?)endstream").unwrap());
// Loose run of readable characters, starting with a letter.
static PRINTABLE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9 .,;:'@/()+&-]{3,}").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Extracts human-readable text from a PDF byte stream. Never fails;
/// returns an empty string when nothing survives the passes.
pub fn extract_pdf_text(bytes: &[u8]) -> String {
    // One byte per char. Literal strings inside content streams are escaped
    // byte sequences, not valid UTF-8 at the whole-file level, so a lossy
    // UTF-8 decode would corrupt exactly the spans we want to match.
    let raw: String = bytes.iter().map(|&b| b as char).collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut segments: Vec<String> = Vec::new();

    // Pass 1: every parenthesized literal string anywhere in the file.
    for cap in PAREN_RE.captures_iter(&raw) {
        push_segment(&cap[1], &mut seen, &mut segments);
    }

    // Pass 2: literal strings scoped to BT...ET text objects.
    for obj in TEXT_OBJECT_RE.captures_iter(&raw) {
        for cap in PAREN_RE.captures_iter(&obj[1]) {
            push_segment(&cap[1], &mut seen, &mut segments);
        }
    }

    // Pass 3: strings bound to the Tj operator.
    for cap in TJ_RE.captures_iter(&raw) {
        push_segment(&cap[1], &mut seen, &mut segments);
    }

    // Pass 4: strings inside [...] TJ arrays.
    for arr in TJ_ARRAY_RE.captures_iter(&raw) {
        for cap in PAREN_RE.captures_iter(&arr[1]) {
            push_segment(&cap[1], &mut seen, &mut segments);
        }
    }

    // Pass 5: Tj/Td variants.
    for cap in TJ_TD_RE.captures_iter(&raw) {
        push_segment(&cap[1], &mut seen, &mut segments);
    }

    // Pass 6: readable runs inside stream...endstream blocks that the
    // structured passes missed.
    for block in STREAM_RE.captures_iter(&raw) {
        for run in PRINTABLE_RUN_RE.find_iter(&block[1]) {
            push_segment(run.as_str(), &mut seen, &mut segments);
        }
    }

    // Pass 7: maximally permissive fallback when the structured passes found
    // almost nothing, skipping PDF structural tokens.
    if segments.len() < FALLBACK_THRESHOLD {
        for run in PRINTABLE_RUN_RE.find_iter(&raw) {
            let text = run.as_str();
            if text.contains("obj") || text.contains("endobj") {
                continue;
            }
            push_segment(text, &mut seen, &mut segments);
        }
    }

    debug!(segments = segments.len(), "pdf heuristic extraction complete");
    segments.join(" ")
}

/// Cleans one candidate segment and appends it unless it is a duplicate
/// (case-insensitive) or fails the noise filters.
fn push_segment(candidate: &str, seen: &mut HashSet<String>, segments: &mut Vec<String>) {
    let Some(cleaned) = clean_segment(candidate) else {
        return;
    };
    if seen.insert(cleaned.to_lowercase()) {
        segments.push(cleaned);
    }
}

/// Unescapes PDF literal-string escapes, collapses whitespace, and rejects
/// segments that are empty, over-long, or contain NUL bytes.
fn clean_segment(raw: &str) -> Option<String> {
    if raw.len() > MAX_SEGMENT_LEN {
        return None;
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') | Some('f') => out.push(' '),
            Some(d @ '0'..='7') => {
                // Octal escape, up to three digits.
                let mut code = d as u32 - '0' as u32;
                for _ in 0..2 {
                    match chars.peek() {
                        Some(&n @ '0'..='7') => {
                            code = code * 8 + (n as u32 - '0' as u32);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                if let Some(decoded) = char::from_u32(code) {
                    out.push(decoded);
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    if out.contains('\0') {
        return None;
    }

    let collapsed = WHITESPACE_RE.replace_all(&out, " ").trim().to_string();
    if collapsed.is_empty() || collapsed.len() > MAX_SEGMENT_LEN {
        return None;
    }
    Some(collapsed)
}
