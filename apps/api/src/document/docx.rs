//! DOCX text extraction.
//!
//! The library path opens the container properly (`zip` + `quick-xml`) and
//! walks `word/document.xml`. The heuristic path mirrors the PDF extractor's
//! philosophy: DOCX is a ZIP whose XML parts often survive a permissive
//! UTF-8 decode as readable fragments, so substring/regex search over the
//! raw buffer recovers text from archives the proper path cannot open.

use std::io::{Cursor, Read};

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use tracing::debug;

static DOCUMENT_PART_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:document[^>]*>(.*?)</w:document>").unwrap());
static RUN_TEXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<w:t[^>]*>(.*?)</w:t>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9@._+-]{3,}").unwrap());

/// Proper extraction: unzip, read `word/document.xml`, collect `<w:t>` run
/// text with paragraph breaks. Returns an empty string on any failure.
pub fn extract_docx_xml(bytes: &[u8]) -> String {
    let Ok(mut archive) = zip::ZipArchive::new(Cursor::new(bytes)) else {
        debug!("docx library extraction: not a readable zip archive");
        return String::new();
    };

    let mut xml = String::new();
    match archive.by_name("word/document.xml") {
        Ok(mut part) => {
            if part.read_to_string(&mut xml).is_err() {
                return String::new();
            }
        }
        Err(_) => return String::new(),
    }

    let mut reader = Reader::from_str(&xml);

    let mut out = String::new();
    let mut buf = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                if let Ok(text) = e.unescape() {
                    if !out.is_empty() && !out.ends_with(['\n', ' ']) {
                        out.push(' ');
                    }
                    out.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!("docx xml walk aborted: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }
    out.trim().to_string()
}

/// Heuristic extraction over the raw buffer, no ZIP directory walk.
/// Never fails; returns an empty string when nothing readable is found.
pub fn extract_docx_text(bytes: &[u8]) -> String {
    let raw = String::from_utf8_lossy(bytes);

    // Preferred: the main document part embedded as a readable fragment.
    if let Some(cap) = DOCUMENT_PART_RE.captures(&raw) {
        return clean_xml_blob(&cap[1]);
    }

    // Next: individual <w:t> run-text elements.
    let runs: Vec<String> = RUN_TEXT_RE
        .captures_iter(&raw)
        .map(|cap| unescape_entities(&cap[1]))
        .filter(|t| !t.trim().is_empty())
        .collect();
    if !runs.is_empty() {
        return WHITESPACE_RE.replace_all(runs.join(" ").trim(), " ").to_string();
    }

    // Last resort: strip non-printables and keep word-like tokens, skipping
    // archive bookkeeping names.
    let printable: String = raw
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { ' ' })
        .collect();
    let tokens: Vec<&str> = TOKEN_RE
        .find_iter(&printable)
        .map(|m| m.as_str())
        .filter(|t| {
            let lower = t.to_lowercase();
            !lower.contains("xml") && !lower.contains("rels")
        })
        .collect();
    tokens.join(" ")
}

/// Strips tags, unescapes the five standard XML entities, collapses whitespace.
fn clean_xml_blob(xml: &str) -> String {
    let stripped = TAG_RE.replace_all(xml, " ");
    let unescaped = unescape_entities(&stripped);
    WHITESPACE_RE.replace_all(unescaped.trim(), " ").to_string()
}

fn unescape_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_extracts_document_part() {
        let doc = b"PK\x03\x04junk<w:document xmlns:w=\"ns\"><w:body><w:p><w:r>\
            <w:t>Jane Smith</w:t></w:r><w:r><w:t>Engineer &amp; Lead</w:t></w:r>\
            </w:p></w:body></w:document>trailing";
        let text = extract_docx_text(doc);
        assert!(text.contains("Jane Smith"));
        assert!(text.contains("Engineer & Lead"));
        assert!(!text.contains("w:body"));
    }

    #[test]
    fn test_heuristic_falls_back_to_run_text() {
        let doc = b"noise <w:t>Python</w:t> noise <w:t xml:space=\"preserve\">SQL</w:t>";
        let text = extract_docx_text(doc);
        assert_eq!(text, "Python SQL");
    }

    #[test]
    fn test_heuristic_token_fallback_skips_archive_names() {
        let doc = b"PK\x03\x04\x00\x00_rels/.rels\x01\x02john.doe@example.com Developer\x05";
        let text = extract_docx_text(doc);
        assert!(text.contains("john.doe@example.com"));
        assert!(text.contains("Developer"));
        assert!(!text.contains("rels"));
    }

    #[test]
    fn test_heuristic_total_on_garbage() {
        assert_eq!(extract_docx_text(&[]), "");
        let garbage = vec![0u8, 1, 2, 3, 255, 254];
        assert_eq!(extract_docx_text(&garbage), "");
    }

    #[test]
    fn test_library_path_rejects_non_zip() {
        assert_eq!(extract_docx_xml(b"not a zip at all"), "");
    }

    #[test]
    fn test_entity_unescape() {
        assert_eq!(
            unescape_entities("&lt;R&amp;D&gt; &quot;lead&apos;s&quot;"),
            "<R&D> \"lead's\""
        );
    }
}
