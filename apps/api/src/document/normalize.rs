//! Text normalization between extraction and the LLM.
//!
//! PDF/DOCX extraction destroys layout: words break across lines, emails and
//! phone numbers pick up stray spaces, and headers run into body text. The
//! LLM extracts noticeably better from paragraph-level structure than from a
//! flat token stream, so this pass repairs the common artifacts and
//! reconstructs paragraphs, headers, and bullets. Pure and deterministic.

use once_cell::sync::Lazy;
use regex::Regex;

// Word split across a line break with a trailing hyphen: "exper-\nience".
static HYPHEN_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])-\s*\n\s*([a-z])").unwrap());
// Word continuation onto the next line without a hyphen.
static SOFT_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z,])\n([a-z])").unwrap());
// Spurious whitespace around @ in an email address.
static EMAIL_SPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z0-9._%+-])[ \t]*@[ \t]*([A-Za-z0-9-])").unwrap());
// Spurious whitespace around a dot between word characters (domains, emails).
static DOT_SPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])[ \t]*\.[ \t]*([a-z]{2,4})\b").unwrap());
// Spurious whitespace around a dash between digits (phone numbers).
static DIGIT_DASH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)[ \t]*-[ \t]*(\d)").unwrap());
// Standalone page numbers and boilerplate lines.
static PAGE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^\s*(\d{1,3}|page\s+\d+|resume)\s*$").unwrap());
// Date-range separators: "2019 - 2023", "2019 to 2023", "2019 – Present".
static DATE_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{4})\s*(?:-|–|—|to)\s*(\d{4}|present|current)").unwrap());

const SECTION_KEYWORDS: &[&str] = &[
    "summary",
    "objective",
    "profile",
    "experience",
    "work experience",
    "employment",
    "education",
    "skills",
    "technical skills",
    "projects",
    "certifications",
    "achievements",
    "awards",
    "languages",
    "interests",
    "contact",
    "references",
];

const BULLET_CHARS: &[char] = &['•', '-', '*', '▪', '‣', '●', '◦'];
const HEADER_MAX_LEN: usize = 60;

/// Repairs extraction artifacts and reconstructs paragraph structure.
pub fn normalize(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n");

    // 1. Rejoin words split across line breaks.
    let text = HYPHEN_BREAK_RE.replace_all(&text, "$1$2");
    let text = SOFT_BREAK_RE.replace_all(&text, "$1 $2");

    // 2. Close spurious whitespace in emails, domains, phone numbers.
    let text = EMAIL_SPACE_RE.replace_all(&text, "$1@$2");
    let text = DOT_SPACE_RE.replace_all(&text, "$1.$2");
    let text = DIGIT_DASH_RE.replace_all(&text, "$1-$2");

    // 3. Drop page numbers and boilerplate lines.
    let text = PAGE_LINE_RE.replace_all(&text, "");

    // 4. Canonical date ranges help the LLM compute employment durations.
    let text = DATE_RANGE_RE.replace_all(&text, "$1-$2");

    // 5. Rebuild paragraphs vs. headers vs. bullets.
    reflow(&text)
}

/// Line-oriented reflow: headers and bullets stand alone, body lines
/// accumulate into paragraphs flushed at sentence-terminating punctuation.
fn reflow(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut out: Vec<String> = Vec::new();
    let mut paragraph = String::new();

    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            flush(&mut paragraph, &mut out);
            continue;
        }

        let next_is_long = lines
            .get(i + 1)
            .map(|next| next.len() > 80)
            .unwrap_or(false);

        if is_standalone(line, next_is_long) {
            flush(&mut paragraph, &mut out);
            out.push((*line).to_string());
            continue;
        }

        if !paragraph.is_empty() {
            paragraph.push(' ');
        }
        paragraph.push_str(line);

        if line.ends_with(['.', '!', '?']) {
            flush(&mut paragraph, &mut out);
        }
    }
    flush(&mut paragraph, &mut out);
    out.join("\n")
}

fn flush(paragraph: &mut String, out: &mut Vec<String>) {
    if !paragraph.trim().is_empty() {
        out.push(paragraph.trim().to_string());
    }
    paragraph.clear();
}

/// A line kept on its own: section header, bullet point, or a short lead-in
/// followed by a long body line.
fn is_standalone(line: &str, next_is_long: bool) -> bool {
    if line.len() >= HEADER_MAX_LEN {
        return false;
    }
    if line.starts_with(BULLET_CHARS) {
        return true;
    }
    if line.ends_with(':') {
        return true;
    }
    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    if !letters.is_empty() && letters.iter().all(|c| c.is_uppercase()) {
        return true;
    }
    let lower = line.to_lowercase();
    if SECTION_KEYWORDS.iter().any(|kw| lower == *kw) {
        return true;
    }
    next_is_long && line.len() < 40
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejoins_hyphen_broken_words() {
        let out = normalize("extensive exper-\nience in systems.");
        assert!(out.contains("experience"));
    }

    #[test]
    fn test_repairs_spaced_email() {
        let out = normalize("Contact: john.doe @ example . com today.");
        assert!(out.contains("john.doe@example.com"));
    }

    #[test]
    fn test_repairs_spaced_phone() {
        let out = normalize("Call 555 - 123 - 4567 anytime.");
        assert!(out.contains("555-123-4567"));
    }

    #[test]
    fn test_strips_page_number_lines() {
        let out = normalize("Worked on billing.\n2\nPage 3\nresume\nShipped the product.");
        assert!(!out.contains("Page 3"));
        assert!(!out.lines().any(|l| l.trim() == "2"));
        assert!(!out.to_lowercase().lines().any(|l| l == "resume"));
    }

    #[test]
    fn test_normalizes_date_ranges() {
        let out = normalize("Acme Corp 2019 to 2023.\nBeta Inc 2016 – 2019.");
        assert!(out.contains("2019-2023"));
        assert!(out.contains("2016-2019"));
    }

    #[test]
    fn test_all_caps_header_stands_alone() {
        let out = normalize("WORK EXPERIENCE\nBuilt the payments platform and scaled it to millions of users.");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "WORK EXPERIENCE");
        assert!(lines[1].starts_with("Built the payments"));
    }

    #[test]
    fn test_colon_header_stands_alone() {
        let out = normalize("Skills:\nPython, SQL, and Rust.");
        assert_eq!(out.lines().next().unwrap(), "Skills:");
    }

    #[test]
    fn test_bullets_stand_alone() {
        let out = normalize("• Led a team of five.\n• Shipped v2.");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('•'));
    }

    #[test]
    fn test_paragraph_flushes_on_sentence_end() {
        let out = normalize("First part of the sentence continues here\nand ends now.\nA new paragraph starts fresh and also ends.");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("ends now."));
    }

    #[test]
    fn test_deterministic() {
        let input = "SKILLS:\nPython and exper-\nience with data 2019 to 2021.";
        assert_eq!(normalize(input), normalize(input));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
    }
}
