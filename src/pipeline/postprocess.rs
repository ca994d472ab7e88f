//! Deterministic cleanup of the Markdown export.
//!
//! OCR text carries artefacts the exporter should not pass through:
//! CRLF line endings when the engine ran on Windows, zero-width characters
//! picked up from PDF text layers, trailing ASCII and ideographic spaces,
//! and runs of empty blocks that turn into long gaps.
//!
//! [`clean_markdown`] runs [`RULES`] in order. Each rule is a pure
//! `&str → String` pass, so the same result always renders to the same
//! bytes. Invisible characters go before the blank-line squeeze (a line
//! holding only U+200B is blank once stripped), and the final newline is
//! fixed last.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

type Rule = fn(&str) -> String;

/// Cleanup passes, in application order.
pub const RULES: &[(&str, Rule)] = &[
    ("unify-newlines", unify_newlines),
    ("strip-format-chars", strip_format_chars),
    ("rstrip-lines", rstrip_lines),
    ("squeeze-blank-runs", squeeze_blank_runs),
    ("space-before-headings", space_before_headings),
    ("single-trailing-newline", single_trailing_newline),
];

/// Run every rule in [`RULES`] over `input`.
pub fn clean_markdown(input: &str) -> String {
    RULES.iter().fold(input.to_string(), |text, (name, rule)| {
        let next = rule(&text);
        if next != text {
            trace!("markdown cleanup: {} changed {} → {} bytes", name, text.len(), next.len());
        }
        next
    })
}

fn unify_newlines(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

/// Zero-width and other format characters with no visible glyph.
const FORMAT_CHARS: [char; 7] = [
    '\u{200B}', // zero width space
    '\u{200C}', // zero width non-joiner
    '\u{200D}', // zero width joiner
    '\u{2060}', // word joiner
    '\u{FEFF}', // byte order mark
    '\u{00AD}', // soft hyphen
    '\u{180E}', // mongolian vowel separator
];

fn strip_format_chars(input: &str) -> String {
    input.chars().filter(|c| !FORMAT_CHARS.contains(c)).collect()
}

/// `str::trim_end` also covers U+3000, which Japanese scans end lines with.
fn rstrip_lines(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, line) in input.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.trim_end());
    }
    out
}

static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn squeeze_blank_runs(input: &str) -> String {
    BLANK_RUN.replace_all(input, "\n\n").into_owned()
}

/// ATX heading: one to six `#` followed by a space.
fn is_heading(line: &str) -> bool {
    let level = line.bytes().take_while(|&b| b == b'#').count();
    (1..=6).contains(&level) && line.as_bytes().get(level) == Some(&b' ')
}

fn space_before_headings(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 16);
    for line in input.lines() {
        if is_heading(line) && !out.is_empty() {
            let kept = out.trim_end_matches('\n').len();
            out.truncate(kept);
            out.push_str("\n\n");
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn single_trailing_newline(input: &str) -> String {
    let mut out = input.trim_end().to_string();
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carriage_returns_become_line_feeds() {
        assert_eq!(unify_newlines("請求書\r\n番号\r12"), "請求書\n番号\n12");
    }

    #[test]
    fn format_chars_are_removed() {
        assert_eq!(
            strip_format_chars("\u{FEFF}合計\u{200B}金額\u{00AD}円"),
            "合計金額円"
        );
    }

    #[test]
    fn trailing_ideographic_space_is_trimmed() {
        assert_eq!(rstrip_lines("見積書\u{3000}\u{3000}\n  indented \t"), "見積書\n  indented");
    }

    #[test]
    fn long_gaps_shrink_to_one_blank_line() {
        assert_eq!(squeeze_blank_runs("上\n\n\n\n\n下"), "上\n\n下");
        assert_eq!(squeeze_blank_runs("上\n\n下"), "上\n\n下");
    }

    #[test]
    fn heading_detection() {
        assert!(is_heading("# 概要"));
        assert!(is_heading("###### six"));
        assert!(!is_heading("####### seven"));
        assert!(!is_heading("#タグ"));
        assert!(!is_heading("#"));
    }

    #[test]
    fn headings_get_a_blank_line_above() {
        assert_eq!(
            space_before_headings("本文\n## 第1章\n続き"),
            "本文\n\n## 第1章\n続き\n"
        );
        assert_eq!(space_before_headings("# 先頭\n本文"), "# 先頭\n本文\n");
    }

    #[test]
    fn output_ends_with_one_newline() {
        assert_eq!(single_trailing_newline("終わり\n\n\n"), "終わり\n");
        assert_eq!(single_trailing_newline(""), "\n");
    }

    #[test]
    fn rules_compose() {
        let raw = "# 請求書\r\n\r\n株式会社サンプル\u{3000}\n\u{200B}\n\n\n\n## 明細\n";
        assert_eq!(clean_markdown(raw), "# 請求書\n\n株式会社サンプル\n\n## 明細\n");
    }

    #[test]
    fn cleanup_is_idempotent() {
        let once = clean_markdown("a  \n\n\n\n# b\nc\r\n");
        assert_eq!(clean_markdown(&once), once);
    }

    #[test]
    fn plain_line() {
        assert_eq!(clean_markdown("Hello World"), "Hello World\n");
    }
}
