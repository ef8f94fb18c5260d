//! Markdown normalisation: deterministic cleanup of assembled line text.
//!
//! Native PDF text and OCR output both carry noise that renders badly as
//! Markdown: Windows line endings, zero-width characters, runs of spaces
//! from justified text, typographic bullets that no renderer recognises as
//! list markers. Each rule below is a pure `&str → String` pass; they run in
//! a fixed order because later rules assume earlier ones already ran (for
//! example the bullet rule relies on lines being trimmed).
//!
//! Rules (applied in order):
//! 1. Normalise line endings (CRLF/CR → LF)
//! 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, …)
//! 3. Collapse horizontal whitespace inside each line and trim it
//! 4. Rewrite typographic bullets (`•`, `▪`, `◦`, `*`, `+`) as `- `
//! 5. Drop closing `#` sequences from ATX headings
//! 6. Collapse 3+ consecutive newlines down to one blank line
//! 7. Ensure heading lines have a blank line before them
//! 8. End with exactly one newline (empty input stays empty)

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all normalisation rules to assembled markdown.
pub fn normalize_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = collapse_inline_whitespace(&s);
    let s = normalise_bullets(&s);
    let s = strip_closing_hashes(&s);
    let s = collapse_blank_lines(&s);
    let s = normalise_heading_spacing(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Collapse whitespace inside lines ─────────────────────────────────

static RE_INLINE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\x{00A0}\x{2009}\x{3000}]+").unwrap());

fn collapse_inline_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| RE_INLINE_WS.replace_all(line, " ").trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Normalise bullet markers ─────────────────────────────────────────

static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[•▪◦‣∙*+] ").unwrap());

fn normalise_bullets(input: &str) -> String {
    RE_BULLET.replace_all(input, "- ").to_string()
}

// ── Rule 5: Strip closing hashes from ATX headings ───────────────────────────

static RE_CLOSING_HASHES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(#{1,6} .*?[^#\s]) +#+$").unwrap());

fn strip_closing_hashes(input: &str) -> String {
    RE_CLOSING_HASHES.replace_all(input, "$1").to_string()
}

// ── Rule 6: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule 7: Normalise heading spacing ────────────────────────────────────────

fn is_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    (1..=6).contains(&hashes) && line[hashes..].starts_with(' ')
}

fn normalise_heading_spacing(input: &str) -> String {
    let mut result = String::with_capacity(input.len() + 64);
    for (i, line) in input.lines().enumerate() {
        if is_heading(line) && i > 0 {
            let trimmed = result.trim_end_matches('\n');
            result.truncate(trimmed.len());
            result.push_str("\n\n");
        }
        result.push_str(line);
        result.push('\n');
    }
    result
}

// ── Rule 8: Ensure file ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
