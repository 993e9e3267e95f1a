//! Derives a safe file base name from the document's first level-1 heading.

use crate::emoji;

/// Base name used when the document has no level-1 heading.
pub const DEFAULT_BASENAME: &str = "markdown-export";

/// Derive a filename base from raw markup. Pure and deterministic.
///
/// Takes the first ATX level-1 heading, strips emoji and anything that is not
/// alphanumeric (hyphens and underscores survive), collapses whitespace runs
/// to single hyphens, trims leading/trailing hyphens, and lowercases.
pub fn derive(source: &str) -> String {
    let heading = source
        .lines()
        .map(str::trim_start)
        .find_map(|line| line.strip_prefix("# "))
        .map(str::trim)
        .unwrap_or("");

    let cleaned: String = heading
        .chars()
        .filter(|c| !emoji::is_emoji(*c) && !is_emoji_joiner(*c))
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                ' '
            }
        })
        .collect();

    let slug = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .trim_matches('-')
        .to_lowercase();

    if slug.is_empty() {
        DEFAULT_BASENAME.to_string()
    } else {
        slug
    }
}

// Variation selectors and the zero-width joiner travel with emoji glyphs.
fn is_emoji_joiner(c: char) -> bool {
    matches!(c, '\u{FE0F}' | '\u{FE0E}' | '\u{200D}')
}
