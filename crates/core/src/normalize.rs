//! Text canonicalization for cross-source comparison.
//!
//! Open-data portals, OSM exports, and gallery scrapes disagree on casing,
//! punctuation, and diacritics for the same artwork. Every string comparison
//! in the engine goes through [`normalize_text`] first so those differences
//! never count as mismatches.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Punctuation stripped by default during normalization. Callers with
/// source-specific needs can pass their own set to [`normalize_text_with`].
pub const DEFAULT_STRIP_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '\'', '"', '`', '(', ')', '[', ']', '{', '}', '#', '&', '/',
    '\\', '|', '*', '_', '~', '-',
];

/// Separators between artist names in a compound credit string: an ampersand,
/// the standalone word "and", or a comma.
static ARTIST_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&|\band\b|,").expect("valid regex"));

/// Canonicalize a string for comparison using the default punctuation set.
///
/// Lowercases, strips diacritics (NFKD decomposition with combining marks
/// removed), replaces punctuation with spaces, collapses internal whitespace
/// to single spaces, and trims. Total over arbitrary Unicode input; empty or
/// whitespace-only input yields the empty string.
pub fn normalize_text(s: &str) -> String {
    normalize_text_with(s, DEFAULT_STRIP_PUNCTUATION)
}

/// [`normalize_text`] with a caller-supplied punctuation set.
pub fn normalize_text_with(s: &str, punctuation: &[char]) -> String {
    let decomposed: String = s
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let spaced: String = decomposed
        .chars()
        .map(|c| if punctuation.contains(&c) { ' ' } else { c })
        .collect();

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a compound artist credit into normalized name tokens.
///
/// Splits on `&`, the standalone word "and", and commas; each token is run
/// through [`normalize_text`] and empty tokens are dropped. A credit that is
/// already a list should instead be normalized entry by entry with
/// [`normalize_artist_entries`].
pub fn split_artists(raw: &str) -> Vec<String> {
    ARTIST_SEPARATOR_RE
        .split(raw)
        .map(normalize_text)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Normalize a pre-split artist list, dropping entries that normalize to
/// empty. Entries are passed through [`split_artists`] individually since
/// some sources put a full compound credit into a single list element.
pub fn normalize_artist_entries(entries: &[String]) -> Vec<String> {
    entries.iter().flat_map(|e| split_artists(e)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- normalize_text ------------------------------------------------------

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(normalize_text("  Digital Orca  "), "digital orca");
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(normalize_text("Café Révolution"), "cafe revolution");
        assert_eq!(normalize_text("Haïda Gwaii"), "haida gwaii");
    }

    #[test]
    fn removes_punctuation_and_collapses_whitespace() {
        assert_eq!(
            normalize_text("\"Untitled\" (mural), 2019 -- detail"),
            "untitled mural 2019 detail"
        );
    }

    #[test]
    fn empty_and_whitespace_input_yield_empty() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   \t\n"), "");
        assert_eq!(normalize_text("?!.,"), "");
    }

    #[test]
    fn custom_punctuation_set_is_respected() {
        // Keep hyphens, strip only periods.
        assert_eq!(normalize_text_with("re-bar.", &['.']), "re-bar");
    }

    #[test]
    fn is_total_over_arbitrary_unicode() {
        // Must not panic on emoji, CJK, or RTL text.
        assert_eq!(normalize_text("石 の 庭"), "石 の 庭");
        let _ = normalize_text("🎨 שלום مرحبا");
    }

    // -- split_artists -------------------------------------------------------

    #[test]
    fn splits_on_ampersand_and_comma() {
        assert_eq!(
            split_artists("Jacques Huet & Marianne Nicolson, Bill Reid"),
            vec!["jacques huet", "marianne nicolson", "bill reid"]
        );
    }

    #[test]
    fn splits_on_the_word_and() {
        assert_eq!(
            split_artists("Douglas Coupland and Ken Lum"),
            vec!["douglas coupland", "ken lum"]
        );
    }

    #[test]
    fn does_not_split_inside_words_containing_and() {
        assert_eq!(split_artists("Sandra Alexander"), vec!["sandra alexander"]);
    }

    #[test]
    fn drops_empty_tokens() {
        assert_eq!(split_artists("Ken Lum, , &"), vec!["ken lum"]);
        assert!(split_artists("").is_empty());
    }

    // -- normalize_artist_entries --------------------------------------------

    #[test]
    fn list_entries_are_normalized_individually() {
        let entries = vec!["  Ken LUM ".to_string(), "José Clemente".to_string()];
        assert_eq!(
            normalize_artist_entries(&entries),
            vec!["ken lum", "jose clemente"]
        );
    }

    #[test]
    fn compound_credit_inside_a_list_entry_is_split() {
        let entries = vec!["A. Binning & B. Smith".to_string()];
        assert_eq!(normalize_artist_entries(&entries), vec!["a binning", "b smith"]);
    }
}
