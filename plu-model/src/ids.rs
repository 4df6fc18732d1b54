//! Slugging and id synthesis
//!
//!     Every identifier in a règlement is hierarchical and derived: the
//!     règlement id from the urba id, titre ids from their parent id plus a
//!     slug of the display title and a sibling ordinal, contenu ids from
//!     their position in the owning list. Nothing here mutates a tree; the
//!     renumbering and cascade-rename walks live in plu-engine and call into
//!     these functions.
//!
//! Slug rules
//!
//!     Diacritics are stripped via NFKD decomposition, anything outside
//!     ASCII alphanumerics becomes an underscore, runs collapse, and the
//!     result is lowercased and truncated to 20 characters before the
//!     ordinal suffix is appended.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Maximum slug length, not counting the ordinal suffix.
const SLUG_MAX_LEN: usize = 20;

static INSEE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5}$").expect("valid insee regex"));
static SIREN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{9}$").expect("valid siren regex"));

/// `idReglement` derived from `idUrba`.
pub fn reglement_id(id_urba: &str) -> String {
    format!("{}/reglement", id_urba)
}

/// Slug of a titre's display text: accent-stripped, lowercased,
/// non-alphanumerics folded to underscores, truncated to 20 characters.
pub fn titre_slug(intitule: &str) -> String {
    let mut slug = String::new();
    let mut last_was_separator = true;
    for c in intitule.nfkd() {
        if is_combining_mark(c) {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_separator = false;
        } else if !last_was_separator {
            slug.push('_');
            last_was_separator = true;
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.len() > SLUG_MAX_LEN {
        slug.truncate(SLUG_MAX_LEN);
        while slug.ends_with('_') {
            slug.pop();
        }
    }
    if slug.is_empty() {
        slug.push_str("titre");
    }
    slug
}

/// Id of a titre appended under `parent_id` with a 1-based sibling ordinal.
pub fn titre_id(parent_id: &str, intitule: &str, ordinal: usize) -> String {
    format!("{}/{}_{}", parent_id, titre_slug(intitule), ordinal)
}

/// Id of a contenu at a 1-based `position` in its owning list.
pub fn contenu_id(base_id: &str, position: usize) -> String {
    format!("{}/contenu{:02}", base_id, position)
}

/// 5-digit INSEE commune code.
pub fn is_valid_insee(code: &str) -> bool {
    INSEE_RE.is_match(code)
}

/// 9-digit SIREN identifier.
pub fn is_valid_siren(code: &str) -> bool {
    SIREN_RE.is_match(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reglement_id_appends_suffix() {
        assert_eq!(
            reglement_id("14027_PLU_20240101"),
            "14027_PLU_20240101/reglement"
        );
    }

    #[test]
    fn slug_strips_diacritics_and_folds_separators() {
        assert_eq!(titre_slug("Dispositions générales"), "dispositions_general");
        assert_eq!(titre_slug("Zone à urbaniser (AU)"), "zone_a_urbaniser_au");
    }

    #[test]
    fn slug_handles_roman_numeral_codepoints() {
        // NFKD folds compatibility characters such as Ⅰ (U+2160) to ASCII.
        assert_eq!(titre_slug("Zone Urbaine Ⅰ"), "zone_urbaine_i");
    }

    #[test]
    fn slug_truncates_before_ordinal() {
        let id = titre_id(
            "14027_PLU_20240101/reglement",
            "Zone Urbaine Ⅰ",
            1,
        );
        assert_eq!(id, "14027_PLU_20240101/reglement/zone_urbaine_i_1");

        let long = titre_id("base", "Dispositions applicables aux zones urbaines", 3);
        let slug = long.strip_prefix("base/").unwrap();
        let slug = slug.strip_suffix("_3").unwrap();
        assert!(slug.len() <= 20, "slug '{}' too long", slug);
    }

    #[test]
    fn slug_of_punctuation_only_title_falls_back() {
        assert_eq!(titre_slug("***"), "titre");
    }

    #[test]
    fn contenu_ids_are_zero_padded() {
        assert_eq!(contenu_id("base", 1), "base/contenu01");
        assert_eq!(contenu_id("base", 12), "base/contenu12");
    }

    #[test]
    fn insee_and_siren_shapes() {
        assert!(is_valid_insee("14027"));
        assert!(!is_valid_insee("1402"));
        assert!(!is_valid_insee("14O27"));
        assert!(is_valid_siren("200012345"));
        assert!(!is_valid_siren("20001234"));
    }
}
