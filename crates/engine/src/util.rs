//! Internal helpers for validation and text matching.
//!
//! These utilities are **not** part of the public API. They centralize
//! normalization logic so search and validation behave consistently.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Fold a string for search: NFKD-decompose, strip combining marks, lowercase.
pub(crate) fn search_fold(value: &str) -> String {
    value
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Trim optional text, mapping blank strings to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_fold_strips_accents_and_case() {
        assert_eq!(search_fold("Équipe Pédagogique"), "equipe pedagogique");
        assert_eq!(search_fold("ALAOUI"), "alaoui");
    }

    #[test]
    fn normalize_optional_text_drops_blanks() {
        assert_eq!(normalize_optional_text(Some("  ")), None);
        assert_eq!(normalize_optional_text(Some(" x ")), Some("x".to_string()));
        assert_eq!(normalize_optional_text(None), None);
    }
}
