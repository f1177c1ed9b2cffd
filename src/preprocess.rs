//! Normalization of raw organism names into Entrez search terms.

use std::sync::LazyLock;

use regex::Regex;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]").unwrap());
static SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(_sp|_adult|_larva)$").unwrap());

pub trait NamePreprocessor: Send + Sync {
    fn preprocess(&self, raw: &str) -> String;
}

impl<F> NamePreprocessor for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn preprocess(&self, raw: &str) -> String {
        self(raw)
    }
}

/// Best-effort normalizer for underscore-separated names such as
/// `Ephemerella_aroni_aurivillii`.
///
/// Digits are dropped, one trailing `_sp`, `_adult` or `_larva` is removed, and
/// names with more than one part keep only the first and last part joined by
/// `+`. Datasets with other naming habits need their own preprocessor.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPreprocessor;

impl NamePreprocessor for DefaultPreprocessor {
    fn preprocess(&self, raw: &str) -> String {
        let without_digits = DIGITS.replace_all(raw, "");
        let trimmed = SUFFIX.replace(&without_digits, "");
        let parts = trimmed.split('_').collect::<Vec<_>>();
        match parts.as_slice() {
            [first, .., last] => format!("{first}+{last}"),
            [single] => single.to_string(),
            [] => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_digits_and_joins_parts() {
        assert_eq!(
            DefaultPreprocessor.preprocess("Asellus2_aquaticus"),
            "Asellus+aquaticus"
        );
        assert_eq!(
            DefaultPreprocessor.preprocess("Ephemerella_aroni_aurivillii"),
            "Ephemerella+aurivillii"
        );
    }

    #[test]
    fn single_segment_is_unchanged() {
        assert_eq!(DefaultPreprocessor.preprocess("Chelifera"), "Chelifera");
    }

    #[test]
    fn drops_trailing_suffixes_only() {
        assert_eq!(DefaultPreprocessor.preprocess("Foo_sp"), "Foo");
        assert_eq!(DefaultPreprocessor.preprocess("Baetis_rhodani_larva"), "Baetis+rhodani");
        assert_eq!(DefaultPreprocessor.preprocess("Baetis_adult2"), "Baetis");
        assert_eq!(DefaultPreprocessor.preprocess("Foo_spx"), "Foo+spx");
    }

    #[test]
    fn closures_are_preprocessors() {
        let upper = |raw: &str| raw.to_uppercase();
        assert_eq!(upper.preprocess("abc"), "ABC");
    }
}
