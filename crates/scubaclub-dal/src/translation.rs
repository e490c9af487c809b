//! Per-language attribute rows and URL slugs shared by clubs and locations.
//!
//! An entity owns zero or more translation rows, at most one per language. Lookups take the
//! language explicitly and fall back to [`LanguageCode::DEFAULT`] field by field, so a Dutch name
//! is shown when the English row is missing or its field is blank.
//!
//! Slugs are unique per language, enforced by a unique index on `(language_id, slug)`.
//! [`SlugCandidates`] yields `base`, `base-1`, `base-2`, ... and the writer tries them in order
//! until the insert is not rejected by that index.

use scubaclub_types::{language::LanguageCode, utils::slug};
use serde::{Deserialize, Serialize};

/// Upper bound of slug candidates tried for one save
pub const MAX_SLUG_ATTEMPTS: u32 = 1000;

pub trait Translation {
    fn language(&self) -> LanguageCode;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Translations<T>(Vec<T>);

impl<T> Default for Translations<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: Translation> Translations<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self(rows)
    }

    pub fn get(&self, lang: LanguageCode) -> Option<&T> {
        self.0.iter().find(|t| t.language() == lang)
    }

    pub fn languages(&self) -> impl Iterator<Item = LanguageCode> + '_ {
        self.0.iter().map(|t| t.language())
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Non-blank value of `field` in `lang`, or in the default language
    pub fn field<'a, F>(&'a self, lang: LanguageCode, field: F) -> Option<&'a str>
    where
        F: Fn(&'a T) -> &'a str,
    {
        let lookup = |code| {
            self.get(code)
                .map(&field)
                .filter(|value| !value.trim().is_empty())
        };
        lookup(lang).or_else(|| lookup(LanguageCode::DEFAULT))
    }

    /// Like [`Translations::field`] with a placeholder when no language has the value
    pub fn field_or<'a, F, P>(&'a self, lang: LanguageCode, field: F, placeholder: P) -> String
    where
        F: Fn(&'a T) -> &'a str,
        P: FnOnce() -> String,
    {
        self.field(lang, field)
            .map(str::to_string)
            .unwrap_or_else(placeholder)
    }
}

impl<T> IntoIterator for Translations<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Outcome of saving several languages of one entity, each language on its own
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TranslationReport {
    pub saved: Vec<SavedTranslation>,
    pub failed: Vec<FailedTranslation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTranslation {
    pub language: LanguageCode,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedTranslation {
    pub language: LanguageCode,
    pub error: String,
}

impl TranslationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn slug(&self, lang: LanguageCode) -> Option<&str> {
        self.saved
            .iter()
            .find(|s| s.language == lang)
            .map(|s| s.slug.as_str())
    }
}

/// Base slug for `name`, falling back to `{prefix}-{id}` when the name has no usable characters
pub fn base_slug(name: &str, prefix: &str, id: i64) -> String {
    let slug = slug::slugify(name);
    if slug.is_empty() {
        slug::fallback_slug(prefix, id)
    } else {
        slug
    }
}

pub struct SlugCandidates<'a> {
    base: &'a str,
    attempt: u32,
}

impl<'a> SlugCandidates<'a> {
    pub fn new(base: &'a str) -> Self {
        Self { base, attempt: 0 }
    }
}

impl Iterator for SlugCandidates<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.attempt >= MAX_SLUG_ATTEMPTS {
            return None;
        }
        let candidate = slug::numbered_slug(self.base, self.attempt);
        self.attempt += 1;
        Some(candidate)
    }
}

/// True when `err` is violation of a unique index that includes the slug column
pub fn is_slug_conflict(err: &sqlx::Error) -> bool {
    match err {
        // SQLite reports "UNIQUE constraint failed: <table>.language_id, <table>.slug"
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.message().contains(".slug")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Row {
        lang: LanguageCode,
        name: &'static str,
        description: &'static str,
    }

    impl Translation for Row {
        fn language(&self) -> LanguageCode {
            self.lang
        }
    }

    fn rows() -> Translations<Row> {
        Translations::new(vec![
            Row {
                lang: LanguageCode::Nl,
                name: "Duikclub Noord",
                description: "Gezellige club",
            },
            Row {
                lang: LanguageCode::En,
                name: "Dive Club North",
                description: "  ",
            },
        ])
    }

    #[test]
    fn test_field_in_requested_language() {
        let t = rows();
        assert_eq!(t.field(LanguageCode::En, |r| r.name), Some("Dive Club North"));
        assert_eq!(t.field(LanguageCode::Nl, |r| r.name), Some("Duikclub Noord"));
    }

    #[test]
    fn test_blank_field_falls_back_to_default() {
        let t = rows();
        assert_eq!(
            t.field(LanguageCode::En, |r| r.description),
            Some("Gezellige club")
        );
    }

    #[test]
    fn test_missing_language_falls_back() {
        let t = Translations::new(vec![Row {
            lang: LanguageCode::Nl,
            name: "Vinkeveen",
            description: "",
        }]);
        assert_eq!(t.field(LanguageCode::En, |r| r.name), Some("Vinkeveen"));
        assert_eq!(t.field(LanguageCode::En, |r| r.description), None);
    }

    #[test]
    fn test_placeholder() {
        let english_only = Translations::new(vec![Row {
            lang: LanguageCode::En,
            name: "Blue Hole",
            description: "",
        }]);
        assert_eq!(
            english_only.field_or(LanguageCode::Nl, |r| r.name, || "Location 3".into()),
            "Location 3"
        );

        let empty: Translations<Row> = Translations::default();
        assert_eq!(
            empty.field_or(LanguageCode::En, |r| r.name, || "Unnamed Club".into()),
            "Unnamed Club"
        );
    }

    #[test]
    fn test_slug_candidates() {
        let candidates: Vec<_> = SlugCandidates::new("duikclub-noord").take(3).collect();
        assert_eq!(
            candidates,
            vec!["duikclub-noord", "duikclub-noord-1", "duikclub-noord-2"]
        );
        assert_eq!(
            SlugCandidates::new("x").count(),
            MAX_SLUG_ATTEMPTS as usize
        );
    }

    #[test]
    fn test_base_slug() {
        assert_eq!(base_slug("Duikclub Noord", "club", 1), "duikclub-noord");
        assert_eq!(base_slug("???", "club", 42), "club-42");
    }
}
