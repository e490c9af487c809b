use phf::phf_map;
use unicode_normalization::UnicodeNormalization;

/// Letters without unicode decomposition, transliterated by hand
static ND_CHARMAP: phf::Map<char, &'static str> = phf_map! {
    'Æ' => "AE",
    'æ' => "ae",
    'Ð' => "D",
    'ð' => "d",
    'Ø' => "O",
    'ø' => "o",
    'Þ' => "Th",
    'þ' => "th",
    'ß' => "s",
    'Đ' => "D",
    'đ' => "d",
    'Ħ' => "H",
    'ħ' => "h",
    'ı' => "i",
    'ĸ' => "k",
    'Ł' => "L",
    'ł' => "l",
    'Ŋ' => "N",
    'ŋ' => "n",
    'Œ' => "Oe",
    'œ' => "oe",
    'Ŧ' => "T",
    'ŧ' => "t",
};

fn fold_to_ascii(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.nfkd() {
        if let Some(mapped) = ND_CHARMAP.get(&c) {
            result.push_str(mapped);
        } else if c.is_ascii() {
            result.push(c);
        }
    }

    result
}

/// URL-safe slug of `text`.
///
/// Diacritics are stripped, the result is lowercased, everything except letters, digits,
/// underscores, hyphens and whitespace is dropped, and runs of hyphens and whitespace become a
/// single hyphen. Leading and trailing hyphens and underscores are trimmed. The result may be empty.
pub fn slugify(text: &str) -> String {
    let folded = fold_to_ascii(text).to_ascii_lowercase();
    let mut slug = String::with_capacity(folded.len());
    let mut pending_separator = false;

    for c in folded.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else if c == '-' || c.is_ascii_whitespace() {
            pending_separator = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Slug candidate number `attempt`: `base`, `base-1`, `base-2`, ...
pub fn numbered_slug(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

/// Slug for an entity whose name does not produce any slug characters
pub fn fallback_slug(prefix: &str, id: i64) -> String {
    format!("{prefix}-{id}")
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    #[test]
    fn test_fold() {
        assert_eq!(fold_to_ascii("Æ"), "AE");
        assert_eq!(fold_to_ascii("œ"), "oe");
        assert_eq!(fold_to_ascii("België"), "Belgie");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Duikclub Noord"), "duikclub-noord");
        assert_eq!(slugify("  Duikclub   Noord  "), "duikclub-noord");
        assert_eq!(slugify("Zeeland -- Oosterschelde!"), "zeeland-oosterschelde");
        assert_eq!(slugify("Plongée à l'Île"), "plongee-a-lile");
        assert_eq!(slugify("snake_case_Name"), "snake_case_name");
        assert_eq!(slugify("_-Grevelingen-_"), "grevelingen");
        assert_eq!(slugify("Straße 12"), "strase-12");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("水下"), "");
    }

    #[test]
    fn test_numbered() {
        assert_eq!(numbered_slug("duikclub-noord", 0), "duikclub-noord");
        assert_eq!(numbered_slug("duikclub-noord", 1), "duikclub-noord-1");
        assert_eq!(numbered_slug("duikclub-noord", 12), "duikclub-noord-12");
        assert_eq!(fallback_slug("club", 7), "club-7");
    }

    #[quickcheck]
    fn slug_is_url_safe(text: String) -> bool {
        let slug = slugify(&text);
        slug.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
            && !slug.contains("--")
            && !slug.starts_with(['-', '_'])
            && !slug.ends_with(['-', '_'])
    }

    #[quickcheck]
    fn slugify_is_idempotent(text: String) -> bool {
        let slug = slugify(&text);
        slugify(&slug) == slug
    }
}
