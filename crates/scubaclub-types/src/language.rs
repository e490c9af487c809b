use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// Languages the site is translated to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    En,
    Nl,
}

impl LanguageCode {
    /// Fallback language for translated content
    pub const DEFAULT: LanguageCode = LanguageCode::Nl;

    pub const ALL: [LanguageCode; 2] = [LanguageCode::En, LanguageCode::Nl];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Nl => "nl",
        }
    }

    /// Picks the first supported language from an `Accept-Language` header value
    pub fn from_accept_language(header: &str) -> Option<Self> {
        let mut candidates = header
            .split(',')
            .filter_map(|part| {
                let mut pieces = part.trim().split(';');
                let tag = pieces.next()?.trim();
                let quality = pieces
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                let primary = tag.split('-').next()?;
                primary
                    .parse::<LanguageCode>()
                    .ok()
                    .map(|code| (code, quality))
            })
            .filter(|(_, q)| *q > 0.0)
            .collect::<Vec<_>>();
        // stable sort keeps header order for equal weights
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        candidates.first().map(|(code, _)| *code)
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for LanguageCode {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(LanguageCode::En),
            "nl" => Ok(LanguageCode::Nl),
            other => Err(UnsupportedLanguage(other.to_string())),
        }
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = UnsupportedLanguage;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
