use std::convert::Infallible;

use axum::extract::FromRequestParts;
use http::{header::ACCEPT_LANGUAGE, request::Parts};
use scubaclub_types::language::LanguageCode;

const LANG_QUERY_PARAM: &str = "lang";

/// Language of the current request.
///
/// Taken from `lang` query parameter, then from `Accept-Language` header,
/// otherwise [`LanguageCode::DEFAULT`]. Unsupported values are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lang(pub LanguageCode);

fn resolve_language(query: Option<&str>, accept_language: Option<&str>) -> LanguageCode {
    let from_query = query.and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(key, _)| key == LANG_QUERY_PARAM)
            .and_then(|(_, value)| value.parse::<LanguageCode>().ok())
    });
    from_query
        .or_else(|| accept_language.and_then(LanguageCode::from_accept_language))
        .unwrap_or_default()
}

impl<S> FromRequestParts<S> for Lang
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let accept_language = parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());
        Ok(Lang(resolve_language(parts.uri.query(), accept_language)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_language() {
        assert_eq!(resolve_language(None, None), LanguageCode::Nl);
        assert_eq!(resolve_language(Some("lang=en"), None), LanguageCode::En);
        assert_eq!(
            resolve_language(Some("page=2&lang=en"), Some("nl")),
            LanguageCode::En
        );
        assert_eq!(
            resolve_language(None, Some("de-DE,en;q=0.8,nl;q=0.5")),
            LanguageCode::En
        );
        assert_eq!(
            resolve_language(Some("lang=fr"), Some("en-GB")),
            LanguageCode::En
        );
        assert_eq!(resolve_language(Some("lang=fr"), None), LanguageCode::Nl);
    }
}
