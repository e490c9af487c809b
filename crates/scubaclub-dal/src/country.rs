use futures::TryStreamExt as _;
use scubaclub_types::language::LanguageCode;
use serde::{Deserialize, Serialize};
use sqlx::Pool;

use crate::{
    Error,
    error::Result,
    translation::{Translation, Translations},
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CountryTranslation {
    #[sqlx(try_from = "String")]
    pub language: LanguageCode,
    pub name: String,
}

impl Translation for CountryTranslation {
    fn language(&self) -> LanguageCode {
        self.language
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub iso_code: String,
    pub translations: Translations<CountryTranslation>,
}

impl Country {
    pub fn name(&self, lang: LanguageCode) -> String {
        self.translations
            .field_or(lang, |t| t.name.as_str(), || self.iso_code.clone())
    }
}

/// Country name in one language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryShort {
    pub id: i64,
    pub iso_code: String,
    pub name: String,
}

pub type CountryRepository = CountryRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct CountryRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> CountryRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Gets or creates country, returns it with flag whether it was created.
    /// Existing translations are left untouched.
    pub async fn ensure(
        &self,
        iso_code: &str,
        names: &[(LanguageCode, &str)],
    ) -> Result<(Country, bool)> {
        let iso_code = iso_code.trim().to_ascii_uppercase();
        if iso_code.len() != 3 || !iso_code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidValue(format!("ISO3 code {iso_code}")));
        }
        let res = sqlx::query("INSERT INTO country (iso_code) VALUES (?) ON CONFLICT(iso_code) DO NOTHING")
            .bind(&iso_code)
            .execute(&self.executor)
            .await?;
        let created = res.rows_affected() > 0;
        let id: i64 = sqlx::query_scalar("SELECT id FROM country WHERE iso_code = ?")
            .bind(&iso_code)
            .fetch_one(&self.executor)
            .await?;
        for (lang, name) in names {
            sqlx::query(
                "INSERT INTO country_translation (country_id, language_id, name)
                 VALUES (?, (SELECT id FROM language WHERE code = ?), ?)
                 ON CONFLICT(country_id, language_id) DO NOTHING",
            )
            .bind(id)
            .bind(lang.as_str())
            .bind(name)
            .execute(&self.executor)
            .await?;
        }
        Ok((self.get(id).await?, created))
    }

    pub async fn get(&self, id: i64) -> Result<Country> {
        let iso_code: String = sqlx::query_scalar("SELECT iso_code FROM country WHERE id = ?")
            .bind(id)
            .fetch_one(&self.executor)
            .await
            .map_err(Error::not_found("Country"))?;
        let translations = sqlx::query_as::<_, CountryTranslation>(
            "SELECT l.code AS language, t.name FROM country_translation t
             JOIN language l ON l.id = t.language_id WHERE t.country_id = ?",
        )
        .bind(id)
        .fetch(&self.executor)
        .try_collect::<Vec<_>>()
        .await?;
        Ok(Country {
            id,
            iso_code,
            translations: Translations::new(translations),
        })
    }

    /// All countries with names in `lang`, falling back to default language and ISO code
    pub async fn list(&self, lang: LanguageCode) -> Result<Vec<CountryShort>> {
        let mut rows = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT c.id, c.iso_code,
                COALESCE(
                    (SELECT t.name FROM country_translation t JOIN language l ON l.id = t.language_id
                     WHERE t.country_id = c.id AND l.code = ? AND t.name <> ''),
                    (SELECT t.name FROM country_translation t JOIN language l ON l.id = t.language_id
                     WHERE t.country_id = c.id AND l.code = ? AND t.name <> ''),
                    c.iso_code) AS name
             FROM country c",
        )
        .bind(lang.as_str())
        .bind(LanguageCode::DEFAULT.as_str())
        .fetch(&self.executor)
        .map_ok(|(id, iso_code, name)| CountryShort { id, iso_code, name })
        .try_collect::<Vec<_>>()
        .await?;
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}
