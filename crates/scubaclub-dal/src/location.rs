use std::collections::HashMap;

use futures::TryStreamExt as _;
use garde::Validate;
use scubaclub_types::language::LanguageCode;
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, Executor, Pool};
use tracing::{debug, error, info};

use crate::{
    ChosenDB, Connection, Error,
    error::Result,
    translation::{
        FailedTranslation, SavedTranslation, SlugCandidates, Translation, TranslationReport,
        Translations, base_slug, is_slug_conflict,
    },
};

const SLUG_PREFIX: &str = "location";

pub fn placeholder_name(id: i64) -> String {
    format!("Location {id}")
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LocationTranslation {
    #[sqlx(try_from = "String")]
    pub language: LanguageCode,
    pub name: String,
    pub description: String,
    pub facilities: String,
    pub parking: String,
    pub directions: String,
    pub slug: String,
}

impl Translation for LocationTranslation {
    fn language(&self) -> LanguageCode {
        self.language
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct LocationRow {
    id: i64,
    latitude: Option<f64>,
    longitude: Option<f64>,
    country_id: Option<i64>,
    #[sqlx(try_from = "String")]
    language: LanguageCode,
    created_by: i64,
    created: time::PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiveLocation {
    pub id: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country_id: Option<i64>,
    pub language: LanguageCode,
    pub created_by: i64,
    pub created: time::PrimitiveDateTime,
    pub translations: Translations<LocationTranslation>,
}

impl DiveLocation {
    fn from_row(row: LocationRow, translations: Vec<LocationTranslation>) -> Self {
        DiveLocation {
            id: row.id,
            latitude: row.latitude,
            longitude: row.longitude,
            country_id: row.country_id,
            language: row.language,
            created_by: row.created_by,
            created: row.created,
            translations: Translations::new(translations),
        }
    }

    pub fn name(&self, lang: LanguageCode) -> String {
        self.translations
            .field_or(lang, |t| t.name.as_str(), || placeholder_name(self.id))
    }

    /// Translated text field with fallback to default language, empty if missing
    pub fn text<F>(&self, lang: LanguageCode, field: F) -> String
    where
        F: for<'a> Fn(&'a LocationTranslation) -> &'a str,
    {
        self.translations
            .field(lang, field)
            .unwrap_or_default()
            .to_string()
    }

    pub fn slug(&self, lang: LanguageCode) -> Option<&str> {
        self.translations.field(lang, |t| t.slug.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LocationDetails {
    #[garde(custom(crate::validation::latitude))]
    pub latitude: Option<f64>,
    #[garde(custom(crate::validation::longitude))]
    pub longitude: Option<f64>,
    #[garde(skip)]
    pub country_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LocationTranslationInput {
    #[garde(skip)]
    pub language: LanguageCode,
    #[garde(length(min = 1, max = 255))]
    pub name: String,
    #[garde(length(max = 5000))]
    pub description: String,
    #[garde(length(max = 2000))]
    pub facilities: String,
    #[garde(length(max = 2000))]
    pub parking: String,
    #[garde(length(max = 2000))]
    pub directions: String,
}

impl LocationTranslationInput {
    pub fn from_translation(t: &LocationTranslation) -> Self {
        Self {
            language: t.language,
            name: t.name.clone(),
            description: t.description.clone(),
            facilities: t.facilities.clone(),
            parking: t.parking.clone(),
            directions: t.directions.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLocation {
    /// Language the location was entered in
    #[garde(skip)]
    pub language: LanguageCode,
    #[garde(dive)]
    pub details: LocationDetails,
    #[garde(length(min = 1), dive)]
    pub translations: Vec<LocationTranslationInput>,
}

const LOCATION_COLUMNS: &str = "d.id, d.latitude, d.longitude, d.country_id, l.code AS language, d.created_by, d.created";

pub type LocationRepository = LocationRepositoryImpl<Pool<ChosenDB>>;

pub struct LocationRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> LocationRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB> + Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        payload: CreateLocation,
        created_by: i64,
    ) -> Result<(DiveLocation, TranslationReport)> {
        let details = payload.details;
        let id = sqlx::query(
            "INSERT INTO dive_location (latitude, longitude, country_id, language_id, created_by)
             VALUES (?, ?, ?, (SELECT id FROM language WHERE code = ?), ?)",
        )
        .bind(details.latitude)
        .bind(details.longitude)
        .bind(details.country_id)
        .bind(payload.language.as_str())
        .bind(created_by)
        .execute(&self.executor)
        .await?
        .last_insert_rowid();
        info!("Created dive location {id} by user {created_by}");

        let report = self.save_translations(id, &payload.translations).await;
        let location = self.get(id).await?;
        Ok((location, report))
    }

    pub async fn update_details(&self, id: i64, details: &LocationDetails) -> Result<()> {
        let mut conn = self.executor.acquire().await?;
        update_details(&mut *conn, id, details).await
    }

    /// Saves each language separately, failure of one language does not undo the others
    pub async fn save_translations(
        &self,
        location_id: i64,
        translations: &[LocationTranslationInput],
    ) -> TranslationReport {
        let mut report = TranslationReport::default();
        for input in translations {
            match self.save_translation(location_id, input).await {
                Ok(slug) => report.saved.push(SavedTranslation {
                    language: input.language,
                    slug,
                }),
                Err(e) => {
                    error!(
                        "Failed to save {} translation of location {location_id}: {e}",
                        input.language
                    );
                    report.failed.push(FailedTranslation {
                        language: input.language,
                        error: e.to_string(),
                    })
                }
            }
        }
        report
    }

    pub async fn save_translation(
        &self,
        location_id: i64,
        input: &LocationTranslationInput,
    ) -> Result<String> {
        let mut conn = self.executor.acquire().await?;
        save_translation(&mut *conn, location_id, input).await
    }

    pub async fn get(&self, id: i64) -> Result<DiveLocation> {
        let mut conn = self.executor.acquire().await?;
        load(&mut *conn, id).await
    }

    /// Finds location by slug in `lang`, then by slug in any other language
    pub async fn find_by_slug(
        &self,
        slug: &str,
        lang: LanguageCode,
    ) -> Result<Option<DiveLocation>> {
        let id = sqlx::query_scalar::<_, i64>(
            "SELECT t.location_id FROM dive_location_translation t JOIN language l ON l.id = t.language_id
             WHERE t.slug = ? ORDER BY (l.code = ?) DESC, (l.code = ?) DESC LIMIT 1",
        )
        .bind(slug)
        .bind(lang.as_str())
        .bind(LanguageCode::DEFAULT.as_str())
        .fetch_optional(&self.executor)
        .await?;
        match id {
            Some(id) => self.get(id).await.map(Some),
            None => Ok(None),
        }
    }

    /// Locations that have a non-empty name in `lang`, newest first
    pub async fn list_for_language(&self, lang: LanguageCode) -> Result<Vec<DiveLocation>> {
        const AVAILABLE: &str = "EXISTS (SELECT 1 FROM dive_location_translation t JOIN language tl ON tl.id = t.language_id
             WHERE t.location_id = d.id AND tl.code = ?1 AND trim(t.name) <> '')";
        let sql = format!(
            "SELECT {LOCATION_COLUMNS} FROM dive_location d JOIN language l ON l.id = d.language_id
             WHERE {AVAILABLE} ORDER BY d.created DESC, d.id DESC"
        );
        let rows = sqlx::query_as::<_, LocationRow>(&sql)
            .bind(lang.as_str())
            .fetch(&self.executor)
            .try_collect::<Vec<_>>()
            .await?;

        let translations_sql = format!(
            "SELECT t.location_id, l.code AS language, t.name, t.description, t.facilities, t.parking, t.directions, t.slug
             FROM dive_location_translation t JOIN language l ON l.id = t.language_id
             WHERE t.location_id IN (SELECT d.id FROM dive_location d WHERE {AVAILABLE})"
        );
        let mut by_location: HashMap<i64, Vec<LocationTranslation>> = HashMap::new();
        let mut stream = sqlx::query_as::<_, LocationTranslationWithOwner>(&translations_sql)
            .bind(lang.as_str())
            .fetch(&self.executor);
        while let Some(row) = stream.try_next().await? {
            by_location
                .entry(row.location_id)
                .or_default()
                .push(row.translation);
        }
        drop(stream);

        Ok(rows
            .into_iter()
            .map(|row| {
                let translations = by_location.remove(&row.id).unwrap_or_default();
                DiveLocation::from_row(row, translations)
            })
            .collect())
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM dive_location WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.executor)
            .await?;
        Ok(found.is_some())
    }
}

#[derive(sqlx::FromRow)]
struct LocationTranslationWithOwner {
    location_id: i64,
    #[sqlx(flatten)]
    translation: LocationTranslation,
}

pub(crate) async fn load(conn: &mut Connection, id: i64) -> Result<DiveLocation> {
    let sql = format!(
        "SELECT {LOCATION_COLUMNS} FROM dive_location d JOIN language l ON l.id = d.language_id
         WHERE d.id = ?"
    );
    let row = sqlx::query_as::<_, LocationRow>(&sql)
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .map_err(Error::not_found("Location"))?;
    let translations = sqlx::query_as::<_, LocationTranslation>(
        "SELECT l.code AS language, t.name, t.description, t.facilities, t.parking, t.directions, t.slug
         FROM dive_location_translation t JOIN language l ON l.id = t.language_id
         WHERE t.location_id = ? ORDER BY l.code",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(DiveLocation::from_row(row, translations))
}

pub(crate) async fn update_details(
    conn: &mut Connection,
    id: i64,
    details: &LocationDetails,
) -> Result<()> {
    let res = sqlx::query(
        "UPDATE dive_location SET latitude = ?, longitude = ?, country_id = ? WHERE id = ?",
    )
    .bind(details.latitude)
    .bind(details.longitude)
    .bind(details.country_id)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    if res.rows_affected() == 0 {
        Err(Error::RecordNotFound("Location".to_string()))
    } else {
        Ok(())
    }
}

/// Upserts translation row, returns its slug.
/// Slug is kept while the name does not change, otherwise the first free candidate is taken.
pub(crate) async fn save_translation(
    conn: &mut Connection,
    location_id: i64,
    input: &LocationTranslationInput,
) -> Result<String> {
    let existing = sqlx::query_as::<_, (String, String)>(
        "SELECT t.name, t.slug FROM dive_location_translation t JOIN language l ON l.id = t.language_id
         WHERE t.location_id = ? AND l.code = ?",
    )
    .bind(location_id)
    .bind(input.language.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some((name, slug)) = existing {
        if name == input.name && !slug.is_empty() {
            sqlx::query(
                "UPDATE dive_location_translation
                 SET description = ?, facilities = ?, parking = ?, directions = ?
                 WHERE location_id = ? AND language_id = (SELECT id FROM language WHERE code = ?)",
            )
            .bind(&input.description)
            .bind(&input.facilities)
            .bind(&input.parking)
            .bind(&input.directions)
            .bind(location_id)
            .bind(input.language.as_str())
            .execute(&mut *conn)
            .await?;
            return Ok(slug);
        }
    }

    let base = base_slug(&input.name, SLUG_PREFIX, location_id);
    for candidate in SlugCandidates::new(&base) {
        let res = sqlx::query(
            "INSERT INTO dive_location_translation
                (location_id, language_id, name, description, facilities, parking, directions, slug)
             VALUES (?, (SELECT id FROM language WHERE code = ?), ?, ?, ?, ?, ?, ?)
             ON CONFLICT(location_id, language_id) DO UPDATE
             SET name = excluded.name, description = excluded.description, facilities = excluded.facilities,
                 parking = excluded.parking, directions = excluded.directions, slug = excluded.slug",
        )
        .bind(location_id)
        .bind(input.language.as_str())
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.facilities)
        .bind(&input.parking)
        .bind(&input.directions)
        .bind(&candidate)
        .execute(&mut *conn)
        .await;
        match res {
            Ok(_) => {
                debug!(
                    "Location {location_id} has slug {candidate} in {}",
                    input.language
                );
                return Ok(candidate);
            }
            Err(e) if is_slug_conflict(&e) => {
                debug!("Slug {candidate} taken in {}", input.language);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(Error::SlugExhausted(base))
}
