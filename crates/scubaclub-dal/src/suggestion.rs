//! Proposed edits of dive locations.
//!
//! A suggestion starts `pending` and ends either `approved` (changes merged into the location,
//! suggestion record deleted) or `rejected` (location untouched).

use std::{fmt::Display, str::FromStr};

use futures::TryStreamExt as _;
use garde::Validate;
use scubaclub_types::language::LanguageCode;
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, Executor, Pool};
use tracing::{debug, info};

use crate::{
    ChosenDB, Connection, Error,
    error::Result,
    location::{self, LocationDetails, LocationTranslationInput},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Approved => "approved",
            SuggestionStatus::Rejected => "rejected",
        }
    }

    /// Only pending suggestion can be decided
    pub fn transition(self, to: SuggestionStatus) -> Result<SuggestionStatus> {
        match (self, to) {
            (SuggestionStatus::Pending, SuggestionStatus::Approved | SuggestionStatus::Rejected) => {
                Ok(to)
            }
            (from, to) => Err(Error::InvalidStatusTransition {
                from: from.as_str(),
                to: to.as_str(),
            }),
        }
    }
}

impl Display for SuggestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuggestionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(SuggestionStatus::Pending),
            "approved" => Ok(SuggestionStatus::Approved),
            "rejected" => Ok(SuggestionStatus::Rejected),
            other => Err(Error::InvalidValue(format!("suggestion status {other}"))),
        }
    }
}

impl TryFrom<String> for SuggestionStatus {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Suggestion {
    pub id: i64,
    pub location_id: i64,
    pub suggested_by: i64,
    #[sqlx(try_from = "String")]
    pub language: LanguageCode,
    pub suggested_name: String,
    pub suggested_description: String,
    pub suggested_facilities: String,
    pub suggested_parking: String,
    pub suggested_directions: String,
    pub suggested_country_id: Option<i64>,
    pub suggested_latitude: Option<f64>,
    pub suggested_longitude: Option<f64>,
    #[sqlx(try_from = "String")]
    pub status: SuggestionStatus,
    pub created: time::PrimitiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateSuggestion {
    /// Target translation, request language when missing
    #[garde(skip)]
    #[serde(default)]
    pub language: Option<LanguageCode>,
    #[garde(length(max = 255))]
    #[serde(default)]
    pub suggested_name: String,
    #[garde(length(max = 5000))]
    #[serde(default)]
    pub suggested_description: String,
    #[garde(length(max = 2000))]
    #[serde(default)]
    pub suggested_facilities: String,
    #[garde(length(max = 2000))]
    #[serde(default)]
    pub suggested_parking: String,
    #[garde(length(max = 2000))]
    #[serde(default)]
    pub suggested_directions: String,
    #[garde(skip)]
    #[serde(default)]
    pub suggested_country_id: Option<i64>,
    #[garde(custom(crate::validation::latitude))]
    #[serde(default)]
    pub suggested_latitude: Option<f64>,
    #[garde(custom(crate::validation::longitude))]
    #[serde(default)]
    pub suggested_longitude: Option<f64>,
}

fn keep_or_replace(old: &str, suggested: &str) -> String {
    if suggested.trim().is_empty() {
        old.to_string()
    } else {
        suggested.to_string()
    }
}

/// Merges approved suggestion into its location, returns false and changes nothing
/// for suggestion in any other state
pub async fn apply_changes(conn: &mut Connection, suggestion: &Suggestion) -> Result<bool> {
    if suggestion.status != SuggestionStatus::Approved {
        debug!(
            "Suggestion {} is {}, nothing to apply",
            suggestion.id, suggestion.status
        );
        return Ok(false);
    }
    let current = location::load(conn, suggestion.location_id).await?;

    let details = LocationDetails {
        latitude: suggestion.suggested_latitude.or(current.latitude),
        longitude: suggestion.suggested_longitude.or(current.longitude),
        country_id: suggestion.suggested_country_id.or(current.country_id),
    };
    location::update_details(conn, current.id, &details).await?;

    let lang = suggestion.language;
    let translation = match current.translations.get(lang) {
        Some(existing) => LocationTranslationInput::from_translation(existing),
        None => LocationTranslationInput {
            language: lang,
            name: location::placeholder_name(current.id),
            description: String::new(),
            facilities: String::new(),
            parking: String::new(),
            directions: String::new(),
        },
    };
    let merged = LocationTranslationInput {
        language: lang,
        name: keep_or_replace(&translation.name, &suggestion.suggested_name),
        description: keep_or_replace(&translation.description, &suggestion.suggested_description),
        facilities: keep_or_replace(&translation.facilities, &suggestion.suggested_facilities),
        parking: keep_or_replace(&translation.parking, &suggestion.suggested_parking),
        directions: keep_or_replace(&translation.directions, &suggestion.suggested_directions),
    };
    let slug = location::save_translation(conn, current.id, &merged).await?;
    info!(
        "Applied suggestion {} to location {}, slug in {lang} is {slug}",
        suggestion.id, current.id
    );
    Ok(true)
}

const SUGGESTION_COLUMNS: &str = "s.id, s.location_id, s.suggested_by, l.code AS language, s.suggested_name, s.suggested_description,
    s.suggested_facilities, s.suggested_parking, s.suggested_directions, s.suggested_country_id,
    s.suggested_latitude, s.suggested_longitude, s.status, s.created";

async fn load(conn: &mut Connection, id: i64) -> Result<Suggestion> {
    let sql = format!(
        "SELECT {SUGGESTION_COLUMNS} FROM dive_location_suggestion s JOIN language l ON l.id = s.language_id
         WHERE s.id = ?"
    );
    sqlx::query_as::<_, Suggestion>(&sql)
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .map_err(Error::not_found("Suggestion"))
}

async fn set_status(
    conn: &mut Connection,
    suggestion: &mut Suggestion,
    to: SuggestionStatus,
) -> Result<()> {
    let status = suggestion.status.transition(to)?;
    sqlx::query("UPDATE dive_location_suggestion SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(suggestion.id)
        .execute(&mut *conn)
        .await?;
    suggestion.status = status;
    Ok(())
}

pub type SuggestionRepository = SuggestionRepositoryImpl<Pool<ChosenDB>>;

pub struct SuggestionRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> SuggestionRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB> + Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        location_id: i64,
        payload: CreateSuggestion,
        suggested_by: i64,
    ) -> Result<Suggestion> {
        let id = sqlx::query(
            "INSERT INTO dive_location_suggestion
                (location_id, suggested_by, language_id, suggested_name, suggested_description,
                 suggested_facilities, suggested_parking, suggested_directions,
                 suggested_country_id, suggested_latitude, suggested_longitude)
             VALUES (?, ?, (SELECT id FROM language WHERE code = ?), ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(location_id)
        .bind(suggested_by)
        .bind(payload.language.unwrap_or_default().as_str())
        .bind(&payload.suggested_name)
        .bind(&payload.suggested_description)
        .bind(&payload.suggested_facilities)
        .bind(&payload.suggested_parking)
        .bind(&payload.suggested_directions)
        .bind(payload.suggested_country_id)
        .bind(payload.suggested_latitude)
        .bind(payload.suggested_longitude)
        .execute(&self.executor)
        .await?
        .last_insert_rowid();
        info!("User {suggested_by} suggested change {id} of location {location_id}");
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<Suggestion> {
        let mut conn = self.executor.acquire().await?;
        load(&mut *conn, id).await
    }

    pub async fn list_pending(&self) -> Result<Vec<Suggestion>> {
        let sql = format!(
            "SELECT {SUGGESTION_COLUMNS} FROM dive_location_suggestion s JOIN language l ON l.id = s.language_id
             WHERE s.status = 'pending' ORDER BY s.created, s.id"
        );
        let rows = sqlx::query_as::<_, Suggestion>(&sql)
            .fetch(&self.executor)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(rows)
    }

    /// Approves, merges and deletes suggestion in one transaction.
    /// Returns id of the updated location.
    pub async fn approve(&self, id: i64) -> Result<i64> {
        let mut tx = self.executor.begin().await?;
        let mut suggestion = load(&mut *tx, id).await?;
        set_status(&mut *tx, &mut suggestion, SuggestionStatus::Approved).await?;
        apply_changes(&mut *tx, &suggestion).await?;
        sqlx::query("DELETE FROM dive_location_suggestion WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        info!("Approved suggestion {id}");
        Ok(suggestion.location_id)
    }

    pub async fn reject(&self, id: i64) -> Result<Suggestion> {
        let mut tx = self.executor.begin().await?;
        let mut suggestion = load(&mut *tx, id).await?;
        set_status(&mut *tx, &mut suggestion, SuggestionStatus::Rejected).await?;
        tx.commit().await?;
        info!("Rejected suggestion {id}");
        Ok(suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use SuggestionStatus::*;
        assert_eq!(Pending.transition(Approved).unwrap(), Approved);
        assert_eq!(Pending.transition(Rejected).unwrap(), Rejected);
        assert!(Approved.transition(Rejected).is_err());
        assert!(Rejected.transition(Approved).is_err());
        assert!(Pending.transition(Pending).is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "approved".parse::<SuggestionStatus>().unwrap(),
            SuggestionStatus::Approved
        );
        assert!("done".parse::<SuggestionStatus>().is_err());
    }

    #[test]
    fn test_keep_or_replace() {
        assert_eq!(keep_or_replace("Vinkeveen", ""), "Vinkeveen");
        assert_eq!(keep_or_replace("Vinkeveen", "  "), "Vinkeveen");
        assert_eq!(keep_or_replace("Vinkeveen", "Vinkeveense Plassen"), "Vinkeveense Plassen");
    }
}
