use futures::TryStreamExt as _;
use garde::Validate;
use scubaclub_types::language::LanguageCode;
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, Executor, Pool};
use time::PrimitiveDateTime;
use tracing::{debug, info};

use crate::{ChosenDB, Error, error::Result, user::UserShort};

pub const DEFAULT_MAX_PARTICIPANTS: i64 = 30;

// Same shape as HTML datetime-local input
time::serde::format_description!(
    event_date,
    PrimitiveDateTime,
    "[year]-[month]-[day]T[hour]:[minute]"
);

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DiveEvent {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location_id: i64,
    #[serde(with = "event_date")]
    pub date: PrimitiveDateTime,
    pub max_participants: i64,
    #[sqlx(try_from = "String")]
    pub language: LanguageCode,
    pub organizer_id: i64,
    pub club_id: Option<i64>,
    pub is_cancelled: bool,
    pub participants_count: i64,
    pub created: PrimitiveDateTime,
}

impl DiveEvent {
    pub fn free_slots(&self) -> i64 {
        (self.max_participants - self.participants_count).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.free_slots() == 0
    }
}

fn default_max_participants() -> i64 {
    DEFAULT_MAX_PARTICIPANTS
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEvent {
    #[garde(length(min = 1, max = 255))]
    pub title: String,
    #[garde(length(max = 5000))]
    #[serde(default)]
    pub description: String,
    #[garde(skip)]
    pub location_id: i64,
    #[garde(skip)]
    #[serde(with = "event_date")]
    pub date: PrimitiveDateTime,
    #[garde(range(min = 1, max = 10_000))]
    #[serde(default = "default_max_participants")]
    pub max_participants: i64,
    /// Request language when missing
    #[garde(skip)]
    #[serde(default)]
    pub language: Option<LanguageCode>,
    #[garde(skip)]
    #[serde(default)]
    pub club_id: Option<i64>,
}

pub type UpdateEvent = CreateEvent;

const EVENT_COLUMNS: &str = "e.id, e.title, e.description, e.location_id, e.date, e.max_participants,
    l.code AS language, e.organizer_id, e.club_id, e.is_cancelled,
    (SELECT count(*) FROM dive_event_participant p WHERE p.event_id = e.id) AS participants_count,
    e.created";

pub type EventRepository = EventRepositoryImpl<Pool<ChosenDB>>;

pub struct EventRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> EventRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB> + Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateEvent, organizer_id: i64) -> Result<DiveEvent> {
        let id = sqlx::query(
            "INSERT INTO dive_event (title, description, location_id, date, max_participants, language_id, organizer_id, club_id)
             VALUES (?, ?, ?, ?, ?, (SELECT id FROM language WHERE code = ?), ?, ?)",
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.location_id)
        .bind(payload.date)
        .bind(payload.max_participants)
        .bind(payload.language.unwrap_or_default().as_str())
        .bind(organizer_id)
        .bind(payload.club_id)
        .execute(&self.executor)
        .await?
        .last_insert_rowid();
        info!("User {organizer_id} created dive event {id}");
        self.get(id).await
    }

    /// Fails with [`Error::InvalidValue`] when capacity would drop below joined participants
    pub async fn update(&self, id: i64, payload: UpdateEvent) -> Result<DiveEvent> {
        let mut tx = self.executor.begin().await?;
        let res = sqlx::query(
            "UPDATE dive_event SET title = ?, description = ?, location_id = ?, date = ?, max_participants = ?,
                language_id = (SELECT id FROM language WHERE code = ?), club_id = ?
             WHERE id = ?",
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.location_id)
        .bind(payload.date)
        .bind(payload.max_participants)
        .bind(payload.language.unwrap_or_default().as_str())
        .bind(payload.club_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if res.rows_affected() == 0 {
            return Err(Error::RecordNotFound("Event".to_string()));
        }
        let joined = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM dive_event_participant WHERE event_id = ?",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if joined > payload.max_participants {
            return Err(Error::InvalidValue(format!(
                "max_participants {} is below {joined} joined divers",
                payload.max_participants
            )));
        }
        tx.commit().await?;
        debug!("Updated dive event {id}");
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<DiveEvent> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM dive_event e JOIN language l ON l.id = e.language_id WHERE e.id = ?"
        );
        sqlx::query_as::<_, DiveEvent>(&sql)
            .bind(id)
            .fetch_one(&self.executor)
            .await
            .map_err(Error::not_found("Event"))
    }

    pub async fn cancel(&self, id: i64) -> Result<()> {
        let res = sqlx::query("UPDATE dive_event SET is_cancelled = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::RecordNotFound("Event".to_string()));
        }
        info!("Cancelled dive event {id}");
        Ok(())
    }

    /// Events in `lang` taking place at or after `from`, soonest first
    pub async fn list_upcoming(
        &self,
        lang: LanguageCode,
        from: PrimitiveDateTime,
    ) -> Result<Vec<DiveEvent>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM dive_event e JOIN language l ON l.id = e.language_id
             WHERE l.code = ? AND e.date >= ? ORDER BY e.date, e.id"
        );
        let events = sqlx::query_as::<_, DiveEvent>(&sql)
            .bind(lang.as_str())
            .bind(from)
            .fetch(&self.executor)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(events)
    }

    pub async fn list_for_club(&self, club_id: i64) -> Result<Vec<DiveEvent>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM dive_event e JOIN language l ON l.id = e.language_id
             WHERE e.club_id = ? ORDER BY e.date, e.id"
        );
        let events = sqlx::query_as::<_, DiveEvent>(&sql)
            .bind(club_id)
            .fetch(&self.executor)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(events)
    }

    pub async fn participants(&self, id: i64) -> Result<Vec<UserShort>> {
        let users = sqlx::query_as::<_, UserShort>(
            "SELECT u.id, u.username FROM users u JOIN dive_event_participant p ON p.user_id = u.id
             WHERE p.event_id = ? ORDER BY u.username",
        )
        .bind(id)
        .fetch(&self.executor)
        .try_collect::<Vec<_>>()
        .await?;
        Ok(users)
    }

    /// Adds participant, capacity is checked in the same transaction.
    /// Returns false if user already participates.
    pub async fn join(&self, id: i64, user_id: i64) -> Result<bool> {
        let mut tx = self.executor.begin().await?;
        let (max_participants, is_cancelled): (i64, bool) =
            sqlx::query_as("SELECT max_participants, is_cancelled FROM dive_event WHERE id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::not_found("Event"))?;
        if is_cancelled {
            return Err(Error::EventCancelled(id));
        }
        let already: Option<i64> = sqlx::query_scalar(
            "SELECT user_id FROM dive_event_participant WHERE event_id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if already.is_some() {
            return Ok(false);
        }
        let count: i64 =
            sqlx::query_scalar("SELECT count(*) FROM dive_event_participant WHERE event_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if count >= max_participants {
            return Err(Error::EventFull(id));
        }
        sqlx::query("INSERT INTO dive_event_participant (event_id, user_id) VALUES (?, ?)")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        debug!("User {user_id} joined dive event {id}");
        Ok(true)
    }

    pub async fn leave(&self, id: i64, user_id: i64) -> Result<bool> {
        let res =
            sqlx::query("DELETE FROM dive_event_participant WHERE event_id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .execute(&self.executor)
                .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn is_participant(&self, id: i64, user_id: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT user_id FROM dive_event_participant WHERE event_id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.executor)
        .await?;
        Ok(found.is_some())
    }
}
