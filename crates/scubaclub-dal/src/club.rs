use std::collections::HashMap;

use futures::TryStreamExt as _;
use garde::Validate;
use scubaclub_types::language::LanguageCode;
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, Executor, Pool};
use tracing::{debug, error, info};

use crate::{
    ChosenDB, Error,
    error::Result,
    translation::{
        FailedTranslation, SavedTranslation, SlugCandidates, Translation, TranslationReport,
        Translations, base_slug, is_slug_conflict,
    },
    user::UserShort,
    validation::{optional_email, optional_url},
};

pub const CLUB_PLACEHOLDER_NAME: &str = "Unnamed Club";
const SLUG_PREFIX: &str = "club";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClubTranslation {
    #[sqlx(try_from = "String")]
    pub language: LanguageCode,
    pub name: String,
    pub description: String,
    pub slug: String,
}

impl Translation for ClubTranslation {
    fn language(&self) -> LanguageCode {
        self.language
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ClubRow {
    id: i64,
    street: String,
    postal_code: String,
    city: String,
    country_id: Option<i64>,
    website: String,
    email: String,
    created_by: i64,
    created: time::PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiveClub {
    pub id: i64,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country_id: Option<i64>,
    pub website: String,
    pub email: String,
    pub created_by: i64,
    pub created: time::PrimitiveDateTime,
    pub translations: Translations<ClubTranslation>,
}

impl DiveClub {
    fn from_row(row: ClubRow, translations: Vec<ClubTranslation>) -> Self {
        DiveClub {
            id: row.id,
            street: row.street,
            postal_code: row.postal_code,
            city: row.city,
            country_id: row.country_id,
            website: row.website,
            email: row.email,
            created_by: row.created_by,
            created: row.created,
            translations: Translations::new(translations),
        }
    }

    pub fn name(&self, lang: LanguageCode) -> String {
        self.translations.field_or(
            lang,
            |t| t.name.as_str(),
            || CLUB_PLACEHOLDER_NAME.to_string(),
        )
    }

    pub fn description(&self, lang: LanguageCode) -> String {
        self.translations
            .field(lang, |t| t.description.as_str())
            .unwrap_or_default()
            .to_string()
    }

    pub fn slug(&self, lang: LanguageCode) -> Option<&str> {
        self.translations.field(lang, |t| t.slug.as_str())
    }
}

/// Language independent part of a club
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ClubDetails {
    #[garde(length(max = 255))]
    pub street: String,
    #[garde(length(max = 20))]
    pub postal_code: String,
    #[garde(length(max = 255))]
    pub city: String,
    #[garde(skip)]
    pub country_id: Option<i64>,
    #[garde(length(max = 200), custom(optional_url))]
    pub website: String,
    #[garde(length(max = 254), custom(optional_email))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClubTranslationInput {
    #[garde(skip)]
    pub language: LanguageCode,
    #[garde(length(min = 1, max = 255))]
    pub name: String,
    #[garde(length(max = 5000))]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateClub {
    #[garde(dive)]
    pub details: ClubDetails,
    #[garde(dive)]
    pub translations: Vec<ClubTranslationInput>,
}

pub type UpdateClub = CreateClub;

/// Relation of one user to one club
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub is_member: bool,
    pub is_admin: bool,
    pub is_pending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinRequest {
    Requested,
    AlreadyMember,
    AlreadyPending,
}

const CLUB_COLUMNS: &str =
    "c.id, c.street, c.postal_code, c.city, c.country_id, c.website, c.email, c.created_by, c.created";

pub type ClubRepository = ClubRepositoryImpl<Pool<ChosenDB>>;

pub struct ClubRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> ClubRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB> + Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Creates club with its creator as admin and member, then saves translations
    /// language by language
    pub async fn create(
        &self,
        payload: CreateClub,
        created_by: i64,
    ) -> Result<(DiveClub, TranslationReport)> {
        let mut tx = self.executor.begin().await?;
        let details = payload.details;
        let id = sqlx::query(
            "INSERT INTO dive_club (street, postal_code, city, country_id, website, email, created_by)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&details.street)
        .bind(&details.postal_code)
        .bind(&details.city)
        .bind(details.country_id)
        .bind(&details.website)
        .bind(&details.email)
        .bind(created_by)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        sqlx::query("INSERT INTO club_admin (club_id, user_id) VALUES (?, ?)")
            .bind(id)
            .bind(created_by)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO club_member (club_id, user_id) VALUES (?, ?)")
            .bind(id)
            .bind(created_by)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        info!("Created club {id} by user {created_by}");

        let report = self.save_translations(id, &payload.translations).await;
        let club = self.get(id).await?;
        Ok((club, report))
    }

    pub async fn update(&self, id: i64, payload: UpdateClub) -> Result<(DiveClub, TranslationReport)> {
        let details = payload.details;
        let res = sqlx::query(
            "UPDATE dive_club SET street = ?, postal_code = ?, city = ?, country_id = ?, website = ?, email = ?
             WHERE id = ?",
        )
        .bind(&details.street)
        .bind(&details.postal_code)
        .bind(&details.city)
        .bind(details.country_id)
        .bind(&details.website)
        .bind(&details.email)
        .bind(id)
        .execute(&self.executor)
        .await?;
        if res.rows_affected() == 0 {
            return Err(Error::RecordNotFound("Club".to_string()));
        }

        let report = self.save_translations(id, &payload.translations).await;
        let club = self.get(id).await?;
        Ok((club, report))
    }

    /// Saves each language separately, failure of one language does not undo the others
    pub async fn save_translations(
        &self,
        club_id: i64,
        translations: &[ClubTranslationInput],
    ) -> TranslationReport {
        let mut report = TranslationReport::default();
        for input in translations {
            match self.save_translation(club_id, input).await {
                Ok(slug) => report.saved.push(SavedTranslation {
                    language: input.language,
                    slug,
                }),
                Err(e) => {
                    error!(
                        "Failed to save {} translation of club {club_id}: {e}",
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

    /// Upserts translation row, returns its slug.
    /// Slug is kept while the name does not change.
    pub async fn save_translation(&self, club_id: i64, input: &ClubTranslationInput) -> Result<String> {
        let existing = sqlx::query_as::<_, (String, String)>(
            "SELECT t.name, t.slug FROM dive_club_translation t JOIN language l ON l.id = t.language_id
             WHERE t.club_id = ? AND l.code = ?",
        )
        .bind(club_id)
        .bind(input.language.as_str())
        .fetch_optional(&self.executor)
        .await?;

        if let Some((name, slug)) = existing {
            if name == input.name && !slug.is_empty() {
                sqlx::query(
                    "UPDATE dive_club_translation SET description = ?
                     WHERE club_id = ? AND language_id = (SELECT id FROM language WHERE code = ?)",
                )
                .bind(&input.description)
                .bind(club_id)
                .bind(input.language.as_str())
                .execute(&self.executor)
                .await?;
                return Ok(slug);
            }
        }

        let base = base_slug(&input.name, SLUG_PREFIX, club_id);
        for candidate in SlugCandidates::new(&base) {
            let res = sqlx::query(
                "INSERT INTO dive_club_translation (club_id, language_id, name, description, slug)
                 VALUES (?, (SELECT id FROM language WHERE code = ?), ?, ?, ?)
                 ON CONFLICT(club_id, language_id) DO UPDATE
                 SET name = excluded.name, description = excluded.description, slug = excluded.slug",
            )
            .bind(club_id)
            .bind(input.language.as_str())
            .bind(&input.name)
            .bind(&input.description)
            .bind(&candidate)
            .execute(&self.executor)
            .await;
            match res {
                Ok(_) => {
                    debug!("Club {club_id} has slug {candidate} in {}", input.language);
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

    /// Regenerates empty slugs, returns the fixed translations
    pub async fn fill_missing_slugs(&self) -> Result<Vec<(i64, LanguageCode, String)>> {
        let missing = sqlx::query_as::<_, (i64, String, String, String)>(
            "SELECT t.club_id, l.code, t.name, t.description FROM dive_club_translation t
             JOIN language l ON l.id = t.language_id WHERE t.slug = ''",
        )
        .fetch(&self.executor)
        .try_collect::<Vec<_>>()
        .await?;

        let mut fixed = Vec::with_capacity(missing.len());
        for (club_id, code, name, description) in missing {
            let language = code
                .parse::<LanguageCode>()
                .map_err(|e| Error::InvalidValue(e.to_string()))?;
            let input = ClubTranslationInput {
                language,
                name,
                description,
            };
            let slug = self.save_translation(club_id, &input).await?;
            fixed.push((club_id, language, slug));
        }
        Ok(fixed)
    }

    pub async fn get(&self, id: i64) -> Result<DiveClub> {
        let sql = format!("SELECT {CLUB_COLUMNS} FROM dive_club c WHERE c.id = ?");
        let row = sqlx::query_as::<_, ClubRow>(&sql)
            .bind(id)
            .fetch_one(&self.executor)
            .await
            .map_err(Error::not_found("Club"))?;
        let translations = self.translations(id).await?;
        Ok(DiveClub::from_row(row, translations))
    }

    async fn translations(&self, club_id: i64) -> Result<Vec<ClubTranslation>> {
        let rows = sqlx::query_as::<_, ClubTranslation>(
            "SELECT l.code AS language, t.name, t.description, t.slug
             FROM dive_club_translation t JOIN language l ON l.id = t.language_id
             WHERE t.club_id = ? ORDER BY l.code",
        )
        .bind(club_id)
        .fetch(&self.executor)
        .try_collect::<Vec<_>>()
        .await?;
        Ok(rows)
    }

    /// Finds club by slug in `lang`, then by slug in any other language
    pub async fn find_by_slug(&self, slug: &str, lang: LanguageCode) -> Result<Option<DiveClub>> {
        let id = sqlx::query_scalar::<_, i64>(
            "SELECT t.club_id FROM dive_club_translation t JOIN language l ON l.id = t.language_id
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

    /// Clubs that have a non-empty name in `lang`, newest first
    pub async fn list_for_language(&self, lang: LanguageCode) -> Result<Vec<DiveClub>> {
        self.list_filtered(ClubFilter::Language(lang)).await
    }

    /// Clubs where user is member or admin
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<DiveClub>> {
        self.list_filtered(ClubFilter::User(user_id)).await
    }

    async fn list_filtered(&self, filter: ClubFilter) -> Result<Vec<DiveClub>> {
        let condition = filter.condition();
        let sql = format!(
            "SELECT {CLUB_COLUMNS} FROM dive_club c WHERE {condition} ORDER BY c.created DESC, c.id DESC"
        );
        let query = sqlx::query_as::<_, ClubRow>(&sql);
        let query = match filter {
            ClubFilter::Language(lang) => query.bind(lang.as_str()),
            ClubFilter::User(user_id) => query.bind(user_id),
        };
        let rows = query
            .fetch(&self.executor)
            .try_collect::<Vec<_>>()
            .await?;

        let translations_sql = format!(
            "SELECT t.club_id, l.code AS language, t.name, t.description, t.slug
             FROM dive_club_translation t JOIN language l ON l.id = t.language_id
             WHERE t.club_id IN (SELECT c.id FROM dive_club c WHERE {condition})"
        );
        let query = sqlx::query_as::<_, ClubTranslationWithOwner>(&translations_sql);
        let query = match filter {
            ClubFilter::Language(lang) => query.bind(lang.as_str()),
            ClubFilter::User(user_id) => query.bind(user_id),
        };
        let mut by_club: HashMap<i64, Vec<ClubTranslation>> = HashMap::new();
        let mut stream = query.fetch(&self.executor);
        while let Some(row) = stream.try_next().await? {
            by_club
                .entry(row.club_id)
                .or_default()
                .push(row.translation);
        }
        drop(stream);

        Ok(rows
            .into_iter()
            .map(|row| {
                let translations = by_club.remove(&row.id).unwrap_or_default();
                DiveClub::from_row(row, translations)
            })
            .collect())
    }

    pub async fn members(&self, club_id: i64) -> Result<Vec<UserShort>> {
        self.users_in("club_member", club_id).await
    }

    pub async fn admins(&self, club_id: i64) -> Result<Vec<UserShort>> {
        self.users_in("club_admin", club_id).await
    }

    pub async fn pending_members(&self, club_id: i64) -> Result<Vec<UserShort>> {
        self.users_in("club_pending_member", club_id).await
    }

    async fn users_in(&self, table: &str, club_id: i64) -> Result<Vec<UserShort>> {
        let sql = format!(
            "SELECT u.id, u.username FROM {table} m JOIN users u ON u.id = m.user_id
             WHERE m.club_id = ? ORDER BY u.username"
        );
        let users = sqlx::query_as::<_, UserShort>(&sql)
            .bind(club_id)
            .fetch(&self.executor)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(users)
    }

    pub async fn membership(&self, club_id: i64, user_id: i64) -> Result<Membership> {
        let (is_member, is_admin, is_pending) = sqlx::query_as::<_, (bool, bool, bool)>(
            "SELECT
                EXISTS (SELECT 1 FROM club_member WHERE club_id = ?1 AND user_id = ?2),
                EXISTS (SELECT 1 FROM club_admin WHERE club_id = ?1 AND user_id = ?2),
                EXISTS (SELECT 1 FROM club_pending_member WHERE club_id = ?1 AND user_id = ?2)",
        )
        .bind(club_id)
        .bind(user_id)
        .fetch_one(&self.executor)
        .await?;
        Ok(Membership {
            is_member,
            is_admin,
            is_pending,
        })
    }

    pub async fn is_admin(&self, club_id: i64, user_id: i64) -> Result<bool> {
        Ok(self.membership(club_id, user_id).await?.is_admin)
    }

    pub async fn request_join(&self, club_id: i64, user_id: i64) -> Result<JoinRequest> {
        let membership = self.membership(club_id, user_id).await?;
        if membership.is_member {
            return Ok(JoinRequest::AlreadyMember);
        }
        if membership.is_pending {
            return Ok(JoinRequest::AlreadyPending);
        }
        sqlx::query(
            "INSERT INTO club_pending_member (club_id, user_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(club_id)
        .bind(user_id)
        .execute(&self.executor)
        .await?;
        Ok(JoinRequest::Requested)
    }

    /// Moves user from pending to members, false if there was no pending request
    pub async fn approve_member(&self, club_id: i64, user_id: i64) -> Result<bool> {
        let mut tx = self.executor.begin().await?;
        let res = sqlx::query("DELETE FROM club_pending_member WHERE club_id = ? AND user_id = ?")
            .bind(club_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if res.rows_affected() == 0 {
            return Ok(false);
        }
        sqlx::query("INSERT INTO club_member (club_id, user_id) VALUES (?, ?) ON CONFLICT DO NOTHING")
            .bind(club_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    pub async fn reject_member(&self, club_id: i64, user_id: i64) -> Result<bool> {
        let res = sqlx::query("DELETE FROM club_pending_member WHERE club_id = ? AND user_id = ?")
            .bind(club_id)
            .bind(user_id)
            .execute(&self.executor)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Removes member, including admin rights. Fails with [`Error::LastAdmin`]
    /// when the user is the only admin.
    pub async fn remove_member(&self, club_id: i64, user_id: i64) -> Result<bool> {
        let mut tx = self.executor.begin().await?;
        let was_admin = revoke_admin(&mut *tx, club_id, user_id).await?;
        let res = sqlx::query("DELETE FROM club_member WHERE club_id = ? AND user_id = ?")
            .bind(club_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(was_admin || res.rows_affected() > 0)
    }

    /// Grants admin rights to an existing member
    pub async fn promote(&self, club_id: i64, user_id: i64) -> Result<bool> {
        let membership = self.membership(club_id, user_id).await?;
        if !membership.is_member {
            return Err(Error::NotAMember { club_id, user_id });
        }
        let res = sqlx::query(
            "INSERT INTO club_admin (club_id, user_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(club_id)
        .bind(user_id)
        .execute(&self.executor)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Revokes admin rights, user stays member. Fails with [`Error::LastAdmin`]
    /// when the user is the only admin.
    pub async fn remove_admin(&self, club_id: i64, user_id: i64) -> Result<bool> {
        let mut tx = self.executor.begin().await?;
        let was_admin = revoke_admin(&mut *tx, club_id, user_id).await?;
        tx.commit().await?;
        Ok(was_admin)
    }
}

/// Deletes admin row first so the transaction holds the write lock
/// before admins are counted. Dropping the transaction on error undoes the delete.
async fn revoke_admin(conn: &mut crate::Connection, club_id: i64, user_id: i64) -> Result<bool> {
    let res = sqlx::query("DELETE FROM club_admin WHERE club_id = ? AND user_id = ?")
        .bind(club_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    if res.rows_affected() == 0 {
        return Ok(false);
    }
    if count_admins(&mut *conn, club_id).await? == 0 {
        debug!("Refused to remove last admin {user_id} of club {club_id}");
        return Err(Error::LastAdmin(club_id));
    }
    Ok(true)
}

#[derive(Debug, Clone, Copy)]
enum ClubFilter {
    Language(LanguageCode),
    User(i64),
}

impl ClubFilter {
    fn condition(&self) -> &'static str {
        match self {
            ClubFilter::Language(_) => {
                "EXISTS (SELECT 1 FROM dive_club_translation t JOIN language l ON l.id = t.language_id
                 WHERE t.club_id = c.id AND l.code = ?1 AND trim(t.name) <> '')"
            }
            ClubFilter::User(_) => {
                "(c.id IN (SELECT club_id FROM club_member WHERE user_id = ?1)
                 OR c.id IN (SELECT club_id FROM club_admin WHERE user_id = ?1))"
            }
        }
    }
}

#[derive(sqlx::FromRow)]
struct ClubTranslationWithOwner {
    club_id: i64,
    #[sqlx(flatten)]
    translation: ClubTranslation,
}

async fn count_admins(conn: &mut crate::Connection, club_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM club_admin WHERE club_id = ?")
        .bind(club_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}
