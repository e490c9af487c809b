pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("User password error: {0}")]
    UserPasswordError(#[from] argon2::password_hash::Error),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No free slug for {0}")]
    SlugExhausted(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Club {0} must keep at least one admin")]
    LastAdmin(i64),

    #[error("User {user_id} is not a member of club {club_id}")]
    NotAMember { club_id: i64, user_id: i64 },

    #[error("Event {0} is full")]
    EventFull(i64),

    #[error("Event {0} is cancelled")]
    EventCancelled(i64),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl Error {
    /// Maps missing row to [`Error::RecordNotFound`] with entity name
    pub(crate) fn not_found(entity: &str) -> impl FnOnce(sqlx::Error) -> Error + '_ {
        move |e| match e {
            sqlx::Error::RowNotFound => Error::RecordNotFound(entity.to_string()),
            other => Error::DatabaseError(other),
        }
    }
}
