use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{Result as HashResult, SaltString, rand_core::OsRng},
};

use garde::Validate;
use scubaclub_types::{
    claim::{Role, UserClaim},
    general::{Username, ValidEmail},
};
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use tracing::debug;

use crate::{Error, error::Result};

fn hash_password(password: &str) -> HashResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

fn verify_password(password: &str, password_hash: &str) -> HashResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)?;
    let res = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    if let Err(e) = res {
        debug!("Invalid password, error {e}");
    }
    Ok(res.is_ok())
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateUser {
    #[garde(dive)]
    pub username: Username,
    #[garde(dive)]
    pub email: ValidEmail,
    #[garde(length(min = 8, max = 255))]
    pub password: String,
    #[garde(skip)]
    pub is_active: bool,
    #[garde(skip)]
    pub is_superuser: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub bio: String,
    pub created: time::PrimitiveDateTime,
}

impl User {
    pub fn claim(&self) -> UserClaim {
        let roles = self.is_superuser.then_some(Role::Superuser);
        UserClaim::new(self.id, self.username.clone(), roles)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct UserShort {
    pub id: i64,
    pub username: String,
}

/// Values an account activation token is bound to
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserAuthState {
    pub id: i64,
    pub is_active: bool,
    pub password: Option<String>,
}

const USER_COLUMNS: &str = "id, username, email, is_active, is_superuser, bio, created";

pub type UserRepository = UserRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct UserRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> UserRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateUser) -> Result<User> {
        let password = hash_password(&payload.password)?;
        let result = sqlx::query(
            "INSERT INTO users (username, email, password, is_active, is_superuser) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(payload.username.as_ref())
        .bind(payload.email.as_ref())
        .bind(password)
        .bind(payload.is_active)
        .bind(payload.is_superuser)
        .execute(&self.executor)
        .await?;

        let id = result.last_insert_rowid();
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_one(&self.executor)
            .await
            .map_err(Error::not_found("User"))?;
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.executor)
            .await?;
        Ok(user)
    }

    pub async fn exists(&self, username: &str) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.executor)
            .await?;
        Ok(found.is_some())
    }

    /// Checks credentials of an active user
    pub async fn check_password(&self, username: &str, password: &str) -> Result<User> {
        let (id, hashed_password, is_active): (i64, Option<String>, bool) =
            sqlx::query_as("SELECT id, password, is_active FROM users WHERE username = ?")
                .bind(username)
                .fetch_one(&self.executor)
                .await
                .map_err(|e| {
                    debug!("User check error: {e}");
                    Error::InvalidCredentials
                })?;
        if !is_active {
            debug!("User {username} is not active");
            return Err(Error::InvalidCredentials);
        }
        if let Some(hashed_password) = hashed_password {
            if verify_password(password, &hashed_password).unwrap_or(false) {
                return self.get(id).await;
            }
        }
        Err(Error::InvalidCredentials)
    }

    pub async fn auth_state(&self, id: i64) -> Result<UserAuthState> {
        let state = sqlx::query_as::<_, UserAuthState>(
            "SELECT id, is_active, password FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.executor)
        .await
        .map_err(Error::not_found("User"))?;
        Ok(state)
    }

    pub async fn activate(&self, id: i64) -> Result<()> {
        let res = sqlx::query("UPDATE users SET is_active = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;
        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("User".to_string()))
        } else {
            Ok(())
        }
    }

    pub async fn change_password(&self, id: i64, password: &str) -> Result<()> {
        let password = hash_password(password)?;
        let res = sqlx::query("UPDATE users SET password = ? WHERE id = ?")
            .bind(password)
            .bind(id)
            .execute(&self.executor)
            .await?;
        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("User".to_string()))
        } else {
            Ok(())
        }
    }
}
