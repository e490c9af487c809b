use crate::{Error, error::Result};
use futures::TryStreamExt as _;
use scubaclub_types::language::LanguageCode;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Language {
    pub id: i64,
    #[sqlx(try_from = "String")]
    pub code: LanguageCode,
}

pub type LanguageRepository = LanguageRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct LanguageRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> LanguageRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Creates missing supported languages, returns codes that were created
    pub async fn ensure_all(&self) -> Result<Vec<LanguageCode>> {
        let mut created = Vec::new();
        for code in LanguageCode::ALL {
            let res = sqlx::query("INSERT INTO language (code) VALUES (?) ON CONFLICT(code) DO NOTHING")
                .bind(code.as_str())
                .execute(&self.executor)
                .await?;
            if res.rows_affected() > 0 {
                debug!("Created language {code}");
                created.push(code);
            }
        }
        Ok(created)
    }

    pub async fn list(&self) -> Result<Vec<Language>> {
        let records = sqlx::query_as::<_, Language>("SELECT id, code FROM language ORDER BY code")
            .fetch(&self.executor)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(records)
    }

    pub async fn get_by_code(&self, code: LanguageCode) -> Result<Language> {
        let record = sqlx::query_as::<_, Language>("SELECT id, code FROM language WHERE code = ?")
            .bind(code.as_str())
            .fetch_one(&self.executor)
            .await
            .map_err(Error::not_found("Language"))?;
        Ok(record)
    }
}
