use futures::TryStreamExt as _;
use sqlx::Executor;

const TEST_USERS: &str = r#"
INSERT INTO users (id, username, email, password, is_active) VALUES (1, 'ivan', 'ivan@example.com', NULL, 1);
INSERT INTO users (id, username, email, password, is_active) VALUES (2, 'petra', 'petra@example.com', NULL, 1);
INSERT INTO users (id, username, email, password, is_active) VALUES (3, 'karel', 'karel@example.com', NULL, 1);
INSERT INTO country (id, iso_code) VALUES (1, 'NLD');
INSERT INTO country (id, iso_code) VALUES (2, 'BEL');
"#;

pub async fn init_db() -> sqlx::Pool<sqlx::Sqlite> {
    const DB_URL: &str = "sqlite::memory:";
    let conn = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(DB_URL)
        .await
        .unwrap();
    conn.execute("PRAGMA foreign_keys = ON").await.unwrap();
    seed(&conn).await;
    conn
}

/// Database file in `dir`, pool with several connections
#[allow(dead_code)]
pub async fn init_file_db(dir: &std::path::Path) -> sqlx::Pool<sqlx::Sqlite> {
    let url = format!("sqlite://{}", dir.join("scubaclub.db").display());
    let conn = scubaclub_dal::new_pool(&url).await.unwrap();
    seed(&conn).await;
    conn
}

async fn seed(conn: &sqlx::Pool<sqlx::Sqlite>) {
    scubaclub_dal::prepare_db(conn).await.unwrap();
    conn.execute_many(TEST_USERS)
        .try_collect::<Vec<_>>()
        .await
        .unwrap();
}
