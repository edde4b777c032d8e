use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlDatabaseError, MySqlPoolOptions, MySqlRow};
use sqlx::{MySqlPool, Row};
use std::time::Duration;
use tracing::info;

/// [`UserDirectory`] backed by the `users` table:
///
/// ```sql
/// CREATE TABLE users (
///     id            CHAR(36)     NOT NULL PRIMARY KEY,
///     email         VARCHAR(255) NOT NULL UNIQUE,
///     name          VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     is_active     BOOLEAN      NOT NULL DEFAULT TRUE,
///     created_at    DATETIME(6)  NOT NULL
/// );
/// ```
pub struct MySqlUserDirectory {
    pool: MySqlPool,
}

impl MySqlUserDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserDirectory { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<MySqlPool> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await?;
        info!("mysql connected");
        Ok(pool)
    }
}

fn store_err(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn is_dup_key(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .try_downcast_ref::<MySqlDatabaseError>()
            .is_some_and(|e| e.number() == 1062), // ER_DUP_ENTRY
        _ => false,
    }
}

fn to_record(row: &MySqlRow) -> Result<UserRecord, sqlx::Error> {
    Ok(UserRecord {
        id: SubjectId(row.try_get("id")?),
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        password_hash: row.try_get("password_hash")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

const SELECT_BY_EMAIL: &str =
    "SELECT id, email, name, password_hash, is_active, created_at FROM users WHERE email = ?";
const SELECT_BY_ID: &str =
    "SELECT id, email, name, password_hash, is_active, created_at FROM users WHERE id = ?";

#[async_trait::async_trait]
impl UserDirectory for MySqlUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        sqlx::query(SELECT_BY_EMAIL)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?
            .map(|row| to_record(&row))
            .transpose()
            .map_err(store_err)
    }

    async fn find_by_id(&self, id: &SubjectId) -> Result<Option<UserRecord>, StoreError> {
        sqlx::query(SELECT_BY_ID)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?
            .map(|row| to_record(&row))
            .transpose()
            .map_err(store_err)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(count > 0)
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let record = UserRecord {
            id: SubjectId(uuid::Uuid::new_v4().to_string()),
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            is_active: true,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
INSERT INTO users (id, email, name, password_hash, is_active, created_at)
VALUES (?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(record.id.as_str())
        .bind(&record.email)
        .bind(&record.name)
        .bind(&record.password_hash)
        .bind(record.is_active)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                StoreError::Conflict
            } else {
                store_err(e)
            }
        })?;

        Ok(record)
    }
}
