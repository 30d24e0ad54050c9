//! System configuration repository: key→value tunables

use sqlx::{Pool, Postgres};

use crate::error::AppResult;

#[derive(Clone)]
pub struct SystemConfigRepository {
    pool: Pool<Postgres>,
}

impl SystemConfigRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Raw value for a key, if present. Callers apply their own fallbacks.
    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM system_config WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    /// All entries, for the settings surface
    pub async fn get_all(&self) -> AppResult<Vec<(String, String)>> {
        let entries = sqlx::query_as::<_, (String, String)>(
            "SELECT key, value FROM system_config ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Upsert one entry
    pub async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO system_config (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
