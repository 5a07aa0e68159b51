// SQLite-backed welcome configuration. Channel and message are set independently.

use crate::core::welcome::{WelcomeConfig, WelcomeError, WelcomeStore};
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteWelcomeStore {
    pool: Pool<Sqlite>,
}

impl SqliteWelcomeStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WelcomeStore for SqliteWelcomeStore {
    async fn get_config(&self, guild_id: u64) -> Result<Option<WelcomeConfig>, WelcomeError> {
        let row = sqlx::query("SELECT channel_id, message_text FROM welcome_config WHERE guild_id = ?")
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| WelcomeError::StorageError(e.to_string()))?;

        Ok(row.map(|row| WelcomeConfig {
            channel_id: row
                .get::<Option<i64>, _>("channel_id")
                .map(|id| id as u64),
            message_text: row.get("message_text"),
        }))
    }

    async fn set_channel(&self, guild_id: u64, channel_id: u64) -> Result<(), WelcomeError> {
        sqlx::query(
            r#"
            INSERT INTO welcome_config (guild_id, channel_id) VALUES (?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET channel_id = excluded.channel_id
            "#,
        )
        .bind(guild_id as i64)
        .bind(channel_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| WelcomeError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn set_message(&self, guild_id: u64, message: &str) -> Result<(), WelcomeError> {
        sqlx::query(
            r#"
            INSERT INTO welcome_config (guild_id, message_text) VALUES (?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET message_text = excluded.message_text
            "#,
        )
        .bind(guild_id as i64)
        .bind(message)
        .execute(&self.pool)
        .await
        .map_err(|e| WelcomeError::StorageError(e.to_string()))?;
        Ok(())
    }
}
