// SQLite-backed join-to-create state: hubs, name templates and live temp channels.

use crate::core::voice::{TempChannel, VoiceError, VoiceStore};
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteVoiceStore {
    pool: Pool<Sqlite>,
}

impl SqliteVoiceStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoiceStore for SqliteVoiceStore {
    async fn set_hub(&self, guild_id: u64, hub_id: u64) -> Result<(), VoiceError> {
        sqlx::query(
            r#"
            INSERT INTO voice_hubs (guild_id, hub_id) VALUES (?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET hub_id = excluded.hub_id
            "#,
        )
        .bind(guild_id as i64)
        .bind(hub_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| VoiceError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn get_hub(&self, guild_id: u64) -> Result<Option<u64>, VoiceError> {
        let row = sqlx::query("SELECT hub_id FROM voice_hubs WHERE guild_id = ?")
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| VoiceError::StorageError(e.to_string()))?;

        Ok(row.map(|row| row.get::<i64, _>("hub_id") as u64))
    }

    async fn set_name_template(&self, user_id: u64, template: &str) -> Result<(), VoiceError> {
        sqlx::query(
            r#"
            INSERT INTO voice_user_settings (user_id, name) VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(user_id as i64)
        .bind(template)
        .execute(&self.pool)
        .await
        .map_err(|e| VoiceError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn get_name_template(&self, user_id: u64) -> Result<Option<String>, VoiceError> {
        let row = sqlx::query("SELECT name FROM voice_user_settings WHERE user_id = ?")
            .bind(user_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| VoiceError::StorageError(e.to_string()))?;

        Ok(row.map(|row| row.get("name")))
    }

    async fn add_temp_channel(&self, channel: &TempChannel) -> Result<(), VoiceError> {
        sqlx::query(
            "INSERT OR REPLACE INTO voice_temp_channels (channel_id, guild_id, owner_id) VALUES (?, ?, ?)",
        )
        .bind(channel.channel_id as i64)
        .bind(channel.guild_id as i64)
        .bind(channel.owner_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| VoiceError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn get_temp_channel(&self, channel_id: u64) -> Result<Option<TempChannel>, VoiceError> {
        let row = sqlx::query(
            "SELECT channel_id, guild_id, owner_id FROM voice_temp_channels WHERE channel_id = ?",
        )
        .bind(channel_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| VoiceError::StorageError(e.to_string()))?;

        Ok(row.map(|row| TempChannel {
            channel_id: row.get::<i64, _>("channel_id") as u64,
            guild_id: row.get::<i64, _>("guild_id") as u64,
            owner_id: row.get::<i64, _>("owner_id") as u64,
        }))
    }

    async fn remove_temp_channel(&self, channel_id: u64) -> Result<bool, VoiceError> {
        let result = sqlx::query("DELETE FROM voice_temp_channels WHERE channel_id = ?")
            .bind(channel_id as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| VoiceError::StorageError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::database::test_pool;

    #[tokio::test]
    async fn test_hub_is_replaced() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteVoiceStore::new(pool);

        assert_eq!(store.get_hub(1).await.unwrap(), None);
        store.set_hub(1, 10).await.unwrap();
        store.set_hub(1, 11).await.unwrap();
        assert_eq!(store.get_hub(1).await.unwrap(), Some(11));
    }

    #[tokio::test]
    async fn test_templates_and_temp_channels() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteVoiceStore::new(pool);

        store.set_name_template(5, "{user}'s cave").await.unwrap();
        assert_eq!(
            store.get_name_template(5).await.unwrap().as_deref(),
            Some("{user}'s cave")
        );

        let channel = TempChannel {
            channel_id: 300,
            guild_id: 1,
            owner_id: 5,
        };
        store.add_temp_channel(&channel).await.unwrap();
        assert_eq!(store.get_temp_channel(300).await.unwrap(), Some(channel));

        assert!(store.remove_temp_channel(300).await.unwrap());
        assert!(!store.remove_temp_channel(300).await.unwrap());
        assert_eq!(store.get_temp_channel(300).await.unwrap(), None);
    }
}
