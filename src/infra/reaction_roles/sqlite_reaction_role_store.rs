// SQLite-backed reaction-role bindings, keyed by (message_id, emoji).

use crate::core::reaction_roles::{ReactionRole, ReactionRoleError, ReactionRoleStore};
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteReactionRoleStore {
    pool: Pool<Sqlite>,
}

impl SqliteReactionRoleStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReactionRoleStore for SqliteReactionRoleStore {
    async fn insert(&self, binding: &ReactionRole) -> Result<bool, ReactionRoleError> {
        let result = sqlx::query(
            r#"
            INSERT INTO reaction_roles (message_id, emoji, role_id, channel_id)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(message_id, emoji) DO NOTHING
            "#,
        )
        .bind(binding.message_id as i64)
        .bind(&binding.emoji)
        .bind(binding.role_id as i64)
        .bind(binding.channel_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| ReactionRoleError::StorageError(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove(&self, message_id: u64, emoji: &str) -> Result<bool, ReactionRoleError> {
        let result = sqlx::query("DELETE FROM reaction_roles WHERE message_id = ? AND emoji = ?")
            .bind(message_id as i64)
            .bind(emoji)
            .execute(&self.pool)
            .await
            .map_err(|e| ReactionRoleError::StorageError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn role_for(
        &self,
        message_id: u64,
        emoji: &str,
    ) -> Result<Option<u64>, ReactionRoleError> {
        let row =
            sqlx::query("SELECT role_id FROM reaction_roles WHERE message_id = ? AND emoji = ?")
                .bind(message_id as i64)
                .bind(emoji)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| ReactionRoleError::StorageError(e.to_string()))?;

        Ok(row.map(|row| row.get::<i64, _>("role_id") as u64))
    }

    async fn list_for_channel(
        &self,
        channel_id: u64,
    ) -> Result<Vec<ReactionRole>, ReactionRoleError> {
        let rows = sqlx::query(
            r#"
            SELECT message_id, emoji, role_id, channel_id FROM reaction_roles
            WHERE channel_id = ?
            ORDER BY message_id, emoji
            "#,
        )
        .bind(channel_id as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ReactionRoleError::StorageError(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| ReactionRole {
                message_id: row.get::<i64, _>("message_id") as u64,
                emoji: row.get("emoji"),
                role_id: row.get::<i64, _>("role_id") as u64,
                channel_id: row.get::<i64, _>("channel_id") as u64,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::database::test_pool;

    fn binding(message_id: u64, emoji: &str, channel_id: u64) -> ReactionRole {
        ReactionRole {
            message_id,
            emoji: emoji.to_string(),
            role_id: 77,
            channel_id,
        }
    }

    #[tokio::test]
    async fn test_duplicate_binding_reports_false() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteReactionRoleStore::new(pool);

        assert!(store.insert(&binding(1, "🔥", 5)).await.unwrap());
        assert!(!store.insert(&binding(1, "🔥", 5)).await.unwrap());
        assert!(store.insert(&binding(1, "<:ferris:123>", 5)).await.unwrap());

        assert_eq!(store.role_for(1, "🔥").await.unwrap(), Some(77));
        assert_eq!(store.role_for(1, "🌊").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_channel() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteReactionRoleStore::new(pool);

        store.insert(&binding(1, "🔥", 5)).await.unwrap();
        store.insert(&binding(2, "🔥", 6)).await.unwrap();

        let listed = store.list_for_channel(5).await.unwrap();
        assert_eq!(listed, vec![binding(1, "🔥", 5)]);

        assert!(store.remove(1, "🔥").await.unwrap());
        assert!(!store.remove(1, "🔥").await.unwrap());
        assert!(store.list_for_channel(5).await.unwrap().is_empty());
    }
}
