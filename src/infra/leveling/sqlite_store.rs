// SQLite-backed level records and level rewards.

use crate::core::leveling::{LevelRecord, LevelReward, LevelStore, LevelingError};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteLevelStore {
    pool: Pool<Sqlite>,
}

impl SqliteLevelStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &SqliteRow) -> LevelRecord {
    LevelRecord {
        user_id: row.get::<i64, _>("user_id") as u64,
        guild_id: row.get::<i64, _>("guild_id") as u64,
        xp: row.get::<i64, _>("xp") as u64,
        level: row.get::<i64, _>("level") as u32,
    }
}

#[async_trait]
impl LevelStore for SqliteLevelStore {
    async fn get_record(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Option<LevelRecord>, LevelingError> {
        let row = sqlx::query(
            "SELECT user_id, guild_id, xp, level FROM levels WHERE user_id = ? AND guild_id = ?",
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LevelingError::StorageError(e.to_string()))?;

        Ok(row.as_ref().map(record_from_row))
    }

    async fn save_record(&self, record: &LevelRecord) -> Result<(), LevelingError> {
        sqlx::query(
            r#"
            INSERT INTO levels (user_id, guild_id, xp, level)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, guild_id) DO UPDATE SET
                xp = excluded.xp,
                level = excluded.level
            "#,
        )
        .bind(record.user_id as i64)
        .bind(record.guild_id as i64)
        .bind(record.xp as i64)
        .bind(record.level as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| LevelingError::StorageError(e.to_string()))?;

        Ok(())
    }

    async fn get_leaderboard(
        &self,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<LevelRecord>, LevelingError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, guild_id, xp, level FROM levels
            WHERE guild_id = ?
            ORDER BY level DESC, xp DESC
            LIMIT ?
            "#,
        )
        .bind(guild_id as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LevelingError::StorageError(e.to_string()))?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn set_reward(&self, guild_id: u64, reward: &LevelReward) -> Result<(), LevelingError> {
        sqlx::query(
            r#"
            INSERT INTO level_roles (guild_id, level, role_id)
            VALUES (?, ?, ?)
            ON CONFLICT(guild_id, level) DO UPDATE SET role_id = excluded.role_id
            "#,
        )
        .bind(guild_id as i64)
        .bind(reward.level as i64)
        .bind(reward.role_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| LevelingError::StorageError(e.to_string()))?;

        Ok(())
    }

    async fn get_reward(&self, guild_id: u64, level: u32) -> Result<Option<u64>, LevelingError> {
        let row = sqlx::query("SELECT role_id FROM level_roles WHERE guild_id = ? AND level = ?")
            .bind(guild_id as i64)
            .bind(level as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LevelingError::StorageError(e.to_string()))?;

        Ok(row.map(|row| row.get::<i64, _>("role_id") as u64))
    }

    async fn list_rewards(&self, guild_id: u64) -> Result<Vec<LevelReward>, LevelingError> {
        let rows =
            sqlx::query("SELECT level, role_id FROM level_roles WHERE guild_id = ? ORDER BY level")
                .bind(guild_id as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| LevelingError::StorageError(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| LevelReward {
                level: row.get::<i64, _>("level") as u32,
                role_id: row.get::<i64, _>("role_id") as u64,
            })
            .collect())
    }

    async fn remove_reward(&self, guild_id: u64, level: u32) -> Result<bool, LevelingError> {
        let result = sqlx::query("DELETE FROM level_roles WHERE guild_id = ? AND level = ?")
            .bind(guild_id as i64)
            .bind(level as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| LevelingError::StorageError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::leveling::LevelingService;
    use crate::infra::database::test_pool;

    #[tokio::test]
    async fn test_record_roundtrip() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteLevelStore::new(pool);

        let mut record = LevelRecord::new(5, 7);
        record.xp = 40;
        record.level = 3;
        store.save_record(&record).await.unwrap();
        assert_eq!(store.get_record(5, 7).await.unwrap(), Some(record.clone()));

        record.xp = 41;
        store.save_record(&record).await.unwrap();
        assert_eq!(store.get_record(5, 7).await.unwrap().unwrap().xp, 41);
        assert_eq!(store.get_record(5, 8).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_leaderboard_order_and_limit() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteLevelStore::new(pool);

        for (user, xp, level) in [(1, 90, 0), (2, 10, 2), (3, 50, 2), (4, 0, 1)] {
            store
                .save_record(&LevelRecord { user_id: user, guild_id: 1, xp, level })
                .await
                .unwrap();
        }

        let board: Vec<u64> = store
            .get_leaderboard(1, 3)
            .await
            .unwrap()
            .iter()
            .map(|r| r.user_id)
            .collect();
        assert_eq!(board, vec![3, 2, 4]);
    }

    #[tokio::test]
    async fn test_rewards_through_service() {
        let (_dir, pool) = test_pool().await;
        let service = LevelingService::new(SqliteLevelStore::new(pool));

        service.set_reward(1, 1, 900).await.unwrap();
        service.set_reward(1, 1, 901).await.unwrap();

        let event = service.award_xp(42, 1, 100).await.unwrap().unwrap();
        assert_eq!(event.new_level, 1);
        assert_eq!(event.reward_role_id, Some(901));

        assert!(service.remove_reward(1, 1).await.unwrap());
        assert!(service.list_rewards(1).await.unwrap().is_empty());
    }
}
