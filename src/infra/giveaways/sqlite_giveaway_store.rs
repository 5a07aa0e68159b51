// SQLite-backed giveaways. `end_time` is stored as unix seconds so the due
// scan is a plain integer comparison.

use crate::core::giveaways::{Giveaway, GiveawayError, GiveawayStatus, GiveawayStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteGiveawayStore {
    pool: Pool<Sqlite>,
}

impl SqliteGiveawayStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn giveaway_from_row(row: &SqliteRow) -> Result<Giveaway, GiveawayError> {
    let end_time = row.get::<i64, _>("end_time");
    let status: String = row.get("status");

    Ok(Giveaway {
        message_id: row.get::<i64, _>("message_id") as u64,
        channel_id: row.get::<i64, _>("channel_id") as u64,
        guild_id: row.get::<i64, _>("guild_id") as u64,
        prize: row.get("prize"),
        end_time: DateTime::from_timestamp(end_time, 0).ok_or_else(|| {
            GiveawayError::StorageError(format!("Invalid end_time {end_time}"))
        })?,
        winners_count: row.get::<i64, _>("winners_count") as u32,
        status: GiveawayStatus::parse(&status)
            .ok_or_else(|| GiveawayError::StorageError(format!("Unknown status '{status}'")))?,
    })
}

#[async_trait]
impl GiveawayStore for SqliteGiveawayStore {
    async fn insert(&self, giveaway: &Giveaway) -> Result<(), GiveawayError> {
        sqlx::query(
            r#"
            INSERT INTO giveaways
                (message_id, channel_id, guild_id, prize, end_time, winners_count, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(giveaway.message_id as i64)
        .bind(giveaway.channel_id as i64)
        .bind(giveaway.guild_id as i64)
        .bind(&giveaway.prize)
        .bind(giveaway.end_time.timestamp())
        .bind(giveaway.winners_count as i64)
        .bind(giveaway.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| GiveawayError::StorageError(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, message_id: u64) -> Result<Option<Giveaway>, GiveawayError> {
        let row = sqlx::query("SELECT * FROM giveaways WHERE message_id = ?")
            .bind(message_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| GiveawayError::StorageError(e.to_string()))?;

        row.as_ref().map(giveaway_from_row).transpose()
    }

    async fn mark_ended(&self, message_id: u64) -> Result<bool, GiveawayError> {
        let result = sqlx::query(
            "UPDATE giveaways SET status = 'ended' WHERE message_id = ? AND status = 'active'",
        )
        .bind(message_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| GiveawayError::StorageError(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Giveaway>, GiveawayError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM giveaways
            WHERE status = 'active' AND end_time <= ?
            ORDER BY end_time
            "#,
        )
        .bind(now.timestamp())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GiveawayError::StorageError(e.to_string()))?;

        rows.iter().map(giveaway_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::database::test_pool;
    use chrono::TimeZone;

    fn giveaway(message_id: u64, end_time: DateTime<Utc>) -> Giveaway {
        Giveaway {
            message_id,
            channel_id: 2,
            guild_id: 3,
            prize: "Steam key".to_string(),
            end_time,
            winners_count: 2,
            status: GiveawayStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteGiveawayStore::new(pool);
        let end = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();

        store.insert(&giveaway(1, end)).await.unwrap();
        assert_eq!(store.get(1).await.unwrap(), Some(giveaway(1, end)));
        assert_eq!(store.get(2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_due_scan_and_single_transition() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteGiveawayStore::new(pool);
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();

        store.insert(&giveaway(1, now - chrono::Duration::seconds(5))).await.unwrap();
        store.insert(&giveaway(2, now)).await.unwrap();
        store.insert(&giveaway(3, now + chrono::Duration::seconds(5))).await.unwrap();

        let due: Vec<u64> = store
            .find_due(now)
            .await
            .unwrap()
            .iter()
            .map(|g| g.message_id)
            .collect();
        assert_eq!(due, vec![1, 2]);

        assert!(store.mark_ended(1).await.unwrap());
        assert!(!store.mark_ended(1).await.unwrap());
        assert!(!store.mark_ended(99).await.unwrap());

        let due = store.find_due(now).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(store.get(1).await.unwrap().unwrap().status, GiveawayStatus::Ended);
    }
}
