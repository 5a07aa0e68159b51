// SQLite-backed ticket settings and tickets.

use crate::core::tickets::{Ticket, TicketError, TicketSettings, TicketStatus, TicketStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteTicketStore {
    pool: Pool<Sqlite>,
}

impl SqliteTicketStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn ticket_from_row(row: &SqliteRow) -> Result<Ticket, TicketError> {
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");

    Ok(Ticket {
        channel_id: row.get::<i64, _>("channel_id") as u64,
        guild_id: row.get::<i64, _>("guild_id") as u64,
        owner_id: row.get::<i64, _>("owner_id") as u64,
        status: TicketStatus::parse(&status)
            .ok_or_else(|| TicketError::StorageError(format!("Unknown status '{status}'")))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| TicketError::StorageError(e.to_string()))?,
    })
}

#[async_trait]
impl TicketStore for SqliteTicketStore {
    async fn save_settings(&self, guild_id: u64, settings: &TicketSettings) -> Result<(), TicketError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO ticket_settings
                (guild_id, active_category_id, archive_category_id, panel_channel_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(guild_id as i64)
        .bind(settings.active_category_id as i64)
        .bind(settings.archive_category_id as i64)
        .bind(settings.panel_channel_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| TicketError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn get_settings(&self, guild_id: u64) -> Result<Option<TicketSettings>, TicketError> {
        let row = sqlx::query(
            r#"
            SELECT active_category_id, archive_category_id, panel_channel_id
            FROM ticket_settings WHERE guild_id = ?
            "#,
        )
        .bind(guild_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TicketError::StorageError(e.to_string()))?;

        Ok(row.map(|row| TicketSettings {
            active_category_id: row.get::<i64, _>("active_category_id") as u64,
            archive_category_id: row.get::<i64, _>("archive_category_id") as u64,
            panel_channel_id: row.get::<i64, _>("panel_channel_id") as u64,
        }))
    }

    async fn insert_ticket(&self, ticket: &Ticket) -> Result<(), TicketError> {
        sqlx::query(
            r#"
            INSERT INTO tickets (channel_id, guild_id, owner_id, status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(ticket.channel_id as i64)
        .bind(ticket.guild_id as i64)
        .bind(ticket.owner_id as i64)
        .bind(ticket.status.as_str())
        .bind(ticket.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| TicketError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn get_ticket(&self, channel_id: u64) -> Result<Option<Ticket>, TicketError> {
        let row = sqlx::query("SELECT * FROM tickets WHERE channel_id = ?")
            .bind(channel_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| TicketError::StorageError(e.to_string()))?;

        row.as_ref().map(ticket_from_row).transpose()
    }

    async fn find_open_ticket(
        &self,
        guild_id: u64,
        owner_id: u64,
    ) -> Result<Option<Ticket>, TicketError> {
        let row = sqlx::query(
            r#"
            SELECT * FROM tickets
            WHERE guild_id = ? AND owner_id = ? AND status = 'OPEN'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(guild_id as i64)
        .bind(owner_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TicketError::StorageError(e.to_string()))?;

        row.as_ref().map(ticket_from_row).transpose()
    }

    async fn set_status(&self, channel_id: u64, status: TicketStatus) -> Result<(), TicketError> {
        sqlx::query("UPDATE tickets SET status = ? WHERE channel_id = ?")
            .bind(status.as_str())
            .bind(channel_id as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| TicketError::StorageError(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::database::test_pool;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteTicketStore::new(pool);
        let settings = TicketSettings {
            active_category_id: 1,
            archive_category_id: 2,
            panel_channel_id: 3,
        };

        assert_eq!(store.get_settings(9).await.unwrap(), None);
        store.save_settings(9, &settings).await.unwrap();
        assert_eq!(store.get_settings(9).await.unwrap(), Some(settings));
    }

    #[tokio::test]
    async fn test_open_ticket_lookup() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteTicketStore::new(pool);
        let ticket = Ticket {
            channel_id: 100,
            guild_id: 9,
            owner_id: 5,
            status: TicketStatus::Open,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap(),
        };

        store.insert_ticket(&ticket).await.unwrap();
        assert_eq!(store.find_open_ticket(9, 5).await.unwrap(), Some(ticket.clone()));
        assert_eq!(store.get_ticket(100).await.unwrap(), Some(ticket));

        store.set_status(100, TicketStatus::Closed).await.unwrap();
        assert_eq!(store.find_open_ticket(9, 5).await.unwrap(), None);
        assert_eq!(
            store.get_ticket(100).await.unwrap().unwrap().status,
            TicketStatus::Closed
        );
    }
}
