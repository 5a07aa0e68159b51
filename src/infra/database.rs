// Shared SQLite database: one file, one pool, every feature table.
//
// Each feature store receives a clone of the pool. Tables are created with
// `IF NOT EXISTS`, so `migrate` is safe to run on every start.

use anyhow::Context as _;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS automod_settings (
        guild_id INTEGER PRIMARY KEY,
        bad_words TEXT NOT NULL DEFAULT '',
        anti_invite BOOLEAN NOT NULL DEFAULT 1,
        anti_links BOOLEAN NOT NULL DEFAULT 0,
        anti_caps BOOLEAN NOT NULL DEFAULT 0,
        max_mentions INTEGER NOT NULL DEFAULT 5,
        max_emojis INTEGER NOT NULL DEFAULT 5,
        exempt_roles TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS giveaways (
        message_id INTEGER PRIMARY KEY,
        channel_id INTEGER NOT NULL,
        guild_id INTEGER NOT NULL,
        prize TEXT NOT NULL,
        end_time INTEGER NOT NULL,
        winners_count INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'active'
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_giveaways_status_end
        ON giveaways(status, end_time)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS levels (
        user_id INTEGER NOT NULL,
        guild_id INTEGER NOT NULL,
        xp INTEGER NOT NULL DEFAULT 0,
        level INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (user_id, guild_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS level_roles (
        guild_id INTEGER NOT NULL,
        level INTEGER NOT NULL,
        role_id INTEGER NOT NULL,
        PRIMARY KEY (guild_id, level)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reaction_roles (
        message_id INTEGER NOT NULL,
        emoji TEXT NOT NULL,
        role_id INTEGER NOT NULL,
        channel_id INTEGER NOT NULL,
        PRIMARY KEY (message_id, emoji)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS voice_hubs (
        guild_id INTEGER PRIMARY KEY,
        hub_id INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS voice_user_settings (
        user_id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS voice_temp_channels (
        channel_id INTEGER PRIMARY KEY,
        guild_id INTEGER NOT NULL,
        owner_id INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ticket_settings (
        guild_id INTEGER PRIMARY KEY,
        active_category_id INTEGER NOT NULL,
        archive_category_id INTEGER NOT NULL,
        panel_channel_id INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tickets (
        channel_id INTEGER PRIMARY KEY,
        guild_id INTEGER NOT NULL,
        owner_id INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'OPEN',
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_tickets_owner
        ON tickets(guild_id, owner_id, status)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS welcome_config (
        guild_id INTEGER PRIMARY KEY,
        channel_id INTEGER,
        message_text TEXT
    )
    "#,
];

pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (or create) the database file at `path`.
    pub async fn connect(path: &str) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite://{}?mode=rwc", path))
            .await
            .with_context(|| format!("Failed to open database at {path}"))?;

        Ok(Self { pool })
    }

    /// Create every table the bot uses.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to run database migration")?;
        }
        Ok(())
    }

    pub fn pool(&self) -> Pool<Sqlite> {
        self.pool.clone()
    }
}

/// A migrated database in a temporary directory. Keep the `TempDir` alive
/// for as long as the pool is used.
#[cfg(test)]
pub async fn test_pool() -> (tempfile::TempDir, Pool<Sqlite>) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    let db = Database::connect(path.to_str().unwrap()).await.unwrap();
    db.migrate().await.unwrap();
    (dir, db.pool())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bot.db");
        let db = Database::connect(path.to_str().unwrap()).await.unwrap();

        db.migrate().await.unwrap();
        db.migrate().await.unwrap();
        assert!(path.exists());

        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_one(&db.pool())
        .await
        .unwrap();
        assert_eq!(row.get::<i64, _>("n"), 11);
    }
}
