// SQLite-backed automod settings.
//
// Lists are stored comma-joined: `bad_words` as lowercased words,
// `exempt_roles` as role ids.

use crate::core::automod::{AutoModError, AutoModSettings, AutoModStore};
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteAutoModStore {
    pool: Pool<Sqlite>,
}

impl SqliteAutoModStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn join_roles(roles: &[u64]) -> String {
    roles
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl AutoModStore for SqliteAutoModStore {
    async fn get_settings(&self, guild_id: u64) -> Result<Option<AutoModSettings>, AutoModError> {
        let row = sqlx::query(
            r#"
            SELECT bad_words, anti_invite, anti_links, anti_caps,
                   max_mentions, max_emojis, exempt_roles
            FROM automod_settings
            WHERE guild_id = ?
            "#,
        )
        .bind(guild_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AutoModError::StorageError(e.to_string()))?;

        Ok(row.map(|row| {
            let bad_words: String = row.get("bad_words");
            let exempt_roles: String = row.get("exempt_roles");

            AutoModSettings {
                bad_words: split_list(&bad_words).map(str::to_string).collect(),
                anti_invite: row.get("anti_invite"),
                anti_links: row.get("anti_links"),
                anti_caps: row.get("anti_caps"),
                max_mentions: row.get::<i64, _>("max_mentions") as u32,
                max_emojis: row.get::<i64, _>("max_emojis") as u32,
                exempt_roles: split_list(&exempt_roles)
                    .filter_map(|id| id.parse().ok())
                    .collect(),
            }
        }))
    }

    async fn save_settings(
        &self,
        guild_id: u64,
        settings: &AutoModSettings,
    ) -> Result<(), AutoModError> {
        sqlx::query(
            r#"
            INSERT INTO automod_settings
                (guild_id, bad_words, anti_invite, anti_links, anti_caps,
                 max_mentions, max_emojis, exempt_roles)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET
                bad_words = excluded.bad_words,
                anti_invite = excluded.anti_invite,
                anti_links = excluded.anti_links,
                anti_caps = excluded.anti_caps,
                max_mentions = excluded.max_mentions,
                max_emojis = excluded.max_emojis,
                exempt_roles = excluded.exempt_roles
            "#,
        )
        .bind(guild_id as i64)
        .bind(settings.bad_words.join(","))
        .bind(settings.anti_invite)
        .bind(settings.anti_links)
        .bind(settings.anti_caps)
        .bind(settings.max_mentions as i64)
        .bind(settings.max_emojis as i64)
        .bind(join_roles(&settings.exempt_roles))
        .execute(&self.pool)
        .await
        .map_err(|e| AutoModError::StorageError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::database::test_pool;

    #[tokio::test]
    async fn test_missing_guild_has_no_row() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteAutoModStore::new(pool);
        assert!(store.get_settings(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_settings_persist_and_overwrite() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteAutoModStore::new(pool);

        let mut settings = AutoModSettings {
            bad_words: vec!["foo".into(), "bar baz".into()],
            anti_links: true,
            exempt_roles: vec![11, 22],
            max_mentions: 3,
            ..Default::default()
        };
        store.save_settings(1, &settings).await.unwrap();
        assert_eq!(store.get_settings(1).await.unwrap(), Some(settings.clone()));

        settings.bad_words.clear();
        settings.exempt_roles.clear();
        settings.anti_invite = false;
        store.save_settings(1, &settings).await.unwrap();
        assert_eq!(store.get_settings(1).await.unwrap(), Some(settings));
    }

    #[tokio::test]
    async fn test_bad_words_survive_a_cold_cache() {
        use crate::core::automod::{AutoModService, InboundMessage, Violation};

        let (_dir, pool) = test_pool().await;
        let warm = AutoModService::new(SqliteAutoModStore::new(pool.clone()));
        warm.add_bad_word(1, "Bar Baz").await.unwrap();
        assert!(matches!(
            warm.add_bad_word(1, "a,").await,
            Err(AutoModError::WordContainsComma)
        ));

        let cold = AutoModService::new(SqliteAutoModStore::new(pool));
        let settings = cold.get_settings(1).await.unwrap();
        assert_eq!(settings.bad_words, vec!["bar baz".to_string()]);

        let clean = InboundMessage {
            content: "a perfectly normal message",
            mention_count: 0,
            author_roles: &[],
            author_is_admin: false,
        };
        assert_eq!(cold.check_message(1, &clean).await.unwrap(), None);

        let dirty = InboundMessage {
            content: "well bar baz then",
            ..clean
        };
        assert_eq!(
            cold.check_message(1, &dirty).await.unwrap(),
            Some(Violation::BannedWord)
        );
    }
}
