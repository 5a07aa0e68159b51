// Reaction roles: bindings of (message, emoji) -> role.
//
// The emoji is stored exactly as Discord renders it (`🎉`, `<:name:id>`),
// which is also what the gateway reaction events produce.

use async_trait::async_trait;
use thiserror::Error;

/// Discord rejects message content over this many characters.
const MESSAGE_LIMIT: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionRole {
    pub message_id: u64,
    pub emoji: String,
    pub role_id: u64,
    pub channel_id: u64,
}

#[derive(Debug, Error)]
pub enum ReactionRoleError {
    #[error("That emoji is already used for a role on this message.")]
    AlreadyBound,

    #[error("No reaction role found for that message and emoji.")]
    NotFound,

    #[error("Please provide an emoji.")]
    EmptyEmoji,

    #[error("Storage error: {0}")]
    StorageError(String),
}

#[async_trait]
pub trait ReactionRoleStore: Send + Sync {
    /// Insert a binding. Returns `false` if (message, emoji) is already bound.
    async fn insert(&self, binding: &ReactionRole) -> Result<bool, ReactionRoleError>;

    /// Returns `false` if nothing was bound.
    async fn remove(&self, message_id: u64, emoji: &str) -> Result<bool, ReactionRoleError>;

    async fn role_for(&self, message_id: u64, emoji: &str)
        -> Result<Option<u64>, ReactionRoleError>;

    async fn list_for_channel(&self, channel_id: u64)
        -> Result<Vec<ReactionRole>, ReactionRoleError>;
}

pub struct ReactionRoleService<S: ReactionRoleStore> {
    store: S,
}

impl<S: ReactionRoleStore> ReactionRoleService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn bind(
        &self,
        message_id: u64,
        emoji: &str,
        role_id: u64,
        channel_id: u64,
    ) -> Result<ReactionRole, ReactionRoleError> {
        let emoji = emoji.trim();
        if emoji.is_empty() {
            return Err(ReactionRoleError::EmptyEmoji);
        }

        let binding = ReactionRole {
            message_id,
            emoji: emoji.to_string(),
            role_id,
            channel_id,
        };

        if !self.store.insert(&binding).await? {
            return Err(ReactionRoleError::AlreadyBound);
        }
        Ok(binding)
    }

    pub async fn unbind(&self, message_id: u64, emoji: &str) -> Result<(), ReactionRoleError> {
        if self.store.remove(message_id, emoji.trim()).await? {
            Ok(())
        } else {
            Err(ReactionRoleError::NotFound)
        }
    }

    /// Role granted for a reaction, if the reaction is bound.
    pub async fn role_for(
        &self,
        message_id: u64,
        emoji: &str,
    ) -> Result<Option<u64>, ReactionRoleError> {
        self.store.role_for(message_id, emoji).await
    }

    pub async fn list_for_channel(
        &self,
        channel_id: u64,
    ) -> Result<Vec<ReactionRole>, ReactionRoleError> {
        self.store.list_for_channel(channel_id).await
    }
}

/// Build the `/rr_list` body. `role_display` turns a role id into a mention
/// (or a placeholder for deleted roles). Output is capped at Discord's limit.
pub fn render_listing(
    guild_id: u64,
    bindings: &[ReactionRole],
    role_display: impl Fn(u64) -> String,
) -> String {
    let lines: Vec<String> = bindings
        .iter()
        .map(|b| {
            format!(
                "• {} -> {} [Jump to Message](https://discord.com/channels/{}/{}/{})",
                b.emoji,
                role_display(b.role_id),
                guild_id,
                b.channel_id,
                b.message_id
            )
        })
        .collect();

    let body = format!("Active Reaction Roles:\n{}", lines.join("\n"));
    if body.chars().count() <= MESSAGE_LIMIT {
        return body;
    }

    let mut truncated: String = body.chars().take(MESSAGE_LIMIT - 10).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    #[derive(Default)]
    struct MockReactionRoleStore {
        rows: DashMap<(u64, String), ReactionRole>,
    }

    #[async_trait]
    impl ReactionRoleStore for MockReactionRoleStore {
        async fn insert(&self, binding: &ReactionRole) -> Result<bool, ReactionRoleError> {
            let key = (binding.message_id, binding.emoji.clone());
            if self.rows.contains_key(&key) {
                return Ok(false);
            }
            self.rows.insert(key, binding.clone());
            Ok(true)
        }

        async fn remove(&self, message_id: u64, emoji: &str) -> Result<bool, ReactionRoleError> {
            Ok(self.rows.remove(&(message_id, emoji.to_string())).is_some())
        }

        async fn role_for(
            &self,
            message_id: u64,
            emoji: &str,
        ) -> Result<Option<u64>, ReactionRoleError> {
            Ok(self
                .rows
                .get(&(message_id, emoji.to_string()))
                .map(|r| r.role_id))
        }

        async fn list_for_channel(
            &self,
            channel_id: u64,
        ) -> Result<Vec<ReactionRole>, ReactionRoleError> {
            Ok(self
                .rows
                .iter()
                .filter(|r| r.channel_id == channel_id)
                .map(|r| r.clone())
                .collect())
        }
    }

    #[tokio::test]
    async fn test_bind_and_lookup() {
        let service = ReactionRoleService::new(MockReactionRoleStore::default());
        service.bind(1, "🎮", 100, 5).await.unwrap();

        assert_eq!(service.role_for(1, "🎮").await.unwrap(), Some(100));
        assert_eq!(service.role_for(1, "🎨").await.unwrap(), None);
        assert_eq!(service.role_for(2, "🎮").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_same_emoji_twice_on_a_message_is_rejected() {
        let service = ReactionRoleService::new(MockReactionRoleStore::default());
        service.bind(1, "🎮", 100, 5).await.unwrap();

        assert!(matches!(
            service.bind(1, "🎮", 200, 5).await,
            Err(ReactionRoleError::AlreadyBound)
        ));
        // Same emoji on another message is fine
        service.bind(2, "🎮", 200, 5).await.unwrap();
    }

    #[tokio::test]
    async fn test_unbind() {
        let service = ReactionRoleService::new(MockReactionRoleStore::default());
        service.bind(1, "🎮", 100, 5).await.unwrap();

        service.unbind(1, "🎮").await.unwrap();
        assert!(matches!(
            service.unbind(1, "🎮").await,
            Err(ReactionRoleError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_empty_emoji_rejected() {
        let service = ReactionRoleService::new(MockReactionRoleStore::default());
        assert!(matches!(
            service.bind(1, "  ", 100, 5).await,
            Err(ReactionRoleError::EmptyEmoji)
        ));
    }

    #[test]
    fn test_listing_links_to_messages() {
        let bindings = vec![ReactionRole {
            message_id: 3,
            emoji: "🎮".to_string(),
            role_id: 42,
            channel_id: 2,
        }];

        let body = render_listing(1, &bindings, |id| format!("<@&{id}>"));
        assert_eq!(
            body,
            "Active Reaction Roles:\n• 🎮 -> <@&42> [Jump to Message](https://discord.com/channels/1/2/3)"
        );
    }

    #[test]
    fn test_listing_is_truncated() {
        let bindings: Vec<ReactionRole> = (0..100)
            .map(|i| ReactionRole {
                message_id: i,
                emoji: "🎮".to_string(),
                role_id: i,
                channel_id: 2,
            })
            .collect();

        let body = render_listing(1, &bindings, |_| "Deleted Role".to_string());
        assert!(body.chars().count() <= 2000);
        assert!(body.ends_with("..."));
    }
}
