// Welcome messages for new members.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WelcomeConfig {
    pub channel_id: Option<u64>,
    pub message_text: Option<String>,
}

#[derive(Debug, Error)]
pub enum WelcomeError {
    #[error("Welcome channel is not set. Use `/setwelcome` to set it.")]
    ChannelNotSet,

    #[error("The welcome message cannot be empty.")]
    EmptyMessage,

    #[error("Storage error: {0}")]
    StorageError(String),
}

#[async_trait]
pub trait WelcomeStore: Send + Sync {
    async fn get_config(&self, guild_id: u64) -> Result<Option<WelcomeConfig>, WelcomeError>;

    /// Set the channel, keeping any stored message text.
    async fn set_channel(&self, guild_id: u64, channel_id: u64) -> Result<(), WelcomeError>;

    /// Set the message text, keeping any stored channel.
    async fn set_message(&self, guild_id: u64, message: &str) -> Result<(), WelcomeError>;
}

/// Facts about the member being welcomed.
#[derive(Debug, Clone)]
pub struct WelcomeContext<'a> {
    pub user_mention: &'a str,
    pub server_name: &'a str,
    pub member_count: u64,
}

/// Body of the welcome embed. Placeholders: `{user}`, `{server}`, `{member_count}`.
pub fn render_welcome(template: Option<&str>, ctx: &WelcomeContext<'_>) -> String {
    match template {
        Some(template) => template
            .replace("{user}", ctx.user_mention)
            .replace("{server}", ctx.server_name)
            .replace("{member_count}", &ctx.member_count.to_string()),
        None => format!(
            "Hello {}, welcome to the server! We're glad to have you here.",
            ctx.user_mention
        ),
    }
}

pub struct WelcomeService<S: WelcomeStore> {
    store: S,
}

impl<S: WelcomeStore> WelcomeService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn set_channel(&self, guild_id: u64, channel_id: u64) -> Result<(), WelcomeError> {
        self.store.set_channel(guild_id, channel_id).await
    }

    pub async fn set_message(&self, guild_id: u64, message: &str) -> Result<(), WelcomeError> {
        if message.trim().is_empty() {
            return Err(WelcomeError::EmptyMessage);
        }
        self.store.set_message(guild_id, message).await
    }

    /// Channel and template to greet with, or `ChannelNotSet`.
    pub async fn greeting_target(
        &self,
        guild_id: u64,
    ) -> Result<(u64, Option<String>), WelcomeError> {
        let config = self.store.get_config(guild_id).await?.unwrap_or_default();
        let channel_id = config.channel_id.ok_or(WelcomeError::ChannelNotSet)?;
        Ok((channel_id, config.message_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    #[derive(Default)]
    struct MockWelcomeStore {
        configs: DashMap<u64, WelcomeConfig>,
    }

    #[async_trait]
    impl WelcomeStore for MockWelcomeStore {
        async fn get_config(&self, guild_id: u64) -> Result<Option<WelcomeConfig>, WelcomeError> {
            Ok(self.configs.get(&guild_id).map(|c| c.clone()))
        }

        async fn set_channel(&self, guild_id: u64, channel_id: u64) -> Result<(), WelcomeError> {
            self.configs.entry(guild_id).or_default().channel_id = Some(channel_id);
            Ok(())
        }

        async fn set_message(&self, guild_id: u64, message: &str) -> Result<(), WelcomeError> {
            self.configs.entry(guild_id).or_default().message_text = Some(message.to_string());
            Ok(())
        }
    }

    const CTX: WelcomeContext<'static> = WelcomeContext {
        user_mention: "<@1>",
        server_name: "Rustaceans",
        member_count: 42,
    };

    #[test]
    fn test_render_template() {
        let text = render_welcome(Some("Hi {user}! You are #{member_count} in {server}."), &CTX);
        assert_eq!(text, "Hi <@1>! You are #42 in Rustaceans.");
    }

    #[test]
    fn test_render_default() {
        let text = render_welcome(None, &CTX);
        assert!(text.starts_with("Hello <@1>, welcome"));
    }

    #[tokio::test]
    async fn test_message_without_channel_does_not_greet() {
        let service = WelcomeService::new(MockWelcomeStore::default());
        service.set_message(1, "Hey {user}").await.unwrap();

        assert!(matches!(
            service.greeting_target(1).await,
            Err(WelcomeError::ChannelNotSet)
        ));
    }

    #[tokio::test]
    async fn test_channel_and_message_are_set_independently() {
        let service = WelcomeService::new(MockWelcomeStore::default());
        service.set_channel(1, 50).await.unwrap();
        assert_eq!(service.greeting_target(1).await.unwrap(), (50, None));

        service.set_message(1, "Hey {user}").await.unwrap();
        service.set_channel(1, 51).await.unwrap();
        assert_eq!(
            service.greeting_target(1).await.unwrap(),
            (51, Some("Hey {user}".to_string()))
        );
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let service = WelcomeService::new(MockWelcomeStore::default());
        assert!(matches!(
            service.set_message(1, "   ").await,
            Err(WelcomeError::EmptyMessage)
        ));
    }
}
