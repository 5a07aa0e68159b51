// Join-to-create voice channels.
//
// A guild has one hub channel. Joining it spawns a temporary channel owned by
// the member; the temporary channel is deleted once the last member leaves.
// Only the owner may use the control panel of a temporary channel.

use async_trait::async_trait;
use thiserror::Error;

/// Discord caps channel names at this many characters.
pub const MAX_CHANNEL_NAME: usize = 100;
/// Highest user limit a voice channel accepts. 0 means unlimited.
pub const MAX_USER_LIMIT: u32 = 99;

/// A voice channel created from the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempChannel {
    pub channel_id: u64,
    pub guild_id: u64,
    pub owner_id: u64,
}

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("This is not a temporary voice channel.")]
    NotTempChannel,

    #[error("Only the channel owner can use these controls.")]
    NotOwner,

    #[error("Invalid number. Please enter a number between 0 and 99.")]
    InvalidLimit,

    #[error("Channel names must be between 1 and 100 characters.")]
    InvalidName,

    #[error("Storage error: {0}")]
    StorageError(String),
}

#[async_trait]
pub trait VoiceStore: Send + Sync {
    async fn set_hub(&self, guild_id: u64, hub_id: u64) -> Result<(), VoiceError>;

    async fn get_hub(&self, guild_id: u64) -> Result<Option<u64>, VoiceError>;

    async fn set_name_template(&self, user_id: u64, template: &str) -> Result<(), VoiceError>;

    async fn get_name_template(&self, user_id: u64) -> Result<Option<String>, VoiceError>;

    async fn add_temp_channel(&self, channel: &TempChannel) -> Result<(), VoiceError>;

    async fn get_temp_channel(&self, channel_id: u64) -> Result<Option<TempChannel>, VoiceError>;

    async fn remove_temp_channel(&self, channel_id: u64) -> Result<bool, VoiceError>;
}

/// What a voice state change means for the join-to-create system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoicePlan {
    /// The member joined the hub; a channel should be created for them.
    pub create_from_hub: Option<u64>,
    /// The member left this temporary channel; delete it if nobody is left.
    pub cleanup_candidate: Option<u64>,
}

/// Channel name for a member: their template with `{user}` filled in,
/// or `"<name>'s Channel"`. Always within Discord's length limit.
pub fn render_channel_name(template: Option<&str>, display_name: &str) -> String {
    let rendered = match template {
        Some(template) if !template.trim().is_empty() => {
            template.replace("{user}", display_name).trim().to_string()
        }
        _ => format!("{display_name}'s Channel"),
    };

    rendered.chars().take(MAX_CHANNEL_NAME).collect()
}

/// Parse the value typed into the user-limit modal.
pub fn parse_user_limit(input: &str) -> Result<u32, VoiceError> {
    let limit: u32 = input.trim().parse().map_err(|_| VoiceError::InvalidLimit)?;
    if limit > MAX_USER_LIMIT {
        return Err(VoiceError::InvalidLimit);
    }
    Ok(limit)
}

/// Validate the value typed into the rename modal.
pub fn validate_channel_name(input: &str) -> Result<String, VoiceError> {
    let name = input.trim();
    let len = name.chars().count();
    if len == 0 || len > MAX_CHANNEL_NAME {
        return Err(VoiceError::InvalidName);
    }
    Ok(name.to_string())
}

pub struct VoiceService<S: VoiceStore> {
    store: S,
}

impl<S: VoiceStore> VoiceService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn set_hub(&self, guild_id: u64, hub_id: u64) -> Result<(), VoiceError> {
        self.store.set_hub(guild_id, hub_id).await
    }

    pub async fn set_name_template(&self, user_id: u64, template: &str) -> Result<String, VoiceError> {
        let template = validate_channel_name(template)?;
        self.store.set_name_template(user_id, &template).await?;
        Ok(template)
    }

    /// The name a new temporary channel gets for this member.
    pub async fn channel_name_for(
        &self,
        user_id: u64,
        display_name: &str,
    ) -> Result<String, VoiceError> {
        let template = self.store.get_name_template(user_id).await?;
        Ok(render_channel_name(template.as_deref(), display_name))
    }

    /// Decide what to do about a member moving from `old` to `new`.
    pub async fn plan_update(
        &self,
        guild_id: u64,
        old_channel: Option<u64>,
        new_channel: Option<u64>,
    ) -> Result<VoicePlan, VoiceError> {
        if old_channel == new_channel {
            // Mute/deafen/stream toggles
            return Ok(VoicePlan::default());
        }

        let mut plan = VoicePlan::default();

        if let Some(joined) = new_channel {
            if self.store.get_hub(guild_id).await? == Some(joined) {
                plan.create_from_hub = Some(joined);
            }
        }

        if let Some(left) = old_channel {
            if self.store.get_temp_channel(left).await?.is_some() {
                plan.cleanup_candidate = Some(left);
            }
        }

        Ok(plan)
    }

    pub async fn register_temp_channel(&self, channel: TempChannel) -> Result<(), VoiceError> {
        tracing::debug!(
            channel_id = channel.channel_id,
            owner_id = channel.owner_id,
            "Temporary voice channel created"
        );
        self.store.add_temp_channel(&channel).await
    }

    pub async fn forget_temp_channel(&self, channel_id: u64) -> Result<bool, VoiceError> {
        self.store.remove_temp_channel(channel_id).await
    }

    /// Make sure `user_id` owns the temporary channel `channel_id`.
    pub async fn authorize_owner(
        &self,
        channel_id: u64,
        user_id: u64,
    ) -> Result<TempChannel, VoiceError> {
        let channel = self
            .store
            .get_temp_channel(channel_id)
            .await?
            .ok_or(VoiceError::NotTempChannel)?;

        if channel.owner_id != user_id {
            return Err(VoiceError::NotOwner);
        }
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    #[derive(Default)]
    struct MockVoiceStore {
        hubs: DashMap<u64, u64>,
        templates: DashMap<u64, String>,
        temp: DashMap<u64, TempChannel>,
    }

    #[async_trait]
    impl VoiceStore for MockVoiceStore {
        async fn set_hub(&self, guild_id: u64, hub_id: u64) -> Result<(), VoiceError> {
            self.hubs.insert(guild_id, hub_id);
            Ok(())
        }

        async fn get_hub(&self, guild_id: u64) -> Result<Option<u64>, VoiceError> {
            Ok(self.hubs.get(&guild_id).map(|h| *h))
        }

        async fn set_name_template(&self, user_id: u64, template: &str) -> Result<(), VoiceError> {
            self.templates.insert(user_id, template.to_string());
            Ok(())
        }

        async fn get_name_template(&self, user_id: u64) -> Result<Option<String>, VoiceError> {
            Ok(self.templates.get(&user_id).map(|t| t.clone()))
        }

        async fn add_temp_channel(&self, channel: &TempChannel) -> Result<(), VoiceError> {
            self.temp.insert(channel.channel_id, channel.clone());
            Ok(())
        }

        async fn get_temp_channel(&self, channel_id: u64) -> Result<Option<TempChannel>, VoiceError> {
            Ok(self.temp.get(&channel_id).map(|c| c.clone()))
        }

        async fn remove_temp_channel(&self, channel_id: u64) -> Result<bool, VoiceError> {
            Ok(self.temp.remove(&channel_id).is_some())
        }
    }

    async fn service_with_hub() -> VoiceService<MockVoiceStore> {
        let service = VoiceService::new(MockVoiceStore::default());
        service.set_hub(1, 100).await.unwrap();
        service
            .register_temp_channel(TempChannel {
                channel_id: 200,
                guild_id: 1,
                owner_id: 7,
            })
            .await
            .unwrap();
        service
    }

    #[test]
    fn test_render_channel_name() {
        assert_eq!(render_channel_name(None, "Ana"), "Ana's Channel");
        assert_eq!(render_channel_name(Some("{user} chills"), "Ana"), "Ana chills");
        assert_eq!(render_channel_name(Some("Lounge"), "Ana"), "Lounge");
        assert_eq!(render_channel_name(Some("   "), "Ana"), "Ana's Channel");

        let long = "x".repeat(150);
        assert_eq!(render_channel_name(Some(&long), "Ana").chars().count(), 100);
    }

    #[test]
    fn test_parse_user_limit() {
        assert_eq!(parse_user_limit("0").unwrap(), 0);
        assert_eq!(parse_user_limit(" 99 ").unwrap(), 99);
        assert!(matches!(parse_user_limit("100"), Err(VoiceError::InvalidLimit)));
        assert!(matches!(parse_user_limit("-1"), Err(VoiceError::InvalidLimit)));
        assert!(matches!(parse_user_limit("ten"), Err(VoiceError::InvalidLimit)));
    }

    #[test]
    fn test_validate_channel_name() {
        assert_eq!(validate_channel_name("  Gaming ").unwrap(), "Gaming");
        assert!(validate_channel_name("").is_err());
        assert!(validate_channel_name(&"y".repeat(101)).is_err());
    }

    #[tokio::test]
    async fn test_joining_hub_plans_creation() {
        let service = service_with_hub().await;

        let plan = service.plan_update(1, None, Some(100)).await.unwrap();
        assert_eq!(plan.create_from_hub, Some(100));
        assert_eq!(plan.cleanup_candidate, None);

        // Another guild's hub id means nothing here
        let plan = service.plan_update(2, None, Some(100)).await.unwrap();
        assert_eq!(plan, VoicePlan::default());
    }

    #[tokio::test]
    async fn test_leaving_temp_channel_plans_cleanup() {
        let service = service_with_hub().await;

        let plan = service.plan_update(1, Some(200), None).await.unwrap();
        assert_eq!(plan.cleanup_candidate, Some(200));

        // Moving from the temp channel straight into the hub does both
        let plan = service.plan_update(1, Some(200), Some(100)).await.unwrap();
        assert_eq!(plan.create_from_hub, Some(100));
        assert_eq!(plan.cleanup_candidate, Some(200));

        // Mute toggles inside the channel are ignored
        let plan = service.plan_update(1, Some(200), Some(200)).await.unwrap();
        assert_eq!(plan, VoicePlan::default());
    }

    #[tokio::test]
    async fn test_owner_authorization() {
        let service = service_with_hub().await;

        assert!(service.authorize_owner(200, 7).await.is_ok());
        assert!(matches!(
            service.authorize_owner(200, 8).await,
            Err(VoiceError::NotOwner)
        ));
        assert!(matches!(
            service.authorize_owner(100, 7).await,
            Err(VoiceError::NotTempChannel)
        ));

        assert!(service.forget_temp_channel(200).await.unwrap());
        assert!(matches!(
            service.authorize_owner(200, 7).await,
            Err(VoiceError::NotTempChannel)
        ));
    }

    #[tokio::test]
    async fn test_name_template_is_used() {
        let service = service_with_hub().await;
        assert_eq!(service.channel_name_for(7, "Bo").await.unwrap(), "Bo's Channel");

        service.set_name_template(7, "{user}'s den").await.unwrap();
        assert_eq!(service.channel_name_for(7, "Bo").await.unwrap(), "Bo's den");
    }
}
