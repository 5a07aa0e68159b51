// Auto-moderation service - core business logic for content filtering.
//
// This service handles:
// - Per-guild settings with a write-through cache
// - The ordered filter chain (first violation wins)
// - Banned word / exempt role list management
//
// NO Discord dependencies here - just pure domain logic.

use super::automod_models::{AutoModSettings, InboundMessage, LimitFeature, ToggleFeature, Violation};
use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static INVITE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"discord(?:\.gg|\.com/invite)/").expect("valid invite regex")
});

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("valid link regex"));

static CUSTOM_EMOJI_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<a?:[^:\s]+:[0-9]+>").expect("valid custom emoji regex"));

/// Messages must be longer than this before the caps filter looks at them.
const CAPS_MIN_LENGTH: usize = 10;
const CAPS_RATIO: f64 = 0.7;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AutoModError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Please specify a word.")]
    EmptyWord,

    #[error("Banned words cannot contain commas.")]
    WordContainsComma,

    #[error("'{0}' is already in the list.")]
    WordAlreadyListed(String),

    #[error("'{0}' is not in the list.")]
    WordNotListed(String),

    #[error("Role is already exempt.")]
    RoleAlreadyExempt,

    #[error("Role is not exempt.")]
    RoleNotExempt,
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait AutoModStore: Send + Sync {
    /// Load settings for a guild, `None` if the guild never saved any.
    async fn get_settings(&self, guild_id: u64) -> Result<Option<AutoModSettings>, AutoModError>;

    /// Replace the settings row for a guild.
    async fn save_settings(
        &self,
        guild_id: u64,
        settings: &AutoModSettings,
    ) -> Result<(), AutoModError>;
}

// ============================================================================
// EVALUATOR
// ============================================================================

/// Administrators and holders of an exempt role bypass every filter.
pub fn is_exempt(settings: &AutoModSettings, message: &InboundMessage<'_>) -> bool {
    message.author_is_admin
        || message
            .author_roles
            .iter()
            .any(|role| settings.exempt_roles.contains(role))
}

/// Run the filter chain over a message. Returns the first violation found.
pub fn evaluate(settings: &AutoModSettings, message: &InboundMessage<'_>) -> Option<Violation> {
    if is_exempt(settings, message) {
        return None;
    }

    let raw = message.content;
    let content = raw.to_lowercase();

    if settings.anti_invite && INVITE_PATTERN.is_match(&content) {
        return Some(Violation::InviteLink);
    }

    if settings.anti_links && LINK_PATTERN.is_match(&content) {
        return Some(Violation::Link);
    }

    if settings
        .bad_words
        .iter()
        .filter(|word| !word.is_empty())
        .any(|word| content.contains(word.as_str()))
    {
        return Some(Violation::BannedWord);
    }

    if settings.anti_caps && is_shouting(raw) {
        return Some(Violation::ExcessiveCaps);
    }

    if settings.max_mentions > 0 && message.mention_count > settings.max_mentions as usize {
        return Some(Violation::MassMention);
    }

    if settings.max_emojis > 0 && count_emojis(raw) > settings.max_emojis as usize {
        return Some(Violation::EmojiSpam);
    }

    None
}

/// More than 70% of the letters are uppercase, for messages over 10 chars.
fn is_shouting(content: &str) -> bool {
    if content.chars().count() <= CAPS_MIN_LENGTH {
        return false;
    }

    let letters = content.chars().filter(|c| c.is_alphabetic()).count();
    if letters == 0 {
        return false;
    }

    let upper = content.chars().filter(|c| c.is_uppercase()).count();
    upper as f64 / letters as f64 > CAPS_RATIO
}

/// Custom emojis (`<:name:id>` / `<a:name:id>`) plus unicode emoticons.
pub fn count_emojis(content: &str) -> usize {
    let custom = CUSTOM_EMOJI_PATTERN.find_iter(content).count();
    let unicode = content
        .chars()
        .filter(|c| ('\u{1F600}'..='\u{1F64F}').contains(c))
        .count();
    custom + unicode
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Auto-moderation service with a per-guild settings cache.
pub struct AutoModService<S: AutoModStore> {
    store: S,
    cache: DashMap<u64, AutoModSettings>,
}

impl<S: AutoModStore> AutoModService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: DashMap::new(),
        }
    }

    /// Settings for a guild. Defaults are used (and cached) when nothing is stored.
    pub async fn get_settings(&self, guild_id: u64) -> Result<AutoModSettings, AutoModError> {
        if let Some(cached) = self.cache.get(&guild_id) {
            return Ok(cached.clone());
        }

        let settings = self
            .store
            .get_settings(guild_id)
            .await?
            .unwrap_or_default();

        self.cache.insert(guild_id, settings.clone());
        Ok(settings)
    }

    /// Persist settings and refresh the cache.
    pub async fn save_settings(
        &self,
        guild_id: u64,
        settings: AutoModSettings,
    ) -> Result<(), AutoModError> {
        self.store.save_settings(guild_id, &settings).await?;
        self.cache.insert(guild_id, settings);
        Ok(())
    }

    /// Check a message against its guild's settings.
    pub async fn check_message(
        &self,
        guild_id: u64,
        message: &InboundMessage<'_>,
    ) -> Result<Option<Violation>, AutoModError> {
        let settings = self.get_settings(guild_id).await?;
        let violation = evaluate(&settings, message);

        if let Some(violation) = violation {
            tracing::debug!(guild_id, %violation, "Automod violation");
        }

        Ok(violation)
    }

    /// Flip a boolean filter. Returns the new value.
    pub async fn toggle(&self, guild_id: u64, feature: ToggleFeature) -> Result<bool, AutoModError> {
        let mut settings = self.get_settings(guild_id).await?;
        let flag = match feature {
            ToggleFeature::AntiInvite => &mut settings.anti_invite,
            ToggleFeature::AntiLinks => &mut settings.anti_links,
            ToggleFeature::AntiCaps => &mut settings.anti_caps,
        };
        *flag = !*flag;
        let enabled = *flag;

        self.save_settings(guild_id, settings).await?;
        Ok(enabled)
    }

    pub async fn set_limit(
        &self,
        guild_id: u64,
        feature: LimitFeature,
        limit: u32,
    ) -> Result<(), AutoModError> {
        let mut settings = self.get_settings(guild_id).await?;
        match feature {
            LimitFeature::MaxMentions => settings.max_mentions = limit,
            LimitFeature::MaxEmojis => settings.max_emojis = limit,
        }
        self.save_settings(guild_id, settings).await
    }

    /// Add a banned word. Returns the normalized word that was stored.
    pub async fn add_bad_word(&self, guild_id: u64, word: &str) -> Result<String, AutoModError> {
        let word = normalize_word(word)?;
        let mut settings = self.get_settings(guild_id).await?;

        if settings.bad_words.contains(&word) {
            return Err(AutoModError::WordAlreadyListed(word));
        }

        settings.bad_words.push(word.clone());
        self.save_settings(guild_id, settings).await?;
        Ok(word)
    }

    /// Remove a banned word. Returns the normalized word that was removed.
    pub async fn remove_bad_word(&self, guild_id: u64, word: &str) -> Result<String, AutoModError> {
        let word = normalize_word(word)?;
        let mut settings = self.get_settings(guild_id).await?;

        let Some(index) = settings.bad_words.iter().position(|w| *w == word) else {
            return Err(AutoModError::WordNotListed(word));
        };

        settings.bad_words.remove(index);
        self.save_settings(guild_id, settings).await?;
        Ok(word)
    }

    pub async fn add_exempt_role(&self, guild_id: u64, role_id: u64) -> Result<(), AutoModError> {
        let mut settings = self.get_settings(guild_id).await?;
        if settings.exempt_roles.contains(&role_id) {
            return Err(AutoModError::RoleAlreadyExempt);
        }
        settings.exempt_roles.push(role_id);
        self.save_settings(guild_id, settings).await
    }

    pub async fn remove_exempt_role(&self, guild_id: u64, role_id: u64) -> Result<(), AutoModError> {
        let mut settings = self.get_settings(guild_id).await?;
        let Some(index) = settings.exempt_roles.iter().position(|r| *r == role_id) else {
            return Err(AutoModError::RoleNotExempt);
        };
        settings.exempt_roles.remove(index);
        self.save_settings(guild_id, settings).await
    }
}

/// Words are stored comma-joined, so a comma would split one entry into
/// several on reload.
fn normalize_word(word: &str) -> Result<String, AutoModError> {
    let word = word.trim().to_lowercase();
    if word.is_empty() {
        Err(AutoModError::EmptyWord)
    } else if word.contains(',') {
        Err(AutoModError::WordContainsComma)
    } else {
        Ok(word)
    }
}

// ============================================================================
// TESTS
// ============================================================================
