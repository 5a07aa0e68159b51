// Auto-moderation domain models.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer extracts the facts it needs from a message into
// `InboundMessage` and turns a `Violation` back into Discord actions.

use serde::{Deserialize, Serialize};

/// Per-guild auto-moderation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoModSettings {
    /// Lowercased words that may not appear anywhere in a message.
    pub bad_words: Vec<String>,
    /// Block Discord invite links.
    pub anti_invite: bool,
    /// Block any http(s) link.
    pub anti_links: bool,
    /// Block messages that are mostly capital letters.
    pub anti_caps: bool,
    /// Maximum user mentions per message (0 disables the check).
    pub max_mentions: u32,
    /// Maximum emojis per message (0 disables the check).
    pub max_emojis: u32,
    /// Roles whose members bypass every filter.
    pub exempt_roles: Vec<u64>,
}

impl Default for AutoModSettings {
    fn default() -> Self {
        Self {
            bad_words: Vec::new(),
            anti_invite: true,
            anti_links: false,
            anti_caps: false,
            max_mentions: 5,
            max_emojis: 5,
            exempt_roles: Vec::new(),
        }
    }
}

/// The boolean filters that can be flipped on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleFeature {
    AntiInvite,
    AntiLinks,
    AntiCaps,
}

impl ToggleFeature {
    pub fn label(self) -> &'static str {
        match self {
            ToggleFeature::AntiInvite => "Anti-Invite",
            ToggleFeature::AntiLinks => "Anti-Links",
            ToggleFeature::AntiCaps => "Anti-Caps",
        }
    }
}

/// The numeric limits that can be configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitFeature {
    MaxMentions,
    MaxEmojis,
}

impl LimitFeature {
    pub fn label(self) -> &'static str {
        match self {
            LimitFeature::MaxMentions => "Max Mentions",
            LimitFeature::MaxEmojis => "Max Emojis",
        }
    }
}

/// Why a message was removed. Variants are listed in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    InviteLink,
    Link,
    BannedWord,
    ExcessiveCaps,
    MassMention,
    EmojiSpam,
}

impl Violation {
    /// Text appended after the author's mention in the channel warning.
    pub fn warning(self) -> &'static str {
        match self {
            Violation::InviteLink => "invite links are not allowed!",
            Violation::Link => "links are not allowed!",
            Violation::BannedWord => "that language is not allowed!",
            Violation::ExcessiveCaps => "please stop shouting!",
            Violation::MassMention => "too many mentions!",
            Violation::EmojiSpam => "too many emojis!",
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::InviteLink => write!(f, "Invite Link"),
            Violation::Link => write!(f, "Link"),
            Violation::BannedWord => write!(f, "Banned Word"),
            Violation::ExcessiveCaps => write!(f, "Excessive Caps"),
            Violation::MassMention => write!(f, "Mass Mention"),
            Violation::EmojiSpam => write!(f, "Emoji Spam"),
        }
    }
}

/// The facts about an incoming message that the evaluator looks at.
#[derive(Debug, Clone)]
pub struct InboundMessage<'a> {
    pub content: &'a str,
    /// Number of users mentioned in the message.
    pub mention_count: usize,
    /// Role ids held by the author.
    pub author_roles: &'a [u64],
    /// Whether the author has the Administrator permission (or owns the guild).
    pub author_is_admin: bool,
}
