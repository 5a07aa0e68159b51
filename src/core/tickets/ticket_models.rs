// Ticket domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Channels created by `/ticket_setup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSettings {
    pub active_category_id: u64,
    pub archive_category_id: u64,
    pub panel_channel_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    Closed,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::Closed => "CLOSED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OPEN" => Some(TicketStatus::Open),
            "CLOSED" => Some(TicketStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub channel_id: u64,
    pub guild_id: u64,
    pub owner_id: u64,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

/// Outcome of pressing "Create Ticket".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketPreparation {
    /// The user already has an open ticket in this channel.
    Existing(u64),
    /// A new ticket channel should be created under this category.
    Create { category_id: u64 },
}

/// Channel name for a user's ticket, following Discord's text channel rules.
pub fn ticket_channel_name(username: &str) -> String {
    let mut slug = String::with_capacity(username.len());
    for c in username.to_lowercase().chars() {
        if c.is_alphanumeric() || c == '_' {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { "user" } else { slug };
    format!("ticket-{slug}").chars().take(100).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_channel_name() {
        assert_eq!(ticket_channel_name("alice"), "ticket-alice");
        assert_eq!(ticket_channel_name("Bob.The Builder"), "ticket-bob-the-builder");
        assert_eq!(ticket_channel_name("..."), "ticket-user");
        assert!(ticket_channel_name(&"z".repeat(200)).chars().count() <= 100);
    }

    #[test]
    fn test_status_text() {
        assert_eq!(TicketStatus::parse("OPEN"), Some(TicketStatus::Open));
        assert_eq!(TicketStatus::Closed.as_str(), "CLOSED");
        assert_eq!(TicketStatus::parse("open"), None);
    }
}
