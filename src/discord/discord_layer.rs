// Discord layer - commands, event handlers and component interactions.
//
// Everything in here is a thin adapter: it pulls facts out of serenity types,
// asks a core service what to do, and turns the answer back into Discord calls.

use std::sync::Arc;

use crate::core::automod::AutoModService;
use crate::core::giveaways::GiveawayService;
use crate::core::leveling::LevelingService;
use crate::core::reaction_roles::ReactionRoleService;
use crate::core::tickets::TicketService;
use crate::core::voice::VoiceService;
use crate::core::welcome::WelcomeService;
use crate::infra::automod::SqliteAutoModStore;
use crate::infra::giveaways::SqliteGiveawayStore;
use crate::infra::leveling::SqliteLevelStore;
use crate::infra::reaction_roles::SqliteReactionRoleStore;
use crate::infra::tickets::SqliteTicketStore;
use crate::infra::voice::SqliteVoiceStore;
use crate::infra::welcome::SqliteWelcomeStore;

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "moderation/commands.rs"]
pub mod moderation;

#[path = "moderation/automod_handler.rs"]
pub mod automod_handler;

#[path = "leveling/leveling_announcements.rs"]
pub mod leveling_announcements;

#[path = "giveaways/giveaway_runner.rs"]
pub mod giveaway_runner;

#[path = "reaction_roles/reaction_events.rs"]
pub mod reaction_events;

#[path = "voice/voice_events.rs"]
pub mod voice_events;

#[path = "voice/voice_panel.rs"]
pub mod voice_panel;

#[path = "tickets/ticket_panel.rs"]
pub mod ticket_panel;

#[path = "welcome/welcome_events.rs"]
pub mod welcome_events;

#[path = "interactions.rs"]
pub mod interactions;

#[path = "replies.rs"]
pub mod replies;

// Type aliases for convenience
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state passed to every command and event handler.
///
/// Services are wrapped in `Arc` so the giveaway poller can hold its own handle.
pub struct Data {
    pub automod: Arc<AutoModService<SqliteAutoModStore>>,
    pub giveaways: Arc<GiveawayService<SqliteGiveawayStore>>,
    pub leveling: Arc<LevelingService<SqliteLevelStore>>,
    pub reaction_roles: Arc<ReactionRoleService<SqliteReactionRoleStore>>,
    pub tickets: Arc<TicketService<SqliteTicketStore>>,
    pub voice: Arc<VoiceService<SqliteVoiceStore>>,
    pub welcome: Arc<WelcomeService<SqliteWelcomeStore>>,
}
