// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "automod/mod.rs"]
pub mod automod;

#[path = "giveaways/mod.rs"]
pub mod giveaways;

#[path = "leveling/leveling_service.rs"]
pub mod leveling;

#[path = "reaction_roles/mod.rs"]
pub mod reaction_roles;

#[path = "tickets/mod.rs"]
pub mod tickets;

#[path = "voice/mod.rs"]
pub mod voice;

#[path = "welcome/mod.rs"]
pub mod welcome;
