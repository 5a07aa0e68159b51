// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "database.rs"]
pub mod database;

#[path = "automod/mod.rs"]
pub mod automod;

#[path = "giveaways/mod.rs"]
pub mod giveaways;

#[path = "leveling/leveling_store.rs"]
pub mod leveling;

#[path = "reaction_roles/mod.rs"]
pub mod reaction_roles;

#[path = "tickets/mod.rs"]
pub mod tickets;

#[path = "voice/mod.rs"]
pub mod voice;

#[path = "welcome/mod.rs"]
pub mod welcome;
