// Core auto-moderation module - per-guild content filters.
// Same split as the other features: models + service (with its storage port).

pub mod automod_models;
pub mod automod_service;

pub use automod_models::*;
pub use automod_service::*;
