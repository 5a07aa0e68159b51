// Core giveaway module - timed reaction giveaways.

pub mod giveaway_models;
pub mod giveaway_service;

pub use giveaway_models::*;
pub use giveaway_service::*;
