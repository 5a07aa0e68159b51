// Core ticket module - private support channels opened from a panel button.

pub mod ticket_models;
pub mod ticket_service;

pub use ticket_models::*;
pub use ticket_service::*;
