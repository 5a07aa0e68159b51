pub mod welcome_service;

pub use welcome_service::*;
