// Core join-to-create voice module.

pub mod voice_service;

pub use voice_service::*;
