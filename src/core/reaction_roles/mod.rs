// Core reaction-role module - emoji on a message grants a role.

pub mod reaction_role_service;

pub use reaction_role_service::*;
