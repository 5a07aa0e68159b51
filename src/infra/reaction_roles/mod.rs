pub mod sqlite_reaction_role_store;

pub use sqlite_reaction_role_store::SqliteReactionRoleStore;
