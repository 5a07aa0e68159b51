// Implementations for the leveling system.

pub mod sqlite_store;

pub use sqlite_store::SqliteLevelStore;
