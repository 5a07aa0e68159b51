pub mod sqlite_welcome_store;

pub use sqlite_welcome_store::SqliteWelcomeStore;
