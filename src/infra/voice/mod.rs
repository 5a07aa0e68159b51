pub mod sqlite_voice_store;

pub use sqlite_voice_store::SqliteVoiceStore;
