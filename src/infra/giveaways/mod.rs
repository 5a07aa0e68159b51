pub mod sqlite_giveaway_store;

pub use sqlite_giveaway_store::SqliteGiveawayStore;
