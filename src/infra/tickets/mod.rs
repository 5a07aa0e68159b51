pub mod sqlite_ticket_store;

pub use sqlite_ticket_store::SqliteTicketStore;
