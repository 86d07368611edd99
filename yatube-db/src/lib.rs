pub mod client;
pub mod memory;
mod record;
pub mod store;

pub use client::DbClient;
pub use memory::MemoryStore;
pub use store::{DbError, FeedFilter, Result, Store};

/// Schema of the PostgreSQL store, applied by [`DbClient::migrate`].
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
