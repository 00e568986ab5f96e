//! SQLite persistence for memo.
//!
//! [`SqliteGateway`] implements [`memo_core::gateway::Gateway`] over a single
//! connection. The schema is created from a static table list when the
//! database is opened.

mod constraint;
pub mod gateway;
pub mod schema;

pub use gateway::SqliteGateway;
