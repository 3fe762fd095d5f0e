//! `PostgreSQL` adapters for ticket, takeover and message persistence.

mod models;
mod repository;
mod schema;

pub use repository::{HelpdeskPgPool, PostgresHelpdeskStore};
