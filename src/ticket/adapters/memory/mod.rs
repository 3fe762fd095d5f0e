//! In-memory adapters for the ticket, takeover and message ports.

mod store;

pub use store::InMemoryHelpdeskStore;
