//! Port contracts for ticket, takeover and message persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by the ticket
//! services. Every mutating method is one unit of work: implementations
//! apply all of it or none of it.

pub mod repository;

pub use repository::{
    TakeoverRepository, TicketMessageRepository, TicketRepository, TicketRepositoryError,
    TicketRepositoryResult,
};
