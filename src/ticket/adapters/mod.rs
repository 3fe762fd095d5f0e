//! Adapter implementations for the ticket, takeover and message ports.

pub mod memory;
pub mod postgres;
