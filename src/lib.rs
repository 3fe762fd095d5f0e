//! Helpdesk: ticket lifecycle and admin takeover coordination.
//!
//! Employees report problems as tickets. Admins claim new tickets, close
//! the ones they own, and hand active tickets to one another through
//! takeover requests that only the current owner may decide. The employee
//! and the owning admin talk on a message thread attached to the ticket.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business rules with no infrastructure dependencies
//! - **Ports**: Abstract repository traits
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//! - **Services**: Identity checks and optimistic read, validate, write cycles
//!
//! # Modules
//!
//! - [`config`]: Environment-driven runtime settings
//! - [`ticket`]: Ticket state machine, takeover protocol, message threads
//!   and services

pub mod config;
pub mod ticket;
