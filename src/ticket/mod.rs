//! Helpdesk ticket lifecycle and admin takeover workflow.
//!
//! Employees file tickets, admins claim and close them, and ownership of an
//! active ticket moves between admins only through an accepted takeover
//! request. Every write is validated against the ticket's current row
//! version, so concurrent admins never both believe they own a ticket.
//! Message threads follow the ticket's current owner. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
