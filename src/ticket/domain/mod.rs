//! Domain model for the ticket lifecycle and admin takeover workflow.
//!
//! Tickets move `New -> Active -> Closed`. An owning admin exists exactly
//! when the ticket is not `New`, and ownership of an `Active` ticket changes
//! hands only through an accepted takeover request. The creating employee
//! and the current owner share a message thread on the ticket.
//! Infrastructure concerns stay outside this module.

mod caller;
mod error;
mod feedback;
mod ids;
mod message;
mod page;
mod takeover;
mod ticket;

pub use caller::{Caller, CallerIdentity, UserRole};
pub use error::{AccessError, ParseTicketStatusError, TicketDomainError};
pub use feedback::Feedback;
pub use ids::{TakeoverId, TicketId, TicketMessageId, TicketVersion, UserId};
pub use message::{PersistedTicketMessageData, TicketMessage};
pub use page::{Page, PageRequest, PageSize};
pub use takeover::{PersistedTakeoverData, TakeoverDecision, TakeoverRequest};
pub use ticket::{PersistedTicketData, Ticket, TicketStatus};
