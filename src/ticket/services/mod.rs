//! Orchestration services for the ticket lifecycle, admin takeovers and
//! ticket message threads.

mod conflict;
mod error;
mod lifecycle;
mod messages;
mod takeover;

pub use error::{ErrorKind, TicketServiceError, TicketServiceResult};
pub use lifecycle::TicketLifecycleService;
pub use messages::TicketMessageService;
pub use takeover::TakeoverCoordinator;
