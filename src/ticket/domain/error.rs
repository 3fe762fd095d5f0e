//! Error types for ticket domain validation and parsing.

use super::{TakeoverId, TicketId, TicketStatus, UserId, UserRole};
use thiserror::Error;

/// Business-rule violations raised by the ticket and takeover aggregates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TicketDomainError {
    /// The ticket title is empty after trimming.
    #[error("ticket title must not be empty")]
    EmptyTitle,

    /// The ticket description is empty after trimming.
    #[error("ticket description must not be empty")]
    EmptyDescription,

    /// The requested status change is not permitted from the current status.
    #[error("ticket {ticket_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Ticket being transitioned.
        ticket_id: TicketId,
        /// Current status.
        from: TicketStatus,
        /// Attempted target status.
        to: TicketStatus,
    },

    /// The caller is not the admin currently owning the ticket.
    #[error("user {user_id} is not the owning admin of ticket {ticket_id}")]
    NotOwningAdmin {
        /// Ticket whose ownership was checked.
        ticket_id: TicketId,
        /// Caller that failed the check.
        user_id: UserId,
    },

    /// The caller is not the employee who created the ticket.
    #[error("user {user_id} did not create ticket {ticket_id}")]
    NotTicketCreator {
        /// Ticket whose creator was checked.
        ticket_id: TicketId,
        /// Caller that failed the check.
        user_id: UserId,
    },

    /// Closed tickets are read-only apart from feedback.
    #[error("ticket {0} is closed and can no longer be edited")]
    TicketClosed(TicketId),

    /// Feedback can only be attached to a closed ticket.
    #[error("feedback requires ticket {0} to be closed")]
    FeedbackRequiresClosedTicket(TicketId),

    /// Feedback has already been recorded for the ticket.
    #[error("feedback for ticket {0} has already been recorded")]
    FeedbackAlreadyRecorded(TicketId),

    /// A satisfaction rating outside the accepted range.
    #[error("invalid feedback rating {0}, expected a value between 1 and 5")]
    InvalidFeedback(u8),

    /// Takeover requested for a ticket that has no owning admin.
    #[error("ticket {0} has no admin assigned and cannot be taken over")]
    TakeoverOfUnassignedTicket(TicketId),

    /// Takeover requested for a ticket that is already closed.
    #[error("ticket {0} is closed and cannot be taken over")]
    TakeoverOfClosedTicket(TicketId),

    /// An admin asked to take over a ticket they already own.
    #[error("user {user_id} already owns ticket {ticket_id}")]
    SelfTakeover {
        /// Ticket the request targeted.
        ticket_id: TicketId,
        /// Admin that is both owner and requester.
        user_id: UserId,
    },

    /// The request no longer matches the ticket's ownership context.
    #[error("takeover request {takeover_id} is stale for ticket {ticket_id}")]
    StaleTakeover {
        /// The stale request.
        takeover_id: TakeoverId,
        /// Ticket referenced by the request.
        ticket_id: TicketId,
    },

    /// A takeover request was resolved against a different ticket.
    #[error("takeover request {takeover_id} does not reference ticket {ticket_id}")]
    TakeoverTicketMismatch {
        /// The request being resolved.
        takeover_id: TakeoverId,
        /// Ticket that was supplied.
        ticket_id: TicketId,
    },

    /// Only the admin who created a takeover request may withdraw it.
    #[error("user {user_id} did not create takeover request {takeover_id}")]
    NotTakeoverRequester {
        /// The request being withdrawn.
        takeover_id: TakeoverId,
        /// Caller that failed the check.
        user_id: UserId,
    },

    /// Stored or deserialized ticket data that breaks an aggregate
    /// invariant.
    #[error("ticket {ticket_id} is inconsistent: {reason}")]
    InconsistentTicket {
        /// Ticket being reconstructed.
        ticket_id: TicketId,
        /// Invariant that failed.
        reason: &'static str,
    },

    /// A ticket message with no content after trimming.
    #[error("message content must not be empty")]
    EmptyMessage,

    /// Only the creating employee and the owning admin may use a ticket's
    /// message thread.
    #[error("user {user_id} is not a participant of ticket {ticket_id}")]
    NotTicketParticipant {
        /// Ticket whose thread was accessed.
        ticket_id: TicketId,
        /// Caller that failed the check.
        user_id: UserId,
    },

    /// Page size outside the permitted set.
    #[error("invalid page size {0}, expected one of 10, 25, 50, 100")]
    InvalidPageSize(u32),

    /// Page numbers start at one.
    #[error("invalid page number {0}, expected a positive integer")]
    InvalidPageNumber(u32),
}

/// Caller identity failures detected before any state is touched.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AccessError {
    /// No caller identity could be resolved.
    #[error("caller is not authenticated")]
    Unauthenticated,

    /// The caller is authenticated but holds the wrong role.
    #[error("operation requires the {required} role")]
    RoleRequired {
        /// Role the operation needs.
        required: UserRole,
    },
}

/// Error returned while parsing ticket statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown ticket status: {0}")]
pub struct ParseTicketStatusError(pub String);
