//! Service-level errors and their user-visible classification.

use crate::ticket::{
    domain::{AccessError, TakeoverId, TicketDomainError, TicketId},
    ports::TicketRepositoryError,
};
use std::fmt;
use thiserror::Error;

/// Errors returned by ticket services.
#[derive(Debug, Clone, Error)]
pub enum TicketServiceError {
    /// Caller identity missing or lacking the required role.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// A domain rule refused the operation.
    #[error(transparent)]
    Domain(#[from] TicketDomainError),

    /// The ticket does not exist or is hidden from the caller.
    #[error("ticket not found: {0}")]
    TicketNotFound(TicketId),

    /// The takeover request does not exist or is hidden from the caller.
    #[error("takeover request not found: {0}")]
    TakeoverNotFound(TakeoverId),

    /// Concurrent writes kept invalidating the read state.
    #[error("ticket {ticket_id} changed concurrently on each of {attempts} attempts")]
    Contended {
        /// Ticket under contention.
        ticket_id: TicketId,
        /// Validation rounds spent.
        attempts: u32,
    },

    /// Persistence failed.
    #[error(transparent)]
    Repository(TicketRepositoryError),
}

impl From<TicketRepositoryError> for TicketServiceError {
    fn from(err: TicketRepositoryError) -> Self {
        match err {
            TicketRepositoryError::TicketNotFound(id) => Self::TicketNotFound(id),
            TicketRepositoryError::TakeoverNotFound(id) => Self::TakeoverNotFound(id),
            other => Self::Repository(other),
        }
    }
}

/// Result type for ticket service operations.
pub type TicketServiceResult<T> = Result<T, TicketServiceError>;

/// Caller-facing category of a [`TicketServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The ticket or takeover request does not exist.
    NotFound,
    /// The status change is illegal for the current ticket state.
    InvalidTransition,
    /// The caller lacks the permission this operation needs.
    Forbidden,
    /// No caller identity was supplied.
    Unauthorized,
    /// The input was malformed or a request precondition failed.
    BadRequest,
    /// A concurrent write won; the caller may retry.
    Conflict,
    /// Infrastructure failure.
    Internal,
}

impl ErrorKind {
    /// Returns the stable name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidTransition => "invalid_transition",
            Self::Forbidden => "forbidden",
            Self::Unauthorized => "unauthorized",
            Self::BadRequest => "bad_request",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TicketServiceError {
    /// Classifies the error for callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Access(AccessError::Unauthenticated) => ErrorKind::Unauthorized,
            Self::Access(AccessError::RoleRequired { .. }) => ErrorKind::Forbidden,
            Self::Domain(err) => domain_kind(err),
            Self::TicketNotFound(_) | Self::TakeoverNotFound(_) => ErrorKind::NotFound,
            Self::Contended { .. } => ErrorKind::Conflict,
            Self::Repository(err) => repository_kind(err),
        }
    }
}

const fn domain_kind(err: &TicketDomainError) -> ErrorKind {
    match err {
        TicketDomainError::InvalidTransition { .. }
        | TicketDomainError::TicketClosed(_)
        | TicketDomainError::FeedbackRequiresClosedTicket(_)
        | TicketDomainError::FeedbackAlreadyRecorded(_) => ErrorKind::InvalidTransition,
        TicketDomainError::NotOwningAdmin { .. }
        | TicketDomainError::NotTicketCreator { .. }
        | TicketDomainError::NotTakeoverRequester { .. }
        | TicketDomainError::NotTicketParticipant { .. } => ErrorKind::Forbidden,
        TicketDomainError::EmptyTitle
        | TicketDomainError::EmptyDescription
        | TicketDomainError::EmptyMessage
        | TicketDomainError::InvalidFeedback(_)
        | TicketDomainError::InvalidPageSize(_)
        | TicketDomainError::InvalidPageNumber(_)
        | TicketDomainError::TakeoverOfUnassignedTicket(_)
        | TicketDomainError::TakeoverOfClosedTicket(_)
        | TicketDomainError::SelfTakeover { .. } => ErrorKind::BadRequest,
        TicketDomainError::StaleTakeover { .. } => ErrorKind::Conflict,
        TicketDomainError::TakeoverTicketMismatch { .. }
        | TicketDomainError::InconsistentTicket { .. } => ErrorKind::Internal,
    }
}

const fn repository_kind(err: &TicketRepositoryError) -> ErrorKind {
    match err {
        TicketRepositoryError::TicketNotFound(_) | TicketRepositoryError::TakeoverNotFound(_) => {
            ErrorKind::NotFound
        }
        TicketRepositoryError::DuplicateTicket(_)
        | TicketRepositoryError::DuplicateTakeover(_)
        | TicketRepositoryError::DuplicateMessage(_)
        | TicketRepositoryError::VersionConflict { .. } => ErrorKind::Conflict,
        TicketRepositoryError::Persistence(_) => ErrorKind::Internal,
    }
}
