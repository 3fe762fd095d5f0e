//! Repository ports for tickets and takeover requests.

use crate::ticket::domain::{
    Page, PageRequest, TakeoverDecision, TakeoverId, TakeoverRequest, Ticket, TicketId,
    TicketMessage, TicketMessageId, TicketStatus, TicketVersion, UserId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for ticket and takeover repository operations.
pub type TicketRepositoryResult<T> = Result<T, TicketRepositoryError>;

/// Ticket persistence contract.
///
/// Writes are guarded by the ticket's [`TicketVersion`]; a write against a
/// stale version is refused rather than applied.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Stores a new ticket.
    ///
    /// # Errors
    ///
    /// Returns [`TicketRepositoryError::DuplicateTicket`] when the ticket ID
    /// already exists.
    async fn store(&self, ticket: &Ticket) -> TicketRepositoryResult<()>;

    /// Persists a mutated ticket if the stored row is still at
    /// `expected_version`.
    ///
    /// In the same unit of work, pending takeover requests that the new
    /// ticket state invalidates are discarded: all of them once the ticket
    /// is no longer `Active`, and those created by the new owner.
    ///
    /// # Errors
    ///
    /// Returns [`TicketRepositoryError::TicketNotFound`] when the ticket does
    /// not exist and [`TicketRepositoryError::VersionConflict`] when another
    /// write landed first.
    async fn update(
        &self,
        ticket: &Ticket,
        expected_version: TicketVersion,
    ) -> TicketRepositoryResult<()>;

    /// Finds a ticket by identifier.
    ///
    /// Returns `None` when the ticket does not exist.
    async fn find_by_id(&self, id: TicketId) -> TicketRepositoryResult<Option<Ticket>>;

    /// Lists tickets filed by `employee`, newest first.
    async fn list_by_employee(
        &self,
        employee: UserId,
        page: PageRequest,
    ) -> TicketRepositoryResult<Page<Ticket>>;

    /// Lists tickets in `status`, or every ticket when `status` is `None`,
    /// newest first.
    async fn list_by_status(
        &self,
        status: Option<TicketStatus>,
        page: PageRequest,
    ) -> TicketRepositoryResult<Page<Ticket>>;
}

/// Takeover request persistence contract.
#[async_trait]
pub trait TakeoverRepository: Send + Sync {
    /// Stores a new request, provided its ticket is still at
    /// `expected_ticket_version`.
    ///
    /// # Errors
    ///
    /// Returns [`TicketRepositoryError::TicketNotFound`],
    /// [`TicketRepositoryError::VersionConflict`] when the ticket changed
    /// after validation, or [`TicketRepositoryError::DuplicateTakeover`].
    async fn store_takeover(
        &self,
        request: &TakeoverRequest,
        expected_ticket_version: TicketVersion,
    ) -> TicketRepositoryResult<()>;

    /// Finds a request by identifier.
    async fn find_takeover(&self, id: TakeoverId)
    -> TicketRepositoryResult<Option<TakeoverRequest>>;

    /// Deletes a request.
    ///
    /// # Errors
    ///
    /// Returns [`TicketRepositoryError::TakeoverNotFound`] when it does not
    /// exist.
    async fn delete_takeover(&self, id: TakeoverId) -> TicketRepositoryResult<()>;

    /// Applies the owning admin's decision as one unit of work.
    ///
    /// The ticket row must still be at `expected_version`. On
    /// [`TakeoverDecision::Accept`] the transferred `ticket` is written; in
    /// both cases the request is deleted. Nothing is written if any step
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns [`TicketRepositoryError::VersionConflict`],
    /// [`TicketRepositoryError::TicketNotFound`] or
    /// [`TicketRepositoryError::TakeoverNotFound`].
    async fn resolve_takeover(
        &self,
        takeover_id: TakeoverId,
        ticket: &Ticket,
        expected_version: TicketVersion,
        decision: TakeoverDecision,
    ) -> TicketRepositoryResult<()>;

    /// Lists requests on tickets currently owned by `owner`, oldest first.
    async fn list_incoming(
        &self,
        owner: UserId,
        page: PageRequest,
    ) -> TicketRepositoryResult<Page<TakeoverRequest>>;

    /// Lists requests created by `requester`, oldest first.
    async fn list_outgoing(
        &self,
        requester: UserId,
        page: PageRequest,
    ) -> TicketRepositoryResult<Page<TakeoverRequest>>;
}

/// Ticket message persistence contract.
#[async_trait]
pub trait TicketMessageRepository: Send + Sync {
    /// Appends a message to its ticket's thread, provided the ticket is
    /// still at `expected_ticket_version`.
    ///
    /// # Errors
    ///
    /// Returns [`TicketRepositoryError::TicketNotFound`],
    /// [`TicketRepositoryError::VersionConflict`] when the ticket changed
    /// after the author was checked, or
    /// [`TicketRepositoryError::DuplicateMessage`].
    async fn store_message(
        &self,
        message: &TicketMessage,
        expected_ticket_version: TicketVersion,
    ) -> TicketRepositoryResult<()>;

    /// Lists the messages on `ticket_id`, oldest first.
    async fn list_messages(
        &self,
        ticket_id: TicketId,
        page: PageRequest,
    ) -> TicketRepositoryResult<Page<TicketMessage>>;
}

/// Errors returned by ticket and takeover repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TicketRepositoryError {
    /// A ticket with the same identifier already exists.
    #[error("duplicate ticket identifier: {0}")]
    DuplicateTicket(TicketId),

    /// A takeover request with the same identifier already exists.
    #[error("duplicate takeover request identifier: {0}")]
    DuplicateTakeover(TakeoverId),

    /// A ticket message with the same identifier already exists.
    #[error("duplicate ticket message identifier: {0}")]
    DuplicateMessage(TicketMessageId),

    /// The ticket was not found.
    #[error("ticket not found: {0}")]
    TicketNotFound(TicketId),

    /// The takeover request was not found.
    #[error("takeover request not found: {0}")]
    TakeoverNotFound(TakeoverId),

    /// The ticket row changed since it was read.
    #[error("ticket {ticket_id} is no longer at version {expected}")]
    VersionConflict {
        /// Ticket whose write was refused.
        ticket_id: TicketId,
        /// Version the writer expected.
        expected: TicketVersion,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TicketRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Wraps a poisoned-lock or other message-only failure.
    pub fn persistence_message(message: impl Into<String>) -> Self {
        Self::persistence(std::io::Error::other(message.into()))
    }
}
