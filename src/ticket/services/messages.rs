//! Message threads shared by a ticket's employee and its owning admin.
//!
//! Access follows the ticket's current ownership: an admin who handed a
//! ticket over can no longer read or write its thread.

use super::{
    conflict::revalidate_on_conflict,
    error::{TicketServiceError, TicketServiceResult},
};
use crate::config::HelpdeskConfig;
use crate::ticket::{
    domain::{CallerIdentity, Page, PageRequest, Ticket, TicketId, TicketMessage},
    ports::{TicketMessageRepository, TicketRepository},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::instrument;

/// Ticket message orchestration service.
#[derive(Clone)]
pub struct TicketMessageService<R, C>
where
    R: TicketRepository + TicketMessageRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    max_conflict_attempts: u32,
}

impl<R, C> TicketMessageService<R, C>
where
    R: TicketRepository + TicketMessageRepository,
    C: Clock + Send + Sync,
{
    /// Creates a message service over a store implementing the ticket and
    /// message ports.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            max_conflict_attempts: HelpdeskConfig::DEFAULT_MAX_CONFLICT_ATTEMPTS,
        }
    }

    /// Bounds how many validation rounds a post may spend on conflicts.
    /// Values below one are raised to one.
    #[must_use]
    pub fn with_max_conflict_attempts(mut self, attempts: u32) -> Self {
        self.max_conflict_attempts = attempts.max(1);
        self
    }

    /// Appends a message by the caller to a ticket's thread.
    ///
    /// The message is stored only if the ticket is unchanged since the
    /// caller's participation was checked.
    ///
    /// # Errors
    ///
    /// Returns [`TicketServiceError::TicketNotFound`], a forbidden error when
    /// the caller is neither the creating employee nor the current owner,
    /// and a bad request for blank content.
    #[instrument(skip(self, identity, content))]
    pub async fn post_message(
        &self,
        identity: &CallerIdentity,
        ticket_id: TicketId,
        content: &str,
    ) -> TicketServiceResult<TicketMessage> {
        let author = identity.require()?.user_id();
        let message = revalidate_on_conflict(self.max_conflict_attempts, ticket_id, || async move {
            let ticket = self.load_ticket(ticket_id).await?;
            let message = TicketMessage::new(&ticket, author, content, &*self.clock)?;
            self.repository
                .store_message(&message, ticket.version())
                .await?;
            Ok(message)
        })
        .await?;
        tracing::info!(message_id = %message.id(), %ticket_id, %author, "ticket message posted");
        Ok(message)
    }

    /// Lists a ticket's messages, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TicketServiceError::TicketNotFound`] or a forbidden error
    /// when the caller is neither the creating employee nor the current
    /// owner.
    pub async fn list_messages(
        &self,
        identity: &CallerIdentity,
        ticket_id: TicketId,
        page: PageRequest,
    ) -> TicketServiceResult<Page<TicketMessage>> {
        let reader = identity.require()?.user_id();
        let ticket = self.load_ticket(ticket_id).await?;
        ticket.ensure_participant(reader)?;
        Ok(self.repository.list_messages(ticket_id, page).await?)
    }

    async fn load_ticket(&self, ticket_id: TicketId) -> TicketServiceResult<Ticket> {
        self.repository
            .find_by_id(ticket_id)
            .await?
            .ok_or(TicketServiceError::TicketNotFound(ticket_id))
    }
}
