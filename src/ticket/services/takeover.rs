//! Takeover coordination between the owning admin and a requesting admin.
//!
//! Deciding is reserved to the ticket's current owner and withdrawing to
//! the requester. Ownership is always re-read at decision time, so a
//! request that outlived the ownership it was filed against cannot move the
//! ticket.

use super::{
    conflict::revalidate_on_conflict,
    error::{TicketServiceError, TicketServiceResult},
};
use crate::config::HelpdeskConfig;
use crate::ticket::{
    domain::{
        CallerIdentity, Page, PageRequest, TakeoverDecision, TakeoverId, TakeoverRequest, Ticket,
        TicketId, UserRole,
    },
    ports::{TakeoverRepository, TicketRepository},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::instrument;

/// Takeover request orchestration service.
#[derive(Clone)]
pub struct TakeoverCoordinator<R, C>
where
    R: TicketRepository + TakeoverRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    max_conflict_attempts: u32,
}

impl<R, C> TakeoverCoordinator<R, C>
where
    R: TicketRepository + TakeoverRepository,
    C: Clock + Send + Sync,
{
    /// Creates a coordinator over a store implementing both ticket ports.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            max_conflict_attempts: HelpdeskConfig::DEFAULT_MAX_CONFLICT_ATTEMPTS,
        }
    }

    /// Bounds how many validation rounds an operation may spend on
    /// conflicts. Values below one are raised to one.
    #[must_use]
    pub fn with_max_conflict_attempts(mut self, attempts: u32) -> Self {
        self.max_conflict_attempts = attempts.max(1);
        self
    }

    /// Files a request by the calling admin to take over an `Active` ticket.
    ///
    /// The request is stored only if the ticket is unchanged since it was
    /// validated.
    ///
    /// # Errors
    ///
    /// Returns [`TicketServiceError::TicketNotFound`], or a bad request when
    /// the ticket is unassigned, closed, or already owned by the caller.
    #[instrument(skip(self, identity))]
    pub async fn create_takeover_request(
        &self,
        identity: &CallerIdentity,
        ticket_id: TicketId,
    ) -> TicketServiceResult<TakeoverRequest> {
        let requester = identity.require_role(UserRole::Admin)?.user_id();
        let request = revalidate_on_conflict(self.max_conflict_attempts, ticket_id, || async move {
            let ticket = self.load_ticket(ticket_id).await?;
            let request = TakeoverRequest::new(&ticket, requester, &*self.clock)?;
            self.repository
                .store_takeover(&request, ticket.version())
                .await?;
            Ok(request)
        })
        .await?;
        tracing::info!(
            takeover_id = %request.id(),
            %ticket_id,
            %requester,
            "takeover requested"
        );
        Ok(request)
    }

    /// Lists requests on tickets the calling admin currently owns, oldest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an access error unless the caller is an admin, or a
    /// persistence error.
    pub async fn list_incoming(
        &self,
        identity: &CallerIdentity,
        page: PageRequest,
    ) -> TicketServiceResult<Page<TakeoverRequest>> {
        let owner = identity.require_role(UserRole::Admin)?.user_id();
        Ok(self.repository.list_incoming(owner, page).await?)
    }

    /// Lists requests the calling admin has filed, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an access error unless the caller is an admin, or a
    /// persistence error.
    pub async fn list_outgoing(
        &self,
        identity: &CallerIdentity,
        page: PageRequest,
    ) -> TicketServiceResult<Page<TakeoverRequest>> {
        let requester = identity.require_role(UserRole::Admin)?.user_id();
        Ok(self.repository.list_outgoing(requester, page).await?)
    }

    /// Accepts or rejects a request on a ticket the calling admin owns.
    ///
    /// Accepting hands the ticket to the requester and deletes the request
    /// in one unit of work; rejecting only deletes the request. Returns the
    /// ticket as it stands after the decision.
    ///
    /// # Errors
    ///
    /// Returns [`TicketServiceError::TakeoverNotFound`] when the request is
    /// gone and a forbidden error when the caller does not own the ticket
    /// at decision time.
    #[instrument(skip(self, identity))]
    pub async fn decide(
        &self,
        identity: &CallerIdentity,
        takeover_id: TakeoverId,
        decision: TakeoverDecision,
    ) -> TicketServiceResult<Ticket> {
        let decider = identity.require_role(UserRole::Admin)?.user_id();
        let ticket_id = self.load_takeover(takeover_id).await?.ticket_id();

        let ticket = revalidate_on_conflict(self.max_conflict_attempts, ticket_id, || async move {
            let request = self.load_takeover(takeover_id).await?;
            let mut ticket = self.load_ticket(ticket_id).await?;
            ticket.ensure_decidable_by(&request, decider)?;
            let expected = ticket.version();
            if decision == TakeoverDecision::Accept {
                ticket.transfer_to(&request, decider, &*self.clock)?;
            }
            self.repository
                .resolve_takeover(takeover_id, &ticket, expected, decision)
                .await?;
            Ok(ticket)
        })
        .await?;

        tracing::info!(
            %takeover_id,
            %ticket_id,
            %decider,
            decision = decision.as_str(),
            owner = ?ticket.admin_user_id(),
            "takeover decided"
        );
        Ok(ticket)
    }

    /// Withdraws a request filed by the calling admin.
    ///
    /// # Errors
    ///
    /// Returns [`TicketServiceError::TakeoverNotFound`] when the request is
    /// gone and a forbidden error when the caller did not file it.
    #[instrument(skip(self, identity))]
    pub async fn delete_takeover_request(
        &self,
        identity: &CallerIdentity,
        takeover_id: TakeoverId,
    ) -> TicketServiceResult<()> {
        let requester = identity.require_role(UserRole::Admin)?.user_id();
        let request = self.load_takeover(takeover_id).await?;
        request.ensure_withdrawable_by(requester)?;
        self.repository.delete_takeover(takeover_id).await?;
        tracing::info!(%takeover_id, %requester, "takeover request withdrawn");
        Ok(())
    }

    /// Fetches a request visible to the calling admin: its requester or the
    /// current owner of its ticket.
    ///
    /// # Errors
    ///
    /// Returns [`TicketServiceError::TakeoverNotFound`] when the request is
    /// missing or hidden.
    pub async fn find_takeover(
        &self,
        identity: &CallerIdentity,
        takeover_id: TakeoverId,
    ) -> TicketServiceResult<TakeoverRequest> {
        let viewer = identity.require_role(UserRole::Admin)?.user_id();
        let request = self.load_takeover(takeover_id).await?;
        if request.requester() == viewer {
            return Ok(request);
        }
        let owns_ticket = self
            .repository
            .find_by_id(request.ticket_id())
            .await?
            .is_some_and(|ticket| ticket.is_owned_by(viewer));
        if !owns_ticket {
            return Err(TicketServiceError::TakeoverNotFound(takeover_id));
        }
        Ok(request)
    }

    async fn load_ticket(&self, ticket_id: TicketId) -> TicketServiceResult<Ticket> {
        self.repository
            .find_by_id(ticket_id)
            .await?
            .ok_or(TicketServiceError::TicketNotFound(ticket_id))
    }

    async fn load_takeover(&self, takeover_id: TakeoverId) -> TicketServiceResult<TakeoverRequest> {
        self.repository
            .find_takeover(takeover_id)
            .await?
            .ok_or(TicketServiceError::TakeoverNotFound(takeover_id))
    }
}
