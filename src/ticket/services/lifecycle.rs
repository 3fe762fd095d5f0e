//! Ticket lifecycle service: creation, claiming, closing and employee edits.

use super::{
    conflict::revalidate_on_conflict,
    error::{TicketServiceError, TicketServiceResult},
};
use crate::config::HelpdeskConfig;
use crate::ticket::{
    domain::{
        CallerIdentity, Feedback, Page, PageRequest, Ticket, TicketId, TicketStatus, UserRole,
    },
    ports::TicketRepository,
};
use mockable::Clock;
use std::sync::Arc;
use tracing::instrument;

/// Ticket lifecycle orchestration service.
///
/// Every mutation re-reads the ticket, validates against that state and
/// writes with the version it read. A concurrent write forces a fresh round.
#[derive(Clone)]
pub struct TicketLifecycleService<R, C>
where
    R: TicketRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    max_conflict_attempts: u32,
}

impl<R, C> TicketLifecycleService<R, C>
where
    R: TicketRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new ticket lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            max_conflict_attempts: HelpdeskConfig::DEFAULT_MAX_CONFLICT_ATTEMPTS,
        }
    }

    /// Bounds how many validation rounds a mutation may spend on conflicts.
    ///
    /// Values below one are raised to one.
    #[must_use]
    pub fn with_max_conflict_attempts(mut self, attempts: u32) -> Self {
        self.max_conflict_attempts = attempts.max(1);
        self
    }

    /// Files a new ticket on behalf of the calling employee.
    ///
    /// # Errors
    ///
    /// Returns an access error unless the caller is an employee, and
    /// [`TicketServiceError::Domain`] for a blank title or description.
    #[instrument(skip_all)]
    pub async fn create_ticket(
        &self,
        identity: &CallerIdentity,
        title: &str,
        description: &str,
    ) -> TicketServiceResult<Ticket> {
        let employee = identity.require_role(UserRole::Employee)?.user_id();
        let ticket = Ticket::new(employee, title, description, &*self.clock)?;
        self.repository.store(&ticket).await?;
        tracing::info!(ticket_id = %ticket.id(), %employee, "ticket created");
        Ok(ticket)
    }

    /// Claims a `New` ticket for the calling admin.
    ///
    /// Under concurrent claims exactly one admin wins; the others observe
    /// the winner's state and fail with an invalid transition.
    ///
    /// # Errors
    ///
    /// Returns an access error unless the caller is an admin,
    /// [`TicketServiceError::TicketNotFound`], or an invalid transition when
    /// the ticket is no longer `New`.
    #[instrument(skip(self, identity))]
    pub async fn assign_admin(
        &self,
        identity: &CallerIdentity,
        ticket_id: TicketId,
    ) -> TicketServiceResult<Ticket> {
        let admin = identity.require_role(UserRole::Admin)?.user_id();
        let ticket = revalidate_on_conflict(self.max_conflict_attempts, ticket_id, || async move {
            let mut ticket = self.load(ticket_id).await?;
            let expected = ticket.version();
            ticket.assign_admin(admin, &*self.clock)?;
            self.repository.update(&ticket, expected).await?;
            Ok(ticket)
        })
        .await?;
        tracing::info!(%ticket_id, %admin, "ticket assigned");
        Ok(ticket)
    }

    /// Closes an `Active` ticket owned by the calling admin.
    ///
    /// Pending takeover requests on the ticket are discarded with the write.
    ///
    /// # Errors
    ///
    /// Returns a forbidden error when another admin owns the ticket, whatever
    /// its status, and an invalid transition when the caller owns it but it
    /// is not `Active`.
    #[instrument(skip(self, identity))]
    pub async fn close(
        &self,
        identity: &CallerIdentity,
        ticket_id: TicketId,
    ) -> TicketServiceResult<Ticket> {
        let admin = identity.require_role(UserRole::Admin)?.user_id();
        let ticket = revalidate_on_conflict(self.max_conflict_attempts, ticket_id, || async move {
            let mut ticket = self.load(ticket_id).await?;
            let expected = ticket.version();
            ticket.close(admin, &*self.clock)?;
            self.repository.update(&ticket, expected).await?;
            Ok(ticket)
        })
        .await?;
        tracing::info!(%ticket_id, %admin, "ticket closed");
        Ok(ticket)
    }

    /// Records the creating employee's rating on a closed ticket.
    ///
    /// # Errors
    ///
    /// Returns a bad request for ratings outside `1..=5`, forbidden when the
    /// caller did not file the ticket, and an invalid transition when the
    /// ticket is not closed or already rated.
    #[instrument(skip(self, identity))]
    pub async fn add_feedback(
        &self,
        identity: &CallerIdentity,
        ticket_id: TicketId,
        rating: u8,
    ) -> TicketServiceResult<Ticket> {
        let employee = identity.require_role(UserRole::Employee)?.user_id();
        let feedback = Feedback::new(rating)?;
        revalidate_on_conflict(self.max_conflict_attempts, ticket_id, || async move {
            let mut ticket = self.load(ticket_id).await?;
            let expected = ticket.version();
            ticket.add_feedback(employee, feedback, &*self.clock)?;
            self.repository.update(&ticket, expected).await?;
            Ok(ticket)
        })
        .await
    }

    /// Edits the title and description of a ticket that is not yet closed.
    ///
    /// Tickets filed by other employees are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns [`TicketServiceError::TicketNotFound`], an invalid transition
    /// once the ticket is closed, or a bad request for blank input.
    #[instrument(skip(self, identity, title, description))]
    pub async fn update_details(
        &self,
        identity: &CallerIdentity,
        ticket_id: TicketId,
        title: &str,
        description: &str,
    ) -> TicketServiceResult<Ticket> {
        let employee = identity.require_role(UserRole::Employee)?.user_id();
        revalidate_on_conflict(self.max_conflict_attempts, ticket_id, || async move {
            let mut ticket = self.load(ticket_id).await?;
            if ticket.employee_user_id() != employee {
                return Err(TicketServiceError::TicketNotFound(ticket_id));
            }
            let expected = ticket.version();
            ticket.update_details(employee, title, description, &*self.clock)?;
            self.repository.update(&ticket, expected).await?;
            Ok(ticket)
        })
        .await
    }

    /// Fetches a ticket visible to the caller.
    ///
    /// Admins see every ticket; employees only their own.
    ///
    /// # Errors
    ///
    /// Returns [`TicketServiceError::TicketNotFound`] when the ticket is
    /// missing or hidden.
    pub async fn find_ticket(
        &self,
        identity: &CallerIdentity,
        ticket_id: TicketId,
    ) -> TicketServiceResult<Ticket> {
        let caller = identity.require()?;
        let ticket = self.load(ticket_id).await?;
        if !caller.is_admin() && ticket.employee_user_id() != caller.user_id() {
            return Err(TicketServiceError::TicketNotFound(ticket_id));
        }
        Ok(ticket)
    }

    /// Lists the calling employee's tickets, newest first.
    ///
    /// # Errors
    ///
    /// Returns an access error unless the caller is an employee, or a
    /// persistence error.
    pub async fn list_own_tickets(
        &self,
        identity: &CallerIdentity,
        page: PageRequest,
    ) -> TicketServiceResult<Page<Ticket>> {
        let employee = identity.require_role(UserRole::Employee)?.user_id();
        Ok(self.repository.list_by_employee(employee, page).await?)
    }

    /// Lists tickets in `status`, or all tickets when no status is given,
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns an access error unless the caller is an admin, or a
    /// persistence error.
    pub async fn list_tickets_by_status(
        &self,
        identity: &CallerIdentity,
        status: Option<TicketStatus>,
        page: PageRequest,
    ) -> TicketServiceResult<Page<Ticket>> {
        identity.require_role(UserRole::Admin)?;
        Ok(self.repository.list_by_status(status, page).await?)
    }

    async fn load(&self, ticket_id: TicketId) -> TicketServiceResult<Ticket> {
        self.repository
            .find_by_id(ticket_id)
            .await?
            .ok_or(TicketServiceError::TicketNotFound(ticket_id))
    }
}
