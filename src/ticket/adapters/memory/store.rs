//! In-memory helpdesk store for tests and single-process use.

use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ticket::{
    domain::{
        Page, PageRequest, TakeoverDecision, TakeoverId, TakeoverRequest, Ticket, TicketId,
        TicketMessage, TicketMessageId, TicketStatus, TicketVersion, UserId,
    },
    ports::{
        TakeoverRepository, TicketMessageRepository, TicketRepository, TicketRepositoryError,
        TicketRepositoryResult,
    },
};

/// Thread-safe in-memory store implementing the ticket, takeover and message
/// ports.
///
/// All records share one lock so multi-record writes are applied atomically.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHelpdeskStore {
    state: Arc<RwLock<HelpdeskState>>,
}

#[derive(Debug, Default)]
struct HelpdeskState {
    tickets: HashMap<TicketId, Ticket>,
    takeovers: HashMap<TakeoverId, TakeoverRequest>,
    messages: HashMap<TicketMessageId, TicketMessage>,
}

impl InMemoryHelpdeskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TicketRepositoryResult<RwLockReadGuard<'_, HelpdeskState>> {
        self.state
            .read()
            .map_err(|err| TicketRepositoryError::persistence_message(err.to_string()))
    }

    fn write(&self) -> TicketRepositoryResult<RwLockWriteGuard<'_, HelpdeskState>> {
        self.state
            .write()
            .map_err(|err| TicketRepositoryError::persistence_message(err.to_string()))
    }
}

impl HelpdeskState {
    fn check_version(
        &self,
        ticket_id: TicketId,
        expected: TicketVersion,
    ) -> TicketRepositoryResult<()> {
        let stored = self
            .tickets
            .get(&ticket_id)
            .ok_or(TicketRepositoryError::TicketNotFound(ticket_id))?;
        if stored.version() != expected {
            return Err(TicketRepositoryError::VersionConflict {
                ticket_id,
                expected,
            });
        }
        Ok(())
    }

    /// Drops requests the current ticket state no longer allows.
    fn purge_stale_takeovers(&mut self, ticket: &Ticket) {
        self.takeovers
            .retain(|_, request| request.ticket_id() != ticket.id() || request.is_live_for(ticket));
    }

    fn page_tickets<F>(&self, page: PageRequest, predicate: F) -> Page<Ticket>
    where
        F: Fn(&Ticket) -> bool,
    {
        let mut matches: Vec<Ticket> = self
            .tickets
            .values()
            .filter(|ticket| predicate(ticket))
            .cloned()
            .collect();
        matches.sort_by_key(|ticket| Reverse((ticket.created_at(), ticket.id().into_inner())));
        Page::from_ordered(matches, page)
    }

    fn page_takeovers<F>(&self, page: PageRequest, predicate: F) -> Page<TakeoverRequest>
    where
        F: Fn(&TakeoverRequest) -> bool,
    {
        let mut matches: Vec<TakeoverRequest> = self
            .takeovers
            .values()
            .filter(|request| predicate(request))
            .cloned()
            .collect();
        matches.sort_by_key(|request| (request.created_at(), request.id().into_inner()));
        Page::from_ordered(matches, page)
    }
}

#[async_trait]
impl TicketRepository for InMemoryHelpdeskStore {
    async fn store(&self, ticket: &Ticket) -> TicketRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tickets.contains_key(&ticket.id()) {
            return Err(TicketRepositoryError::DuplicateTicket(ticket.id()));
        }
        state.tickets.insert(ticket.id(), ticket.clone());
        Ok(())
    }

    async fn update(
        &self,
        ticket: &Ticket,
        expected_version: TicketVersion,
    ) -> TicketRepositoryResult<()> {
        let mut state = self.write()?;
        state.check_version(ticket.id(), expected_version)?;
        state.tickets.insert(ticket.id(), ticket.clone());
        state.purge_stale_takeovers(ticket);
        Ok(())
    }

    async fn find_by_id(&self, id: TicketId) -> TicketRepositoryResult<Option<Ticket>> {
        let state = self.read()?;
        Ok(state.tickets.get(&id).cloned())
    }

    async fn list_by_employee(
        &self,
        employee: UserId,
        page: PageRequest,
    ) -> TicketRepositoryResult<Page<Ticket>> {
        let state = self.read()?;
        Ok(state.page_tickets(page, |ticket| ticket.employee_user_id() == employee))
    }

    async fn list_by_status(
        &self,
        status: Option<TicketStatus>,
        page: PageRequest,
    ) -> TicketRepositoryResult<Page<Ticket>> {
        let state = self.read()?;
        Ok(state.page_tickets(page, |ticket| {
            status.is_none_or(|wanted| ticket.status() == wanted)
        }))
    }
}

#[async_trait]
impl TakeoverRepository for InMemoryHelpdeskStore {
    async fn store_takeover(
        &self,
        request: &TakeoverRequest,
        expected_ticket_version: TicketVersion,
    ) -> TicketRepositoryResult<()> {
        let mut state = self.write()?;
        state.check_version(request.ticket_id(), expected_ticket_version)?;
        if state.takeovers.contains_key(&request.id()) {
            return Err(TicketRepositoryError::DuplicateTakeover(request.id()));
        }
        state.takeovers.insert(request.id(), request.clone());
        Ok(())
    }

    async fn find_takeover(
        &self,
        id: TakeoverId,
    ) -> TicketRepositoryResult<Option<TakeoverRequest>> {
        let state = self.read()?;
        Ok(state.takeovers.get(&id).cloned())
    }

    async fn delete_takeover(&self, id: TakeoverId) -> TicketRepositoryResult<()> {
        let mut state = self.write()?;
        state
            .takeovers
            .remove(&id)
            .map(|_| ())
            .ok_or(TicketRepositoryError::TakeoverNotFound(id))
    }

    async fn resolve_takeover(
        &self,
        takeover_id: TakeoverId,
        ticket: &Ticket,
        expected_version: TicketVersion,
        decision: TakeoverDecision,
    ) -> TicketRepositoryResult<()> {
        let mut state = self.write()?;
        state.check_version(ticket.id(), expected_version)?;
        let targets_ticket = state
            .takeovers
            .get(&takeover_id)
            .is_some_and(|request| request.ticket_id() == ticket.id());
        if !targets_ticket {
            return Err(TicketRepositoryError::TakeoverNotFound(takeover_id));
        }

        state.takeovers.remove(&takeover_id);
        if decision == TakeoverDecision::Accept {
            state.tickets.insert(ticket.id(), ticket.clone());
            state.purge_stale_takeovers(ticket);
        }
        Ok(())
    }

    async fn list_incoming(
        &self,
        owner: UserId,
        page: PageRequest,
    ) -> TicketRepositoryResult<Page<TakeoverRequest>> {
        let state = self.read()?;
        Ok(state.page_takeovers(page, |request| {
            state
                .tickets
                .get(&request.ticket_id())
                .is_some_and(|ticket| ticket.is_owned_by(owner))
        }))
    }

    async fn list_outgoing(
        &self,
        requester: UserId,
        page: PageRequest,
    ) -> TicketRepositoryResult<Page<TakeoverRequest>> {
        let state = self.read()?;
        Ok(state.page_takeovers(page, |request| request.requester() == requester))
    }
}

#[async_trait]
impl TicketMessageRepository for InMemoryHelpdeskStore {
    async fn store_message(
        &self,
        message: &TicketMessage,
        expected_ticket_version: TicketVersion,
    ) -> TicketRepositoryResult<()> {
        let mut state = self.write()?;
        state.check_version(message.ticket_id(), expected_ticket_version)?;
        if state.messages.contains_key(&message.id()) {
            return Err(TicketRepositoryError::DuplicateMessage(message.id()));
        }
        state.messages.insert(message.id(), message.clone());
        Ok(())
    }

    async fn list_messages(
        &self,
        ticket_id: TicketId,
        page: PageRequest,
    ) -> TicketRepositoryResult<Page<TicketMessage>> {
        let state = self.read()?;
        let mut thread: Vec<TicketMessage> = state
            .messages
            .values()
            .filter(|message| message.ticket_id() == ticket_id)
            .cloned()
            .collect();
        thread.sort_by_key(|message| (message.created_at(), message.id().into_inner()));
        Ok(Page::from_ordered(thread, page))
    }
}
