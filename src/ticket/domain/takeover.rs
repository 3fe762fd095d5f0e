//! Takeover requests: a non-owning admin asking to become a ticket's owner.

use super::{TakeoverId, Ticket, TicketDomainError, TicketId, TicketStatus, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Pending request by an admin to take ownership of an `Active` ticket.
///
/// The request keeps lookup keys only. Ownership is always re-read from the
/// ticket when the request is decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeoverRequest {
    id: TakeoverId,
    ticket_id: TicketId,
    admin_user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted takeover request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTakeoverData {
    /// Persisted request identifier.
    pub id: TakeoverId,
    /// Ticket the request targets.
    pub ticket_id: TicketId,
    /// Requesting admin.
    pub admin_user_id: UserId,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TakeoverRequest {
    /// Creates a request by `requester` against `ticket`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Ticket::ensure_takeover_allowed`].
    pub fn new(
        ticket: &Ticket,
        requester: UserId,
        clock: &impl Clock,
    ) -> Result<Self, TicketDomainError> {
        ticket.ensure_takeover_allowed(requester)?;
        let timestamp = clock.utc();
        Ok(Self {
            id: TakeoverId::new(),
            ticket_id: ticket.id(),
            admin_user_id: requester,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a request from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTakeoverData) -> Self {
        Self {
            id: data.id,
            ticket_id: data.ticket_id,
            admin_user_id: data.admin_user_id,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the request identifier.
    #[must_use]
    pub const fn id(&self) -> TakeoverId {
        self.id
    }

    /// Returns the targeted ticket.
    #[must_use]
    pub const fn ticket_id(&self) -> TicketId {
        self.ticket_id
    }

    /// Returns the admin asking to take over.
    #[must_use]
    pub const fn requester(&self) -> UserId {
        self.admin_user_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Checks that `user_id` created this request and may withdraw it.
    ///
    /// # Errors
    ///
    /// Returns [`TicketDomainError::NotTakeoverRequester`] otherwise.
    pub fn ensure_withdrawable_by(&self, user_id: UserId) -> Result<(), TicketDomainError> {
        if self.admin_user_id != user_id {
            return Err(TicketDomainError::NotTakeoverRequester {
                takeover_id: self.id,
                user_id,
            });
        }
        Ok(())
    }

    /// Returns `true` while the request is still consistent with `ticket`:
    /// the ticket is `Active` and owned by someone other than the requester.
    #[must_use]
    pub fn is_live_for(&self, ticket: &Ticket) -> bool {
        self.ticket_id == ticket.id()
            && ticket.status() == TicketStatus::Active
            && ticket
                .admin_user_id()
                .is_some_and(|owner| owner != self.admin_user_id)
    }
}

/// The owning admin's answer to a takeover request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TakeoverDecision {
    /// Hand ownership to the requester.
    Accept,
    /// Keep ownership and discard the request.
    Reject,
}

impl TakeoverDecision {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
        }
    }
}

impl From<bool> for TakeoverDecision {
    fn from(accept: bool) -> Self {
        if accept { Self::Accept } else { Self::Reject }
    }
}
