//! Messages exchanged on a ticket between its employee and owning admin.

use super::{Ticket, TicketDomainError, TicketId, TicketMessageId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// One entry on a ticket's message thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketMessage {
    id: TicketMessageId,
    ticket_id: TicketId,
    author: UserId,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTicketMessageData {
    /// Persisted message identifier.
    pub id: TicketMessageId,
    /// Ticket the message belongs to.
    pub ticket_id: TicketId,
    /// User who wrote the message.
    pub author: UserId,
    /// Message body.
    pub content: String,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TicketMessage {
    /// Writes a message by `author` on `ticket`.
    ///
    /// Messages are allowed in every status, including `Closed`.
    ///
    /// # Errors
    ///
    /// Returns [`TicketDomainError::NotTicketParticipant`] when `author` is
    /// neither the creating employee nor the owning admin, and
    /// [`TicketDomainError::EmptyMessage`] when `content` is blank.
    pub fn new(
        ticket: &Ticket,
        author: UserId,
        content: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, TicketDomainError> {
        ticket.ensure_participant(author)?;
        let raw: String = content.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TicketDomainError::EmptyMessage);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: TicketMessageId::new(),
            ticket_id: ticket.id(),
            author,
            content: trimmed.to_owned(),
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a message from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTicketMessageData) -> Self {
        Self {
            id: data.id,
            ticket_id: data.ticket_id,
            author: data.author,
            content: data.content,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> TicketMessageId {
        self.id
    }

    /// Returns the ticket the message belongs to.
    #[must_use]
    pub const fn ticket_id(&self) -> TicketId {
        self.ticket_id
    }

    /// Returns the user who wrote the message.
    #[must_use]
    pub const fn author(&self) -> UserId {
        self.author
    }

    /// Returns the message body.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
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
}
