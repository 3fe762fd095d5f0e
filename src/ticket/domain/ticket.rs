//! Ticket aggregate root and its status state machine.

use super::{
    Feedback, ParseTicketStatusError, TakeoverRequest, TicketDomainError, TicketId,
    TicketVersion, UserId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticket lifecycle status.
///
/// `New` tickets have no owning admin, `Active` and `Closed` tickets always
/// have one. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Filed by an employee and waiting for an admin to claim it.
    New,
    /// Claimed by an admin and being worked on.
    Active,
    /// Resolved by the owning admin.
    Closed,
}

impl TicketStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }

    /// Returns `true` when moving from `self` to `target` is permitted.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::New, Self::Active) | (Self::Active, Self::Closed)
        )
    }

    /// Returns `true` for statuses with no outgoing transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl TryFrom<&str> for TicketStatus {
    type Error = ParseTicketStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "new" => Ok(Self::New),
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseTicketStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket aggregate root.
///
/// Deserialization goes through [`Ticket::from_persisted`], so decoded
/// tickets satisfy the same invariants as constructed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersistedTicketData")]
pub struct Ticket {
    id: TicketId,
    title: String,
    description: String,
    status: TicketStatus,
    employee_user_id: UserId,
    admin_user_id: Option<UserId>,
    feedback: Option<Feedback>,
    version: TicketVersion,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted ticket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistedTicketData {
    /// Persisted ticket identifier.
    pub id: TicketId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: String,
    /// Persisted lifecycle status.
    pub status: TicketStatus,
    /// Creating employee.
    pub employee_user_id: UserId,
    /// Owning admin, if any.
    pub admin_user_id: Option<UserId>,
    /// Satisfaction rating, if any.
    pub feedback: Option<Feedback>,
    /// Persisted row version.
    pub version: TicketVersion,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Files a new ticket on behalf of an employee.
    ///
    /// # Errors
    ///
    /// Returns [`TicketDomainError::EmptyTitle`] or
    /// [`TicketDomainError::EmptyDescription`] when either field is blank.
    pub fn new(
        employee_user_id: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, TicketDomainError> {
        let raw_title: String = title.into();
        let raw_description: String = description.into();
        let (clean_title, clean_description) = validate_details(&raw_title, &raw_description)?;
        let timestamp = clock.utc();
        Ok(Self {
            id: TicketId::new(),
            title: clean_title,
            description: clean_description,
            status: TicketStatus::New,
            employee_user_id,
            admin_user_id: None,
            feedback: None,
            version: TicketVersion::INITIAL,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a ticket from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns a blank-field error, or
    /// [`TicketDomainError::InconsistentTicket`] when the owner does not
    /// match the status, feedback sits on an open ticket, or the version is
    /// zero.
    pub fn from_persisted(data: PersistedTicketData) -> Result<Self, TicketDomainError> {
        if data.title.trim().is_empty() {
            return Err(TicketDomainError::EmptyTitle);
        }
        if data.description.trim().is_empty() {
            return Err(TicketDomainError::EmptyDescription);
        }
        let inconsistent = |reason: &'static str| TicketDomainError::InconsistentTicket {
            ticket_id: data.id,
            reason,
        };
        if (data.status == TicketStatus::New) != data.admin_user_id.is_none() {
            return Err(inconsistent(
                "an owning admin must be recorded exactly when the ticket is not new",
            ));
        }
        if data.feedback.is_some() && data.status != TicketStatus::Closed {
            return Err(inconsistent("feedback requires a closed ticket"));
        }
        if data.version < TicketVersion::INITIAL {
            return Err(inconsistent("version must be at least 1"));
        }
        Ok(Self {
            id: data.id,
            title: data.title,
            description: data.description,
            status: data.status,
            employee_user_id: data.employee_user_id,
            admin_user_id: data.admin_user_id,
            feedback: data.feedback,
            version: data.version,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }

    /// Returns the ticket identifier.
    #[must_use]
    pub const fn id(&self) -> TicketId {
        self.id
    }

    /// Returns the ticket title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the ticket description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TicketStatus {
        self.status
    }

    /// Returns the employee who filed the ticket.
    #[must_use]
    pub const fn employee_user_id(&self) -> UserId {
        self.employee_user_id
    }

    /// Returns the owning admin, if the ticket has been claimed.
    #[must_use]
    pub const fn admin_user_id(&self) -> Option<UserId> {
        self.admin_user_id
    }

    /// Returns the recorded satisfaction rating, if any.
    #[must_use]
    pub const fn feedback(&self) -> Option<Feedback> {
        self.feedback
    }

    /// Returns the optimistic-concurrency version.
    #[must_use]
    pub const fn version(&self) -> TicketVersion {
        self.version
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

    /// Returns `true` when `user_id` is the owning admin.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.admin_user_id == Some(user_id)
    }

    /// Checks that `user_id` is the creating employee or the current owner.
    ///
    /// Ownership is read from the ticket as it is now, so an admin who handed
    /// the ticket over is no longer a participant.
    ///
    /// # Errors
    ///
    /// Returns [`TicketDomainError::NotTicketParticipant`] otherwise.
    pub fn ensure_participant(&self, user_id: UserId) -> Result<(), TicketDomainError> {
        if self.employee_user_id == user_id || self.is_owned_by(user_id) {
            return Ok(());
        }
        Err(TicketDomainError::NotTicketParticipant {
            ticket_id: self.id,
            user_id,
        })
    }

    /// Checks the ownership invariants: no admin exactly when `New`, and a
    /// closed ticket always records the admin who closed it.
    #[must_use]
    pub const fn satisfies_ownership_invariant(&self) -> bool {
        let unowned = self.admin_user_id.is_none();
        let is_new = matches!(self.status, TicketStatus::New);
        unowned == is_new
    }

    /// Claims a `New` ticket for `admin`, making it `Active`.
    ///
    /// # Errors
    ///
    /// Returns [`TicketDomainError::InvalidTransition`] if the ticket has
    /// already been claimed or closed. The ticket is left untouched.
    pub fn assign_admin(
        &mut self,
        admin: UserId,
        clock: &impl Clock,
    ) -> Result<(), TicketDomainError> {
        self.ensure_transition(TicketStatus::Active)?;
        self.admin_user_id = Some(admin);
        self.status = TicketStatus::Active;
        self.touch(clock);
        Ok(())
    }

    /// Closes an `Active` ticket on behalf of its owning admin.
    ///
    /// # Errors
    ///
    /// Returns [`TicketDomainError::NotOwningAdmin`] when another admin owns
    /// the ticket, whatever its status, and
    /// [`TicketDomainError::InvalidTransition`] unless the ticket is `Active`.
    /// An unclaimed ticket reports the transition.
    pub fn close(&mut self, admin: UserId, clock: &impl Clock) -> Result<(), TicketDomainError> {
        if self.admin_user_id.is_some() {
            self.ensure_owned_by(admin)?;
        }
        self.ensure_transition(TicketStatus::Closed)?;
        self.status = TicketStatus::Closed;
        self.touch(clock);
        Ok(())
    }

    /// Records the employee's satisfaction rating on a closed ticket.
    ///
    /// # Errors
    ///
    /// Returns [`TicketDomainError::NotTicketCreator`] for other users,
    /// [`TicketDomainError::FeedbackRequiresClosedTicket`] before closure and
    /// [`TicketDomainError::FeedbackAlreadyRecorded`] on a second attempt.
    pub fn add_feedback(
        &mut self,
        employee: UserId,
        feedback: Feedback,
        clock: &impl Clock,
    ) -> Result<(), TicketDomainError> {
        self.ensure_created_by(employee)?;
        if self.status != TicketStatus::Closed {
            return Err(TicketDomainError::FeedbackRequiresClosedTicket(self.id));
        }
        if self.feedback.is_some() {
            return Err(TicketDomainError::FeedbackAlreadyRecorded(self.id));
        }
        self.feedback = Some(feedback);
        self.touch(clock);
        Ok(())
    }

    /// Replaces title and description while the ticket is still open.
    ///
    /// # Errors
    ///
    /// Returns [`TicketDomainError::NotTicketCreator`] for other users,
    /// [`TicketDomainError::TicketClosed`] once closed, or a blank-field
    /// error.
    pub fn update_details(
        &mut self,
        employee: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), TicketDomainError> {
        self.ensure_created_by(employee)?;
        if self.status.is_terminal() {
            return Err(TicketDomainError::TicketClosed(self.id));
        }
        let raw_title: String = title.into();
        let raw_description: String = description.into();
        let (clean_title, clean_description) = validate_details(&raw_title, &raw_description)?;
        self.title = clean_title;
        self.description = clean_description;
        self.touch(clock);
        Ok(())
    }

    /// Checks that `requester` may ask to take this ticket over.
    ///
    /// # Errors
    ///
    /// Returns [`TicketDomainError::TakeoverOfUnassignedTicket`],
    /// [`TicketDomainError::SelfTakeover`] or
    /// [`TicketDomainError::TakeoverOfClosedTicket`].
    pub fn ensure_takeover_allowed(&self, requester: UserId) -> Result<(), TicketDomainError> {
        let Some(owner) = self.admin_user_id else {
            return Err(TicketDomainError::TakeoverOfUnassignedTicket(self.id));
        };
        if owner == requester {
            return Err(TicketDomainError::SelfTakeover {
                ticket_id: self.id,
                user_id: requester,
            });
        }
        if self.status != TicketStatus::Active {
            return Err(TicketDomainError::TakeoverOfClosedTicket(self.id));
        }
        Ok(())
    }

    /// Checks that `decider` currently owns the ticket a request targets.
    ///
    /// Ownership is read from the ticket as it is now, never from the state
    /// at request creation.
    ///
    /// # Errors
    ///
    /// Returns [`TicketDomainError::TakeoverTicketMismatch`] if the request
    /// references another ticket and [`TicketDomainError::NotOwningAdmin`]
    /// when `decider` is not the owner.
    pub fn ensure_decidable_by(
        &self,
        takeover: &TakeoverRequest,
        decider: UserId,
    ) -> Result<(), TicketDomainError> {
        if takeover.ticket_id() != self.id {
            return Err(TicketDomainError::TakeoverTicketMismatch {
                takeover_id: takeover.id(),
                ticket_id: self.id,
            });
        }
        self.ensure_owned_by(decider)
    }

    /// Hands ownership over to the admin who created `takeover`.
    ///
    /// Status stays `Active`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::ensure_decidable_by`], or
    /// [`TicketDomainError::StaleTakeover`] when the ticket is no longer
    /// `Active` or the requester already owns it.
    pub fn transfer_to(
        &mut self,
        takeover: &TakeoverRequest,
        decider: UserId,
        clock: &impl Clock,
    ) -> Result<(), TicketDomainError> {
        self.ensure_decidable_by(takeover, decider)?;
        let requester = takeover.requester();
        if self.status != TicketStatus::Active || self.is_owned_by(requester) {
            return Err(TicketDomainError::StaleTakeover {
                takeover_id: takeover.id(),
                ticket_id: self.id,
            });
        }
        self.admin_user_id = Some(requester);
        self.touch(clock);
        Ok(())
    }

    fn ensure_transition(&self, target: TicketStatus) -> Result<(), TicketDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(TicketDomainError::InvalidTransition {
                ticket_id: self.id,
                from: self.status,
                to: target,
            });
        }
        Ok(())
    }

    fn ensure_owned_by(&self, admin: UserId) -> Result<(), TicketDomainError> {
        if !self.is_owned_by(admin) {
            return Err(TicketDomainError::NotOwningAdmin {
                ticket_id: self.id,
                user_id: admin,
            });
        }
        Ok(())
    }

    fn ensure_created_by(&self, employee: UserId) -> Result<(), TicketDomainError> {
        if self.employee_user_id != employee {
            return Err(TicketDomainError::NotTicketCreator {
                ticket_id: self.id,
                user_id: employee,
            });
        }
        Ok(())
    }

    /// Refreshes `updated_at` and advances the row version.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
        self.version = self.version.next();
    }
}

impl TryFrom<PersistedTicketData> for Ticket {
    type Error = TicketDomainError;

    fn try_from(data: PersistedTicketData) -> Result<Self, Self::Error> {
        Self::from_persisted(data)
    }
}

fn validate_details(title: &str, description: &str) -> Result<(String, String), TicketDomainError> {
    let trimmed_title = title.trim();
    if trimmed_title.is_empty() {
        return Err(TicketDomainError::EmptyTitle);
    }
    let trimmed_description = description.trim();
    if trimmed_description.is_empty() {
        return Err(TicketDomainError::EmptyDescription);
    }
    Ok((trimmed_title.to_owned(), trimmed_description.to_owned()))
}
