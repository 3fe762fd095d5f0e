//! Typed caller identity resolved once per inbound call.

use super::{AccessError, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role held by an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Helpdesk staff that claim, resolve, and hand off tickets.
    Admin,
    /// Staff member filing tickets.
    Employee,
}

impl UserRole {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated user together with their role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Caller {
    user_id: UserId,
    role: UserRole,
}

impl Caller {
    /// Creates a caller with an explicit role.
    #[must_use]
    pub const fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }

    /// Creates an admin caller.
    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self::new(user_id, UserRole::Admin)
    }

    /// Creates an employee caller.
    #[must_use]
    pub const fn employee(user_id: UserId) -> Self {
        Self::new(user_id, UserRole::Employee)
    }

    /// Returns the caller's user identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the caller's role.
    #[must_use]
    pub const fn role(&self) -> UserRole {
        self.role
    }

    /// Returns `true` when the caller is an admin.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}

/// Identity supplied by the transport layer for a single call.
///
/// The ticket core performs no credential checks; it only distinguishes
/// anonymous calls from authenticated ones and enforces roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerIdentity {
    /// No identity could be resolved for the call.
    Anonymous,
    /// The call carries an authenticated user.
    Authenticated(Caller),
}

impl CallerIdentity {
    /// Returns the authenticated caller.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthenticated`] for anonymous calls.
    pub const fn require(&self) -> Result<&Caller, AccessError> {
        match self {
            Self::Authenticated(caller) => Ok(caller),
            Self::Anonymous => Err(AccessError::Unauthenticated),
        }
    }

    /// Returns the authenticated caller when it holds `role`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthenticated`] for anonymous calls and
    /// [`AccessError::RoleRequired`] when the role does not match.
    pub fn require_role(&self, role: UserRole) -> Result<&Caller, AccessError> {
        let caller = self.require()?;
        if caller.role() != role {
            return Err(AccessError::RoleRequired { required: role });
        }
        Ok(caller)
    }
}

impl From<Caller> for CallerIdentity {
    fn from(caller: Caller) -> Self {
        Self::Authenticated(caller)
    }
}

impl From<Option<Caller>> for CallerIdentity {
    fn from(caller: Option<Caller>) -> Self {
        caller.map_or(Self::Anonymous, Self::Authenticated)
    }
}
