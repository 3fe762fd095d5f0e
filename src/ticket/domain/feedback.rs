//! Employee satisfaction rating for closed tickets.

use super::TicketDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Satisfaction rating from 1 (poor) to 5 (excellent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Feedback(u8);

impl Feedback {
    /// Lowest accepted rating.
    pub const MIN: u8 = 1;
    /// Highest accepted rating.
    pub const MAX: u8 = 5;

    /// Creates a validated rating.
    ///
    /// # Errors
    ///
    /// Returns [`TicketDomainError::InvalidFeedback`] outside `1..=5`.
    pub const fn new(value: u8) -> Result<Self, TicketDomainError> {
        if value < Self::MIN || value > Self::MAX {
            return Err(TicketDomainError::InvalidFeedback(value));
        }
        Ok(Self(value))
    }

    /// Returns the numeric rating.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Feedback {
    type Error = TicketDomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Feedback> for u8 {
    fn from(feedback: Feedback) -> Self {
        feedback.0
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}
