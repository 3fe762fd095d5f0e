//! Bounded re-validation after optimistic concurrency conflicts.

use super::error::{TicketServiceError, TicketServiceResult};
use crate::ticket::{domain::TicketId, ports::TicketRepositoryError};
use std::future::Future;

/// Runs `attempt` until it stops failing with a version conflict.
///
/// Each round must re-read the ticket and re-run domain validation, so the
/// loser of a race reports the business error implied by the winner's state.
pub(super) async fn revalidate_on_conflict<T, F, Fut>(
    max_attempts: u32,
    ticket_id: TicketId,
    mut attempt: F,
) -> TicketServiceResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TicketServiceResult<T>>,
{
    for round in 1..=max_attempts {
        match attempt().await {
            Err(TicketServiceError::Repository(TicketRepositoryError::VersionConflict {
                expected,
                ..
            })) => {
                tracing::debug!(%ticket_id, %expected, round, "ticket changed concurrently, re-validating");
            }
            outcome => return outcome,
        }
    }

    tracing::warn!(%ticket_id, attempts = max_attempts, "ticket still contended, giving up");
    Err(TicketServiceError::Contended {
        ticket_id,
        attempts: max_attempts,
    })
}
