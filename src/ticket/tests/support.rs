//! Shared builders for ticket unit tests.

use crate::ticket::domain::{Caller, CallerIdentity, Ticket, TicketDomainError, UserId};
use mockable::DefaultClock;

pub fn new_ticket(employee: UserId) -> Result<Ticket, TicketDomainError> {
    Ticket::new(
        employee,
        "Printer on floor 3 is jammed",
        "Paper tray two reports a jam after every job.",
        &DefaultClock,
    )
}

pub fn active_ticket(employee: UserId, owner: UserId) -> Result<Ticket, TicketDomainError> {
    let mut ticket = new_ticket(employee)?;
    ticket.assign_admin(owner, &DefaultClock)?;
    Ok(ticket)
}

pub fn closed_ticket(employee: UserId, owner: UserId) -> Result<Ticket, TicketDomainError> {
    let mut ticket = active_ticket(employee, owner)?;
    ticket.close(owner, &DefaultClock)?;
    Ok(ticket)
}

pub fn admin(user_id: UserId) -> CallerIdentity {
    Caller::admin(user_id).into()
}

pub fn employee(user_id: UserId) -> CallerIdentity {
    Caller::employee(user_id).into()
}
