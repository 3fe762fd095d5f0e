//! Then steps for ticket takeover BDD scenarios.

use super::world::{HelpdeskWorld, run_async};
use helpdesk::ticket::{
    domain::{Caller, CallerIdentity, PageRequest, TicketStatus, UserId},
    services::TicketServiceError,
};
use rstest_bdd_macros::then;

/// An admin outside the scenario cast. Admins see every ticket.
fn observer() -> CallerIdentity {
    CallerIdentity::from(Caller::admin(UserId::new()))
}

#[then("the operation succeeds")]
fn operation_succeeds(world: &HelpdeskWorld) -> Result<(), eyre::Report> {
    match world.last_result()? {
        Ok(()) => Ok(()),
        Err(err) => Err(eyre::eyre!("expected success, got {err:?}")),
    }
}

#[then(r#"the operation fails with "{kind}""#)]
fn operation_fails_with(world: &HelpdeskWorld, kind: String) -> Result<(), eyre::Report> {
    match world.last_result()? {
        Err(err) if err.kind().as_str() == kind => Ok(()),
        other => Err(eyre::eyre!("expected a {kind} failure, got {other:?}")),
    }
}

#[then(r#"ticket "{ticket}" is "{status}" and owned by "{admin}""#)]
fn ticket_is_owned_by(
    world: &HelpdeskWorld,
    ticket: String,
    status: String,
    admin: String,
) -> Result<(), eyre::Report> {
    let expected_status = TicketStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let expected_owner = world.known_user(&admin)?;
    let ticket_id = world.ticket(&ticket)?;

    let found = run_async(world.lifecycle.find_ticket(&observer(), ticket_id))?;
    if found.status() != expected_status {
        return Err(eyre::eyre!(
            "expected status {}, found {}",
            expected_status.as_str(),
            found.status().as_str()
        ));
    }
    if found.admin_user_id() != Some(expected_owner) {
        return Err(eyre::eyre!(
            "expected owner {admin} ({expected_owner}), found {:?}",
            found.admin_user_id()
        ));
    }
    Ok(())
}

#[then(r#"takeover "{request}" no longer exists"#)]
fn takeover_no_longer_exists(world: &HelpdeskWorld, request: String) -> Result<(), eyre::Report> {
    let (takeover_id, requester) = world.request_with_requester(&request)?;
    let identity = CallerIdentity::from(Caller::admin(requester));
    match run_async(world.takeovers.find_takeover(&identity, takeover_id)) {
        Err(TicketServiceError::TakeoverNotFound(id)) if id == takeover_id => Ok(()),
        other => Err(eyre::eyre!("expected {request} to be gone, got {other:?}")),
    }
}

#[then(r#"takeover "{request}" is still pending"#)]
fn takeover_still_pending(world: &HelpdeskWorld, request: String) -> Result<(), eyre::Report> {
    let (takeover_id, requester) = world.request_with_requester(&request)?;
    let identity = CallerIdentity::from(Caller::admin(requester));
    let found = run_async(world.takeovers.find_takeover(&identity, takeover_id))?;
    if found.requester() != requester {
        return Err(eyre::eyre!(
            "expected {request} to be filed by {requester}, found {}",
            found.requester()
        ));
    }
    Ok(())
}

#[then(r#"employee "{employee}" reads {count:usize} messages on ticket "{ticket}""#)]
fn employee_reads_messages(
    world: &HelpdeskWorld,
    employee: String,
    count: usize,
    ticket: String,
) -> Result<(), eyre::Report> {
    let identity = CallerIdentity::from(Caller::employee(world.known_user(&employee)?));
    let ticket_id = world.ticket(&ticket)?;
    let thread = run_async(
        world
            .messages
            .list_messages(&identity, ticket_id, PageRequest::first()),
    )?;
    if thread.items.len() != count {
        return Err(eyre::eyre!(
            "expected {count} messages, found {}",
            thread.items.len()
        ));
    }
    Ok(())
}
