//! Given steps for ticket takeover BDD scenarios.

use super::world::{HelpdeskWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"employee "{employee}" filed ticket "{ticket}""#)]
fn employee_filed_ticket(
    world: &mut HelpdeskWorld,
    employee: String,
    ticket: String,
) -> Result<(), eyre::Report> {
    let identity = world.employee(&employee);
    let created = run_async(world.lifecycle.create_ticket(
        &identity,
        "Laptop will not boot",
        "Black screen after the latest update.",
    ))
    .wrap_err("file ticket for scenario")?;
    world.remember_ticket(ticket, created.id());
    Ok(())
}

#[given(r#"admin "{admin}" assigned ticket "{ticket}""#)]
fn admin_assigned_ticket(
    world: &mut HelpdeskWorld,
    admin: String,
    ticket: String,
) -> Result<(), eyre::Report> {
    let identity = world.admin(&admin);
    let ticket_id = world.ticket(&ticket)?;
    run_async(world.lifecycle.assign_admin(&identity, ticket_id))
        .wrap_err("assign ticket for scenario")?;
    Ok(())
}

#[given(r#"admin "{admin}" requested takeover "{request}" of ticket "{ticket}""#)]
fn admin_requested_takeover(
    world: &mut HelpdeskWorld,
    admin: String,
    request: String,
    ticket: String,
) -> Result<(), eyre::Report> {
    let identity = world.admin(&admin);
    let ticket_id = world.ticket(&ticket)?;
    let created = run_async(world.takeovers.create_takeover_request(&identity, ticket_id))
        .wrap_err("file takeover request for scenario")?;
    world.remember_request(request, created.id(), created.requester());
    Ok(())
}
