//! Ticket persistence against `PostgreSQL`.

use super::helpers::{TestDatabase, at_minute, database, ensure_same_state, ticket_at};
use diesel::connection::SimpleConnection;
use helpdesk::ticket::{
    domain::{Feedback, PageRequest, TicketId, TicketStatus, TicketVersion, UserId},
    ports::{TicketRepository, TicketRepositoryError},
};
use mockable::DefaultClock;
use rstest::rstest;

#[rstest]
#[ignore = "requires a PostgreSQL server in HELPDESK_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn stored_ticket_round_trips(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let employee = UserId::new();
    let owner = UserId::new();
    let mut ticket = ticket_at(employee, Some(owner), TicketStatus::Active, 0)?;
    ticket.close(owner, &DefaultClock)?;
    ticket.add_feedback(employee, Feedback::new(5)?, &DefaultClock)?;

    db.store.store(&ticket).await?;
    let found = db
        .store
        .find_by_id(ticket.id())
        .await?
        .ok_or_else(|| eyre::eyre!("stored ticket missing"))?;

    ensure_same_state(&found, &ticket)?;
    eyre::ensure!(found.created_at() == ticket.created_at(), "created_at differs");
    eyre::ensure!(found.employee_user_id() == employee, "employee differs");
    Ok(())
}

#[rstest]
#[ignore = "requires a PostgreSQL server in HELPDESK_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn missing_ticket_is_none(database: eyre::Result<TestDatabase>) -> eyre::Result<()> {
    let db = database?;
    let found = db.store.find_by_id(TicketId::new()).await?;
    eyre::ensure!(found.is_none(), "expected no ticket, got {found:?}");
    Ok(())
}

#[rstest]
#[ignore = "requires a PostgreSQL server in HELPDESK_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_ticket_is_reported(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let ticket = ticket_at(UserId::new(), None, TicketStatus::New, 0)?;
    db.store.store(&ticket).await?;

    let result = db.store.store(&ticket).await;
    eyre::ensure!(
        matches!(result, Err(TicketRepositoryError::DuplicateTicket(id)) if id == ticket.id()),
        "expected duplicate ticket error, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[ignore = "requires a PostgreSQL server in HELPDESK_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn stale_update_is_refused_and_leaves_row(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let original = ticket_at(UserId::new(), None, TicketStatus::New, 0)?;
    db.store.store(&original).await?;

    let winner = UserId::new();
    let mut first = original.clone();
    first.assign_admin(winner, &DefaultClock)?;
    db.store.update(&first, original.version()).await?;

    let mut second = original.clone();
    second.assign_admin(UserId::new(), &DefaultClock)?;
    let result = db.store.update(&second, original.version()).await;
    eyre::ensure!(
        matches!(
            result,
            Err(TicketRepositoryError::VersionConflict { expected, .. })
                if expected == TicketVersion::INITIAL
        ),
        "expected version conflict, got {result:?}"
    );

    let stored = db
        .store
        .find_by_id(original.id())
        .await?
        .ok_or_else(|| eyre::eyre!("ticket missing"))?;
    ensure_same_state(&stored, &first)?;
    Ok(())
}

#[rstest]
#[ignore = "requires a PostgreSQL server in HELPDESK_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn update_of_missing_ticket_reports_not_found(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let ticket = ticket_at(UserId::new(), None, TicketStatus::New, 0)?;
    let result = db.store.update(&ticket, ticket.version()).await;
    eyre::ensure!(
        matches!(result, Err(TicketRepositoryError::TicketNotFound(id)) if id == ticket.id()),
        "expected not found, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[ignore = "requires a PostgreSQL server in HELPDESK_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn listings_are_newest_first_filtered_and_paged(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let employee = UserId::new();
    let owner = UserId::new();
    let mut ids = Vec::new();
    for minute in 0..12 {
        let (status, admin) = if minute < 4 {
            (TicketStatus::Active, Some(owner))
        } else {
            (TicketStatus::New, None)
        };
        let ticket = ticket_at(employee, admin, status, minute)?;
        db.store.store(&ticket).await?;
        ids.push(ticket.id());
    }
    db.store
        .store(&ticket_at(UserId::new(), None, TicketStatus::New, 30)?)
        .await?;

    let second_page = db
        .store
        .list_by_employee(employee, PageRequest::new(2, 10)?)
        .await?;
    let listed: Vec<TicketId> = second_page.items.iter().map(|ticket| ticket.id()).collect();
    let expected: Vec<TicketId> = ids.iter().take(2).rev().copied().collect();
    eyre::ensure!(listed == expected, "second page holds the two oldest");
    eyre::ensure!(second_page.total_count == 12, "count is per employee");
    eyre::ensure!(second_page.total_pages() == 2, "two pages of ten");

    let active = db
        .store
        .list_by_status(Some(TicketStatus::Active), PageRequest::first())
        .await?;
    let active_ids: Vec<TicketId> = active.items.iter().map(|ticket| ticket.id()).collect();
    let expected_active: Vec<TicketId> = ids.iter().take(4).rev().copied().collect();
    eyre::ensure!(active_ids == expected_active, "active tickets newest first");
    eyre::ensure!(active.total_count == 4, "four active tickets");

    let everything = db.store.list_by_status(None, PageRequest::first()).await?;
    eyre::ensure!(everything.total_count == 13, "unfiltered listing counts every ticket");
    eyre::ensure!(
        everything.items.first().map(|ticket| ticket.created_at()) == Some(at_minute(30)),
        "unfiltered listing is newest first"
    );
    Ok(())
}

#[rstest]
#[case::new_with_owner(
    "'new'",
    "'00000000-0000-0000-0000-000000000002'",
    "NULL"
)]
#[case::active_without_owner("'active'", "NULL", "NULL")]
#[case::feedback_before_close(
    "'active'",
    "'00000000-0000-0000-0000-000000000002'",
    "3"
)]
#[case::unknown_status("'parked'", "NULL", "NULL")]
#[ignore = "requires a PostgreSQL server in HELPDESK_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn schema_rejects_inconsistent_rows(
    database: eyre::Result<TestDatabase>,
    #[case] status: &str,
    #[case] admin: &str,
    #[case] feedback: &str,
) -> eyre::Result<()> {
    let db = database?;
    let mut connection = db.connection()?;
    let insert = format!(
        "INSERT INTO tickets (id, title, description, status, employee_user_id, \
         admin_user_id, feedback, version, created_at, updated_at) VALUES \
         ('00000000-0000-0000-0000-0000000000aa', 'Title', 'Description', {status}, \
         '00000000-0000-0000-0000-000000000001', {admin}, {feedback}, 1, now(), now())"
    );
    let result = connection.batch_execute(&insert);
    eyre::ensure!(result.is_err(), "row with status {status} admin {admin} was accepted");
    Ok(())
}

#[rstest]
#[ignore = "requires a PostgreSQL server in HELPDESK_TEST_DATABASE_URL"]
#[tokio::test(flavor = "multi_thread")]
async fn row_breaking_domain_rules_is_reported_on_read(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let ticket = ticket_at(UserId::new(), Some(UserId::new()), TicketStatus::Active, 0)?;
    db.store.store(&ticket).await?;
    db.connection()?.batch_execute(&format!(
        "ALTER TABLE tickets DROP CONSTRAINT tickets_feedback_requires_closed; \
         UPDATE tickets SET feedback = 3 WHERE id = '{}'",
        ticket.id()
    ))?;

    let result = db.store.find_by_id(ticket.id()).await;
    eyre::ensure!(
        matches!(result, Err(TicketRepositoryError::Persistence(_))),
        "expected the row to be refused, got {result:?}"
    );
    Ok(())
}
