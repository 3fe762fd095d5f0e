//! Shared test helpers for `PostgreSQL` integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use helpdesk::config::HelpdeskConfig;
use helpdesk::ticket::{
    adapters::postgres::PostgresHelpdeskStore,
    domain::{
        PersistedTakeoverData, PersistedTicketData, TakeoverId, TakeoverRequest, Ticket,
        TicketDomainError, TicketId, TicketStatus, TicketVersion, UserId,
    },
};
use rstest::fixture;
use uuid::Uuid;

/// Environment variable naming the server used by this suite.
pub const TEST_DATABASE_URL_VAR: &str = "HELPDESK_TEST_DATABASE_URL";

/// Migrations applied to each test schema, oldest first.
pub const MIGRATIONS: [&str; 2] = [
    include_str!("../../migrations/2026-10-01-000000_create_helpdesk_tables/up.sql"),
    include_str!("../../migrations/2026-10-02-000000_create_ticket_messages/up.sql"),
];

/// A migrated schema private to one test, dropped when the value goes out
/// of scope.
pub struct TestDatabase {
    base_url: String,
    schema: String,
    pub store: PostgresHelpdeskStore,
}

impl TestDatabase {
    /// Checks out a pooled connection whose search path points at the test
    /// schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot hand out a connection.
    pub fn connection(&self) -> eyre::Result<PooledConnection<ConnectionManager<PgConnection>>> {
        Ok(self.store.pool().get()?)
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let dropped = PgConnection::establish(&self.base_url)
            .map_err(eyre::Report::from)
            .and_then(|mut connection| {
                connection
                    .batch_execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema))
                    .map_err(eyre::Report::from)
            });
        if let Err(err) = dropped {
            tracing::warn!(schema = %self.schema, error = %err, "failed to drop test schema");
        }
    }
}

/// Provides a migrated test schema on the server named by
/// [`TEST_DATABASE_URL_VAR`].
///
/// # Errors
///
/// Returns an error if the variable is unset, or the schema cannot be
/// created or migrated.
#[fixture]
pub fn database() -> eyre::Result<TestDatabase> {
    let base_url = std::env::var(TEST_DATABASE_URL_VAR).map_err(|err| {
        eyre::eyre!("{TEST_DATABASE_URL_VAR} must name a PostgreSQL server: {err}")
    })?;
    let schema = format!("helpdesk_test_{}", Uuid::new_v4().simple());

    let mut connection = PgConnection::establish(&base_url)?;
    connection.batch_execute(&format!("CREATE SCHEMA {schema}; SET search_path TO {schema};"))?;
    for migration in MIGRATIONS {
        connection.batch_execute(migration)?;
    }

    let separator = if base_url.contains('?') { '&' } else { '?' };
    let config = HelpdeskConfig {
        database_url: Some(format!(
            "{base_url}{separator}options=-csearch_path%3D{schema}"
        )),
        pool_max_size: 8,
        ..HelpdeskConfig::default()
    };
    let store = PostgresHelpdeskStore::connect(&config)?;

    Ok(TestDatabase {
        base_url,
        schema,
        store,
    })
}

/// A whole-second timestamp `minutes` after a fixed base, so values survive
/// the microsecond precision of `TIMESTAMPTZ` unchanged.
pub fn at_minute(minutes: i64) -> DateTime<Utc> {
    let base = Utc
        .with_ymd_and_hms(2026, 5, 4, 8, 0, 0)
        .single()
        .unwrap_or_default();
    base + Duration::minutes(minutes)
}

/// Builds a ticket directly in `status`, owned by `owner` unless `New`.
pub fn ticket_at(
    employee: UserId,
    owner: Option<UserId>,
    status: TicketStatus,
    minutes: i64,
) -> Result<Ticket, TicketDomainError> {
    Ticket::from_persisted(PersistedTicketData {
        id: TicketId::new(),
        title: format!("Ticket filed at minute {minutes}"),
        description: "Stored by the PostgreSQL suite".to_owned(),
        status,
        employee_user_id: employee,
        admin_user_id: owner,
        feedback: None,
        version: TicketVersion::INITIAL,
        created_at: at_minute(minutes),
        updated_at: at_minute(minutes),
    })
}

/// Builds a request by `requester` on `ticket`.
pub fn request_at(ticket: &Ticket, requester: UserId, minutes: i64) -> TakeoverRequest {
    TakeoverRequest::from_persisted(PersistedTakeoverData {
        id: TakeoverId::new(),
        ticket_id: ticket.id(),
        admin_user_id: requester,
        created_at: at_minute(minutes),
        updated_at: at_minute(minutes),
    })
}

/// Compares everything but `updated_at`, which domain mutations stamp with
/// sub-microsecond precision.
///
/// # Errors
///
/// Returns an error naming the first differing field.
pub fn ensure_same_state(stored: &Ticket, expected: &Ticket) -> eyre::Result<()> {
    eyre::ensure!(stored.id() == expected.id(), "id differs");
    eyre::ensure!(
        stored.status() == expected.status(),
        "status {:?} != {:?}",
        stored.status(),
        expected.status()
    );
    eyre::ensure!(
        stored.admin_user_id() == expected.admin_user_id(),
        "owner {:?} != {:?}",
        stored.admin_user_id(),
        expected.admin_user_id()
    );
    eyre::ensure!(
        stored.version() == expected.version(),
        "version {} != {}",
        stored.version(),
        expected.version()
    );
    eyre::ensure!(stored.feedback() == expected.feedback(), "feedback differs");
    eyre::ensure!(
        stored.title() == expected.title() && stored.description() == expected.description(),
        "details differ"
    );
    Ok(())
}
