//! `PostgreSQL` store implementing the ticket, takeover and message ports.
//!
//! Every write runs in a transaction that first locks the ticket row and
//! checks its version, so a stale caller never overwrites a newer state.

use super::{
    models::{NewTakeoverRow, TakeoverRow, TicketMessageRow, TicketRecord, TicketRow},
    schema::{takeover_requests, ticket_messages, tickets},
};
use crate::config::HelpdeskConfig;
use crate::ticket::{
    domain::{
        Feedback, Page, PageRequest, PersistedTakeoverData, PersistedTicketData,
        PersistedTicketMessageData, TakeoverDecision, TakeoverId, TakeoverRequest, Ticket, TicketId,
        TicketMessage, TicketMessageId, TicketStatus, TicketVersion, UserId,
    },
    ports::{
        TakeoverRepository, TicketMessageRepository, TicketRepository, TicketRepositoryError,
        TicketRepositoryResult,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by helpdesk adapters.
pub type HelpdeskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed store for tickets, takeover requests and messages.
#[derive(Debug, Clone)]
pub struct PostgresHelpdeskStore {
    pool: HelpdeskPgPool,
}

#[derive(Debug, Clone, Copy)]
enum RowLock {
    Share,
    Exclusive,
}

impl PostgresHelpdeskStore {
    /// Creates a store from an existing connection pool.
    #[must_use]
    pub const fn new(pool: HelpdeskPgPool) -> Self {
        Self { pool }
    }

    /// Builds a connection pool from `config` and wraps it in a store.
    ///
    /// # Errors
    ///
    /// Returns [`TicketRepositoryError::Persistence`] when no database URL is
    /// configured or the pool cannot be built.
    pub fn connect(config: &HelpdeskConfig) -> TicketRepositoryResult<Self> {
        let url = config
            .require_database_url()
            .map_err(TicketRepositoryError::persistence)?;
        let manager = ConnectionManager::<PgConnection>::new(url);
        let pool = Pool::builder()
            .max_size(config.pool_max_size)
            .build(manager)
            .map_err(TicketRepositoryError::persistence)?;
        Ok(Self::new(pool))
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &HelpdeskPgPool {
        &self.pool
    }

    async fn run_blocking<F, T>(&self, f: F) -> TicketRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TicketRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TicketRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TicketRepositoryError::persistence)?
    }
}

impl From<DieselError> for TicketRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl TicketRepository for PostgresHelpdeskStore {
    async fn store(&self, ticket: &Ticket) -> TicketRepositoryResult<()> {
        let ticket_id = ticket.id();
        let record = to_record(ticket)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(tickets::table)
                .values(&record)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TicketRepositoryError::DuplicateTicket(ticket_id)
                    }
                    _ => TicketRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(
        &self,
        ticket: &Ticket,
        expected_version: TicketVersion,
    ) -> TicketRepositoryResult<()> {
        let updated = ticket.clone();
        let record = to_record(ticket)?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, TicketRepositoryError, _>(|tx| {
                ensure_version(tx, updated.id(), expected_version, RowLock::Exclusive)?;
                diesel::update(tickets::table.find(record.id))
                    .set(&record)
                    .execute(tx)?;
                purge_stale_takeovers(tx, &updated)
            })
        })
        .await
    }

    async fn find_by_id(&self, id: TicketId) -> TicketRepositoryResult<Option<Ticket>> {
        self.run_blocking(move |connection| {
            let row = tickets::table
                .find(id.into_inner())
                .select(TicketRow::as_select())
                .first::<TicketRow>(connection)
                .optional()?;
            row.map(row_to_ticket).transpose()
        })
        .await
    }

    async fn list_by_employee(
        &self,
        employee: UserId,
        page: PageRequest,
    ) -> TicketRepositoryResult<Page<Ticket>> {
        let employee_id = employee.into_inner();
        self.run_blocking(move |connection| {
            let (offset, limit) = page_bounds(page)?;
            let total = tickets::table
                .filter(tickets::employee_user_id.eq(employee_id))
                .count()
                .get_result::<i64>(connection)?;
            let rows = tickets::table
                .filter(tickets::employee_user_id.eq(employee_id))
                .order((tickets::created_at.desc(), tickets::id.desc()))
                .offset(offset)
                .limit(limit)
                .select(TicketRow::as_select())
                .load::<TicketRow>(connection)?;
            ticket_page(rows, page, total)
        })
        .await
    }

    async fn list_by_status(
        &self,
        status: Option<TicketStatus>,
        page: PageRequest,
    ) -> TicketRepositoryResult<Page<Ticket>> {
        self.run_blocking(move |connection| {
            let (offset, limit) = page_bounds(page)?;
            let mut count_query = tickets::table.into_boxed();
            let mut rows_query = tickets::table.into_boxed();
            if let Some(wanted) = status {
                count_query = count_query.filter(tickets::status.eq(wanted.as_str()));
                rows_query = rows_query.filter(tickets::status.eq(wanted.as_str()));
            }
            let total = count_query.count().get_result::<i64>(connection)?;
            let rows = rows_query
                .order((tickets::created_at.desc(), tickets::id.desc()))
                .offset(offset)
                .limit(limit)
                .select(TicketRow::as_select())
                .load::<TicketRow>(connection)?;
            ticket_page(rows, page, total)
        })
        .await
    }
}

#[async_trait]
impl TakeoverRepository for PostgresHelpdeskStore {
    async fn store_takeover(
        &self,
        request: &TakeoverRequest,
        expected_ticket_version: TicketVersion,
    ) -> TicketRepositoryResult<()> {
        let takeover_id = request.id();
        let ticket_id = request.ticket_id();
        let row = to_new_takeover_row(request);

        self.run_blocking(move |connection| {
            connection.transaction::<_, TicketRepositoryError, _>(|tx| {
                ensure_version(tx, ticket_id, expected_ticket_version, RowLock::Share)?;
                diesel::insert_into(takeover_requests::table)
                    .values(&row)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            TicketRepositoryError::DuplicateTakeover(takeover_id)
                        }
                        _ => TicketRepositoryError::persistence(err),
                    })?;
                Ok(())
            })
        })
        .await
    }

    async fn find_takeover(
        &self,
        id: TakeoverId,
    ) -> TicketRepositoryResult<Option<TakeoverRequest>> {
        self.run_blocking(move |connection| {
            let row = takeover_requests::table
                .find(id.into_inner())
                .select(TakeoverRow::as_select())
                .first::<TakeoverRow>(connection)
                .optional()?;
            Ok(row.map(row_to_takeover))
        })
        .await
    }

    async fn delete_takeover(&self, id: TakeoverId) -> TicketRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let removed =
                diesel::delete(takeover_requests::table.find(id.into_inner())).execute(connection)?;
            if removed == 0 {
                return Err(TicketRepositoryError::TakeoverNotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn resolve_takeover(
        &self,
        takeover_id: TakeoverId,
        ticket: &Ticket,
        expected_version: TicketVersion,
        decision: TakeoverDecision,
    ) -> TicketRepositoryResult<()> {
        let resolved = ticket.clone();
        let record = to_record(ticket)?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, TicketRepositoryError, _>(|tx| {
                ensure_version(tx, resolved.id(), expected_version, RowLock::Exclusive)?;
                let removed = diesel::delete(
                    takeover_requests::table
                        .filter(takeover_requests::id.eq(takeover_id.into_inner()))
                        .filter(takeover_requests::ticket_id.eq(record.id)),
                )
                .execute(tx)?;
                if removed == 0 {
                    return Err(TicketRepositoryError::TakeoverNotFound(takeover_id));
                }

                if decision == TakeoverDecision::Accept {
                    diesel::update(tickets::table.find(record.id))
                        .set(&record)
                        .execute(tx)?;
                    purge_stale_takeovers(tx, &resolved)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn list_incoming(
        &self,
        owner: UserId,
        page: PageRequest,
    ) -> TicketRepositoryResult<Page<TakeoverRequest>> {
        let owner_id = owner.into_inner();
        self.run_blocking(move |connection| {
            let (offset, limit) = page_bounds(page)?;
            let total = takeover_requests::table
                .inner_join(tickets::table)
                .filter(tickets::admin_user_id.eq(owner_id))
                .count()
                .get_result::<i64>(connection)?;
            let rows = takeover_requests::table
                .inner_join(tickets::table)
                .filter(tickets::admin_user_id.eq(owner_id))
                .order((takeover_requests::created_at.asc(), takeover_requests::id.asc()))
                .offset(offset)
                .limit(limit)
                .select(TakeoverRow::as_select())
                .load::<TakeoverRow>(connection)?;
            takeover_page(rows, page, total)
        })
        .await
    }

    async fn list_outgoing(
        &self,
        requester: UserId,
        page: PageRequest,
    ) -> TicketRepositoryResult<Page<TakeoverRequest>> {
        let requester_id = requester.into_inner();
        self.run_blocking(move |connection| {
            let (offset, limit) = page_bounds(page)?;
            let total = takeover_requests::table
                .filter(takeover_requests::admin_user_id.eq(requester_id))
                .count()
                .get_result::<i64>(connection)?;
            let rows = takeover_requests::table
                .filter(takeover_requests::admin_user_id.eq(requester_id))
                .order((takeover_requests::created_at.asc(), takeover_requests::id.asc()))
                .offset(offset)
                .limit(limit)
                .select(TakeoverRow::as_select())
                .load::<TakeoverRow>(connection)?;
            takeover_page(rows, page, total)
        })
        .await
    }
}

#[async_trait]
impl TicketMessageRepository for PostgresHelpdeskStore {
    async fn store_message(
        &self,
        message: &TicketMessage,
        expected_ticket_version: TicketVersion,
    ) -> TicketRepositoryResult<()> {
        let message_id = message.id();
        let ticket_id = message.ticket_id();
        let row = to_message_row(message);

        self.run_blocking(move |connection| {
            connection.transaction::<_, TicketRepositoryError, _>(|tx| {
                ensure_version(tx, ticket_id, expected_ticket_version, RowLock::Share)?;
                diesel::insert_into(ticket_messages::table)
                    .values(&row)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            TicketRepositoryError::DuplicateMessage(message_id)
                        }
                        _ => TicketRepositoryError::persistence(err),
                    })?;
                Ok(())
            })
        })
        .await
    }

    async fn list_messages(
        &self,
        ticket_id: TicketId,
        page: PageRequest,
    ) -> TicketRepositoryResult<Page<TicketMessage>> {
        let ticket_uuid = ticket_id.into_inner();
        self.run_blocking(move |connection| {
            let (offset, limit) = page_bounds(page)?;
            let total = ticket_messages::table
                .filter(ticket_messages::ticket_id.eq(ticket_uuid))
                .count()
                .get_result::<i64>(connection)?;
            let rows = ticket_messages::table
                .filter(ticket_messages::ticket_id.eq(ticket_uuid))
                .order((ticket_messages::created_at.asc(), ticket_messages::id.asc()))
                .offset(offset)
                .limit(limit)
                .select(TicketMessageRow::as_select())
                .load::<TicketMessageRow>(connection)?;
            let items = rows.into_iter().map(row_to_message).collect();
            Ok(Page::new(items, page, total_count(total)?))
        })
        .await
    }
}

/// Locks the ticket row and checks it is still at `expected`.
fn ensure_version(
    connection: &mut PgConnection,
    ticket_id: TicketId,
    expected: TicketVersion,
    lock: RowLock,
) -> TicketRepositoryResult<()> {
    let query = tickets::table
        .find(ticket_id.into_inner())
        .select(tickets::version);
    let current = match lock {
        RowLock::Share => query.for_share().get_result::<i64>(connection),
        RowLock::Exclusive => query.for_update().get_result::<i64>(connection),
    }
    .optional()?
    .ok_or(TicketRepositoryError::TicketNotFound(ticket_id))?;

    if current != version_to_column(expected)? {
        return Err(TicketRepositoryError::VersionConflict {
            ticket_id,
            expected,
        });
    }
    Ok(())
}

/// Deletes requests the ticket's new state no longer allows.
fn purge_stale_takeovers(
    connection: &mut PgConnection,
    ticket: &Ticket,
) -> TicketRepositoryResult<()> {
    let pending =
        takeover_requests::table.filter(takeover_requests::ticket_id.eq(ticket.id().into_inner()));
    let purged = match (ticket.status(), ticket.admin_user_id()) {
        (TicketStatus::Active, Some(owner)) => diesel::delete(
            pending.filter(takeover_requests::admin_user_id.eq(owner.into_inner())),
        )
        .execute(connection)?,
        _ => diesel::delete(pending).execute(connection)?,
    };
    if purged > 0 {
        tracing::debug!(ticket_id = %ticket.id(), purged, "discarded stale takeover requests");
    }
    Ok(())
}

fn page_bounds(page: PageRequest) -> TicketRepositoryResult<(i64, i64)> {
    let offset = i64::try_from(page.offset()).map_err(TicketRepositoryError::persistence)?;
    let limit = i64::try_from(page.limit()).map_err(TicketRepositoryError::persistence)?;
    Ok((offset, limit))
}

fn total_count(total: i64) -> TicketRepositoryResult<u64> {
    u64::try_from(total).map_err(TicketRepositoryError::persistence)
}

fn ticket_page(
    rows: Vec<TicketRow>,
    page: PageRequest,
    total: i64,
) -> TicketRepositoryResult<Page<Ticket>> {
    let items = rows
        .into_iter()
        .map(row_to_ticket)
        .collect::<TicketRepositoryResult<Vec<_>>>()?;
    Ok(Page::new(items, page, total_count(total)?))
}

fn takeover_page(
    rows: Vec<TakeoverRow>,
    page: PageRequest,
    total: i64,
) -> TicketRepositoryResult<Page<TakeoverRequest>> {
    let items = rows.into_iter().map(row_to_takeover).collect();
    Ok(Page::new(items, page, total_count(total)?))
}

fn version_to_column(version: TicketVersion) -> TicketRepositoryResult<i64> {
    i64::try_from(version.value()).map_err(TicketRepositoryError::persistence)
}

fn to_record(ticket: &Ticket) -> TicketRepositoryResult<TicketRecord> {
    Ok(TicketRecord {
        id: ticket.id().into_inner(),
        title: ticket.title().to_owned(),
        description: ticket.description().to_owned(),
        status: ticket.status().as_str().to_owned(),
        employee_user_id: ticket.employee_user_id().into_inner(),
        admin_user_id: ticket.admin_user_id().map(UserId::into_inner),
        feedback: ticket.feedback().map(|rating| i16::from(rating.value())),
        version: version_to_column(ticket.version())?,
        created_at: ticket.created_at(),
        updated_at: ticket.updated_at(),
    })
}

fn row_to_ticket(row: TicketRow) -> TicketRepositoryResult<Ticket> {
    let TicketRow {
        id,
        title,
        description,
        status: persisted_status,
        employee_user_id,
        admin_user_id,
        feedback: persisted_feedback,
        version: persisted_version,
        created_at,
        updated_at,
    } = row;

    let status =
        TicketStatus::try_from(persisted_status.as_str()).map_err(TicketRepositoryError::persistence)?;
    let feedback = persisted_feedback
        .map(|raw| {
            let value = u8::try_from(raw).map_err(TicketRepositoryError::persistence)?;
            Feedback::new(value).map_err(TicketRepositoryError::persistence)
        })
        .transpose()?;
    let version = u64::try_from(persisted_version).map_err(TicketRepositoryError::persistence)?;

    Ticket::from_persisted(PersistedTicketData {
        id: TicketId::from_uuid(id),
        title,
        description,
        status,
        employee_user_id: UserId::from_uuid(employee_user_id),
        admin_user_id: admin_user_id.map(UserId::from_uuid),
        feedback,
        version: TicketVersion::new(version),
        created_at,
        updated_at,
    })
    .map_err(TicketRepositoryError::persistence)
}

fn to_new_takeover_row(request: &TakeoverRequest) -> NewTakeoverRow {
    NewTakeoverRow {
        id: request.id().into_inner(),
        ticket_id: request.ticket_id().into_inner(),
        admin_user_id: request.requester().into_inner(),
        created_at: request.created_at(),
        updated_at: request.updated_at(),
    }
}

fn row_to_takeover(row: TakeoverRow) -> TakeoverRequest {
    TakeoverRequest::from_persisted(PersistedTakeoverData {
        id: TakeoverId::from_uuid(row.id),
        ticket_id: TicketId::from_uuid(row.ticket_id),
        admin_user_id: UserId::from_uuid(row.admin_user_id),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn to_message_row(message: &TicketMessage) -> TicketMessageRow {
    TicketMessageRow {
        id: message.id().into_inner(),
        ticket_id: message.ticket_id().into_inner(),
        author_user_id: message.author().into_inner(),
        content: message.content().to_owned(),
        created_at: message.created_at(),
        updated_at: message.updated_at(),
    }
}

fn row_to_message(row: TicketMessageRow) -> TicketMessage {
    TicketMessage::from_persisted(PersistedTicketMessageData {
        id: TicketMessageId::from_uuid(row.id),
        ticket_id: TicketId::from_uuid(row.ticket_id),
        author: UserId::from_uuid(row.author_user_id),
        content: row.content,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
