//! Diesel row models for helpdesk persistence.

use super::schema::{takeover_requests, ticket_messages, tickets};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for tickets.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tickets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TicketRow {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub employee_user_id: uuid::Uuid,
    pub admin_user_id: Option<uuid::Uuid>,
    pub feedback: Option<i16>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert and update model for tickets.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tickets)]
#[diesel(treat_none_as_null = true)]
pub struct TicketRecord {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub employee_user_id: uuid::Uuid,
    pub admin_user_id: Option<uuid::Uuid>,
    pub feedback: Option<i16>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query result row for takeover requests.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = takeover_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TakeoverRow {
    pub id: uuid::Uuid,
    pub ticket_id: uuid::Uuid,
    pub admin_user_id: uuid::Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert model for takeover requests.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = takeover_requests)]
pub struct NewTakeoverRow {
    pub id: uuid::Uuid,
    pub ticket_id: uuid::Uuid,
    pub admin_user_id: uuid::Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query and insert model for ticket messages.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = ticket_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TicketMessageRow {
    pub id: uuid::Uuid,
    pub ticket_id: uuid::Uuid,
    pub author_user_id: uuid::Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
