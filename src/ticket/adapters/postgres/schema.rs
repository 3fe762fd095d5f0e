//! Diesel schema for helpdesk persistence.

diesel::table! {
    /// Helpdesk tickets.
    tickets (id) {
        /// Ticket identifier.
        id -> Uuid,
        /// Short summary.
        title -> Text,
        /// Problem description.
        description -> Text,
        /// Lifecycle status.
        #[max_length = 16]
        status -> Varchar,
        /// Employee who filed the ticket.
        employee_user_id -> Uuid,
        /// Owning admin, set once the ticket leaves `new`.
        admin_user_id -> Nullable<Uuid>,
        /// Employee rating recorded after closure.
        feedback -> Nullable<Int2>,
        /// Optimistic concurrency token.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Pending admin takeover requests.
    takeover_requests (id) {
        /// Request identifier.
        id -> Uuid,
        /// Ticket the requester wants to own.
        ticket_id -> Uuid,
        /// Requesting admin.
        admin_user_id -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Messages on a ticket's thread.
    ticket_messages (id) {
        /// Message identifier.
        id -> Uuid,
        /// Ticket the message belongs to.
        ticket_id -> Uuid,
        /// Employee or admin who wrote the message.
        author_user_id -> Uuid,
        /// Message body.
        content -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(takeover_requests -> tickets (ticket_id));
diesel::joinable!(ticket_messages -> tickets (ticket_id));
diesel::allow_tables_to_appear_in_same_query!(tickets, takeover_requests, ticket_messages);
