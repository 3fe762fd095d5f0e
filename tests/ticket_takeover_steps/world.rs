//! Shared world state for ticket takeover BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use helpdesk::ticket::{
    adapters::memory::InMemoryHelpdeskStore,
    domain::{Caller, CallerIdentity, TakeoverId, TicketId, UserId},
    services::{
        TakeoverCoordinator, TicketLifecycleService, TicketMessageService, TicketServiceError,
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Lifecycle service type used by the BDD world.
pub type TestLifecycleService = TicketLifecycleService<InMemoryHelpdeskStore, DefaultClock>;
/// Takeover coordinator type used by the BDD world.
pub type TestTakeoverCoordinator = TakeoverCoordinator<InMemoryHelpdeskStore, DefaultClock>;
/// Message service type used by the BDD world.
pub type TestMessageService = TicketMessageService<InMemoryHelpdeskStore, DefaultClock>;

/// Scenario world for ticket takeover behaviour tests.
///
/// People, tickets and requests are referred to by the short names used in
/// the feature file.
pub struct HelpdeskWorld {
    pub lifecycle: TestLifecycleService,
    pub takeovers: TestTakeoverCoordinator,
    pub messages: TestMessageService,
    users: HashMap<String, UserId>,
    tickets: HashMap<String, TicketId>,
    requests: HashMap<String, (TakeoverId, UserId)>,
    pub last_result: Option<Result<(), TicketServiceError>>,
}

impl HelpdeskWorld {
    /// Creates a world backed by one shared in-memory store.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryHelpdeskStore::new());
        let clock = Arc::new(DefaultClock);
        Self {
            lifecycle: TicketLifecycleService::new(Arc::clone(&store), Arc::clone(&clock)),
            takeovers: TakeoverCoordinator::new(Arc::clone(&store), Arc::clone(&clock)),
            messages: TicketMessageService::new(store, clock),
            users: HashMap::new(),
            tickets: HashMap::new(),
            requests: HashMap::new(),
            last_result: None,
        }
    }

    /// Returns the user called `name`, minting an id on first mention.
    pub fn user(&mut self, name: &str) -> UserId {
        *self.users.entry(name.to_owned()).or_default()
    }

    /// Identity of the admin called `name`.
    pub fn admin(&mut self, name: &str) -> CallerIdentity {
        CallerIdentity::from(Caller::admin(self.user(name)))
    }

    /// Identity of the employee called `name`.
    pub fn employee(&mut self, name: &str) -> CallerIdentity {
        CallerIdentity::from(Caller::employee(self.user(name)))
    }

    /// Looks up a user that has already appeared in the scenario.
    pub fn known_user(&self, name: &str) -> Result<UserId, eyre::Report> {
        self.users
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown user {name:?} in scenario world"))
    }

    pub fn remember_ticket(&mut self, name: String, ticket_id: TicketId) {
        self.tickets.insert(name, ticket_id);
    }

    pub fn ticket(&self, name: &str) -> Result<TicketId, eyre::Report> {
        self.tickets
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown ticket {name:?} in scenario world"))
    }

    pub fn remember_request(&mut self, name: String, takeover_id: TakeoverId, requester: UserId) {
        self.requests.insert(name, (takeover_id, requester));
    }

    pub fn request(&self, name: &str) -> Result<TakeoverId, eyre::Report> {
        self.request_with_requester(name).map(|(takeover_id, _)| takeover_id)
    }

    /// Returns the request called `name` together with the admin who filed
    /// it.
    pub fn request_with_requester(
        &self,
        name: &str,
    ) -> Result<(TakeoverId, UserId), eyre::Report> {
        self.requests
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown takeover request {name:?} in scenario world"))
    }

    /// Records the outcome of the latest `When` step.
    pub fn record<T>(&mut self, result: Result<T, TicketServiceError>) {
        self.last_result = Some(result.map(|_| ()));
    }

    /// Returns the outcome of the latest `When` step.
    pub fn last_result(&self) -> Result<&Result<(), TicketServiceError>, eyre::Report> {
        self.last_result
            .as_ref()
            .ok_or_else(|| eyre::eyre!("no operation has run in this scenario"))
    }
}

impl Default for HelpdeskWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> HelpdeskWorld {
    HelpdeskWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
