//! Persistence ports and their PostgreSQL and in-memory adapters.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::{Account, AccountId, Event, EventId, Page, PageRequest};
use crate::utils::error::AppError;

pub use memory::{InMemoryAccountRepository, InMemoryEventRepository};
pub use postgres::{PgAccountRepository, PgEventRepository};

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Inserts the event when it has no id yet, otherwise overwrites the
    /// stored row. Returns the persisted state.
    async fn save(&self, event: Event) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, AppError>;
    async fn find_all(&self, request: &PageRequest) -> Result<Page<Event>, AppError>;
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Same insert-or-update contract as [`EventRepository::save`]. Emails are
    /// unique; a clash yields [`AppError::Conflict`].
    async fn save(&self, account: Account) -> Result<Account, AppError>;
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;
}
