use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{
    Account, AccountId, Direction, Event, EventId, EventSortField, Page, PageRequest,
};
use crate::repositories::{AccountRepository, EventRepository};
use crate::utils::error::AppError;

#[derive(Debug)]
struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Process-local event store, used by tests and `STORAGE=memory`.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    table: RwLock<Table<Event>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare(field: EventSortField, a: &Event, b: &Event) -> Ordering {
    match field {
        EventSortField::Id => a.id.cmp(&b.id),
        EventSortField::Name => a.name.cmp(&b.name),
        EventSortField::BeginEnrollmentDateTime => a
            .begin_enrollment_date_time
            .cmp(&b.begin_enrollment_date_time),
        EventSortField::CloseEnrollmentDateTime => a
            .close_enrollment_date_time
            .cmp(&b.close_enrollment_date_time),
        EventSortField::BeginEventDateTime => a.begin_event_date_time.cmp(&b.begin_event_date_time),
        EventSortField::EndEventDateTime => a.end_event_date_time.cmp(&b.end_event_date_time),
        EventSortField::Location => a.location.cmp(&b.location),
        EventSortField::BasePrice => a.base_price.cmp(&b.base_price),
        EventSortField::MaxPrice => a.max_price.cmp(&b.max_price),
        EventSortField::LimitOfEnrollment => a.limit_of_enrollment.cmp(&b.limit_of_enrollment),
        EventSortField::EventStatus => a.event_status.as_str().cmp(b.event_status.as_str()),
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn save(&self, mut event: Event) -> Result<Event, AppError> {
        let mut table = self.table.write().await;
        let id = match event.id {
            Some(id) if table.rows.contains_key(&id) => id,
            Some(id) => return Err(AppError::NotFound(format!("Event with id '{}' was not found", id))),
            None => table.allocate_id(),
        };
        event.id = Some(id);
        table.rows.insert(id, event.clone());
        Ok(event)
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, AppError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_all(&self, request: &PageRequest) -> Result<Page<Event>, AppError> {
        let table = self.table.read().await;
        let mut events: Vec<&Event> = table.rows.values().collect();

        if let Some(sort) = request.sort {
            // BTreeMap iteration is already by id; a stable sort keeps that as the tie-break.
            events.sort_by(|a, b| {
                let ordering = compare(sort.field, a, b);
                match sort.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        let total = events.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let content = events
            .into_iter()
            .skip(offset)
            .take(request.size as usize)
            .cloned()
            .collect();

        Ok(Page::new(content, request, total))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    table: RwLock<Table<Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn save(&self, mut account: Account) -> Result<Account, AppError> {
        let mut table = self.table.write().await;

        let clash = table
            .rows
            .values()
            .any(|other| other.email == account.email && other.id != account.id);
        if clash {
            return Err(AppError::Conflict(format!(
                "Account '{}' already exists",
                account.email
            )));
        }

        let id = match account.id {
            Some(id) if table.rows.contains_key(&id) => id,
            Some(id) => {
                return Err(AppError::NotFound(format!(
                    "Account with id '{}' was not found",
                    id
                )))
            }
            None => table.allocate_id(),
        };
        account.id = Some(id);
        table.rows.insert(id, account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AppError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|a| a.email == email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountRole, EventStatus, Sort};
    use chrono::NaiveDate;

    fn event(name: &str, base_price: i32) -> Event {
        let at = NaiveDate::from_ymd_opt(2019, 5, 6)
            .and_then(|d| d.and_hms_opt(17, 0, 0))
            .unwrap();
        Event {
            id: None,
            name: name.to_string(),
            description: "test event".to_string(),
            begin_enrollment_date_time: at,
            close_enrollment_date_time: at,
            begin_event_date_time: at,
            end_event_date_time: at,
            location: None,
            base_price,
            max_price: 0,
            limit_of_enrollment: 10,
            free: false,
            offline: false,
            event_status: EventStatus::Draft,
            manager: None,
        }
    }

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let repo = InMemoryEventRepository::new();
        let first = repo.save(event("a", 0)).await.unwrap();
        let second = repo.save(event("b", 0)).await.unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(repo.find_by_id(2).await.unwrap().unwrap().name, "b");
        assert!(repo.find_by_id(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_with_id_overwrites() {
        let repo = InMemoryEventRepository::new();
        let mut saved = repo.save(event("a", 0)).await.unwrap();
        saved.name = "renamed".to_string();
        repo.save(saved).await.unwrap();

        assert_eq!(repo.find_by_id(1).await.unwrap().unwrap().name, "renamed");

        let mut ghost = event("ghost", 0);
        ghost.id = Some(99);
        assert!(matches!(repo.save(ghost).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_all_sorts_and_slices() {
        let repo = InMemoryEventRepository::new();
        for i in 0..30 {
            repo.save(event(&format!("event {:02}", i), i)).await.unwrap();
        }

        let request = PageRequest::new(1, 10).with_sort(Sort::parse("name,DESC").unwrap());
        let page = repo.find_all(&request).await.unwrap();

        assert_eq!(page.total_elements, 30);
        assert_eq!(page.content.len(), 10);
        assert_eq!(page.content[0].name, "event 19");
        assert_eq!(page.content[9].name, "event 10");
    }

    #[tokio::test]
    async fn test_find_all_past_the_end_is_empty() {
        let repo = InMemoryEventRepository::new();
        repo.save(event("a", 0)).await.unwrap();

        let page = repo.find_all(&PageRequest::new(5, 10)).await.unwrap();
        assert!(page.content.is_empty());
        assert_eq!(page.total_elements, 1);
    }

    #[tokio::test]
    async fn test_account_email_is_unique() {
        let repo = InMemoryAccountRepository::new();
        let saved = repo
            .save(Account::new("user@email.com", "x", vec![AccountRole::User]))
            .await
            .unwrap();
        assert_eq!(
            repo.find_by_email("user@email.com").await.unwrap(),
            Some(saved.clone())
        );

        let duplicate = Account::new("user@email.com", "y", vec![AccountRole::User]);
        assert!(matches!(repo.save(duplicate).await, Err(AppError::Conflict(_))));

        // re-saving the same account is not a clash
        assert!(repo.save(saved).await.is_ok());
    }
}
