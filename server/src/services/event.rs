use std::sync::Arc;

use tracing::{debug, info};

use crate::models::{Account, Event, EventId, EventRequest, Page, PageRequest};
use crate::repositories::EventRepository;
use crate::utils::error::AppError;
use crate::validation::{check_preconditions, EventValidator};

/// Create, read and update use cases for events.
///
/// Each call validates one payload in isolation; nothing is written unless
/// every check passes.
#[derive(Clone)]
pub struct EventService {
    repository: Arc<dyn EventRepository>,
    validator: EventValidator,
}

impl EventService {
    pub fn new(repository: Arc<dyn EventRepository>, validator: EventValidator) -> Self {
        Self {
            repository,
            validator,
        }
    }

    pub async fn create(&self, request: EventRequest, manager: &Account) -> Result<Event, AppError> {
        let input = check_preconditions(request)?;
        self.validator.validate(&input).into_result(())?;

        let event = Event::create(input, manager);
        let saved = self.repository.save(event).await?;
        info!(event_id = ?saved.id, manager = ?manager.id, "Created event");
        Ok(saved)
    }

    pub async fn find(&self, id: EventId) -> Result<Event, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn list(&self, request: &PageRequest) -> Result<Page<Event>, AppError> {
        let page = self.repository.find_all(request).await?;
        debug!(
            page = page.number,
            size = page.size,
            total = page.total_elements,
            "Listed events"
        );
        Ok(page)
    }

    /// Existence is checked first, then the payload, then ownership.
    pub async fn update(
        &self,
        id: EventId,
        request: EventRequest,
        current: &Account,
    ) -> Result<Event, AppError> {
        let mut event = self.find(id).await?;

        let input = check_preconditions(request)?;
        self.validator.validate(&input).into_result(())?;

        if !event.is_managed_by(current) {
            return Err(AppError::AuthError(format!(
                "Only the manager may update event '{}'",
                id
            )));
        }

        event.apply(input);
        let saved = self.repository.save(event).await?;
        info!(event_id = id, "Updated event");
        Ok(saved)
    }
}

fn not_found(id: EventId) -> AppError {
    AppError::NotFound(format!("Event with id '{}' was not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountRole, EventStatus};
    use crate::repositories::InMemoryEventRepository;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 5, day)
            .and_then(|d| d.and_hms_opt(17, 0, 0))
            .unwrap()
    }

    fn request() -> EventRequest {
        EventRequest {
            name: Some("REST API with Spring".to_string()),
            description: Some("REST API Basic".to_string()),
            begin_enrollment_date_time: Some(at(6)),
            close_enrollment_date_time: Some(at(9)),
            begin_event_date_time: Some(at(10)),
            end_event_date_time: Some(at(13)),
            location: Some("Seoul".to_string()),
            base_price: Some(100),
            max_price: Some(100),
            limit_of_enrollment: Some(100),
        }
    }

    fn account(id: i64) -> Account {
        Account {
            id: Some(id),
            email: format!("user{}@email.com", id),
            password: "{noop}pass".to_string(),
            roles: vec![AccountRole::User],
        }
    }

    fn service() -> (EventService, Arc<InMemoryEventRepository>) {
        let repository = Arc::new(InMemoryEventRepository::new());
        (
            EventService::new(repository.clone(), EventValidator::new()),
            repository,
        )
    }

    #[tokio::test]
    async fn test_create_derives_fields_and_persists() {
        let (service, _) = service();
        let event = service.create(request(), &account(1)).await.unwrap();

        assert_eq!(event.id, Some(1));
        assert!(!event.free);
        assert!(event.offline);
        assert_eq!(event.event_status, EventStatus::Draft);
        assert!(event.is_managed_by(&account(1)));
    }

    #[tokio::test]
    async fn test_invalid_create_persists_nothing() {
        let (service, repository) = service();
        let mut req = request();
        req.base_price = Some(10000);

        let err = service.create(req, &account(1)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref e) if e.has_field_error("basePrice")));

        let page = repository.find_all(&PageRequest::default()).await.unwrap();
        assert_eq!(page.total_elements, 0);
    }

    #[tokio::test]
    async fn test_update_by_manager_rederives() {
        let (service, _) = service();
        let created = service.create(request(), &account(1)).await.unwrap();
        let id = created.id.unwrap();

        let mut req = request();
        req.base_price = Some(0);
        req.max_price = Some(0);
        req.location = None;
        req.name = Some("Updated".to_string());

        let updated = service.update(id, req, &account(1)).await.unwrap();
        assert_eq!(updated.name, "Updated");
        assert!(updated.free);
        assert!(!updated.offline);
        assert_eq!(service.find(id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_by_other_account_is_unauthorized() {
        let (service, _) = service();
        let created = service.create(request(), &account(1)).await.unwrap();

        let err = service
            .update(created.id.unwrap(), request(), &account(2))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));
    }

    #[tokio::test]
    async fn test_update_checks_existence_before_payload() {
        let (service, _) = service();
        let err = service
            .update(404, EventRequest::default(), &account(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_checks_payload_before_ownership() {
        let (service, _) = service();
        let created = service.create(request(), &account(1)).await.unwrap();

        let err = service
            .update(created.id.unwrap(), EventRequest::default(), &account(2))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
