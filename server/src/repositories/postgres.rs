use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{Account, AccountId, Event, EventId, Page, PageRequest};
use crate::repositories::{AccountRepository, EventRepository};
use crate::utils::error::AppError;

const EVENT_COLUMNS: &str = "id, name, description, begin_enrollment_date_time, \
     close_enrollment_date_time, begin_event_date_time, end_event_date_time, location, \
     base_price, max_price, limit_of_enrollment, free, offline, event_status, manager_id";

const ACCOUNT_COLUMNS: &str = "id, email, password, roles";

#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn save(&self, event: Event) -> Result<Event, AppError> {
        let manager_id = event.manager.map(|m| m.id);

        let saved = match event.id {
            None => {
                sqlx::query_as::<_, Event>(&format!(
                    r#"
                    INSERT INTO events (name, description, begin_enrollment_date_time,
                        close_enrollment_date_time, begin_event_date_time, end_event_date_time,
                        location, base_price, max_price, limit_of_enrollment, free, offline,
                        event_status, manager_id)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                    RETURNING {}
                    "#,
                    EVENT_COLUMNS
                ))
                .bind(&event.name)
                .bind(&event.description)
                .bind(event.begin_enrollment_date_time)
                .bind(event.close_enrollment_date_time)
                .bind(event.begin_event_date_time)
                .bind(event.end_event_date_time)
                .bind(&event.location)
                .bind(event.base_price)
                .bind(event.max_price)
                .bind(event.limit_of_enrollment)
                .bind(event.free)
                .bind(event.offline)
                .bind(event.event_status.as_str())
                .bind(manager_id)
                .fetch_one(&self.pool)
                .await?
            }
            Some(id) => {
                sqlx::query_as::<_, Event>(&format!(
                    r#"
                    UPDATE events
                    SET name = $2,
                        description = $3,
                        begin_enrollment_date_time = $4,
                        close_enrollment_date_time = $5,
                        begin_event_date_time = $6,
                        end_event_date_time = $7,
                        location = $8,
                        base_price = $9,
                        max_price = $10,
                        limit_of_enrollment = $11,
                        free = $12,
                        offline = $13,
                        event_status = $14,
                        manager_id = $15
                    WHERE id = $1
                    RETURNING {}
                    "#,
                    EVENT_COLUMNS
                ))
                .bind(id)
                .bind(&event.name)
                .bind(&event.description)
                .bind(event.begin_enrollment_date_time)
                .bind(event.close_enrollment_date_time)
                .bind(event.begin_event_date_time)
                .bind(event.end_event_date_time)
                .bind(&event.location)
                .bind(event.base_price)
                .bind(event.max_price)
                .bind(event.limit_of_enrollment)
                .bind(event.free)
                .bind(event.offline)
                .bind(event.event_status.as_str())
                .bind(manager_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Event with id '{}' was not found", id)))?
            }
        };

        Ok(saved)
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn find_all(&self, request: &PageRequest) -> Result<Page<Event>, AppError> {
        // Column and direction come from closed enums, never from raw input.
        let order_by = match request.sort {
            Some(sort) => format!("{} {}, id ASC", sort.field.column(), sort.direction.as_str()),
            None => "id ASC".to_string(),
        };

        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events ORDER BY {} LIMIT $1 OFFSET $2",
            EVENT_COLUMNS, order_by
        ))
        .bind(i64::from(request.size))
        .bind(i64::try_from(request.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(events, request, u64::try_from(total).unwrap_or(0)))
    }
}

#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unique_violation(err: sqlx::Error, email: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("Account '{}' already exists", email))
        }
        _ => AppError::DatabaseError(err),
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn save(&self, account: Account) -> Result<Account, AppError> {
        let roles: Vec<String> = account
            .roles
            .iter()
            .map(|role| role.as_str().to_string())
            .collect();

        let saved = match account.id {
            None => sqlx::query_as::<_, Account>(&format!(
                "INSERT INTO accounts (email, password, roles) VALUES ($1, $2, $3) RETURNING {}",
                ACCOUNT_COLUMNS
            ))
            .bind(&account.email)
            .bind(&account.password)
            .bind(&roles)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_violation(e, &account.email))?,
            Some(id) => sqlx::query_as::<_, Account>(&format!(
                "UPDATE accounts SET email = $2, password = $3, roles = $4 WHERE id = $1 RETURNING {}",
                ACCOUNT_COLUMNS
            ))
            .bind(id)
            .bind(&account.email)
            .bind(&account.password)
            .bind(&roles)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| unique_violation(e, &account.email))?
            .ok_or_else(|| AppError::NotFound(format!("Account with id '{}' was not found", id)))?,
        };

        Ok(saved)
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE email = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }
}
