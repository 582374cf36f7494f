use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use thiserror::Error;

use crate::models::account::{Account, AccountRef};

pub type EventId = i64;

/// Publication state of an event.
///
/// Only `Draft` is assigned by the server (on creation). The remaining states
/// follow the order returned by [`EventStatus::successor`]; nothing in the API
/// moves an event along yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
    BeganEnrollment,
    ClosedEnrollment,
    BeganEvent,
    Ended,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "DRAFT",
            EventStatus::Published => "PUBLISHED",
            EventStatus::BeganEnrollment => "BEGAN_ENROLLMENT",
            EventStatus::ClosedEnrollment => "CLOSED_ENROLLMENT",
            EventStatus::BeganEvent => "BEGAN_EVENT",
            EventStatus::Ended => "ENDED",
        }
    }

    pub fn successor(&self) -> Option<EventStatus> {
        match self {
            EventStatus::Draft => Some(EventStatus::Published),
            EventStatus::Published => Some(EventStatus::BeganEnrollment),
            EventStatus::BeganEnrollment => Some(EventStatus::ClosedEnrollment),
            EventStatus::ClosedEnrollment => Some(EventStatus::BeganEvent),
            EventStatus::BeganEvent => Some(EventStatus::Ended),
            EventStatus::Ended => None,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown event status '{0}'")]
pub struct UnknownEventStatus(pub String);

impl FromStr for EventStatus {
    type Err = UnknownEventStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(EventStatus::Draft),
            "PUBLISHED" => Ok(EventStatus::Published),
            "BEGAN_ENROLLMENT" => Ok(EventStatus::BeganEnrollment),
            "CLOSED_ENROLLMENT" => Ok(EventStatus::ClosedEnrollment),
            "BEGAN_EVENT" => Ok(EventStatus::BeganEvent),
            "ENDED" => Ok(EventStatus::Ended),
            other => Err(UnknownEventStatus(other.to_string())),
        }
    }
}

/// `free` holds when neither price tier costs anything.
pub fn is_free(base_price: i32, max_price: i32) -> bool {
    base_price == 0 && max_price == 0
}

/// `offline` holds when a non-blank location is given.
pub fn is_offline(location: Option<&str>) -> bool {
    location.is_some_and(|location| !location.trim().is_empty())
}

/// Payload accepted by the create and update endpoints.
///
/// Every field is optional at the wire level so that missing values surface as
/// field errors instead of deserialization failures. Server-owned fields
/// (`id`, `free`, `offline`, `eventStatus`, `manager`) are not part of the
/// schema and are rejected as unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub begin_enrollment_date_time: Option<NaiveDateTime>,
    pub close_enrollment_date_time: Option<NaiveDateTime>,
    pub begin_event_date_time: Option<NaiveDateTime>,
    pub end_event_date_time: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub base_price: Option<i32>,
    pub max_price: Option<i32>,
    pub limit_of_enrollment: Option<i32>,
}

/// An [`EventRequest`] whose required fields are all present.
#[derive(Debug, Clone, PartialEq)]
pub struct EventInput {
    pub name: String,
    pub description: String,
    pub begin_enrollment_date_time: NaiveDateTime,
    pub close_enrollment_date_time: NaiveDateTime,
    pub begin_event_date_time: NaiveDateTime,
    pub end_event_date_time: NaiveDateTime,
    pub location: Option<String>,
    pub base_price: i32,
    pub max_price: i32,
    pub limit_of_enrollment: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EventId>,
    pub name: String,
    pub description: String,
    pub begin_enrollment_date_time: NaiveDateTime,
    pub close_enrollment_date_time: NaiveDateTime,
    pub begin_event_date_time: NaiveDateTime,
    pub end_event_date_time: NaiveDateTime,
    pub location: Option<String>,
    pub base_price: i32,
    pub max_price: i32,
    pub limit_of_enrollment: i32,
    pub free: bool,
    pub offline: bool,
    pub event_status: EventStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<AccountRef>,
}

impl Event {
    /// Builds a not-yet-persisted draft managed by `manager`.
    pub fn create(input: EventInput, manager: &Account) -> Self {
        let mut event = Self {
            id: None,
            name: input.name,
            description: input.description,
            begin_enrollment_date_time: input.begin_enrollment_date_time,
            close_enrollment_date_time: input.close_enrollment_date_time,
            begin_event_date_time: input.begin_event_date_time,
            end_event_date_time: input.end_event_date_time,
            location: input.location,
            base_price: input.base_price,
            max_price: input.max_price,
            limit_of_enrollment: input.limit_of_enrollment,
            free: false,
            offline: false,
            event_status: EventStatus::Draft,
            manager: manager.id.map(|id| AccountRef { id }),
        };
        event.update_dynamic_fields();
        event
    }

    /// Copies client-editable fields from `input` and recomputes derived flags.
    /// Identity, status and manager are left untouched.
    pub fn apply(&mut self, input: EventInput) {
        self.name = input.name;
        self.description = input.description;
        self.begin_enrollment_date_time = input.begin_enrollment_date_time;
        self.close_enrollment_date_time = input.close_enrollment_date_time;
        self.begin_event_date_time = input.begin_event_date_time;
        self.end_event_date_time = input.end_event_date_time;
        self.location = input.location;
        self.base_price = input.base_price;
        self.max_price = input.max_price;
        self.limit_of_enrollment = input.limit_of_enrollment;
        self.update_dynamic_fields();
    }

    pub fn update_free(&mut self) {
        self.free = is_free(self.base_price, self.max_price);
    }

    pub fn update_offline(&mut self) {
        self.offline = is_offline(self.location.as_deref());
    }

    pub fn update_dynamic_fields(&mut self) {
        self.update_free();
        self.update_offline();
    }

    /// Both sides must carry a persisted id; unsaved accounts manage nothing.
    pub fn is_managed_by(&self, account: &Account) -> bool {
        match (&self.manager, account.id) {
            (Some(manager), Some(account_id)) => manager.id == account_id,
            _ => false,
        }
    }
}

impl<'r> FromRow<'r, PgRow> for Event {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("event_status")?;
        let event_status = status.parse().map_err(|e: UnknownEventStatus| {
            sqlx::Error::ColumnDecode {
                index: "event_status".to_string(),
                source: Box::new(e),
            }
        })?;
        let manager_id: Option<i64> = row.try_get("manager_id")?;

        Ok(Self {
            id: Some(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            begin_enrollment_date_time: row.try_get("begin_enrollment_date_time")?,
            close_enrollment_date_time: row.try_get("close_enrollment_date_time")?,
            begin_event_date_time: row.try_get("begin_event_date_time")?,
            end_event_date_time: row.try_get("end_event_date_time")?,
            location: row.try_get("location")?,
            base_price: row.try_get("base_price")?,
            max_price: row.try_get("max_price")?,
            limit_of_enrollment: row.try_get("limit_of_enrollment")?,
            free: row.try_get("free")?,
            offline: row.try_get("offline")?,
            event_status,
            manager: manager_id.map(|id| AccountRef { id }),
        })
    }
}
