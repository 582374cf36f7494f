use chrono::NaiveDateTime;
use serde_json::{json, Value};

use crate::models::event::{EventInput, EventRequest};
use crate::validation::{ValidationErrors, WRONG_VALUE};

pub const OBJECT_NAME: &str = "eventRequest";

const NOT_EMPTY: &str = "NotEmpty";
const NOT_NULL: &str = "NotNull";
const MIN: &str = "Min";

/// Presence and range checks on the raw payload.
///
/// Returns the complete [`EventInput`] when every required field is there,
/// otherwise all the field errors found.
pub fn check_preconditions(request: EventRequest) -> Result<EventInput, ValidationErrors> {
    let mut errors = ValidationErrors::new(OBJECT_NAME);

    let name = required_text(&mut errors, "name", request.name);
    let description = required_text(&mut errors, "description", request.description);
    let begin_enrollment = required(
        &mut errors,
        "beginEnrollmentDateTime",
        request.begin_enrollment_date_time,
    );
    let close_enrollment = required(
        &mut errors,
        "closeEnrollmentDateTime",
        request.close_enrollment_date_time,
    );
    let begin_event = required(&mut errors, "beginEventDateTime", request.begin_event_date_time);
    let end_event = required(&mut errors, "endEventDateTime", request.end_event_date_time);
    let base_price = at_least(&mut errors, "basePrice", request.base_price, 0);
    let max_price = at_least(&mut errors, "maxPrice", request.max_price, 0);
    let limit_of_enrollment = at_least(
        &mut errors,
        "limitOfEnrollment",
        request.limit_of_enrollment,
        1,
    );

    match (
        name,
        description,
        begin_enrollment,
        close_enrollment,
        begin_event,
        end_event,
        base_price,
        max_price,
        limit_of_enrollment,
    ) {
        (
            Some(name),
            Some(description),
            Some(begin_enrollment_date_time),
            Some(close_enrollment_date_time),
            Some(begin_event_date_time),
            Some(end_event_date_time),
            Some(base_price),
            Some(max_price),
            Some(limit_of_enrollment),
        ) if errors.is_empty() => Ok(EventInput {
            name,
            description,
            begin_enrollment_date_time,
            close_enrollment_date_time,
            begin_event_date_time,
            end_event_date_time,
            location: request.location,
            base_price,
            max_price,
            limit_of_enrollment,
        }),
        _ => Err(errors),
    }
}

fn required_text(errors: &mut ValidationErrors, field: &str, value: Option<String>) -> Option<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Some(text),
        other => {
            errors.reject_value(field, NOT_EMPTY, "must not be empty", other.map(Value::String));
            None
        }
    }
}

fn required(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<NaiveDateTime>,
) -> Option<NaiveDateTime> {
    if value.is_none() {
        errors.reject_value(field, NOT_NULL, "must not be null", None);
    }
    value
}

fn at_least(errors: &mut ValidationErrors, field: &str, value: Option<i32>, min: i32) -> Option<i32> {
    match value {
        None => {
            errors.reject_value(field, NOT_NULL, "must not be null", None);
            None
        }
        Some(v) if v < min => {
            errors.reject_value(
                field,
                MIN,
                format!("must be greater than or equal to {}", min),
                Some(json!(v)),
            );
            None
        }
        Some(v) => Some(v),
    }
}

/// Cross-field consistency rules for prices and the two time windows.
///
/// Every rule runs on every call; errors accumulate rather than short-circuit.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventValidator;

impl EventValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, candidate: &EventInput) -> ValidationErrors {
        let mut errors = ValidationErrors::new(OBJECT_NAME);

        if candidate.max_price != 0 && candidate.base_price > candidate.max_price {
            errors.reject_value(
                "basePrice",
                WRONG_VALUE,
                "BasePrice is wrong",
                Some(json!(candidate.base_price)),
            );
            errors.reject_value(
                "maxPrice",
                WRONG_VALUE,
                "maxPrice is wrong",
                Some(json!(candidate.max_price)),
            );
        }

        let begin_enrollment = candidate.begin_enrollment_date_time;
        let close_enrollment = candidate.close_enrollment_date_time;
        let begin_event = candidate.begin_event_date_time;
        let end_event = candidate.end_event_date_time;

        if end_event < begin_event || end_event < close_enrollment || end_event < begin_enrollment {
            errors.reject_value(
                "endEventDateTime",
                WRONG_VALUE,
                "endEventDateTime is wrong",
                Some(json!(end_event)),
            );
        }

        if close_enrollment < begin_enrollment || close_enrollment > begin_event {
            errors.reject_value(
                "closeEnrollmentDateTime",
                WRONG_VALUE,
                "closeEnrollmentDateTime is wrong",
                Some(json!(close_enrollment)),
            );
        }

        if begin_event > end_event || begin_event < begin_enrollment || begin_event < close_enrollment {
            errors.reject_value(
                "beginEventDateTime",
                WRONG_VALUE,
                "beginEventDateTime is wrong",
                Some(json!(begin_event)),
            );
        }

        errors
    }

    pub fn is_valid(&self, candidate: &EventInput) -> bool {
        self.validate(candidate).is_empty()
    }
}
