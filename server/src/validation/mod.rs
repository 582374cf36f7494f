//! Field-level validation errors and the event validation rules.

pub mod event;

pub use event::{check_preconditions, EventValidator};

use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

pub const WRONG_VALUE: &str = "wrongValue";

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub object_name: String,
    pub field: String,
    pub code: String,
    pub default_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_value: Option<Value>,
}

/// Errors collected while validating one object. Rules append to it and keep
/// going, so a single pass reports every problem at once.
///
/// Serializes as a plain JSON array of [`FieldError`]s.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{object_name} has {} invalid field(s)", errors.len())]
pub struct ValidationErrors {
    object_name: String,
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new(object_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            errors: Vec::new(),
        }
    }

    pub fn reject_value(
        &mut self,
        field: &str,
        code: &str,
        message: impl Into<String>,
        rejected_value: Option<Value>,
    ) {
        self.errors.push(FieldError {
            object_name: self.object_name.clone(),
            field: field.to_string(),
            code: code.to_string(),
            default_message: message.into(),
            rejected_value,
        });
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn has_field_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// `Ok(value)` when nothing was rejected, `Err(self)` otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.errors.serialize(serializer)
    }
}
