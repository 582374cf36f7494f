use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

pub const HAL_JSON_UTF8: &str = "application/hal+json;charset=UTF-8";

#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorBody,
}

pub fn success<T>(data: T, message: impl Into<String>) -> impl IntoResponse
where
    T: Serialize,
{
    let body = ApiResponse {
        success: true,
        data: Some(data),
        message: Some(message.into()),
    };
    (StatusCode::OK, Json(body))
}

pub fn error(
    code: &str,
    message: impl Into<String>,
    details: Option<Value>,
    status: StatusCode,
) -> Response {
    let body = ApiErrorResponse {
        success: false,
        error: ApiErrorBody {
            code: code.to_string(),
            message: message.into(),
            details,
        },
    };

    (status, Json(body)).into_response()
}

/// Serializes `body` as `application/hal+json`.
pub fn hal<T>(status: StatusCode, body: &T) -> Response
where
    T: Serialize,
{
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(HAL_JSON_UTF8),
    );
    response
}

/// Same as [`hal`] with a `Location` header pointing at the resource.
pub fn hal_at<T>(status: StatusCode, location: &str, body: &T) -> Response
where
    T: Serialize,
{
    let mut response = hal(status, body);
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(header::LOCATION, value);
        }
        Err(e) => tracing::warn!(location, error = %e, "Skipping unrepresentable Location header"),
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hal_sets_content_type_and_location() {
        let response = hal_at(
            StatusCode::CREATED,
            "/api/events/1",
            &serde_json::json!({ "id": 1 }),
        );

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], HAL_JSON_UTF8);
        assert_eq!(response.headers()[header::LOCATION], "/api/events/1");
    }

    #[test]
    fn test_error_envelope_status() {
        let response = error("NOT_FOUND", "missing", None, StatusCode::NOT_FOUND);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
