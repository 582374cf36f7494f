use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};

use crate::auth::{OAuthError, TokenRequest};
use crate::state::AppState;

/// `POST /oauth/token`: client credentials in HTTP Basic, grant in the form
/// body.
pub async fn issue_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> Result<Response, OAuthError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    state.granter.authenticate_client(authorization)?;

    let Form(request) = form.map_err(|rejection| OAuthError::InvalidRequest(rejection.body_text()))?;
    let token = state.granter.grant(request).await?;

    let mut response = (StatusCode::OK, Json(token)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    Ok(response)
}
