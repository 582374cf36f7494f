use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::password::{BcryptError, PasswordEncoder};
use crate::auth::token::{IssuedToken, TokenStore};
use crate::services::AccountService;
use crate::utils::error::AppError;

pub const PASSWORD_GRANT: &str = "password";
pub const REFRESH_TOKEN_GRANT: &str = "refresh_token";
const SCOPES: [&str; 2] = ["read", "write"];

/// Form body of `POST /oauth/token`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub scope: String,
}

impl TokenResponse {
    fn bearer(issued: IssuedToken, scope: String) -> Self {
        Self {
            access_token: issued.access_token,
            token_type: "bearer".to_string(),
            refresh_token: issued.refresh_token,
            expires_in: issued.expires_in,
            scope,
        }
    }
}

/// Token endpoint failures, rendered as RFC 6749 error bodies.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Client authentication failed")]
    InvalidClient,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    InvalidGrant(String),

    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error(transparent)]
    Server(#[from] AppError),
}

impl OAuthError {
    fn error_code(&self) -> &'static str {
        match self {
            OAuthError::InvalidClient => "invalid_client",
            OAuthError::InvalidRequest(_) => "invalid_request",
            OAuthError::InvalidGrant(_) => "invalid_grant",
            OAuthError::UnsupportedGrantType(_) => "unsupported_grant_type",
            OAuthError::InvalidScope(_) => "invalid_scope",
            OAuthError::Server(_) => "server_error",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            OAuthError::InvalidClient => StatusCode::UNAUTHORIZED,
            OAuthError::Server(e) => e.status_code(),
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Serialize)]
struct OAuthErrorBody {
    error: &'static str,
    error_description: String,
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        if let OAuthError::Server(inner) = self {
            return inner.into_response();
        }

        warn!(error = self.error_code(), description = %self, "Token request rejected");

        let status = self.status_code();
        let body = OAuthErrorBody {
            error: self.error_code(),
            error_description: self.to_string(),
        };
        let mut response = (status, Json(body)).into_response();
        if matches!(self, OAuthError::InvalidClient) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"oauth2/client\""),
            );
        }
        response
    }
}

/// Issues tokens to the single configured client for the password and
/// refresh-token grants.
pub struct TokenGranter {
    client_id: String,
    encoded_secret: String,
    encoder: PasswordEncoder,
    accounts: AccountService,
    tokens: Arc<TokenStore>,
}

impl TokenGranter {
    /// `client_secret` is the raw secret; only its encoding is kept.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: &str,
        encoder: PasswordEncoder,
        accounts: AccountService,
        tokens: Arc<TokenStore>,
    ) -> Result<Self, BcryptError> {
        Ok(Self {
            client_id: client_id.into(),
            encoded_secret: encoder.encode(client_secret)?,
            encoder,
            accounts,
            tokens,
        })
    }

    /// Checks an HTTP Basic `Authorization` header against the client
    /// credentials.
    pub fn authenticate_client(&self, authorization: Option<&str>) -> Result<(), OAuthError> {
        let (id, secret) = authorization
            .and_then(parse_basic)
            .ok_or(OAuthError::InvalidClient)?;

        if id == self.client_id && self.encoder.matches(&secret, &self.encoded_secret) {
            Ok(())
        } else {
            Err(OAuthError::InvalidClient)
        }
    }

    pub async fn grant(&self, request: TokenRequest) -> Result<TokenResponse, OAuthError> {
        let scope = resolve_scope(request.scope.as_deref())?;

        match request.grant_type.as_deref() {
            Some(PASSWORD_GRANT) => {
                let username = required(request.username, "username")?;
                let password = required(request.password, "password")?;

                let account = match self.accounts.authenticate(&username, &password).await {
                    Ok(account) => account,
                    Err(AppError::AuthError(msg)) => return Err(OAuthError::InvalidGrant(msg)),
                    Err(e) => return Err(e.into()),
                };
                let account_id = account.id.ok_or_else(|| {
                    AppError::InternalServerError("authenticated account has no id".to_string())
                })?;

                let issued = self.tokens.issue(account_id).await;
                info!(username = %username, "Issued token for password grant");
                Ok(TokenResponse::bearer(issued, scope))
            }
            Some(REFRESH_TOKEN_GRANT) => {
                let refresh_token = required(request.refresh_token, "refresh_token")?;
                let (account_id, issued) = self
                    .tokens
                    .refresh(&refresh_token)
                    .await
                    .ok_or_else(|| OAuthError::InvalidGrant("Invalid refresh token".to_string()))?;

                // The account may have been removed since the token was issued.
                if self.accounts.find_by_id(account_id).await?.is_none() {
                    self.tokens.revoke(&issued.access_token).await;
                    return Err(OAuthError::InvalidGrant("Invalid refresh token".to_string()));
                }

                info!(account_id, "Issued token for refresh grant");
                Ok(TokenResponse::bearer(issued, scope))
            }
            Some(other) => Err(OAuthError::UnsupportedGrantType(other.to_string())),
            None => Err(OAuthError::InvalidRequest(
                "Missing grant type".to_string(),
            )),
        }
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, OAuthError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| OAuthError::InvalidRequest(format!("Missing parameter: {}", name)))
}

/// Requested scopes must be a subset of the client's; none requested means all.
fn resolve_scope(requested: Option<&str>) -> Result<String, OAuthError> {
    let Some(requested) = requested.filter(|s| !s.trim().is_empty()) else {
        return Ok(SCOPES.join(" "));
    };
    if let Some(unknown) = requested.split_whitespace().find(|s| !SCOPES.contains(s)) {
        return Err(OAuthError::InvalidScope(unknown.to_string()));
    }
    Ok(requested.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn parse_basic(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (id, secret) = decoded.split_once(':')?;
    Some((id.to_string(), secret.to_string()))
}
