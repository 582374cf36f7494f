use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};

use crate::auth::token::TokenStore;
use crate::models::Account;
use crate::repositories::AccountRepository;
use crate::state::AppState;
use crate::utils::error::AppError;

/// Resolves a bearer token into the account acting on the request.
#[async_trait]
pub trait PrincipalProvider: Send + Sync {
    /// `Ok(None)` when the token is unknown or expired.
    async fn current_account(&self, bearer: &str) -> Result<Option<Account>, AppError>;
}

pub struct TokenPrincipalProvider {
    tokens: Arc<TokenStore>,
    accounts: Arc<dyn AccountRepository>,
}

impl TokenPrincipalProvider {
    pub fn new(tokens: Arc<TokenStore>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self { tokens, accounts }
    }
}

#[async_trait]
impl PrincipalProvider for TokenPrincipalProvider {
    async fn current_account(&self, bearer: &str) -> Result<Option<Account>, AppError> {
        match self.tokens.resolve_access(bearer).await {
            Some(account_id) => self.accounts.find_by_id(account_id).await,
            None => Ok(None),
        }
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// The caller's account if a bearer token was sent.
///
/// No token means anonymous; a token that does not resolve is rejected with
/// 401 rather than silently downgraded.
#[derive(Debug, Clone)]
pub struct MaybeAccount(pub Option<Account>);

/// Like [`MaybeAccount`] but anonymous callers are rejected.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount(pub Account);

#[async_trait]
impl FromRequestParts<AppState> for MaybeAccount {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(MaybeAccount(None));
        };

        match state.principals.current_account(token).await? {
            Some(account) => Ok(MaybeAccount(Some(account))),
            None => Err(AppError::AuthError("Invalid access token".to_string())),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedAccount {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeAccount(account) = MaybeAccount::from_request_parts(parts, state).await?;
        account.map(AuthenticatedAccount).ok_or_else(|| {
            AppError::AuthError(
                "Full authentication is required to access this resource".to_string(),
            )
        })
    }
}
