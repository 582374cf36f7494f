use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::AccountId;

pub const DEFAULT_ACCESS_TOKEN_VALIDITY_SECS: i64 = 10 * 60;
pub const DEFAULT_REFRESH_TOKEN_VALIDITY_SECS: i64 = 6 * 10 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone)]
struct StoredToken {
    account_id: AccountId,
    kind: TokenKind,
    expires_at: DateTime<Utc>,
}

impl StoredToken {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires.
    pub expires_in: i64,
}

/// In-memory bearer token store.
///
/// Tokens are random UUIDs. Expired entries are evicted when looked up and
/// whenever new tokens are written, so the map stays bounded by the live set.
#[derive(Debug)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, StoredToken>>,
    access_validity: Duration,
    refresh_validity: Duration,
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(
            DEFAULT_ACCESS_TOKEN_VALIDITY_SECS,
            DEFAULT_REFRESH_TOKEN_VALIDITY_SECS,
        )
    }
}

impl TokenStore {
    pub fn new(access_validity_secs: i64, refresh_validity_secs: i64) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            access_validity: Duration::seconds(access_validity_secs),
            refresh_validity: Duration::seconds(refresh_validity_secs),
        }
    }

    /// Issues a fresh access/refresh pair for `account_id`.
    pub async fn issue(&self, account_id: AccountId) -> IssuedToken {
        let now = Utc::now();
        let access_token = Uuid::new_v4().to_string();
        let refresh_token = Uuid::new_v4().to_string();

        let mut tokens = self.tokens.write().await;
        evict_expired(&mut tokens, now);
        tokens.insert(
            access_token.clone(),
            StoredToken {
                account_id,
                kind: TokenKind::Access,
                expires_at: now + self.access_validity,
            },
        );
        tokens.insert(
            refresh_token.clone(),
            StoredToken {
                account_id,
                kind: TokenKind::Refresh,
                expires_at: now + self.refresh_validity,
            },
        );

        tracing::debug!(account_id, "Issued access and refresh tokens");

        IssuedToken {
            access_token,
            refresh_token,
            expires_in: self.access_validity.num_seconds(),
        }
    }

    /// Exchanges a live refresh token for a new access token. The refresh token
    /// itself stays valid until its own expiry.
    pub async fn refresh(&self, refresh_token: &str) -> Option<(AccountId, IssuedToken)> {
        let stored = self.lookup(refresh_token, TokenKind::Refresh).await?;
        let access_token = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut tokens = self.tokens.write().await;
        evict_expired(&mut tokens, now);
        tokens.insert(
            access_token.clone(),
            StoredToken {
                account_id: stored.account_id,
                kind: TokenKind::Access,
                expires_at: now + self.access_validity,
            },
        );
        drop(tokens);

        Some((
            stored.account_id,
            IssuedToken {
                access_token,
                refresh_token: refresh_token.to_string(),
                expires_in: self.access_validity.num_seconds(),
            },
        ))
    }

    /// Account owning a live access token.
    pub async fn resolve_access(&self, access_token: &str) -> Option<AccountId> {
        self.lookup(access_token, TokenKind::Access)
            .await
            .map(|stored| stored.account_id)
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.tokens.write().await.remove(token).is_some()
    }

    pub async fn purge_expired(&self) -> usize {
        evict_expired(&mut *self.tokens.write().await, Utc::now())
    }

    /// Number of stored access and refresh tokens, expired or not.
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn lookup(&self, token: &str, kind: TokenKind) -> Option<StoredToken> {
        let stored = self.tokens.read().await.get(token).cloned()?;
        if stored.is_expired(Utc::now()) {
            self.tokens.write().await.remove(token);
            return None;
        }
        (stored.kind == kind).then_some(stored)
    }
}

fn evict_expired(tokens: &mut HashMap<String, StoredToken>, now: DateTime<Utc>) -> usize {
    let before = tokens.len();
    tokens.retain(|_, stored| !stored.is_expired(now));
    let evicted = before - tokens.len();
    if evicted > 0 {
        tracing::debug!(evicted, "Evicted expired tokens");
    }
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issued_access_token_resolves() {
        let store = TokenStore::default();
        let issued = store.issue(7).await;

        assert_eq!(issued.expires_in, DEFAULT_ACCESS_TOKEN_VALIDITY_SECS);
        assert_ne!(issued.access_token, issued.refresh_token);
        assert_eq!(store.resolve_access(&issued.access_token).await, Some(7));
        assert_eq!(store.resolve_access("unknown").await, None);
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let store = TokenStore::default();
        let issued = store.issue(7).await;
        assert_eq!(store.resolve_access(&issued.refresh_token).await, None);
    }

    #[tokio::test]
    async fn test_refresh_issues_new_access_token() {
        let store = TokenStore::default();
        let issued = store.issue(7).await;

        let (account_id, refreshed) = store.refresh(&issued.refresh_token).await.unwrap();
        assert_eq!(account_id, 7);
        assert_eq!(refreshed.refresh_token, issued.refresh_token);
        assert_ne!(refreshed.access_token, issued.access_token);
        assert_eq!(store.resolve_access(&refreshed.access_token).await, Some(7));

        assert!(store.refresh(&issued.access_token).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_tokens_are_rejected_and_evicted() {
        let store = TokenStore::new(0, 0);
        let issued = store.issue(7).await;

        assert_eq!(store.resolve_access(&issued.access_token).await, None);
        assert!(store.refresh(&issued.refresh_token).await.is_none());
        assert_eq!(store.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn test_purge_and_revoke() {
        let store = TokenStore::new(0, 3600);
        let issued = store.issue(1).await;

        assert_eq!(store.purge_expired().await, 1);
        assert!(store.revoke(&issued.refresh_token).await);
        assert!(!store.revoke(&issued.refresh_token).await);
    }

    #[tokio::test]
    async fn test_unused_expired_tokens_are_evicted_on_issue() {
        let store = TokenStore::new(0, 0);
        for account_id in 0..50 {
            store.issue(account_id).await;
        }
        // only the pair from the latest grant survives; nothing was ever looked up
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_refresh_evicts_stale_access_tokens() {
        let store = TokenStore::new(0, 3600);
        let issued = store.issue(3).await;
        assert_eq!(store.len().await, 2);

        store.refresh(&issued.refresh_token).await.unwrap();
        // the original access token expired immediately and is gone
        assert_eq!(store.len().await, 2);
        assert_eq!(store.resolve_access(&issued.access_token).await, None);
    }
}
