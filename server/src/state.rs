use std::sync::Arc;

use tracing::info;

use crate::auth::{PasswordEncoder, PrincipalProvider, TokenGranter, TokenPrincipalProvider, TokenStore};
use crate::config::{AppProperties, Config};
use crate::models::AccountRole;
use crate::repositories::{AccountRepository, EventRepository};
use crate::services::{AccountService, EventService};
use crate::utils::error::AppError;
use crate::validation::EventValidator;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
    pub accounts: AccountService,
    pub granter: Arc<TokenGranter>,
    pub principals: Arc<dyn PrincipalProvider>,
}

impl AppState {
    pub fn new(
        config: &Config,
        event_repository: Arc<dyn EventRepository>,
        account_repository: Arc<dyn AccountRepository>,
    ) -> Result<Self, AppError> {
        let encoder = PasswordEncoder::with_cost(config.password_cost);
        let tokens = Arc::new(TokenStore::new(
            config.access_token_validity_secs,
            config.refresh_token_validity_secs,
        ));
        let accounts = AccountService::new(account_repository.clone(), encoder);

        let granter = TokenGranter::new(
            config.app.client_id.clone(),
            &config.app.client_secret,
            encoder,
            accounts.clone(),
            tokens.clone(),
        )?;

        Ok(Self {
            events: EventService::new(event_repository, EventValidator::new()),
            accounts,
            granter: Arc::new(granter),
            principals: Arc::new(TokenPrincipalProvider::new(tokens, account_repository)),
        })
    }

    /// Makes sure the configured admin and user accounts exist.
    pub async fn seed_accounts(&self, app: &AppProperties) -> Result<(), AppError> {
        self.accounts
            .ensure_account(
                &app.admin_username,
                &app.admin_password,
                vec![AccountRole::Admin, AccountRole::User],
            )
            .await?;
        self.accounts
            .ensure_account(&app.user_username, &app.user_password, vec![AccountRole::User])
            .await?;

        info!(admin = %app.admin_username, user = %app.user_username, "Default accounts ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{InMemoryAccountRepository, InMemoryEventRepository};

    #[tokio::test]
    async fn test_seed_accounts_is_idempotent() {
        let config =
            Config::from_lookup(|name| (name == "BCRYPT_COST").then(|| "4".to_string())).unwrap();
        let state = AppState::new(
            &config,
            Arc::new(InMemoryEventRepository::new()),
            Arc::new(InMemoryAccountRepository::new()),
        )
        .unwrap();

        state.seed_accounts(&config.app).await.unwrap();
        state.seed_accounts(&config.app).await.unwrap();

        let admin = state
            .accounts
            .load_user_by_username(&config.app.admin_username)
            .await
            .unwrap();
        assert!(admin.has_role(AccountRole::Admin));
        assert_eq!(admin.id, Some(1));

        let user = state
            .accounts
            .authenticate(&config.app.user_username, &config.app.user_password)
            .await
            .unwrap();
        assert_eq!(user.id, Some(2));
        assert!(!user.has_role(AccountRole::Admin));
    }
}
