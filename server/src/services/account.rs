use std::sync::Arc;

use tracing::info;

use crate::auth::PasswordEncoder;
use crate::models::{Account, AccountId, AccountRole};
use crate::repositories::AccountRepository;
use crate::utils::error::AppError;

#[derive(Clone)]
pub struct AccountService {
    repository: Arc<dyn AccountRepository>,
    encoder: PasswordEncoder,
}

impl AccountService {
    pub fn new(repository: Arc<dyn AccountRepository>, encoder: PasswordEncoder) -> Self {
        Self {
            repository,
            encoder,
        }
    }

    /// Stores `account` with its raw password replaced by the encoded form.
    pub async fn save_password_encoded_account(&self, mut account: Account) -> Result<Account, AppError> {
        account.password = self.encoder.encode(&account.password)?;
        self.repository.save(account).await
    }

    pub async fn load_user_by_username(&self, username: &str) -> Result<Account, AppError> {
        self.repository
            .find_by_email(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account '{}' was not found", username)))
    }

    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AppError> {
        self.repository.find_by_id(id).await
    }

    /// Resolves `username` and checks `password` against the stored encoding.
    /// Unknown users and wrong passwords produce the same error.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Account, AppError> {
        let bad_credentials = || AppError::AuthError("Bad credentials".to_string());

        let account = match self.load_user_by_username(username).await {
            Ok(account) => account,
            Err(AppError::NotFound(_)) => return Err(bad_credentials()),
            Err(e) => return Err(e),
        };

        if self.encoder.matches(password, &account.password) {
            Ok(account)
        } else {
            Err(bad_credentials())
        }
    }

    /// Registers `email` unless an account with that email already exists.
    pub async fn ensure_account(
        &self,
        email: &str,
        password: &str,
        roles: Vec<AccountRole>,
    ) -> Result<Account, AppError> {
        if let Some(existing) = self.repository.find_by_email(email).await? {
            return Ok(existing);
        }
        let account = self
            .save_password_encoded_account(Account::new(email, password, roles))
            .await?;
        info!(email, "Registered account");
        Ok(account)
    }
}
