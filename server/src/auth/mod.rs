//! Credentials, bearer tokens and the OAuth2 token endpoint logic.

pub mod oauth;
pub mod password;
pub mod principal;
pub mod token;

pub use oauth::{OAuthError, TokenGranter, TokenRequest, TokenResponse};
pub use password::PasswordEncoder;
pub use principal::{AuthenticatedAccount, MaybeAccount, PrincipalProvider, TokenPrincipalProvider};
pub use token::{IssuedToken, TokenStore};
