use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use thiserror::Error;

pub type AccountId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountRole {
    Admin,
    User,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Admin => "ADMIN",
            AccountRole::User => "USER",
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown account role '{0}'")]
pub struct UnknownAccountRole(pub String);

impl FromStr for AccountRole {
    type Err = UnknownAccountRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(AccountRole::Admin),
            "USER" => Ok(AccountRole::User),
            other => Err(UnknownAccountRole(other.to_string())),
        }
    }
}

/// A registered user. `email` doubles as the login name and `password` is
/// always stored in encoded form once persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Option<AccountId>,
    pub email: String,
    pub password: String,
    pub roles: Vec<AccountRole>,
}

impl Account {
    pub fn new(email: impl Into<String>, password: impl Into<String>, roles: Vec<AccountRole>) -> Self {
        Self {
            id: None,
            email: email.into(),
            password: password.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: AccountRole) -> bool {
        self.roles.contains(&role)
    }

    /// Role names in the `ROLE_` authority form.
    pub fn authorities(&self) -> Vec<String> {
        self.roles
            .iter()
            .map(|role| format!("ROLE_{}", role.as_str()))
            .collect()
    }
}

/// Public view of an account when it is referenced from another resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountRef {
    pub id: AccountId,
}

impl<'r> FromRow<'r, PgRow> for Account {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let names: Vec<String> = row.try_get("roles")?;
        let roles = names
            .iter()
            .map(|name| name.parse::<AccountRole>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "roles".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            id: Some(row.try_get("id")?),
            email: row.try_get("email")?,
            password: row.try_get("password")?,
            roles,
        })
    }
}
