use std::{collections::HashSet, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Hash, PartialEq, Eq, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Moderates location suggestions and sees everything
    Superuser,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superuser => "superuser",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "superuser" | "admin" => Ok(Role::Superuser),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

pub trait Authorization {
    fn has_role(&self, role: Role) -> bool;

    fn has_any_role<I>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = Role>,
    {
        roles.into_iter().any(|role| self.has_role(role))
    }

    fn has_all_roles<I>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = Role>,
    {
        roles.into_iter().all(|role| self.has_role(role))
    }

    fn is_superuser(&self) -> bool {
        self.has_role(Role::Superuser)
    }
}

/// Identity of a logged in user, as kept in the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaim {
    pub id: i64,
    pub username: String,
    pub roles: HashSet<Role>,
}

impl UserClaim {
    pub fn new(id: i64, username: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            id,
            username: username.into(),
            roles: roles.into_iter().collect(),
        }
    }
}

impl Authorization for UserClaim {
    fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
