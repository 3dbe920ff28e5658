use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, ValidationError};

/// Roles in descending privilege order: admin > manager > user > guest.
///
/// A user holds exactly one role at a time; admin implies all manager and
/// user capabilities, manager implies user read/write capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
    Guest,
}

/// Coarse capabilities granted by a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    Write,
    Delete,
    ManageUsers,
}

impl Role {
    pub fn privilege_level(&self) -> u8 {
        match self {
            Role::Admin => 4,
            Role::Manager => 3,
            Role::User => 2,
            Role::Guest => 1,
        }
    }

    pub fn has_at_least(&self, other: Role) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Permission set per role: admin has everything, manager has read and
    /// write, user has read, guest has nothing.
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Admin => &[
                Permission::Read,
                Permission::Write,
                Permission::Delete,
                Permission::ManageUsers,
            ],
            Role::Manager => &[Permission::Read, Permission::Write],
            Role::User => &[Permission::Read],
            Role::Guest => &[],
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
            Role::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "user" => Ok(Role::User),
            "guest" => Ok(Role::Guest),
            _ => Err(AppError::Validation(ValidationError::InvalidFormat(
                format!("unknown role '{}'", s),
            ))),
        }
    }
}
