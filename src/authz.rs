/// Authorization policies.
///
/// Pure predicates over the identity the auth gate attached: each returns
/// `Ok(())` or the specific rejection, and handlers bail with `?`. Nothing
/// here touches storage; the resource-ownership policy takes the already
/// loaded resource so the lookup stays with the caller.

use uuid::Uuid;

use crate::domain::{Permission, Role, User};
use crate::error::{AppError, PolicyError};
use crate::middleware::AuthenticatedUser;

/// Ownership facts about a loaded resource.
#[derive(Debug, Clone, Copy)]
pub struct OwnedResource {
    pub created_by: Uuid,
    /// Assignee takes precedence over the creator when deciding ownership.
    pub assignee: Option<Uuid>,
}

impl OwnedResource {
    pub fn owner(&self) -> Uuid {
        self.assignee.unwrap_or(self.created_by)
    }
}

/// The caller's role must be in the allow-list.
pub fn require_role(identity: &AuthenticatedUser, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&identity.user.role) {
        return Ok(());
    }
    tracing::warn!(
        user_id = %identity.user.id,
        role = %identity.user.role,
        "Role not in allow-list"
    );
    Err(AppError::Policy(PolicyError::InsufficientPermissions))
}

/// Admins pass; anyone else must be the designated owner.
pub fn require_owner_or_admin(
    identity: &AuthenticatedUser,
    owner_id: Uuid,
) -> Result<(), AppError> {
    if identity.user.role.is_admin() || identity.user.id == owner_id {
        return Ok(());
    }
    Err(AppError::Policy(PolicyError::InsufficientPermissions))
}

/// Ownership check against a loaded resource: 404 when it does not exist,
/// admin bypass, otherwise the assignee (else creator) must be the caller.
pub fn require_resource_owner(
    identity: &AuthenticatedUser,
    resource: Option<&OwnedResource>,
) -> Result<(), AppError> {
    let resource = resource.ok_or(AppError::Policy(PolicyError::ResourceNotFound))?;

    if identity.user.role.is_admin() || resource.owner() == identity.user.id {
        return Ok(());
    }
    Err(AppError::Policy(PolicyError::InsufficientPermissions))
}

/// Coarse capability check derived from the role.
pub fn require_permission(
    identity: &AuthenticatedUser,
    permission: Permission,
) -> Result<(), AppError> {
    if identity.user.role.has_permission(permission) {
        return Ok(());
    }
    Err(AppError::Policy(PolicyError::InsufficientPermissions))
}

/// Second-factor gate. Only a shape check: the token must be present and a
/// 6-digit numeric string. No TOTP verification is performed here.
pub fn require_two_factor(user: &User, token: Option<&str>) -> Result<(), AppError> {
    if !user.two_factor_enabled {
        return Ok(());
    }

    let token = token.ok_or(AppError::Policy(PolicyError::TwoFactorRequired))?;
    if token.len() != 6 || !token.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Policy(PolicyError::InvalidTwoFactorToken));
    }
    Ok(())
}
