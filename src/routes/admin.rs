use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::authz::require_role;
use crate::domain::Role;
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;

/// GET /api/admin/overview (authenticated, admin or manager only)
pub async fn admin_overview(
    identity: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
    require_role(&identity, &[Role::Admin, Role::Manager])?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "role": identity.user.role,
        "permissions": identity.user.role.permissions(),
    })))
}
