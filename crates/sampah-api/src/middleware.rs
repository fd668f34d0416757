use axum::{
    Extension,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use uuid::Uuid;

use sampah_types::models::Role;

use crate::auth::decode_token;
use crate::error::ApiError;
use crate::state::{AppState, run_db};

/// The authenticated caller, resolved once per request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

/// Validate the bearer token and load the caller's account.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthorized("Authorization header required"))?;

    let claims = decode_token(&state.jwt_secret, bearer.token())
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token"))?;

    let uid = claims.sub.to_string();
    let user = run_db(&state, "Failed to load account", move |db| db.get_user_by_id(&uid))
        .await?
        .ok_or(ApiError::Unauthorized("Account no longer exists"))?;

    req.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        name: user.name,
        role: user.role,
    });
    Ok(next.run(req).await)
}

/// Layered inside [`require_auth`] on admin-only routes.
pub async fn require_admin(
    Extension(user): Extension<CurrentUser>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !user.role.is_admin() {
        return Err(ApiError::Forbidden);
    }
    Ok(next.run(req).await)
}
