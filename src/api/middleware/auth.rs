use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{User, UserRole, UserStatus},
    error::AppError,
};

/// Identity established by the upstream gateway, which authenticates the
/// caller and forwards their id in `x-user-id`. This service only loads the
/// user and enforces role and account status.
#[derive(Clone)]
pub struct CurrentUser {
    pub user: User,
}

// Header parsing stays synchronous: the request body is !Sync, so holding
// &Request across an await would make the middleware future !Send.
fn parse_user_id(request: &Request) -> Result<Uuid, AppError> {
    request
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or(AppError::Unauthorized)
}

async fn load_user(state: &AppState, user_id: Uuid) -> Result<User, AppError> {
    let user = state
        .service_context
        .user_repo
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if user.status != UserStatus::Active {
        return Err(AppError::Forbidden);
    }

    Ok(user)
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = parse_user_id(&request)?;
    let user = load_user(&state, user_id).await?;
    request.extensions_mut().insert(CurrentUser { user });
    Ok(next.run(request).await)
}

pub async fn require_host(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = parse_user_id(&request)?;
    let user = load_user(&state, user_id).await?;
    if !matches!(user.role, UserRole::Host | UserRole::Admin) {
        return Err(AppError::Forbidden);
    }
    request.extensions_mut().insert(CurrentUser { user });
    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = parse_user_id(&request)?;
    let user = load_user(&state, user_id).await?;
    if user.role != UserRole::Admin {
        return Err(AppError::Forbidden);
    }
    request.extensions_mut().insert(CurrentUser { user });
    Ok(next.run(request).await)
}
