use axum::extract::{Json, State};
use contracts::shared::action_result::ActionResult;
use contracts::system::auth::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, UserInfo};
use contracts::system::users::User;

use crate::shared::error::{ok, AppError, AppResult};
use crate::system::auth::extractor::CurrentUser;
use crate::system::auth::{jwt, refresh_tokens};
use crate::system::users::service as user_service;
use crate::AppState;

fn user_info(user: User) -> UserInfo {
    UserInfo {
        id: user.id,
        username: user.username,
        full_name: user.full_name,
        email: user.email,
        is_admin: user.is_admin,
    }
}

/// POST /api/system/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<ActionResult<LoginResponse>>> {
    let user = user_service::verify_credentials(&state.db, &request.username, &request.password)
        .await?
        .ok_or_else(|| AppError::Auth("Invalid username or password".into()))?;

    let access_token = jwt::generate_access_token(&state.db, &user.id, &user.username, user.is_admin).await?;
    let refresh_token = jwt::generate_refresh_token();
    refresh_tokens::store(&state.db, &user.id, &refresh_token).await?;

    tracing::info!("User '{}' signed in", user.username);
    Ok(ok(LoginResponse {
        access_token,
        refresh_token,
        user: user_info(user),
    }))
}

/// POST /api/system/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> AppResult<Json<ActionResult<RefreshResponse>>> {
    let user_id = refresh_tokens::validate(&state.db, &request.refresh_token)
        .await?
        .ok_or_else(|| AppError::Auth("Invalid or expired refresh token".into()))?;

    let user = user_service::get_by_id(&state.db, &user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Auth("User no longer exists".into()))?;

    let access_token = jwt::generate_access_token(&state.db, &user.id, &user.username, user.is_admin).await?;
    Ok(ok(RefreshResponse { access_token }))
}

/// POST /api/system/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> AppResult<Json<ActionResult<bool>>> {
    let owner = refresh_tokens::validate(&state.db, &request.refresh_token).await?;
    let revoked = refresh_tokens::revoke(&state.db, &request.refresh_token).await?;
    if let Some(user_id) = owner {
        state.sessions.remove(&user_id).await;
        tracing::info!("User {} signed out", user_id);
    }
    Ok(ok(revoked))
}

/// GET /api/system/auth/me
pub async fn current_user(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> AppResult<Json<ActionResult<UserInfo>>> {
    let user = user_service::get_by_id(&state.db, &claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", claims.sub)))?;
    Ok(ok(user_info(user)))
}
