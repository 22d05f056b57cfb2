use crate::shared::error::{AppError, AppResult};
use crate::AppState;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::shared::action_result::{ActionResult, ErrorKind};
use contracts::system::auth::TokenClaims;

async fn bearer_claims(state: &AppState, headers: &HeaderMap) -> AppResult<TokenClaims> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Auth("Missing bearer token".into()))?;

    super::jwt::validate_token(&state.db, token)
        .await
        .map_err(|e| AppError::Auth(format!("Invalid access token: {}", e)))
}

/// Rejects requests without a valid access token; puts the claims into
/// request extensions for [`super::extractor::CurrentUser`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = bearer_claims(&state, req.headers()).await?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Same as [`require_auth`], plus the admin flag
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = bearer_claims(&state, req.headers()).await?;
    if !claims.is_admin {
        let body: ActionResult<()> =
            ActionResult::err(ErrorKind::Auth, "Administrator privileges required");
        return Ok((StatusCode::FORBIDDEN, Json(body)).into_response());
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
