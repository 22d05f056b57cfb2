use axum::extract::{Json, State};
use contracts::shared::action_result::ActionResult;
use contracts::system::users::{CreateUserDto, User};

use crate::shared::error::{ok, AppError, AppResult};
use crate::system::users::service;
use crate::AppState;

/// GET /api/system/users
pub async fn list(State(state): State<AppState>) -> AppResult<Json<ActionResult<Vec<User>>>> {
    Ok(ok(service::list_all(&state.db).await?))
}

/// POST /api/system/users
pub async fn create(
    State(state): State<AppState>,
    Json(dto): Json<CreateUserDto>,
) -> AppResult<Json<ActionResult<User>>> {
    let id = service::create(&state.db, dto).await?;
    let user = service::get_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
    Ok(ok(user))
}
