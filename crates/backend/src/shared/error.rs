use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::domain::common::AggregateRoot;
use contracts::shared::action_result::{ActionResult, ErrorKind};
use thiserror::Error;

/// Error taxonomy of every boundary-facing operation
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing/invalid session or expired external credential
    #[error("Authentication error: {0}")]
    Auth(String),

    /// External system answered with an unexpected shape or status
    #[error("External API error: {0}")]
    Api(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Auth(_) => ErrorKind::Auth,
            AppError::Api(_) => ErrorKind::Api,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Database(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// "<Element name> <id> not found"
    pub fn not_found<A: AggregateRoot>(id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{} {} not found", A::element_name(), id))
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::Api => StatusCode::BAD_GATEWAY,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the user
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth(_) => "Session expired or invalid, please sign in again".to_string(),
            AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn into_action_result<T>(self) -> ActionResult<T> {
        ActionResult::err(self.kind(), self.user_message())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Api(format!("Response did not match the expected shape: {}", err))
        } else {
            AppError::Api(format!("Network error: {}", err))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(_) | AppError::Internal(_) => tracing::error!("{}", self),
            AppError::Api(_) | AppError::Auth(_) => tracing::warn!("{}", self),
            _ => tracing::debug!("{}", self),
        }
        let status = self.status_code();
        (status, Json(self.into_action_result::<()>())).into_response()
    }
}

/// Successful action body
pub fn ok<T: serde::Serialize>(data: T) -> Json<ActionResult<T>> {
    Json(ActionResult::ok(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(AppError::Auth("x".into()).kind(), ErrorKind::Auth);
        assert_eq!(AppError::Api("x".into()).kind(), ErrorKind::Api);
        assert_eq!(AppError::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(AppError::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_internal_details_are_not_leaked() {
        let err = AppError::Internal(anyhow::anyhow!("password=hunter2"));
        let result = err.into_action_result::<()>();
        let error = result.into_result().unwrap_err();
        assert_eq!(error.message, "Internal server error");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Auth("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Api("x".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
