use super::repository;
use crate::shared::error::{AppError, AppResult};
use crate::system::auth::password;
use chrono::Utc;
use contracts::system::users::{CreateUserDto, User};
use sea_orm::DatabaseConnection;

/// Create a user; returns the new id
pub async fn create(db: &DatabaseConnection, dto: CreateUserDto) -> AppResult<String> {
    let username = dto.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::Validation("Username cannot be empty".into()));
    }
    if repository::get_by_username(db, &username).await?.is_some() {
        return Err(AppError::Validation(format!("Username '{}' already exists", username)));
    }
    if let Some(email) = dto.email.as_deref() {
        if !email.trim().is_empty() && !email.contains('@') {
            return Err(AppError::Validation("Invalid email format".into()));
        }
    }
    password::validate_password_strength(&dto.password)?;
    let password_hash = password::hash_password(&dto.password)?;

    let now = Utc::now().to_rfc3339();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username,
        email: dto.email,
        full_name: dto.full_name,
        is_active: true,
        is_admin: dto.is_admin,
        created_at: now.clone(),
        updated_at: now,
        last_login_at: None,
    };
    repository::create_with_password(db, &user, &password_hash).await?;
    tracing::info!("Created user '{}' ({})", user.username, user.id);
    Ok(user.id)
}

pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> AppResult<Option<User>> {
    Ok(repository::get_by_id(db, id).await?)
}

pub async fn list_all(db: &DatabaseConnection) -> AppResult<Vec<User>> {
    Ok(repository::list_all(db).await?)
}

pub async fn count(db: &DatabaseConnection) -> AppResult<u64> {
    Ok(repository::count_users(db).await?)
}

/// The user when the credentials match an active account
pub async fn verify_credentials(
    db: &DatabaseConnection,
    username: &str,
    password_plain: &str,
) -> AppResult<Option<User>> {
    let user = match repository::get_by_username(db, username.trim()).await? {
        Some(u) if u.is_active => u,
        _ => return Ok(None),
    };
    let hash = match repository::get_password_hash(db, &user.id).await? {
        Some(h) => h,
        None => return Ok(None),
    };
    if !password::verify_password(password_plain, &hash)? {
        return Ok(None);
    }
    if let Err(e) = repository::update_last_login(db, &user.id).await {
        tracing::warn!("Failed to record login of {}: {}", user.username, e);
    }
    Ok(Some(user))
}
