use crate::shared::config::AuthConfig;
use crate::shared::error::AppResult;
use crate::system::users::service;
use contracts::system::users::CreateUserDto;
use sea_orm::DatabaseConnection;

/// Create the configured admin account when no user exists yet
pub async fn ensure_admin_user_exists(db: &DatabaseConnection, auth: &AuthConfig) -> AppResult<()> {
    if service::count(db).await? > 0 {
        return Ok(());
    }

    tracing::info!("No users found. Creating admin user '{}'", auth.admin_username);
    let admin_id = service::create(
        db,
        CreateUserDto {
            username: auth.admin_username.clone(),
            password: auth.admin_password.clone(),
            email: None,
            full_name: Some("Administrator".to_string()),
            is_admin: true,
        },
    )
    .await?;

    tracing::warn!(
        "Admin user '{}' created ({}). Change the configured password.",
        auth.admin_username,
        admin_id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_support::memory_db;

    #[tokio::test]
    async fn test_admin_created_once() {
        let db = memory_db().await;
        let auth = AuthConfig::default();
        ensure_admin_user_exists(&db, &auth).await.unwrap();
        ensure_admin_user_exists(&db, &auth).await.unwrap();

        assert_eq!(service::count(&db).await.unwrap(), 1);
        let admin = service::verify_credentials(&db, "admin", "admin").await.unwrap().unwrap();
        assert!(admin.is_admin);
    }
}
