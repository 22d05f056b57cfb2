use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::auth::TokenClaims;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};

const ACCESS_TOKEN_LIFETIME_HOURS: i64 = 24;
const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 90;
const JWT_SECRET_KEY: &str = "jwt_secret";

/// Signed access token valid for 24 hours
pub async fn generate_access_token(
    db: &DatabaseConnection,
    user_id: &str,
    username: &str,
    is_admin: bool,
) -> Result<String> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        username: username.to_string(),
        is_admin,
        exp: (now + chrono::Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let secret = get_jwt_secret(db).await?;
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT token")
}

/// Validate signature and expiry, returning the claims
pub async fn validate_token(db: &DatabaseConnection, token: &str) -> Result<TokenClaims> {
    let secret = get_jwt_secret(db).await?;
    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT token")?;
    Ok(token_data.claims)
}

/// 256 random bits, base64
pub fn generate_random_token() -> String {
    use base64::{engine::general_purpose, Engine as _};
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen::<u8>()).collect();
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

pub fn generate_refresh_token() -> String {
    generate_random_token()
}

pub fn calculate_refresh_token_expiration() -> String {
    (Utc::now() + chrono::Duration::days(REFRESH_TOKEN_LIFETIME_DAYS)).to_rfc3339()
}

/// Secret from sys_settings; generated on first use.
///
/// `INSERT OR IGNORE` followed by a re-read keeps concurrent first calls on
/// the same secret.
pub async fn get_jwt_secret(db: &DatabaseConnection) -> Result<String> {
    if let Some(secret) = read_setting(db, JWT_SECRET_KEY).await? {
        return Ok(secret);
    }

    let now = Utc::now().to_rfc3339();
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT OR IGNORE INTO sys_settings (key, value, description, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)",
        [
            JWT_SECRET_KEY.into(),
            generate_random_token().into(),
            "Auto-generated JWT secret for authentication".into(),
            now.clone().into(),
            now.into(),
        ],
    ))
    .await?;

    read_setting(db, JWT_SECRET_KEY)
        .await?
        .ok_or_else(|| anyhow::anyhow!("JWT secret could not be stored"))
}

async fn read_setting(db: &DatabaseConnection, key: &str) -> Result<Option<String>> {
    let row = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT value FROM sys_settings WHERE key = ?",
            [key.into()],
        ))
        .await?;
    match row {
        Some(row) => Ok(Some(row.try_get("", "value")?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_support::memory_db;

    #[tokio::test]
    async fn test_token_roundtrip() {
        let db = memory_db().await;
        let token = generate_access_token(&db, "u-1", "alice", true).await.unwrap();
        let claims = validate_token(&db, &token).await.unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.username, "alice");
        assert!(claims.is_admin);
    }

    #[tokio::test]
    async fn test_secret_is_stable() {
        let db = memory_db().await;
        let first = get_jwt_secret(&db).await.unwrap();
        let second = get_jwt_secret(&db).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let db = memory_db().await;
        let token = generate_access_token(&db, "u-1", "alice", false).await.unwrap();
        let tampered = format!("{}x", token);
        assert!(validate_token(&db, &tampered).await.is_err());
    }

    #[test]
    fn test_random_tokens_differ() {
        assert_ne!(generate_random_token(), generate_random_token());
        assert_eq!(generate_random_token().len(), 43);
    }
}
