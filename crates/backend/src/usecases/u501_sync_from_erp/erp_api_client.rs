use super::erp_models::{
    ErpOrderDetails, ErpOrderListResponse, ErpOrderSummary, ErpTokenRequest, ErpTokenResponse,
};
use crate::shared::config::ErpConfig;
use crate::shared::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Source of external order snapshots
#[async_trait]
pub trait ErpSource: Send + Sync {
    /// One page of the order list; `page` is 1-based
    async fn fetch_list(&self, page_size: u32, page: u32) -> AppResult<Vec<ErpOrderSummary>>;

    async fn fetch_details(&self, external_id: &str) -> AppResult<ErpOrderDetails>;
}

/// An empty page or a page shorter than requested ends pagination
pub fn is_terminal_page(len: usize, page_size: u32) -> bool {
    len == 0 || len < page_size as usize
}

/// Tokens are refreshed this long before they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Longest token lifetime taken from the ERP response
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// HTTP client of the ERP order API
pub struct ErpApiClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl ErpApiClient {
    pub fn new(config: &ErpConfig) -> AppResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(AppError::Validation("ERP base_url is not configured".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token: Mutex::new(None),
        })
    }

    /// Cached bearer token, fetching a new one when missing or about to expire
    async fn access_token(&self) -> AppResult<String> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() + TOKEN_EXPIRY_MARGIN {
                return Ok(cached.value.clone());
            }
        }

        let url = format!("{}/api/auth/token", self.base_url);
        tracing::info!("ERP API: POST {} (client_id='{}')", url, self.client_id);

        let response = self
            .client
            .post(&url)
            .json(&ErpTokenRequest {
                client_id: &self.client_id,
                client_secret: &self.client_secret,
            })
            .send()
            .await?;

        let token: ErpTokenResponse = Self::decode(response, &url).await?;
        if token.access_token.is_empty() {
            return Err(AppError::Api(format!(
                "Response from {} did not match the expected shape: empty access_token",
                url
            )));
        }

        let value = token.access_token.clone();
        let lifetime = Duration::from_secs(token.expires_in).min(MAX_TOKEN_LIFETIME);
        *guard = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    async fn forget_token(&self) {
        *self.token.lock().await = None;
    }

    /// Map status codes, then deserialize the body into `T`
    async fn decode<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> AppResult<T> {
        let status = response.status();
        tracing::debug!("ERP API response: {} for {}", status, url);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::Auth(format!(
                "ERP rejected credentials (HTTP {}) for {}",
                status.as_u16(),
                url
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api(format!(
                "HTTP {} from {}: {}",
                status.as_u16(),
                url,
                body.chars().take(500).collect::<String>()
            )));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            AppError::Api(format!(
                "Response from {} did not match the expected shape: {}",
                url, e
            ))
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let result = Self::decode(response, url).await;
        if matches!(result, Err(AppError::Auth(_))) {
            // next call authenticates again
            self.forget_token().await;
        }
        result
    }
}

#[async_trait]
impl ErpSource for ErpApiClient {
    async fn fetch_list(&self, page_size: u32, page: u32) -> AppResult<Vec<ErpOrderSummary>> {
        let url = format!(
            "{}/api/orders?pageSize={}&page={}",
            self.base_url, page_size, page
        );
        tracing::info!("ERP API: GET {}", url);

        let body: ErpOrderListResponse = self.get_json(&url).await?;
        for item in &body.items {
            item.validate().map_err(|e| {
                AppError::Api(format!("Response from {} did not match the expected shape: {}", url, e))
            })?;
        }
        Ok(body.items)
    }

    async fn fetch_details(&self, external_id: &str) -> AppResult<ErpOrderDetails> {
        let url = format!(
            "{}/api/orders/{}",
            self.base_url,
            urlencoding::encode(external_id)
        );
        tracing::debug!("ERP API: GET {}", url);

        let details: ErpOrderDetails = self.get_json(&url).await?;
        details.validate().map_err(|e| {
            AppError::Api(format!("Response from {} did not match the expected shape: {}", url, e))
        })?;
        Ok(details)
    }
}

/// Stand-in used when no ERP endpoint is configured; every call fails
pub struct UnconfiguredErp;

#[async_trait]
impl ErpSource for UnconfiguredErp {
    async fn fetch_list(&self, _page_size: u32, _page: u32) -> AppResult<Vec<ErpOrderSummary>> {
        Err(AppError::Api("ERP base_url is not configured".into()))
    }

    async fn fetch_details(&self, _external_id: &str) -> AppResult<ErpOrderDetails> {
        Err(AppError::Api("ERP base_url is not configured".into()))
    }
}
