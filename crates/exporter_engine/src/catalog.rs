use std::time::Duration;

use reqwest::StatusCode;

use crate::models::{FollowsPageBody, TokenBody};
use crate::types::{CatalogError, Credentials, PageOutcome, PageResult, TokenPair};

/// Headers carrying the end of the current rate-limit window, in epoch
/// milliseconds. Checked in order.
pub const RETRY_AFTER_HEADERS: [&str; 2] = ["RateLimit-Retry-After", "X-RateLimit-Retry-After"];

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    /// OpenID-Connect token endpoint.
    pub token_url: String,
    /// Base URL of the catalog REST API.
    pub api_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            token_url: "https://auth.mangadex.org/realms/mangadex/protocol/openid-connect/token"
                .to_string(),
            api_url: "https://api.mangadex.org".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The catalog service as the pagination engine sees it: token lifecycle
/// plus one page-fetch operation.
#[async_trait::async_trait]
pub trait FollowsSource: Send + Sync {
    /// Exchanges user and client credentials for a token pair.
    async fn fetch_tokens(&self, credentials: &Credentials) -> Result<TokenPair, CatalogError>;

    /// Exchanges a refresh token for a new token pair.
    async fn refresh_tokens(
        &self,
        refresh_token: &str,
        credentials: &Credentials,
    ) -> Result<TokenPair, CatalogError>;

    /// Fetches one follows page. `limit` is clamped to 100 by the remote
    /// API itself; valid values are 1 to 100.
    async fn followed_page(
        &self,
        access_token: &str,
        limit: u32,
        offset: u64,
    ) -> Result<PageOutcome, CatalogError>;
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    settings: CatalogSettings,
}

impl CatalogClient {
    pub fn new(settings: CatalogSettings) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self { http, settings })
    }

    async fn token_request(
        &self,
        form: &[(&str, &str)],
        credentials_can_fail: bool,
    ) -> Result<TokenPair, CatalogError> {
        let response = self
            .http
            .post(&self.settings.token_url)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED && credentials_can_fail {
            return Err(CatalogError::InvalidCredentials);
        }
        if status != StatusCode::OK {
            return Err(CatalogError::UnexpectedResponse {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: TokenBody = response.json().await?;
        Ok(TokenPair {
            access: body.access_token,
            refresh: body.refresh_token,
        })
    }
}

#[async_trait::async_trait]
impl FollowsSource for CatalogClient {
    async fn fetch_tokens(&self, credentials: &Credentials) -> Result<TokenPair, CatalogError> {
        self.token_request(
            &[
                ("grant_type", "password"),
                ("username", &credentials.username),
                ("password", &credentials.password),
                ("client_id", &credentials.client_id),
                ("client_secret", &credentials.client_secret),
            ],
            true,
        )
        .await
    }

    async fn refresh_tokens(
        &self,
        refresh_token: &str,
        credentials: &Credentials,
    ) -> Result<TokenPair, CatalogError> {
        self.token_request(
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &credentials.client_id),
                ("client_secret", &credentials.client_secret),
            ],
            false,
        )
        .await
    }

    async fn followed_page(
        &self,
        access_token: &str,
        limit: u32,
        offset: u64,
    ) -> Result<PageOutcome, CatalogError> {
        let response = self
            .http
            .get(format!("{}/user/follows/manga", self.settings.api_url))
            .bearer_auth(access_token)
            .query(&[("limit", limit.to_string()), ("offset", offset.to_string())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(PageOutcome::RateLimited {
                retry_after_epoch_ms: retry_after_epoch_ms(response.headers()),
            });
        }
        if status.is_success() {
            let body: FollowsPageBody = response.json().await?;
            let items = body
                .data
                .into_iter()
                .map(|entry| entry.into_followed_title())
                .collect();
            return Ok(PageOutcome::Page(PageResult {
                items,
                total: body.total,
                offset: body.offset,
                limit: body.limit,
            }));
        }

        Ok(PageOutcome::Unexpected {
            status: status.as_u16(),
        })
    }
}

fn retry_after_epoch_ms(headers: &reqwest::header::HeaderMap) -> Option<i64> {
    RETRY_AFTER_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| value.trim().parse::<i64>().ok())
}
