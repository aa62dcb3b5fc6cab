use std::time::Duration;

use exporter_core::LogEvent;
use reqwest::StatusCode;
use scraper::{Html, Selector};
use tokio::sync::Mutex;

use crate::models::{BulkAddBody, CreateListBody, ListData, LoginBody};
use crate::types::{ProgressSink, ReadingListError};

/// Maximum entries per bulk-add request.
pub const BULK_BATCH_SIZE: usize = 100;

/// Name of the list the export writes into.
pub const EXPORT_LIST_TITLE: &str = "MangaDex Reading List";

/// Anchor prefix on public series pages whose href carries the real
/// series ID: `{prefix}{id}/rss`.
const SERIES_RSS_PREFIX: &str = "https://api.mangaupdates.com/v1/series/";

#[derive(Debug, Clone)]
pub struct ReadingListSettings {
    /// Versioned base URL of the reading-list REST API.
    pub api_url: String,
    /// Base URL of the public site, used for series-page ID lookups.
    pub site_url: String,
    /// Pause between consecutive bulk-add requests, applied regardless of
    /// batch outcome.
    pub batch_pacing: Duration,
    /// Fixed wait before repeating a request answered with 412. Retried
    /// until a different status arrives.
    pub precondition_retry_delay: Duration,
    /// Pause before each series-page ID lookup.
    pub id_lookup_delay: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ReadingListSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.mangaupdates.com/v1".to_string(),
            site_url: "https://www.mangaupdates.com".to_string(),
            batch_pacing: Duration::from_millis(5000),
            precondition_retry_delay: Duration::from_millis(5000),
            id_lookup_delay: Duration::from_millis(5000),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReadingListCredentials {
    pub username: String,
    pub password: String,
}

/// Outcome of a bulk add across all batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkAddSummary {
    pub batches: u32,
    pub submitted: usize,
    pub failed: usize,
}

/// Client for the reading-list service. The session token is fetched
/// lazily on first use and refreshed once when a call answers 401.
pub struct ReadingListClient {
    http: reqwest::Client,
    settings: ReadingListSettings,
    credentials: ReadingListCredentials,
    session: Mutex<Option<String>>,
}

impl ReadingListClient {
    pub fn new(
        credentials: ReadingListCredentials,
        settings: ReadingListSettings,
    ) -> Result<Self, ReadingListError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            http,
            settings,
            credentials,
            session: Mutex::new(None),
        })
    }

    pub fn settings(&self) -> &ReadingListSettings {
        &self.settings
    }

    async fn login(&self) -> Result<String, ReadingListError> {
        let response = self
            .http
            .put(format!("{}/account/login", self.settings.api_url))
            .json(&serde_json::json!({
                "username": self.credentials.username,
                "password": self.credentials.password,
            }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ReadingListError::InvalidCredentials);
        }
        if status != StatusCode::OK {
            return Err(unexpected(response).await);
        }

        let body: LoginBody = response.json().await?;
        match body.context {
            Some(context) => Ok(context.session_token),
            None => Err(ReadingListError::UnexpectedResponse {
                status: status.as_u16(),
                reason: body.reason,
            }),
        }
    }

    async fn session_token(&self) -> Result<String, ReadingListError> {
        let mut guard = self.session.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }
        let token = self.login().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    async fn invalidate_session(&self) {
        *self.session.lock().await = None;
    }

    /// Sends an authenticated request, waiting out 412 responses and
    /// re-logging-in once on 401.
    async fn send_with_session<F>(&self, build: F) -> Result<reqwest::Response, ReadingListError>
    where
        F: Fn(&reqwest::Client, &str) -> reqwest::RequestBuilder,
    {
        let mut refreshed = false;
        loop {
            let token = self.session_token().await?;
            let response = build(&self.http, &token).send().await?;
            let status = response.status();
            if status == StatusCode::PRECONDITION_FAILED {
                tokio::time::sleep(self.settings.precondition_retry_delay).await;
                continue;
            }
            if status == StatusCode::UNAUTHORIZED && !refreshed {
                refreshed = true;
                self.invalidate_session().await;
                continue;
            }
            return Ok(response);
        }
    }

    /// Fetches the user's reading lists.
    pub async fn fetch_lists(&self) -> Result<Vec<ListData>, ReadingListError> {
        let url = format!("{}/lists", self.settings.api_url);
        let response = self
            .send_with_session(|http, token| http.get(&url).bearer_auth(token))
            .await?;
        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }
        Ok(response.json().await?)
    }

    /// Creates a reading list of type `read` and returns its ID.
    pub async fn make_list(
        &self,
        title: &str,
        description: &str,
    ) -> Result<u64, ReadingListError> {
        let url = format!("{}/lists", self.settings.api_url);
        let payload = serde_json::json!({
            "title": title,
            "description": description,
            "type": "read",
        });
        let response = self
            .send_with_session(|http, token| http.post(&url).bearer_auth(token).json(&payload))
            .await?;
        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }
        let body: CreateListBody = response.json().await?;
        Ok(body.context.id)
    }

    /// Returns the ID of the list with the given title, creating the list
    /// when it does not exist yet.
    pub async fn get_or_create_list(
        &self,
        title: &str,
        description: &str,
    ) -> Result<u64, ReadingListError> {
        let lists = self.fetch_lists().await?;
        if let Some(list) = lists.iter().find(|list| list.title == title) {
            return Ok(list.list_id);
        }
        self.make_list(title, description).await
    }

    /// Bulk-adds titles to a list by their display title. Matching on the
    /// remote side is best-effort; partial outcomes are surfaced through
    /// the sink per batch.
    pub async fn add_titles_by_title(
        &self,
        titles: &[String],
        list_id: u64,
        sink: &dyn ProgressSink,
    ) -> Result<BulkAddSummary, ReadingListError> {
        let url = format!("{}/lists/{list_id}/series/bulk", self.settings.api_url);
        let mut summary = BulkAddSummary::default();

        for (index, batch) in titles.chunks(BULK_BATCH_SIZE).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.settings.batch_pacing).await;
            }
            let first = index * BULK_BATCH_SIZE;
            let last = first + batch.len() - 1;
            sink.emit(LogEvent::info(format!("Exporting titles {first} to {last}")));

            let payload: Vec<serde_json::Value> = batch
                .iter()
                .map(|title| {
                    serde_json::json!({
                        "priority": "High",
                        "series_title": title,
                    })
                })
                .collect();
            let response = self
                .send_with_session(|http, token| http.post(&url).bearer_auth(token).json(&payload))
                .await?;
            if !response.status().is_success() {
                return Err(unexpected(response).await);
            }

            let body: BulkAddBody = response.json().await?;
            summary.batches += 1;
            summary.submitted += batch.len();
            summary.failed += report_batch_outcome(&body, batch.len(), first, last, sink);
        }

        Ok(summary)
    }

    /// Bulk-adds series to a list by their numeric ID.
    pub async fn add_titles_by_id(
        &self,
        series_ids: &[u64],
        list_id: u64,
        sink: &dyn ProgressSink,
    ) -> Result<BulkAddSummary, ReadingListError> {
        let url = format!("{}/lists/series", self.settings.api_url);
        let mut summary = BulkAddSummary::default();

        for (index, batch) in series_ids.chunks(BULK_BATCH_SIZE).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.settings.batch_pacing).await;
            }
            let first = index * BULK_BATCH_SIZE;
            let last = first + batch.len() - 1;
            sink.emit(LogEvent::info(format!("Exporting titles {first} to {last}")));

            let payload: Vec<serde_json::Value> = batch
                .iter()
                .map(|series_id| {
                    serde_json::json!({
                        "series": { "id": series_id },
                        "list_id": list_id,
                    })
                })
                .collect();
            let response = self
                .send_with_session(|http, token| http.post(&url).bearer_auth(token).json(&payload))
                .await?;
            if !response.status().is_success() {
                return Err(unexpected(response).await);
            }

            let body: BulkAddBody = response.json().await?;
            summary.batches += 1;
            summary.submitted += batch.len();
            summary.failed += report_batch_outcome(&body, batch.len(), first, last, sink);
        }

        Ok(summary)
    }

    /// Resolves a series' real ID from its public page reference.
    ///
    /// The page reference addresses `{site}/series/{ref}`; on 404 the
    /// legacy `{site}/series.html?id={ref}` variant is tried. The ID is
    /// taken from the RSS anchor on the page; a page without the anchor
    /// resolves to `None` rather than an error.
    pub async fn resolve_title_id(
        &self,
        page_ref: &str,
    ) -> Result<Option<u64>, ReadingListError> {
        let mut response = self
            .get_public_page(&format!("{}/series/{page_ref}", self.settings.site_url), &[])
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            response = self
                .get_public_page(
                    &format!("{}/series.html", self.settings.site_url),
                    &[("id", page_ref)],
                )
                .await?;
        }
        if !response.status().is_success() {
            return Err(unexpected(response).await);
        }

        let html = response.text().await?;
        Ok(extract_series_id(&html))
    }

    async fn get_public_page(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, ReadingListError> {
        loop {
            let response = self.http.get(url).query(query).send().await?;
            if response.status() == StatusCode::PRECONDITION_FAILED {
                tokio::time::sleep(self.settings.precondition_retry_delay).await;
                continue;
            }
            return Ok(response);
        }
    }
}

/// Extracts the numeric series ID from a public series page, via the RSS
/// anchor `{SERIES_RSS_PREFIX}{id}/rss`.
pub fn extract_series_id(html: &str) -> Option<u64> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| href.strip_prefix(SERIES_RSS_PREFIX))
        .filter_map(|rest| rest.strip_suffix("/rss"))
        .find_map(|id| id.parse::<u64>().ok())
}

fn report_batch_outcome(
    body: &BulkAddBody,
    batch_len: usize,
    first: usize,
    last: usize,
    sink: &dyn ProgressSink,
) -> usize {
    if !body.status.starts_with("partial") {
        sink.emit(LogEvent::info(format!(
            "Added {batch_len} titles successfully"
        )));
        return 0;
    }

    let errors: Vec<String> = body
        .context
        .as_ref()
        .map(|context| context.errors.iter().map(|error| error.describe()).collect())
        .unwrap_or_default();
    let details = errors.join("\n\t");

    if errors.len() == batch_len {
        sink.emit(LogEvent::error(format!(
            "Failed to add titles {first} to {last}.\n\t{details}"
        )));
    } else {
        sink.emit(LogEvent::warn(format!(
            "Failed to add some titles ({} of {batch_len}).\n\t{details}",
            errors.len()
        )));
    }
    errors.len()
}

async fn unexpected(response: reqwest::Response) -> ReadingListError {
    let status = response.status().as_u16();
    let reason = response.text().await.unwrap_or_default();
    ReadingListError::UnexpectedResponse { status, reason }
}
