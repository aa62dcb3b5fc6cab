use std::sync::mpsc;

use exporter_core::{FetchStats, FollowedTitle, LogEvent};
use thiserror::Error;

/// One page of the follows list as returned by the catalog service.
///
/// `total` is authoritative only for the response it arrived with; the
/// service may report a different total on later pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub items: Vec<FollowedTitle>,
    pub total: u64,
    pub offset: u64,
    pub limit: u32,
}

/// Classified outcome of one page fetch. The client classifies the
/// response; retry and backoff policy belong to the pagination engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page parsed successfully.
    Page(PageResult),
    /// The service rate-limited the request. The retry-after value is the
    /// end of the current limit window in epoch milliseconds, when the
    /// header was present and parsable.
    RateLimited { retry_after_epoch_ms: Option<i64> },
    /// Any other status. The engine decides whether it is retryable.
    Unexpected { status: u16 },
}

/// Credentials for the catalog service's password-grant token endpoint.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
}

/// An access/refresh token pair. Held by the caller, never cached inside
/// the client, so refresh composes cleanly with retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Events delivered to the caller over the run's ordered channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// One entry of the log stream.
    Log(LogEvent),
    /// Terminal event; emitted exactly once per run.
    Finished {
        success: bool,
        fetch_stats: Option<FetchStats>,
    },
}

/// Consumer of a run's ordered log stream.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: LogEvent);
}

/// Sink that forwards events into the run channel. The receiving side
/// owns presentation; a dropped receiver silently discards events.
pub struct ChannelProgressSink {
    tx: mpsc::Sender<RunEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<RunEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: LogEvent) {
        let _ = self.tx.send(RunEvent::Log(event));
    }
}

/// Errors from the catalog service client.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid user or client credentials")]
    InvalidCredentials,
    #[error("unexpected response from catalog service ({status}): {body}")]
    UnexpectedResponse { status: u16, body: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Errors from the reading-list service client.
#[derive(Debug, Error)]
pub enum ReadingListError {
    #[error("invalid reading-list user credentials")]
    InvalidCredentials,
    #[error("unexpected response from reading-list service ({status}): {reason}")]
    UnexpectedResponse { status: u16, reason: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Failure of a whole fetch run.
#[derive(Debug, Error)]
pub enum FetchRunError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("gave up after {attempts} failed attempts at offset {offset}")]
    RetriesExhausted { offset: u64, attempts: u32 },
    #[error("fatal response from catalog service ({status}) at offset {offset}")]
    FatalStatus { status: u16, offset: u64 },
}
