use std::time::Duration;

use exporter_core::{FetchStats, FollowedTitle, LogEvent};

use crate::catalog::FollowsSource;
use crate::types::{Credentials, FetchRunError, PageOutcome, ProgressSink};

#[derive(Debug, Clone)]
pub struct PaginationSettings {
    /// Page size requested from the service. Valid range 1 to 100; the
    /// remote API clamps to 100 itself, no client-side clamp is applied.
    pub limit: u32,
    /// Offset the run starts from.
    pub initial_offset: u64,
    /// Page attempts per batch before the global pause.
    pub attempts_per_batch: u32,
    /// Global pause between batches of page attempts.
    pub batch_pause: Duration,
    /// Wait applied when a rate-limit response carries no usable
    /// retry-after header.
    pub rate_limit_fallback: Duration,
    /// Consecutive failed attempts on one offset before the run is
    /// abandoned.
    pub unexpected_retry_limit: u32,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            limit: 100,
            initial_offset: 0,
            attempts_per_batch: 5,
            batch_pause: Duration::from_millis(1000),
            rate_limit_fallback: Duration::from_millis(60_000),
            unexpected_retry_limit: 5,
        }
    }
}

/// Result of a completed fetch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// All pages' items concatenated in arrival order. Overlapping pages
    /// are not deduplicated.
    pub titles: Vec<FollowedTitle>,
    pub stats: FetchStats,
    /// The total reported by the last successful page.
    pub expected_total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchState {
    Fetching,
    Done,
}

enum StatusClass {
    AuthExpired,
    Retryable,
    Fatal,
}

fn classify_status(status: u16) -> StatusClass {
    match status {
        401 => StatusClass::AuthExpired,
        500..=599 => StatusClass::Retryable,
        _ => StatusClass::Fatal,
    }
}

/// Wait before retrying a rate-limited page: the reported end of the
/// limit window plus one millisecond, or the fallback when the service
/// gave no usable guidance. Never negative.
pub fn rate_limit_wait(
    retry_after_epoch_ms: Option<i64>,
    now_epoch_ms: i64,
    fallback: Duration,
) -> Duration {
    match retry_after_epoch_ms {
        Some(period_end) => {
            Duration::from_millis((period_end - now_epoch_ms + 1).max(0) as u64)
        }
        None => fallback,
    }
}

/// Drives the catalog client through successive pages until the follows
/// list is exhausted.
///
/// Pages are appended strictly in increasing offset order. A rate-limited
/// page is waited out and retried; a 401 refreshes the token pair and
/// retries; a 5xx or transport failure retries the same offset up to
/// [`PaginationSettings::unexpected_retry_limit`] times; any other status
/// aborts the run. Credential failure during token acquisition is fatal
/// immediately.
pub async fn fetch_all_follows(
    source: &dyn FollowsSource,
    credentials: &Credentials,
    settings: &PaginationSettings,
    sink: &dyn ProgressSink,
) -> Result<FetchOutcome, FetchRunError> {
    let mut tokens = source.fetch_tokens(credentials).await?;

    let mut titles: Vec<FollowedTitle> = Vec::new();
    let mut stats = FetchStats::default();
    let mut current_offset = settings.initial_offset;
    // Sentinel keeps the loop alive until the first page reports a real total.
    let mut expected_total = settings.initial_offset + 1;
    let mut consecutive_failures: u32 = 0;
    let mut state = FetchState::Fetching;

    while state == FetchState::Fetching {
        for _ in 0..settings.attempts_per_batch {
            sink.emit(LogEvent::info(format!("Current index: {current_offset}")));
            stats.api_calls += 1;

            match source
                .followed_page(&tokens.access, settings.limit, current_offset)
                .await
            {
                Ok(PageOutcome::Page(page)) => {
                    consecutive_failures = 0;
                    stats.successful_pages += 1;
                    stats.items_received += page.items.len() as u64;
                    expected_total = page.total;

                    let empty = page.items.is_empty();
                    current_offset += page.items.len() as u64;
                    sink.emit(LogEvent::info(format!(
                        "Successful response ({}): received {} titles",
                        stats.successful_pages,
                        page.items.len()
                    )));
                    titles.extend(page.items);

                    if empty || current_offset >= expected_total {
                        state = FetchState::Done;
                    }
                }
                Ok(PageOutcome::RateLimited {
                    retry_after_epoch_ms,
                }) => {
                    stats.rate_limited_pages += 1;
                    let wait = rate_limit_wait(
                        retry_after_epoch_ms,
                        chrono::Utc::now().timestamp_millis(),
                        settings.rate_limit_fallback,
                    );
                    sink.emit(LogEvent::warn(format!(
                        "Reached rate limit on API call {}; waiting {} ms",
                        stats.api_calls,
                        wait.as_millis()
                    )));
                    tokio::time::sleep(wait).await;
                }
                Ok(PageOutcome::Unexpected { status }) => match classify_status(status) {
                    StatusClass::AuthExpired => {
                        stats.retried_pages += 1;
                        consecutive_failures += 1;
                        if consecutive_failures >= settings.unexpected_retry_limit {
                            return Err(FetchRunError::RetriesExhausted {
                                offset: current_offset,
                                attempts: consecutive_failures,
                            });
                        }
                        sink.emit(LogEvent::warn(
                            "Access token rejected; refreshing token pair",
                        ));
                        tokens = source.refresh_tokens(&tokens.refresh, credentials).await?;
                    }
                    StatusClass::Retryable => {
                        stats.retried_pages += 1;
                        consecutive_failures += 1;
                        if consecutive_failures >= settings.unexpected_retry_limit {
                            return Err(FetchRunError::RetriesExhausted {
                                offset: current_offset,
                                attempts: consecutive_failures,
                            });
                        }
                        sink.emit(LogEvent::warn(format!(
                            "Unexpected HTTP response {status}; retrying offset {current_offset}"
                        )));
                    }
                    StatusClass::Fatal => {
                        sink.emit(LogEvent::error(format!(
                            "Unexpected HTTP response {status}; aborting fetch"
                        )));
                        return Err(FetchRunError::FatalStatus {
                            status,
                            offset: current_offset,
                        });
                    }
                },
                Err(err) => {
                    stats.retried_pages += 1;
                    consecutive_failures += 1;
                    if consecutive_failures >= settings.unexpected_retry_limit {
                        return Err(FetchRunError::RetriesExhausted {
                            offset: current_offset,
                            attempts: consecutive_failures,
                        });
                    }
                    sink.emit(LogEvent::warn(format!(
                        "Request failed ({err}); retrying offset {current_offset}"
                    )));
                }
            }

            if state == FetchState::Done {
                break;
            }
        }

        // Global pause between batches, kept even right after a
        // rate-limit wait.
        if state == FetchState::Fetching {
            tokio::time::sleep(settings.batch_pause).await;
        }
    }

    sink.emit(LogEvent::info(stats.summary(expected_total)));
    Ok(FetchOutcome {
        titles,
        stats,
        expected_total,
    })
}
