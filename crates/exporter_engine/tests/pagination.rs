use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use exporter_core::{FollowedTitle, LogEvent, Severity};
use exporter_engine::{
    fetch_all_follows, rate_limit_wait, CatalogError, Credentials, FetchRunError, FollowsSource,
    PageOutcome, PageResult, PaginationSettings, ProgressSink, TokenPair,
};

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<LogEvent>>,
}

impl TestSink {
    fn take(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: LogEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Source that replays a fixed sequence of page outcomes.
struct ScriptedSource {
    pages: Mutex<VecDeque<Result<PageOutcome, CatalogError>>>,
    page_calls: AtomicU32,
    refresh_calls: AtomicU32,
    token_result: Option<CatalogError>,
}

impl ScriptedSource {
    fn new(pages: Vec<Result<PageOutcome, CatalogError>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            page_calls: AtomicU32::new(0),
            refresh_calls: AtomicU32::new(0),
            token_result: None,
        }
    }

    fn rejecting_credentials() -> Self {
        Self {
            pages: Mutex::new(VecDeque::new()),
            page_calls: AtomicU32::new(0),
            refresh_calls: AtomicU32::new(0),
            token_result: Some(CatalogError::InvalidCredentials),
        }
    }

    fn page_calls(&self) -> u32 {
        self.page_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl FollowsSource for ScriptedSource {
    async fn fetch_tokens(&self, _credentials: &Credentials) -> Result<TokenPair, CatalogError> {
        match &self.token_result {
            Some(CatalogError::InvalidCredentials) => Err(CatalogError::InvalidCredentials),
            _ => Ok(TokenPair {
                access: "access-1".to_string(),
                refresh: "refresh-1".to_string(),
            }),
        }
    }

    async fn refresh_tokens(
        &self,
        _refresh_token: &str,
        _credentials: &Credentials,
    ) -> Result<TokenPair, CatalogError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        Ok(TokenPair {
            access: "access-2".to_string(),
            refresh: "refresh-2".to_string(),
        })
    }

    async fn followed_page(
        &self,
        _access_token: &str,
        _limit: u32,
        _offset: u64,
    ) -> Result<PageOutcome, CatalogError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(PageOutcome::Unexpected { status: 500 }))
    }
}

fn credentials() -> Credentials {
    Credentials {
        username: "user".to_string(),
        password: "pass".to_string(),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
    }
}

fn fast_settings() -> PaginationSettings {
    PaginationSettings {
        batch_pause: Duration::from_millis(1),
        rate_limit_fallback: Duration::from_millis(20),
        ..PaginationSettings::default()
    }
}

fn title(id: usize) -> FollowedTitle {
    FollowedTitle {
        id: id.to_string(),
        title: BTreeMap::from([("en".to_string(), format!("Title {id}"))]),
        alt_titles: Vec::new(),
        links: BTreeMap::new(),
        original_language: "ja".to_string(),
    }
}

fn page(ids: std::ops::Range<usize>, total: u64, limit: u32) -> Result<PageOutcome, CatalogError> {
    let offset = ids.start as u64;
    Ok(PageOutcome::Page(PageResult {
        items: ids.map(title).collect(),
        total,
        offset,
        limit,
    }))
}

/// Splits `n` items into pages of `limit` with matching totals.
fn pages_for(n: usize, limit: usize) -> Vec<Result<PageOutcome, CatalogError>> {
    if n == 0 {
        return vec![page(0..0, 0, limit as u32)];
    }
    let mut pages = Vec::new();
    let mut start = 0;
    while start < n {
        let end = (start + limit).min(n);
        pages.push(page(start..end, n as u64, limit as u32));
        start = end;
    }
    pages
}

#[tokio::test]
async fn collects_every_item_in_order_for_various_sizes() {
    for (n, limit) in [(0, 100), (1, 100), (7, 3), (205, 100), (10, 1)] {
        let source = ScriptedSource::new(pages_for(n, limit));
        let sink = TestSink::default();

        let outcome = fetch_all_follows(&source, &credentials(), &fast_settings(), &sink)
            .await
            .expect("fetch ok");

        assert_eq!(outcome.titles.len(), n, "n={n} limit={limit}");
        let ids: Vec<String> = outcome.titles.iter().map(|t| t.id.clone()).collect();
        let expected: Vec<String> = (0..n).map(|id| id.to_string()).collect();
        assert_eq!(ids, expected, "arrival order n={n} limit={limit}");
        assert_eq!(outcome.stats.items_received, n as u64);
    }
}

#[tokio::test]
async fn three_pages_of_205_terminate_without_a_fourth_fetch() {
    let source = ScriptedSource::new(vec![
        page(0..100, 205, 100),
        page(100..200, 205, 100),
        page(200..205, 205, 100),
    ]);
    let sink = TestSink::default();

    let outcome = fetch_all_follows(&source, &credentials(), &fast_settings(), &sink)
        .await
        .expect("fetch ok");

    assert_eq!(outcome.titles.len(), 205);
    assert_eq!(outcome.expected_total, 205);
    assert_eq!(source.page_calls(), 3);
    assert_eq!(outcome.stats.successful_pages, 3);

    let successes = sink
        .take()
        .into_iter()
        .filter(|event| event.message.starts_with("Successful response"))
        .count();
    assert_eq!(successes, 3);
}

#[tokio::test]
async fn empty_page_terminates_even_when_total_disagrees() {
    let source = ScriptedSource::new(vec![page(0..0, 50, 100)]);
    let sink = TestSink::default();

    let outcome = fetch_all_follows(&source, &credentials(), &fast_settings(), &sink)
        .await
        .expect("fetch ok");

    assert!(outcome.titles.is_empty());
    assert_eq!(source.page_calls(), 1);
}

#[tokio::test]
async fn changed_total_on_later_pages_is_tolerated() {
    // The first response claims 4 items, the second revises the total down
    // to 3; the engine adopts each response's total as it arrives.
    let source = ScriptedSource::new(vec![page(0..2, 4, 2), page(2..3, 3, 2)]);
    let sink = TestSink::default();

    let outcome = fetch_all_follows(&source, &credentials(), &fast_settings(), &sink)
        .await
        .expect("fetch ok");

    assert_eq!(outcome.titles.len(), 3);
    assert_eq!(outcome.expected_total, 3);
    assert_eq!(source.page_calls(), 2);
}

#[tokio::test]
async fn rate_limited_page_waits_then_retries_same_offset() {
    let source = ScriptedSource::new(vec![
        Ok(PageOutcome::RateLimited {
            retry_after_epoch_ms: None,
        }),
        page(0..3, 3, 100),
    ]);
    let sink = TestSink::default();
    let settings = fast_settings();

    let started = Instant::now();
    let outcome = fetch_all_follows(&source, &credentials(), &settings, &sink)
        .await
        .expect("fetch ok");

    assert!(started.elapsed() >= settings.rate_limit_fallback);
    assert_eq!(outcome.titles.len(), 3);
    assert_eq!(outcome.stats.rate_limited_pages, 1);
    assert_eq!(source.page_calls(), 2);
}

#[test]
fn rate_limit_wait_uses_header_guidance() {
    assert_eq!(
        rate_limit_wait(Some(10_500), 10_000, Duration::from_millis(60_000)),
        Duration::from_millis(501)
    );
    // A window that already ended never yields a negative wait.
    assert_eq!(
        rate_limit_wait(Some(9_000), 10_000, Duration::from_millis(60_000)),
        Duration::ZERO
    );
}

#[test]
fn rate_limit_wait_falls_back_to_sixty_seconds() {
    assert_eq!(
        rate_limit_wait(None, 10_000, Duration::from_millis(60_000)),
        Duration::from_millis(60_000)
    );
}

#[tokio::test]
async fn server_errors_retry_then_exhaust() {
    let source = ScriptedSource::new(vec![
        Ok(PageOutcome::Unexpected { status: 502 }),
        Ok(PageOutcome::Unexpected { status: 502 }),
        Ok(PageOutcome::Unexpected { status: 502 }),
    ]);
    let sink = TestSink::default();
    let settings = PaginationSettings {
        unexpected_retry_limit: 3,
        ..fast_settings()
    };

    let err = fetch_all_follows(&source, &credentials(), &settings, &sink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FetchRunError::RetriesExhausted {
            offset: 0,
            attempts: 3
        }
    ));
    assert_eq!(source.page_calls(), 3);
}

#[tokio::test]
async fn server_error_then_success_recovers() {
    let source = ScriptedSource::new(vec![
        Ok(PageOutcome::Unexpected { status: 503 }),
        page(0..2, 2, 100),
    ]);
    let sink = TestSink::default();

    let outcome = fetch_all_follows(&source, &credentials(), &fast_settings(), &sink)
        .await
        .expect("fetch ok");

    assert_eq!(outcome.titles.len(), 2);
    assert_eq!(outcome.stats.retried_pages, 1);

    let warned = sink
        .take()
        .iter()
        .any(|event| event.severity == Severity::Warn);
    assert!(warned);
}

#[tokio::test]
async fn client_error_is_fatal_immediately() {
    let source = ScriptedSource::new(vec![Ok(PageOutcome::Unexpected { status: 404 })]);
    let sink = TestSink::default();

    let err = fetch_all_follows(&source, &credentials(), &fast_settings(), &sink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FetchRunError::FatalStatus {
            status: 404,
            offset: 0
        }
    ));
    assert_eq!(source.page_calls(), 1);
}

#[tokio::test]
async fn unauthorized_refreshes_tokens_and_retries() {
    let source = ScriptedSource::new(vec![
        Ok(PageOutcome::Unexpected { status: 401 }),
        page(0..1, 1, 100),
    ]);
    let sink = TestSink::default();

    let outcome = fetch_all_follows(&source, &credentials(), &fast_settings(), &sink)
        .await
        .expect("fetch ok");

    assert_eq!(outcome.titles.len(), 1);
    assert_eq!(source.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalid_credentials_abort_the_run() {
    let source = ScriptedSource::rejecting_credentials();
    let sink = TestSink::default();

    let err = fetch_all_follows(&source, &credentials(), &fast_settings(), &sink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FetchRunError::Catalog(CatalogError::InvalidCredentials)
    ));
    assert_eq!(source.page_calls(), 0);
}

#[tokio::test]
async fn batch_pause_separates_batches() {
    // One attempt per batch forces a pause between every page.
    let source = ScriptedSource::new(pages_for(6, 2));
    let sink = TestSink::default();
    let settings = PaginationSettings {
        attempts_per_batch: 1,
        batch_pause: Duration::from_millis(10),
        ..fast_settings()
    };

    let started = Instant::now();
    let outcome = fetch_all_follows(&source, &credentials(), &settings, &sink)
        .await
        .expect("fetch ok");

    assert_eq!(outcome.titles.len(), 6);
    // Three pages, two inter-batch pauses.
    assert!(started.elapsed() >= Duration::from_millis(20));
}
