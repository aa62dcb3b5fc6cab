use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use engine_logging::{engine_debug, engine_warn};
use exporter_core::{normalize_title, Destination, ExportSelection, LogEvent, NormalizedTitle};

use crate::catalog::{CatalogClient, CatalogSettings};
use crate::export::ExportPipeline;
use crate::filename::run_timestamp;
use crate::pagination::{fetch_all_follows, PaginationSettings};
use crate::reading_list::{ReadingListClient, ReadingListCredentials, ReadingListSettings};
use crate::types::{ChannelProgressSink, Credentials, ProgressSink, RunEvent};

/// Everything one export run needs, assembled by the caller before the
/// run starts and immutable afterwards.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub catalog_credentials: Credentials,
    /// Required only when the selection includes the reading-list
    /// destination.
    pub reading_list_credentials: Option<ReadingListCredentials>,
    pub selection: ExportSelection,
    pub output_dir: PathBuf,
    pub pagination: PaginationSettings,
    pub catalog: CatalogSettings,
    pub reading_list: ReadingListSettings,
}

enum EngineCommand {
    StartRun(Box<RunConfig>),
}

/// Handle to the engine's worker thread. Commands go in over a channel;
/// the ordered event stream comes back out. At most one run is active at
/// a time; a second request is rejected with a warning, not queued.
pub struct ExporterHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<RunEvent>,
    event_tx: mpsc::Sender<RunEvent>,
    running: Arc<AtomicBool>,
}

impl ExporterHandle {
    pub fn new() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(false));

        let worker_events = event_tx.clone();
        let worker_running = running.clone();
        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartRun(config) => {
                        engine_debug!("Export run dispatched to the engine runtime");
                        let events = worker_events.clone();
                        runtime.block_on(run_export(*config, &events));
                        worker_running.store(false, Ordering::SeqCst);
                    }
                }
            }
        });

        Self {
            cmd_tx,
            event_rx,
            event_tx,
            running,
        }
    }

    /// Dispatches a run. Rejected with a WARN event while another run is
    /// active.
    pub fn start_run(&self, config: RunConfig) {
        if self.running.swap(true, Ordering::SeqCst) {
            engine_warn!("Rejecting export run: one is already active");
            let _ = self.event_tx.send(RunEvent::Log(LogEvent::warn(
                "An export run is already active; ignoring the new request",
            )));
            return;
        }
        if self.cmd_tx.send(EngineCommand::StartRun(Box::new(config))).is_err() {
            self.running.store(false, Ordering::SeqCst);
        }
    }

    /// Next pending event, in emission order.
    pub fn try_recv(&self) -> Option<RunEvent> {
        self.event_rx.try_recv().ok()
    }
}

impl Default for ExporterHandle {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_export(config: RunConfig, events: &mpsc::Sender<RunEvent>) {
    let sink = ChannelProgressSink::new(events.clone());
    let finish = |success: bool, stats| {
        let _ = events.send(RunEvent::Finished {
            success,
            fetch_stats: stats,
        });
    };

    sink.emit(LogEvent::info("Starting title fetch..."));
    let catalog = match CatalogClient::new(config.catalog.clone()) {
        Ok(client) => client,
        Err(err) => {
            sink.emit(LogEvent::error(format!(
                "Failed to build catalog client: {err}"
            )));
            finish(false, None);
            return;
        }
    };

    let outcome = match fetch_all_follows(
        &catalog,
        &config.catalog_credentials,
        &config.pagination,
        &sink,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            sink.emit(LogEvent::error(format!("Title fetch failed: {err}")));
            finish(false, None);
            return;
        }
    };

    let titles: Vec<NormalizedTitle> = outcome
        .titles
        .iter()
        .map(|raw| normalize_title(raw, &config.selection.locale_preference))
        .collect();

    sink.emit(LogEvent::info(
        "Exporting list... (this may take a while for the reading-list destination)",
    ));

    let reading_list = build_reading_list_client(&config, &sink);
    let pipeline = ExportPipeline::with_default_destinations(
        config.output_dir.clone(),
        run_timestamp(),
        reading_list,
    );
    let report = pipeline.run(&titles, &config.selection, &sink).await;

    sink.emit(LogEvent::info("Done running"));
    finish(report.failed.is_empty(), Some(outcome.stats));
}

fn build_reading_list_client(
    config: &RunConfig,
    sink: &dyn ProgressSink,
) -> Option<Arc<ReadingListClient>> {
    if !config
        .selection
        .destinations
        .contains(&Destination::ReadingList)
    {
        return None;
    }
    let Some(credentials) = config.reading_list_credentials.clone() else {
        sink.emit(LogEvent::warn(
            "Reading-list export selected but no credentials provided; skipping",
        ));
        return None;
    };
    match ReadingListClient::new(credentials, config.reading_list.clone()) {
        Ok(client) => Some(Arc::new(client)),
        Err(err) => {
            sink.emit(LogEvent::error(format!(
                "Failed to build reading-list client: {err}"
            )));
            None
        }
    }
}
