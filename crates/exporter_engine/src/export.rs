//! Export pipeline: fans one normalized list out to the selected
//! destinations, isolating each destination's failures.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use exporter_core::{
    normalize_page_ref, Destination, ExportSelection, ExportStats, ImportMethod, LinkKind,
    LogEvent, NormalizedTitle,
};

use crate::files::{
    collect_export_stats, write_stats_report, CsvDestination, ImportFileDestination,
    TextFilesDestination,
};
use crate::persist::PersistError;
use crate::reading_list::{ReadingListClient, EXPORT_LIST_TITLE};
use crate::types::{ProgressSink, ReadingListError};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("reading-list error: {0}")]
    ReadingList(#[from] ReadingListError),
}

/// One destination handler. Registered once per [`Destination`] kind in
/// the pipeline's strategy table.
#[async_trait::async_trait]
pub trait DestinationWriter: Send + Sync {
    /// The destination this writer realizes.
    fn kind(&self) -> Destination;

    /// Writes the whole list to this destination.
    async fn write(
        &self,
        titles: &[NormalizedTitle],
        selection: &ExportSelection,
        sink: &dyn ProgressSink,
    ) -> Result<(), ExportError>;
}

/// What the pipeline accomplished for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub completed: Vec<Destination>,
    pub failed: Vec<Destination>,
    /// Present when a file-based destination was selected.
    pub stats: Option<ExportStats>,
}

/// Destination handlers keyed by kind, applied to the selection in fixed
/// order.
pub struct ExportPipeline {
    writers: BTreeMap<Destination, Box<dyn DestinationWriter>>,
    output_dir: PathBuf,
    timestamp: String,
}

impl ExportPipeline {
    pub fn new(
        output_dir: PathBuf,
        timestamp: String,
        writers: Vec<Box<dyn DestinationWriter>>,
    ) -> Self {
        Self {
            writers: writers
                .into_iter()
                .map(|writer| (writer.kind(), writer))
                .collect(),
            output_dir,
            timestamp,
        }
    }

    /// Pipeline with every built-in destination registered. The
    /// reading-list destination is registered only when a client is
    /// available.
    pub fn with_default_destinations(
        output_dir: PathBuf,
        timestamp: String,
        reading_list: Option<Arc<ReadingListClient>>,
    ) -> Self {
        let mut writers: Vec<Box<dyn DestinationWriter>> = vec![
            Box::new(TextFilesDestination::new(
                output_dir.clone(),
                timestamp.clone(),
            )),
            Box::new(CsvDestination::new(output_dir.clone(), timestamp.clone())),
            Box::new(ImportFileDestination::new(
                output_dir.clone(),
                timestamp.clone(),
            )),
        ];
        if let Some(client) = reading_list {
            writers.push(Box::new(ReadingListDestination::new(client)));
        }
        Self::new(output_dir, timestamp, writers)
    }

    /// Realizes every selected destination. A failing destination is
    /// logged and skipped; the remaining destinations still run.
    pub async fn run(
        &self,
        titles: &[NormalizedTitle],
        selection: &ExportSelection,
        sink: &dyn ProgressSink,
    ) -> ExportReport {
        let mut report = ExportReport::default();

        for destination in &selection.destinations {
            let Some(writer) = self.writers.get(destination) else {
                sink.emit(LogEvent::warn(format!(
                    "{destination:?} export selected but not configured; skipping"
                )));
                report.failed.push(*destination);
                continue;
            };

            match writer.write(titles, selection, sink).await {
                Ok(()) => report.completed.push(*destination),
                Err(err) => {
                    sink.emit(LogEvent::error(format!(
                        "{destination:?} export failed: {err}"
                    )));
                    report.failed.push(*destination);
                }
            }
        }

        let file_based = selection.destinations.contains(&Destination::Text)
            || selection.destinations.contains(&Destination::Csv);
        if file_based {
            let stats = collect_export_stats(titles, selection);
            match write_stats_report(&self.output_dir, &selection.base_name, &self.timestamp, &stats)
            {
                Ok(path) => sink.emit(LogEvent::info(format!(
                    "Run statistics written to {}",
                    path.display()
                ))),
                Err(err) => sink.emit(LogEvent::error(format!(
                    "Failed to write run statistics: {err}"
                ))),
            }
            sink.emit(LogEvent::info(stats.render_report()));
            report.stats = Some(stats);
        }

        report
    }
}

/// Remote reading-list destination: resolves the export list, then
/// bulk-adds by title or by resolved ID depending on the selection.
pub struct ReadingListDestination {
    client: Arc<ReadingListClient>,
}

impl ReadingListDestination {
    pub fn new(client: Arc<ReadingListClient>) -> Self {
        Self { client }
    }

    async fn resolve_ids(
        &self,
        titles: &[NormalizedTitle],
        sink: &dyn ProgressSink,
    ) -> Result<Vec<u64>, ExportError> {
        sink.emit(LogEvent::info(format!(
            "Getting title IDs. This will take at least {}.",
            duration_estimate(titles.len())
        )));

        let mut series_ids = Vec::new();
        for title in titles {
            let Some(value) = title.link(LinkKind::Mu.key()) else {
                sink.emit(LogEvent::warn(format!(
                    "Ignoring {} because it has no {} link",
                    title.title,
                    LinkKind::Mu.canonical_name()
                )));
                continue;
            };
            let page_ref = normalize_page_ref(value);

            sink.emit(LogEvent::info(format!("Fetching ID for {}", title.title)));
            tokio::time::sleep(self.client.settings().id_lookup_delay).await;
            match self.client.resolve_title_id(&page_ref).await {
                Ok(Some(series_id)) => {
                    sink.emit(LogEvent::info(format!(
                        "Got ID for {}: {series_id}",
                        title.title
                    )));
                    series_ids.push(series_id);
                }
                Ok(None) => sink.emit(LogEvent::warn(format!(
                    "Could not resolve a series ID for {} ({page_ref})",
                    title.title
                ))),
                Err(err) => sink.emit(LogEvent::warn(format!(
                    "Series page lookup failed for {}: {err}",
                    title.title
                ))),
            }
        }
        Ok(series_ids)
    }
}

#[async_trait::async_trait]
impl DestinationWriter for ReadingListDestination {
    fn kind(&self) -> Destination {
        Destination::ReadingList
    }

    async fn write(
        &self,
        titles: &[NormalizedTitle],
        selection: &ExportSelection,
        sink: &dyn ProgressSink,
    ) -> Result<(), ExportError> {
        let list_id = self
            .client
            .get_or_create_list(EXPORT_LIST_TITLE, "Exported follows")
            .await?;
        sink.emit(LogEvent::info("Beginning reading-list export..."));

        let summary = match selection.import_method {
            ImportMethod::Title => {
                let trimmed: Vec<String> =
                    titles.iter().map(|title| trim_title(&title.title)).collect();
                self.client
                    .add_titles_by_title(&trimmed, list_id, sink)
                    .await?
            }
            ImportMethod::Id => {
                let series_ids = self.resolve_ids(titles, sink).await?;
                self.client
                    .add_titles_by_id(&series_ids, list_id, sink)
                    .await?
            }
        };

        sink.emit(LogEvent::info(format!(
            "Reading-list export finished: {} titles in {} batches, {} rejected",
            summary.submitted, summary.batches, summary.failed
        )));
        Ok(())
    }
}

fn trim_title(title: &str) -> String {
    title
        .trim_matches(|c: char| c == '\'' || c == '"' || c == '\n' || c == '\r' || c == ' ')
        .to_string()
}

fn duration_estimate(count: usize) -> String {
    let minutes = count as f64 * 5.0 / 60.0;
    if minutes < 1.0 {
        format!("{:.0} second(s)", minutes * 60.0)
    } else if minutes > 60.0 {
        format!("{:.1} hour(s)", minutes / 60.0)
    } else {
        format!("{:.1} minute(s)", minutes)
    }
}
