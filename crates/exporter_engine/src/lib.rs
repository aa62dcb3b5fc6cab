//! Exporter engine: catalog fetch, pagination, and the export pipeline.
mod catalog;
mod engine;
mod export;
mod files;
mod filename;
mod models;
mod pagination;
mod persist;
mod reading_list;
mod types;

pub use catalog::{CatalogClient, CatalogSettings, FollowsSource, RETRY_AFTER_HEADERS};
pub use engine::{ExporterHandle, RunConfig};
pub use export::{
    DestinationWriter, ExportError, ExportPipeline, ExportReport, ReadingListDestination,
};
pub use files::{
    collect_export_stats, write_stats_report, CsvDestination, ImportFileDestination,
    TextFilesDestination, NULL_LINK_PLACEHOLDER,
};
pub use filename::{run_timestamp, timestamped_filename};
pub use models::ListData;
pub use pagination::{fetch_all_follows, rate_limit_wait, FetchOutcome, PaginationSettings};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError, RecordWriter};
pub use reading_list::{
    extract_series_id, BulkAddSummary, ReadingListClient, ReadingListCredentials,
    ReadingListSettings, BULK_BATCH_SIZE, EXPORT_LIST_TITLE,
};
pub use types::{
    CatalogError, ChannelProgressSink, Credentials, FetchRunError, PageOutcome, PageResult,
    ProgressSink, ReadingListError, RunEvent, TokenPair,
};
