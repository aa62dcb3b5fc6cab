//! File-based export destinations: positional text files, the CSV, the
//! third-party import file, and the trailing stats report.

use std::path::{Path, PathBuf};

use exporter_core::{
    BufferingMode, Destination, ExportSelection, ExportStats, LinkKind, LogEvent, NormalizedTitle,
    NullLinkCounters,
};

use crate::export::{DestinationWriter, ExportError};
use crate::filename::timestamped_filename;
use crate::persist::{AtomicFileWriter, RecordWriter};
use crate::types::ProgressSink;

/// Placeholder written for a missing link, keeping positional alignment
/// between the titles file and each links file.
pub const NULL_LINK_PLACEHOLDER: &str = "null";

/// Qualifier of the titles text file.
const TITLES_QUALIFIER: &str = "Titles";

fn link_cell(title: &NormalizedTitle, kind: LinkKind) -> &str {
    title.link(kind.key()).unwrap_or(NULL_LINK_PLACEHOLDER)
}

/// Null-link accounting over the whole list for the selected kinds.
pub fn collect_export_stats(
    titles: &[NormalizedTitle],
    selection: &ExportSelection,
) -> ExportStats {
    let mut null_links = NullLinkCounters::for_kinds(selection.links.iter().copied());
    for title in titles {
        for kind in &selection.links {
            if title.link(kind.key()).is_none() {
                null_links.record_missing(*kind);
            }
        }
    }
    ExportStats {
        titles_processed: titles.len() as u64,
        null_links,
    }
}

/// Writes the trailing stats report next to the exported files.
pub fn write_stats_report(
    output_dir: &Path,
    base_name: &str,
    timestamp: &str,
    stats: &ExportStats,
) -> Result<PathBuf, ExportError> {
    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    let filename = timestamped_filename(base_name, Some("stats"), timestamp, "txt");
    Ok(writer.write(&filename, &stats.render_report())?)
}

/// One text file of titles plus one text file per selected link kind,
/// aligned by line order.
pub struct TextFilesDestination {
    output_dir: PathBuf,
    timestamp: String,
}

impl TextFilesDestination {
    pub fn new(output_dir: PathBuf, timestamp: String) -> Self {
        Self {
            output_dir,
            timestamp,
        }
    }
}

#[async_trait::async_trait]
impl DestinationWriter for TextFilesDestination {
    fn kind(&self) -> Destination {
        Destination::Text
    }

    async fn write(
        &self,
        titles: &[NormalizedTitle],
        selection: &ExportSelection,
        sink: &dyn ProgressSink,
    ) -> Result<(), ExportError> {
        let titles_name = timestamped_filename(
            &selection.base_name,
            Some(TITLES_QUALIFIER),
            &self.timestamp,
            "txt",
        );
        let link_names: Vec<(LinkKind, String)> = selection
            .links
            .iter()
            .map(|kind| {
                let name = timestamped_filename(
                    &selection.base_name,
                    Some(kind.key()),
                    &self.timestamp,
                    "txt",
                );
                (*kind, name)
            })
            .collect();

        match selection.buffering {
            BufferingMode::PerTitle => {
                let mut titles_file = RecordWriter::create(&self.output_dir, &titles_name)?;
                let mut link_files = Vec::with_capacity(link_names.len());
                for (kind, name) in &link_names {
                    link_files.push((*kind, RecordWriter::create(&self.output_dir, name)?));
                }
                for title in titles {
                    titles_file.append_line(&title.title)?;
                    for (kind, file) in &mut link_files {
                        file.append_line(link_cell(title, *kind))?;
                    }
                }
                sink.emit(LogEvent::info(format!(
                    "Wrote {} titles to {}",
                    titles.len(),
                    titles_file.path().display()
                )));
            }
            BufferingMode::PerList => {
                let mut titles_buffer = String::new();
                let mut link_buffers: Vec<(LinkKind, String)> = link_names
                    .iter()
                    .map(|(kind, _)| (*kind, String::new()))
                    .collect();
                for title in titles {
                    titles_buffer.push_str(&title.title);
                    titles_buffer.push('\n');
                    for (kind, buffer) in &mut link_buffers {
                        buffer.push_str(link_cell(title, *kind));
                        buffer.push('\n');
                    }
                }

                let writer = AtomicFileWriter::new(self.output_dir.clone());
                let titles_path = writer.write(&titles_name, &titles_buffer)?;
                for ((_, name), (_, buffer)) in link_names.iter().zip(&link_buffers) {
                    writer.write(name, buffer)?;
                }
                sink.emit(LogEvent::info(format!(
                    "Wrote {} titles to {}",
                    titles.len(),
                    titles_path.display()
                )));
            }
        }

        Ok(())
    }
}

/// Single CSV with a `title` column plus one column per selected link
/// kind. Values are written unescaped: an embedded comma in a title is
/// not quoted (known limitation of the format).
pub struct CsvDestination {
    output_dir: PathBuf,
    timestamp: String,
}

impl CsvDestination {
    pub fn new(output_dir: PathBuf, timestamp: String) -> Self {
        Self {
            output_dir,
            timestamp,
        }
    }

    fn header(selection: &ExportSelection) -> String {
        let mut header = "title".to_string();
        for kind in &selection.links {
            header.push(',');
            header.push_str(kind.key());
        }
        header
    }

    fn row(title: &NormalizedTitle, selection: &ExportSelection) -> String {
        let mut row = title.title.clone();
        for kind in &selection.links {
            row.push(',');
            row.push_str(link_cell(title, *kind));
        }
        row
    }
}

#[async_trait::async_trait]
impl DestinationWriter for CsvDestination {
    fn kind(&self) -> Destination {
        Destination::Csv
    }

    async fn write(
        &self,
        titles: &[NormalizedTitle],
        selection: &ExportSelection,
        sink: &dyn ProgressSink,
    ) -> Result<(), ExportError> {
        let filename = timestamped_filename(&selection.base_name, None, &self.timestamp, "csv");

        let path = match selection.buffering {
            BufferingMode::PerTitle => {
                let mut file = RecordWriter::create(&self.output_dir, &filename)?;
                file.append_line(&Self::header(selection))?;
                for title in titles {
                    file.append_line(&Self::row(title, selection))?;
                }
                file.path().to_path_buf()
            }
            BufferingMode::PerList => {
                let mut buffer = Self::header(selection);
                buffer.push('\n');
                for title in titles {
                    buffer.push_str(&Self::row(title, selection));
                    buffer.push('\n');
                }
                AtomicFileWriter::new(self.output_dir.clone()).write(&filename, &buffer)?
            }
        };

        sink.emit(LogEvent::info(format!(
            "Wrote {} titles to {}",
            titles.len(),
            path.display()
        )));
        Ok(())
    }
}

/// Import file for the third-party tracking site: one `<manga>` entry per
/// title carrying that site's link; titles without the link are skipped.
pub struct ImportFileDestination {
    output_dir: PathBuf,
    timestamp: String,
}

impl ImportFileDestination {
    pub fn new(output_dir: PathBuf, timestamp: String) -> Self {
        Self {
            output_dir,
            timestamp,
        }
    }
}

#[async_trait::async_trait]
impl DestinationWriter for ImportFileDestination {
    fn kind(&self) -> Destination {
        Destination::ThirdPartyImport
    }

    async fn write(
        &self,
        titles: &[NormalizedTitle],
        selection: &ExportSelection,
        sink: &dyn ProgressSink,
    ) -> Result<(), ExportError> {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\
             <myanimelist>\
             <myinfo><user_export_type>2</user_export_type></myinfo>",
        );

        let mut included = 0usize;
        for title in titles {
            let Some(value) = title.link(LinkKind::Mal.key()) else {
                continue;
            };
            let id = value.trim_matches(|c: char| c == '"' || c.is_whitespace());
            xml.push_str("<manga><manga_mangadb_id>");
            xml.push_str(id);
            xml.push_str("</manga_mangadb_id><update_on_import>1</update_on_import></manga>");
            included += 1;
        }
        xml.push_str("</myanimelist>");

        let filename = timestamped_filename(&selection.base_name, None, &self.timestamp, "xml");
        let path = AtomicFileWriter::new(self.output_dir.clone()).write(&filename, &xml)?;

        sink.emit(LogEvent::info(format!(
            "Wrote import file with {included} of {} titles to {}",
            titles.len(),
            path.display()
        )));
        Ok(())
    }
}
