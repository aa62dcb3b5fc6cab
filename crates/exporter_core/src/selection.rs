use std::collections::BTreeSet;

use crate::links::LinkKind;
use crate::normalize::DEFAULT_LOCALE_PREFERENCE;

/// Where a run's list should be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Destination {
    /// One text file of titles plus one text file per selected link kind.
    Text,
    /// A single CSV of titles and links.
    Csv,
    /// The remote reading-list service.
    ReadingList,
    /// An import file for the third-party tracking site.
    ThirdPartyImport,
}

impl Destination {
    /// Every destination, in pipeline order.
    pub const ALL: [Destination; 4] = [
        Destination::Text,
        Destination::Csv,
        Destination::ReadingList,
        Destination::ThirdPartyImport,
    ];
}

/// Buffering policy for the file-based destinations.
///
/// Both modes produce byte-identical output; they differ in memory held
/// versus write calls issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferingMode {
    /// Flush after each record.
    PerTitle,
    /// Accumulate in memory and write once at the end.
    #[default]
    PerList,
}

/// How titles are imported to the reading-list service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMethod {
    /// By title text. Fast, but matching on the remote side is best-effort.
    #[default]
    Title,
    /// By numeric ID resolved from each title's link. Slow but exact;
    /// titles without the link are skipped.
    Id,
}

/// Everything the caller decides about one export run. Immutable for the
/// duration of that run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSelection {
    /// Destinations to realize.
    pub destinations: BTreeSet<Destination>,
    /// Link kinds to include, iterated in wire-key order.
    pub links: BTreeSet<LinkKind>,
    /// Ordered locale preference for title resolution.
    pub locale_preference: Vec<String>,
    /// Base name for output files; a timestamp suffix is appended per run.
    pub base_name: String,
    /// Buffering policy for file-based destinations.
    pub buffering: BufferingMode,
    /// Import method for the reading-list destination.
    pub import_method: ImportMethod,
}

impl Default for ExportSelection {
    fn default() -> Self {
        Self {
            destinations: Destination::ALL.into_iter().collect(),
            links: LinkKind::ALL.into_iter().collect(),
            locale_preference: DEFAULT_LOCALE_PREFERENCE
                .iter()
                .map(ToString::to_string)
                .collect(),
            base_name: "My_MangaDex_Follows".to_string(),
            buffering: BufferingMode::default(),
            import_method: ImportMethod::default(),
        }
    }
}
