use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::links::LinkKind;

/// Running counters for one fetch run. Reset per invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Titles received across all pages.
    pub items_received: u64,
    /// Pages that returned data.
    pub successful_pages: u32,
    /// Pages answered with a rate-limit response.
    pub rate_limited_pages: u32,
    /// Pages retried after an unexpected response.
    pub retried_pages: u32,
    /// Total requests issued against the follows endpoint.
    pub api_calls: u32,
}

impl FetchStats {
    /// Multi-line summary logged when a fetch run finishes.
    pub fn summary(&self, expected_total: u64) -> String {
        format!(
            "Finished fetching titles. Stats:\n\
             \tExpected total: {expected_total}\n\
             \tReceived: {}\n\
             \tNumber of API calls: {}\n\
             \tNumber of successful API calls: {}",
            self.items_received, self.api_calls, self.successful_pages,
        )
    }
}

/// Per-link-kind count of titles missing that link, accumulated during
/// export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullLinkCounters {
    counts: BTreeMap<LinkKind, u64>,
}

impl NullLinkCounters {
    /// Zeroed counters for the given kinds, so unselected kinds never
    /// appear in the report.
    pub fn for_kinds(kinds: impl IntoIterator<Item = LinkKind>) -> Self {
        Self {
            counts: kinds.into_iter().map(|kind| (kind, 0)).collect(),
        }
    }

    /// Records one title missing the given link kind.
    pub fn record_missing(&mut self, kind: LinkKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }

    /// Missing-count for one kind.
    pub fn count(&self, kind: LinkKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Iterates counters in wire-key order.
    pub fn iter(&self) -> impl Iterator<Item = (LinkKind, u64)> + '_ {
        self.counts.iter().map(|(kind, count)| (*kind, *count))
    }
}

/// Trailing statistics for the file-based destinations of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Titles written out.
    pub titles_processed: u64,
    /// Missing-link counts per selected kind.
    pub null_links: NullLinkCounters,
}

impl ExportStats {
    /// Renders the stats report written next to the exported files.
    pub fn render_report(&self) -> String {
        let mut report = format!(
            "Titles added: {}\nNull links count:\n",
            self.titles_processed
        );
        for (kind, count) in self.null_links.iter() {
            let _ = writeln!(report, "\t{}:\t{count}", kind.key());
        }
        report
    }
}
