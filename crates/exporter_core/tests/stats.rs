use exporter_core::{ExportStats, FetchStats, LinkKind, NullLinkCounters};

#[test]
fn null_counters_only_report_selected_kinds() {
    let mut counters = NullLinkCounters::for_kinds([LinkKind::Mu, LinkKind::Mal]);
    counters.record_missing(LinkKind::Mu);
    counters.record_missing(LinkKind::Mu);

    assert_eq!(counters.count(LinkKind::Mu), 2);
    assert_eq!(counters.count(LinkKind::Mal), 0);
    assert_eq!(counters.count(LinkKind::Al), 0);

    let kinds: Vec<LinkKind> = counters.iter().map(|(kind, _)| kind).collect();
    assert_eq!(kinds, vec![LinkKind::Mal, LinkKind::Mu]);
}

#[test]
fn report_lists_titles_and_per_kind_counts() {
    let mut null_links = NullLinkCounters::for_kinds([LinkKind::Mu]);
    for _ in 0..3 {
        null_links.record_missing(LinkKind::Mu);
    }
    let stats = ExportStats {
        titles_processed: 10,
        null_links,
    };

    let report = stats.render_report();
    assert!(report.starts_with("Titles added: 10\n"));
    assert!(report.contains("Null links count:\n"));
    assert!(report.contains("\tmu:\t3"));
}

#[test]
fn fetch_summary_reports_counters() {
    let stats = FetchStats {
        items_received: 205,
        successful_pages: 3,
        rate_limited_pages: 1,
        retried_pages: 0,
        api_calls: 4,
    };

    let summary = stats.summary(205);
    assert!(summary.contains("Expected total: 205"));
    assert!(summary.contains("Received: 205"));
    assert!(summary.contains("Number of API calls: 4"));
    assert!(summary.contains("Number of successful API calls: 3"));
}
