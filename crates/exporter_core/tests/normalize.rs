use std::collections::BTreeMap;

use exporter_core::{normalize_title, FollowedTitle, DEFAULT_LOCALE_PREFERENCE};

fn locale_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(locale, text)| (locale.to_string(), text.to_string()))
        .collect()
}

fn prefs(locales: &[&str]) -> Vec<String> {
    locales.iter().map(ToString::to_string).collect()
}

fn title_with(
    title: &[(&str, &str)],
    alt_titles: &[&[(&str, &str)]],
    original_language: &str,
) -> FollowedTitle {
    FollowedTitle {
        id: "d1a9fdeb".to_string(),
        title: locale_map(title),
        alt_titles: alt_titles.iter().map(|alt| locale_map(alt)).collect(),
        links: BTreeMap::new(),
        original_language: original_language.to_string(),
    }
}

#[test]
fn alt_title_wins_when_earlier_in_preference() {
    let raw = title_with(&[("en", "Foo"), ("ja", "フー")], &[&[("ja-ro", "Fuu")]], "ja");

    let normalized = normalize_title(&raw, &prefs(&["ja-ro", "ja", "en"]));
    assert_eq!(normalized.title, "Fuu");
}

#[test]
fn main_title_map_is_consulted_before_alt_titles() {
    let raw = title_with(&[("ja", "フー")], &[&[("ja", "Alt フー")]], "ja");

    let normalized = normalize_title(&raw, &prefs(&["ja"]));
    assert_eq!(normalized.title, "フー");
}

#[test]
fn first_matching_alt_title_wins_in_arrival_order() {
    let raw = title_with(
        &[("en", "English")],
        &[&[("ko", "첫째")], &[("ko", "둘째")]],
        "ko",
    );

    let normalized = normalize_title(&raw, &prefs(&["ko"]));
    assert_eq!(normalized.title, "첫째");
}

#[test]
fn locale_match_is_case_insensitive() {
    let raw = title_with(&[("JA", "フー")], &[], "ja");

    let normalized = normalize_title(&raw, &prefs(&["ja"]));
    assert_eq!(normalized.title, "フー");
}

#[test]
fn original_token_resolves_to_original_language() {
    let raw = title_with(&[("en", "English"), ("ko", "한국어")], &[], "ko");

    let normalized = normalize_title(&raw, &prefs(&["original", "en"]));
    assert_eq!(normalized.title, "한국어");
}

#[test]
fn original_token_is_skipped_when_language_is_absent() {
    let raw = title_with(&[("en", "English")], &[], "");

    let normalized = normalize_title(&raw, &prefs(&["original", "en"]));
    assert_eq!(normalized.title, "English");
}

#[test]
fn falls_back_to_first_title_map_value_when_nothing_matches() {
    let raw = title_with(&[("pt-br", "Fulano"), ("vi", "Việt")], &[], "pt-br");

    let normalized = normalize_title(&raw, &prefs(&["ja", "en"]));
    // BTreeMap order: "pt-br" sorts before "vi".
    assert_eq!(normalized.title, "Fulano");
}

#[test]
fn falls_back_to_alt_title_when_title_map_is_empty() {
    let raw = title_with(&[], &[&[("pt-br", "Fulano")]], "");

    let normalized = normalize_title(&raw, &prefs(&["ja", "en"]));
    assert_eq!(normalized.title, "Fulano");
}

#[test]
fn normalization_is_deterministic() {
    let raw = title_with(
        &[("en", "Foo"), ("ja", "フー")],
        &[&[("ja-ro", "Fuu")]],
        "ja",
    );
    let preference = prefs(&["ja-ro", "ja", "en"]);

    let first = normalize_title(&raw, &preference);
    let second = normalize_title(&raw, &preference);
    assert_eq!(first, second);
}

#[test]
fn links_pass_through_unchanged() {
    let mut raw = title_with(&[("en", "Foo")], &[], "en");
    raw.links
        .insert("mu".to_string(), Some("abc123".to_string()));
    raw.links.insert("mal".to_string(), None);

    let normalized = normalize_title(&raw, &prefs(&["en"]));
    assert_eq!(normalized.link("mu"), Some("abc123"));
    assert_eq!(normalized.link("mal"), None);
    assert_eq!(normalized.links, raw.links);
}

#[test]
fn default_preference_prefers_japanese() {
    let raw = title_with(&[("en", "Foo"), ("ja", "フー")], &[], "ja");
    let preference: Vec<String> = DEFAULT_LOCALE_PREFERENCE
        .iter()
        .map(ToString::to_string)
        .collect();

    let normalized = normalize_title(&raw, &preference);
    assert_eq!(normalized.title, "フー");
}
