use crate::title::{FollowedTitle, NormalizedTitle};

/// Locale order used when the caller supplies no preference of its own.
pub const DEFAULT_LOCALE_PREFERENCE: [&str; 8] =
    ["ja", "ja-ro", "ko", "ko-ro", "zh", "zh-hk", "zh-ro", "en"];

/// Preference-list token that resolves to the entry's own original language.
pub const ORIGINAL_LANGUAGE_TOKEN: &str = "original";

/// Picks one display title for a followed entry.
///
/// Walks `preference` in order; for each locale the main title map is
/// consulted first, then the alternate titles in arrival order. The
/// [`ORIGINAL_LANGUAGE_TOKEN`] resolves to the entry's original-language
/// code and is skipped when that code is empty. Locale comparison is
/// case-insensitive.
///
/// When nothing in the preference list matches, the first value of the
/// title map is used, then the first alternate title, then the empty
/// string. Deterministic for identical inputs.
pub fn normalize_title(raw: &FollowedTitle, preference: &[String]) -> NormalizedTitle {
    for wanted in preference {
        let locale = if wanted.eq_ignore_ascii_case(ORIGINAL_LANGUAGE_TOKEN) {
            if raw.original_language.is_empty() {
                continue;
            }
            raw.original_language.as_str()
        } else {
            wanted.as_str()
        };

        if let Some(text) = lookup(raw, locale) {
            return NormalizedTitle {
                title: text.to_string(),
                links: raw.links.clone(),
            };
        }
    }

    let fallback = raw
        .title
        .values()
        .next()
        .or_else(|| raw.alt_titles.iter().flat_map(|alt| alt.values()).next())
        .cloned()
        .unwrap_or_default();

    NormalizedTitle {
        title: fallback,
        links: raw.links.clone(),
    }
}

fn lookup<'a>(raw: &'a FollowedTitle, locale: &str) -> Option<&'a str> {
    let from_title = raw
        .title
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(locale))
        .map(|(_, text)| text.as_str());
    if from_title.is_some() {
        return from_title;
    }

    raw.alt_titles
        .iter()
        .flat_map(|alt| alt.iter())
        .find(|(key, _)| key.eq_ignore_ascii_case(locale))
        .map(|(_, text)| text.as_str())
}
