use std::collections::BTreeMap;

/// Locale code mapped to text in that locale.
pub type LocaleMap = BTreeMap<String, String>;

/// One followed entry as reported by the catalog service, before title
/// resolution. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowedTitle {
    /// Catalog identifier of the entry.
    pub id: String,
    /// Title text per locale.
    pub title: LocaleMap,
    /// Alternate titles; each map carries a single locale entry. Arrival
    /// order is preserved because resolution picks the first match.
    pub alt_titles: Vec<LocaleMap>,
    /// External link values keyed by link kind. A `None` value is the
    /// service's explicit null.
    pub links: BTreeMap<String, Option<String>>,
    /// Language code the work was originally published in.
    pub original_language: String,
}

impl FollowedTitle {
    /// Looks up a link value, treating explicit nulls and missing keys alike.
    pub fn link(&self, kind: &str) -> Option<&str> {
        self.links.get(kind).and_then(|value| value.as_deref())
    }
}

/// A followed entry reduced to one display title plus its link map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTitle {
    /// Display title chosen by locale preference.
    pub title: String,
    /// External link values, passed through from the raw entry.
    pub links: BTreeMap<String, Option<String>>,
}

impl NormalizedTitle {
    /// Looks up a link value, treating explicit nulls and missing keys alike.
    pub fn link(&self, kind: &str) -> Option<&str> {
        self.links.get(kind).and_then(|value| value.as_deref())
    }
}
