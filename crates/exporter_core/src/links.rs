use std::fmt;

use url::Url;

/// External link kinds the catalog service stores with each series.
///
/// The wire key (e.g. `mu`) is the key used in the catalog's link map; the
/// canonical name is the linked site's actual name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LinkKind {
    /// AniList.
    Al,
    /// Amazon.
    Amz,
    /// Anime-Planet.
    Ap,
    /// Book Walker.
    Bw,
    /// CDJapan.
    Cdj,
    /// eBookJapan.
    Ebj,
    /// Official English release.
    Engtl,
    /// Kitsu.
    Kt,
    /// MyAnimeList.
    Mal,
    /// MangaUpdates.
    Mu,
    /// NovelUpdates.
    Nu,
    /// Raw publication.
    Raw,
}

impl LinkKind {
    /// Every known link kind, in wire-key order.
    pub const ALL: [LinkKind; 12] = [
        LinkKind::Al,
        LinkKind::Amz,
        LinkKind::Ap,
        LinkKind::Bw,
        LinkKind::Cdj,
        LinkKind::Ebj,
        LinkKind::Engtl,
        LinkKind::Kt,
        LinkKind::Mal,
        LinkKind::Mu,
        LinkKind::Nu,
        LinkKind::Raw,
    ];

    /// Key used in the catalog's link map and in output file names.
    pub fn key(self) -> &'static str {
        match self {
            LinkKind::Al => "al",
            LinkKind::Ap => "ap",
            LinkKind::Amz => "amz",
            LinkKind::Bw => "bw",
            LinkKind::Cdj => "cdj",
            LinkKind::Ebj => "ebj",
            LinkKind::Engtl => "engtl",
            LinkKind::Kt => "kt",
            LinkKind::Mal => "mal",
            LinkKind::Mu => "mu",
            LinkKind::Nu => "nu",
            LinkKind::Raw => "raw",
        }
    }

    /// The linked site's actual name (e.g. `mu` is "MangaUpdates").
    pub fn canonical_name(self) -> &'static str {
        match self {
            LinkKind::Al => "AniList",
            LinkKind::Ap => "Anime-Planet",
            LinkKind::Amz => "Amazon",
            LinkKind::Bw => "Book Walker",
            LinkKind::Cdj => "CDJapan",
            LinkKind::Ebj => "eBookJapan",
            LinkKind::Engtl => "Official English",
            LinkKind::Kt => "Kitsu",
            LinkKind::Mal => "MyAnimeList",
            LinkKind::Mu => "MangaUpdates",
            LinkKind::Nu => "NovelUpdates",
            LinkKind::Raw => "Raws",
        }
    }

    /// Parses a wire key back into a kind.
    pub fn from_key(key: &str) -> Option<LinkKind> {
        LinkKind::ALL.iter().copied().find(|kind| kind.key() == key)
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Normalizes a stored link value into the page reference a reading-list
/// lookup expects.
///
/// The catalog stores either a bare page ID or a full series URL, sometimes
/// with stray quotes or whitespace. For URLs, the segment following
/// `series` is taken; `series.html?id=` style URLs yield the `id` query
/// parameter. Anything else is returned trimmed.
pub fn normalize_page_ref(value: &str) -> String {
    let trimmed = value.trim_matches(|c: char| c == '"' || c.is_whitespace());
    let Ok(parsed) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };

    if let Some(mut segments) = parsed.path_segments() {
        if segments.any(|segment| segment == "series") {
            if let Some(page_ref) = segments.next() {
                if !page_ref.is_empty() {
                    return page_ref.to_string();
                }
            }
        }
    }
    if let Some((_, id)) = parsed.query_pairs().find(|(key, _)| key == "id") {
        return id.into_owned();
    }

    trimmed.to_string()
}
