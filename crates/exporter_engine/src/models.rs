//! Wire formats of the two remote services.

use std::collections::BTreeMap;

use exporter_core::FollowedTitle;
use serde::Deserialize;

/// Body of the catalog token endpoint's 200 response. The access token
/// expires after 15 minutes, the refresh token after 90 days.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenBody {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub expires_in: u64,
    #[serde(default)]
    #[allow(dead_code)]
    pub refresh_expires_in: u64,
    #[serde(default)]
    #[allow(dead_code)]
    pub token_type: String,
}

/// Body of one follows page.
#[derive(Debug, Deserialize)]
pub(crate) struct FollowsPageBody {
    #[serde(default)]
    #[allow(dead_code)]
    pub result: String,
    pub data: Vec<MangaEntry>,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u64,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MangaEntry {
    pub id: String,
    pub attributes: MangaAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MangaAttributes {
    #[serde(default)]
    pub title: BTreeMap<String, String>,
    #[serde(default)]
    pub alt_titles: Vec<BTreeMap<String, String>>,
    /// Absent for entries with no external links at all; individual values
    /// may be explicit nulls.
    #[serde(default)]
    pub links: Option<BTreeMap<String, Option<String>>>,
    #[serde(default)]
    pub original_language: String,
}

impl MangaEntry {
    pub(crate) fn into_followed_title(self) -> FollowedTitle {
        FollowedTitle {
            id: self.id,
            title: self.attributes.title,
            alt_titles: self.attributes.alt_titles,
            links: self.attributes.links.unwrap_or_default(),
            original_language: self.attributes.original_language,
        }
    }
}

/// Body of the reading-list login endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginBody {
    #[serde(default)]
    #[allow(dead_code)]
    pub status: String,
    #[serde(default)]
    pub reason: String,
    pub context: Option<LoginContext>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginContext {
    pub session_token: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub uid: u64,
}

/// One reading list as returned by the lists endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ListData {
    pub list_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub custom: bool,
}

/// Body of the list-creation endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct CreateListBody {
    #[serde(default)]
    #[allow(dead_code)]
    pub status: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub reason: String,
    pub context: CreateListContext,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateListContext {
    pub id: u64,
}

/// Body of both bulk-add endpoints. `context` is present only for partial
/// outcomes.
#[derive(Debug, Deserialize)]
pub(crate) struct BulkAddBody {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub reason: String,
    pub context: Option<BulkAddContext>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkAddContext {
    #[serde(default)]
    pub errors: Vec<BulkAddError>,
}

/// One per-title failure inside a partial bulk-add response. By-title adds
/// report `series_name`, by-ID adds report `series_id`.
#[derive(Debug, Deserialize)]
pub(crate) struct BulkAddError {
    #[serde(default)]
    pub series_name: Option<String>,
    #[serde(default)]
    pub series_id: Option<u64>,
    #[serde(default)]
    pub error: String,
}

impl BulkAddError {
    pub(crate) fn describe(&self) -> String {
        match (&self.series_name, self.series_id) {
            (Some(name), _) => format!("\"{name}\" - {}", self.error),
            (None, Some(id)) => format!("ID: {id} - {}", self.error),
            (None, None) => self.error.clone(),
        }
    }
}
