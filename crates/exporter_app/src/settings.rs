//! RON-backed settings persistence: a secrets file for credentials and a
//! config file for run parameters, loaded with defaults on any failure.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use engine_logging::{engine_error, engine_warn};
use exporter_core::{
    BufferingMode, Destination, ExportSelection, ImportMethod, LinkKind,
    DEFAULT_LOCALE_PREFERENCE,
};
use exporter_engine::AtomicFileWriter;
use serde::{Deserialize, Serialize};

const SECRETS_FILENAME: &str = "secrets.ron";
const CONFIG_FILENAME: &str = "config.ron";

/// Credentials for both remote services. The reading-list pair is
/// optional; without it that destination is skipped.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Secrets {
    pub catalog_username: String,
    pub catalog_password: String,
    pub catalog_client_id: String,
    pub catalog_client_secret: String,
    #[serde(default)]
    pub reading_list_username: Option<String>,
    #[serde(default)]
    pub reading_list_password: Option<String>,
}

impl Secrets {
    /// The four catalog fields are all required to start a run.
    pub fn catalog_complete(&self) -> bool {
        !self.catalog_username.is_empty()
            && !self.catalog_password.is_empty()
            && !self.catalog_client_id.is_empty()
            && !self.catalog_client_secret.is_empty()
    }
}

/// Run parameters as persisted on disk. Enum-valued fields are stored as
/// lower-case strings so hand-edited files stay forgiving; unknown values
/// are warned about and dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_destinations")]
    pub destinations: Vec<String>,
    #[serde(default = "default_links")]
    pub links: Vec<String>,
    #[serde(default = "default_locale_preference")]
    pub locale_preference: Vec<String>,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,
    #[serde(default)]
    pub initial_offset: u64,
    #[serde(default = "default_base_name")]
    pub base_name: String,
    #[serde(default = "default_buffering")]
    pub buffering: String,
    #[serde(default = "default_import_method")]
    pub import_method: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            destinations: default_destinations(),
            links: default_links(),
            locale_preference: default_locale_preference(),
            fetch_limit: default_fetch_limit(),
            initial_offset: 0,
            base_name: default_base_name(),
            buffering: default_buffering(),
            import_method: default_import_method(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_destinations() -> Vec<String> {
    vec!["text".to_string(), "csv".to_string()]
}

fn default_links() -> Vec<String> {
    LinkKind::ALL.iter().map(|kind| kind.key().to_string()).collect()
}

fn default_locale_preference() -> Vec<String> {
    DEFAULT_LOCALE_PREFERENCE
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_fetch_limit() -> u32 {
    100
}

fn default_base_name() -> String {
    "My_MangaDex_Follows".to_string()
}

fn default_buffering() -> String {
    "per_list".to_string()
}

fn default_import_method() -> String {
    "title".to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

impl Config {
    /// Builds the validated selection for one run. Unknown destination or
    /// link names are dropped with a warning; the fetch limit is forced
    /// into the API's 1 to 100 range.
    pub fn to_selection(&self) -> ExportSelection {
        let mut destinations = BTreeSet::new();
        for name in &self.destinations {
            match name.as_str() {
                "text" => {
                    destinations.insert(Destination::Text);
                }
                "csv" => {
                    destinations.insert(Destination::Csv);
                }
                "reading_list" => {
                    destinations.insert(Destination::ReadingList);
                }
                "third_party_import" => {
                    destinations.insert(Destination::ThirdPartyImport);
                }
                other => engine_warn!("Unknown destination {:?} in config; skipping", other),
            }
        }

        let mut links = BTreeSet::new();
        for key in &self.links {
            match LinkKind::from_key(key) {
                Some(kind) => {
                    links.insert(kind);
                }
                None => engine_warn!("Unknown link kind {:?} in config; skipping", key),
            }
        }

        let buffering = match self.buffering.as_str() {
            "per_title" => BufferingMode::PerTitle,
            "per_list" => BufferingMode::PerList,
            other => {
                engine_warn!("Unknown buffering mode {:?}; using per_list", other);
                BufferingMode::PerList
            }
        };

        let import_method = match self.import_method.as_str() {
            "title" => ImportMethod::Title,
            "id" => ImportMethod::Id,
            other => {
                engine_warn!("Unknown import method {:?}; using title", other);
                ImportMethod::Title
            }
        };

        ExportSelection {
            destinations,
            links,
            locale_preference: self.locale_preference.clone(),
            base_name: self.base_name.clone(),
            buffering,
            import_method,
        }
    }

    /// Fetch limit clamped into the API's documented 1 to 100 range.
    pub fn validated_fetch_limit(&self) -> u32 {
        if (1..=100).contains(&self.fetch_limit) {
            self.fetch_limit
        } else {
            engine_warn!(
                "Fetch limit {} outside 1..=100; using 100",
                self.fetch_limit
            );
            100
        }
    }
}

/// File-backed store for [`Secrets`] and [`Config`].
pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.dir.join(SECRETS_FILENAME)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILENAME)
    }

    /// Loads the secrets file. `None` when the file is missing or
    /// unparsable; credentials are never defaulted.
    pub fn load_secrets(&self) -> Option<Secrets> {
        let path = self.secrets_path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                engine_warn!("No secrets file at {:?}", path);
                return None;
            }
            Err(err) => {
                engine_error!("Failed to read secrets from {:?}: {}", path, err);
                return None;
            }
        };
        match ron::from_str(&content) {
            Ok(secrets) => Some(secrets),
            Err(err) => {
                engine_error!("Failed to parse secrets from {:?}: {}", path, err);
                None
            }
        }
    }

    /// Loads the config file, falling back to defaults with a warning.
    pub fn load_config(&self) -> Config {
        let path = self.config_path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Config::default();
            }
            Err(err) => {
                engine_warn!("Failed to read config from {:?}: {}", path, err);
                return Config::default();
            }
        };
        match ron::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                engine_warn!("Failed to parse config from {:?}: {}", path, err);
                Config::default()
            }
        }
    }

    pub fn save_secrets(&self, secrets: &Secrets) -> Result<(), String> {
        self.save(SECRETS_FILENAME, secrets)
    }

    pub fn save_config(&self, config: &Config) -> Result<(), String> {
        self.save(CONFIG_FILENAME, config)
    }

    fn save<T: Serialize>(&self, filename: &str, value: &T) -> Result<(), String> {
        let pretty = ron::ser::PrettyConfig::new();
        let content =
            ron::ser::to_string_pretty(value, pretty).map_err(|err| err.to_string())?;
        let writer = AtomicFileWriter::new(self.dir.clone());
        writer
            .write(filename, &content)
            .map(|_| ())
            .map_err(|err| err.to_string())
    }
}

/// Directory the exported files land in.
pub fn resolve_output_dir(config: &Config) -> PathBuf {
    Path::new(&config.output_dir).to_path_buf()
}
