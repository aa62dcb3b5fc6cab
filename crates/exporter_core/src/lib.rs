//! Exporter core: pure title, selection, and session-state logic.
mod effect;
mod event;
mod links;
mod msg;
mod normalize;
mod selection;
mod state;
mod stats;
mod title;
mod update;

pub use effect::Effect;
pub use event::{LogEvent, Severity};
pub use links::{normalize_page_ref, LinkKind};
pub use msg::Msg;
pub use normalize::{normalize_title, DEFAULT_LOCALE_PREFERENCE, ORIGINAL_LANGUAGE_TOKEN};
pub use selection::{BufferingMode, Destination, ExportSelection, ImportMethod};
pub use state::{AppState, SessionState};
pub use stats::{ExportStats, FetchStats, NullLinkCounters};
pub use title::{FollowedTitle, LocaleMap, NormalizedTitle};
pub use update::update;
