//! Headless caller for the exporter engine: loads settings, starts one
//! export run, and mirrors the run's ordered event stream into the
//! colorized log output.

mod settings;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_info, engine_warn, LogDestination};
use exporter_core::{update, AppState, Effect, LogEvent, Msg, Severity};
use exporter_engine::{
    CatalogSettings, Credentials, ExporterHandle, PaginationSettings, ReadingListCredentials,
    ReadingListSettings, RunConfig, RunEvent,
};

use crate::settings::{resolve_output_dir, Secrets, SettingsStore};

fn main() {
    engine_logging::initialize(LogDestination::Both);
    engine_info!("Exporter session started at {}", chrono::Local::now().to_rfc3339());

    let settings_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let store = SettingsStore::in_dir(&settings_dir);

    let Some(secrets) = store.load_secrets() else {
        engine_error!(
            "No usable secrets file; create {:?} first",
            store.secrets_path()
        );
        std::process::exit(1);
    };
    if !secrets.catalog_complete() {
        engine_error!("Catalog credentials are incomplete; aborting");
        std::process::exit(1);
    }
    let config = store.load_config();

    let run_config = build_run_config(&secrets, &config);
    let handle = ExporterHandle::new();

    let mut state = AppState::new();
    let (next, effects) = update(state, Msg::RunRequested);
    state = next;
    for effect in effects {
        match effect {
            Effect::StartRun => handle.start_run(run_config.clone()),
            Effect::RejectAlreadyRunning => {
                engine_warn!("An export run is already active");
            }
        }
    }

    let success = drain_events(&handle);
    let (next, _) = update(state, Msg::RunCompleted);
    engine_info!("Runs completed this session: {}", next.runs_completed());

    if !success {
        std::process::exit(1);
    }
}

fn build_run_config(secrets: &Secrets, config: &settings::Config) -> RunConfig {
    let reading_list_credentials = match (
        secrets.reading_list_username.clone(),
        secrets.reading_list_password.clone(),
    ) {
        (Some(username), Some(password)) => Some(ReadingListCredentials { username, password }),
        _ => None,
    };

    RunConfig {
        catalog_credentials: Credentials {
            username: secrets.catalog_username.clone(),
            password: secrets.catalog_password.clone(),
            client_id: secrets.catalog_client_id.clone(),
            client_secret: secrets.catalog_client_secret.clone(),
        },
        reading_list_credentials,
        selection: config.to_selection(),
        output_dir: resolve_output_dir(config),
        pagination: PaginationSettings {
            limit: config.validated_fetch_limit(),
            initial_offset: config.initial_offset,
            ..PaginationSettings::default()
        },
        catalog: CatalogSettings::default(),
        reading_list: ReadingListSettings::default(),
    }
}

/// Polls the event channel until the terminal event arrives, forwarding
/// every log event in emission order.
fn drain_events(handle: &ExporterHandle) -> bool {
    loop {
        match handle.try_recv() {
            Some(RunEvent::Log(event)) => emit(event),
            Some(RunEvent::Finished {
                success,
                fetch_stats,
            }) => {
                if let Some(stats) = fetch_stats {
                    engine_info!(
                        "Fetch finished with {} items over {} API calls",
                        stats.items_received,
                        stats.api_calls
                    );
                }
                return success;
            }
            None => thread::sleep(Duration::from_millis(20)),
        }
    }
}

fn emit(event: LogEvent) {
    match event.severity {
        Severity::Info => engine_info!("{}", event.message),
        Severity::Warn => engine_warn!("{}", event.message),
        Severity::Error => engine_error!("{}", event.message),
    }
}
