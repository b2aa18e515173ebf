use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use futures::channel::mpsc;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use campus_locations::cache::{AccessPointCache, CacheError};
use campus_locations::config::{AppConfig, ConfigError};
use campus_locations::inspect::{RowDetails, SpatialJoinIndex, WingInspection};
use campus_locations::records::{self, AccessPointRecord, RecordError};

/// How long to wait for the access point snapshot to land in the cache.
const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("usage: campus-locations <resolve <mac> | inspect <wing> | wings | decode <text>>")]
    Usage,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid snapshot {}: {source}", path.display())]
    Snapshot { path: PathBuf, source: RecordError },

    #[error("access point snapshot was not applied within {0:?}")]
    SnapshotTimeout(Duration),

    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

enum Command {
    Resolve(String),
    Inspect(String),
    Wings,
    Decode(String),
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, CliError> {
        let command = args.next().ok_or(CliError::Usage)?;
        let rest: Vec<String> = args.collect();
        match (command.as_str(), rest.as_slice()) {
            ("resolve", [mac]) => Ok(Command::Resolve(mac.clone())),
            ("inspect", [wing]) => Ok(Command::Inspect(wing.clone())),
            ("wings", []) => Ok(Command::Wings),
            ("decode", words) if !words.is_empty() => Ok(Command::Decode(words.join(" "))),
            _ => Err(CliError::Usage),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectOutput {
    #[serde(flatten)]
    inspection: WingInspection,
    details: Vec<RowDetails>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), CliError> {
    let command = Command::parse(std::env::args().skip(1))?;

    // Configuration is optional; defaults cover the campus
    let config = match std::env::var_os("CAMPUS_CONFIG") {
        Some(path) => AppConfig::load(Path::new(&path))?,
        None => AppConfig::default(),
    };
    let decoder = config.decoder();

    if let Command::Decode(text) = &command {
        return print_json(&decoder.decode(Some(text)));
    }

    let cache = AccessPointCache::new(decoder.clone());
    match std::env::var_os("CAMPUS_ACCESS_POINTS") {
        Some(path) => load_access_points(&cache, PathBuf::from(path)).await?,
        None => warn!("CAMPUS_ACCESS_POINTS not set, no access points loaded"),
    }

    let rows = match std::env::var_os("CAMPUS_SITE_ROWS") {
        Some(path) => {
            let path = PathBuf::from(path);
            let contents = read(&path)?;
            records::parse_site_rows(&contents, &decoder)
                .map_err(|source| CliError::Snapshot { path, source })?
        }
        None => {
            warn!("CAMPUS_SITE_ROWS not set, no site rows loaded");
            Vec::new()
        }
    };
    let index = SpatialJoinIndex::new(rows, cache.clone());

    match command {
        Command::Resolve(mac) => print_json(&cache.resolve(Some(&mac))),
        Command::Wings => print_json(&index.wings()),
        Command::Inspect(wing) => {
            let inspection = index.inspect(&wing);
            if inspection.is_empty() {
                info!(wing = %wing, "no site rows for wing");
            }
            let details = inspection
                .rows
                .iter()
                .map(|row| index.row_details(row))
                .collect();
            print_json(&InspectOutput {
                inspection,
                details,
            })
        }
        Command::Decode(_) => Ok(()),
    }
}

/// Feed the access point file through a cache subscription and wait for the
/// rebuild. An unreadable file clears the cache like any upstream failure.
async fn load_access_points(cache: &AccessPointCache, path: PathBuf) -> Result<(), CliError> {
    let (tx, rx) = mpsc::unbounded::<Result<Vec<AccessPointRecord>, CliError>>();
    let mut revisions = cache.revisions();
    cache.subscribe(rx)?;

    let snapshot = read(&path).and_then(|contents| {
        records::parse_access_points(&contents)
            .map_err(|source| CliError::Snapshot { path, source })
    });
    if tx.unbounded_send(snapshot).is_err() {
        warn!("access point subscription closed before the snapshot was sent");
    }

    match tokio::time::timeout(SNAPSHOT_TIMEOUT, revisions.changed()).await {
        Ok(Ok(())) => {
            info!(entries = cache.snapshot().len(), "access points loaded");
            Ok(())
        }
        _ => Err(CliError::SnapshotTimeout(SNAPSHOT_TIMEOUT)),
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
