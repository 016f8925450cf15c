//! bgv: command line front end for the verification engine.

mod shutdown;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bgv_protocol::HttpTransport;
use bgv_store::VerificationStore;
use bgv_store_lmdb::{LmdbEnvironment, LmdbVerificationStore};
use bgv_types::{CandidateId, EntryId, RegistryIdentifier, WorkHistoryEntry};
use bgv_utils::LogFormat;
use bgv_verification::{EngineConfig, EngineEvent, EngineMetrics, VerificationEngine};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::shutdown::TeardownGuard;

type Engine = VerificationEngine<HttpTransport, LmdbVerificationStore>;

#[derive(Parser)]
#[command(name = "bgv", about = "Employment background verification")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// flags and env vars override them.
    #[arg(long, env = "BGV_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the attempt log.
    #[arg(long, env = "BGV_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log filter, e.g. "info" or "debug,bgv_protocol=trace".
    #[arg(long, env = "BGV_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format: "human" or "json".
    #[arg(long, env = "BGV_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Provider API key, sent as `x-api-key`.
    #[arg(long, env = "BGV_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Write Prometheus metrics to this file when the command finishes.
    #[arg(long, env = "BGV_METRICS_OUT")]
    metrics_out: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify work-history entries listed in a JSON file.
    Verify {
        /// JSON array of work-history entries.
        #[arg(long)]
        entries: PathBuf,

        /// Only verify entries of this candidate.
        #[arg(long)]
        candidate: Option<String>,

        /// Stay up until scheduled retries have run (Ctrl-C to stop).
        #[arg(long)]
        wait: bool,
    },
    /// Look a candidate up in the national registry.
    Registry {
        #[arg(long)]
        candidate: String,

        #[command(flatten)]
        identifier: IdentifierArgs,

        /// Entries to reconcile against the result.
        #[arg(long)]
        entries: Option<PathBuf>,

        /// Query the provider even if a stored result exists.
        #[arg(long)]
        force: bool,
    },
    /// Print the stored attempt log of an entry.
    History {
        #[arg(long, required_unless_present = "registry", conflicts_with = "registry")]
        entry: Option<String>,

        /// Show the registry lookup log of this candidate instead.
        #[arg(long)]
        registry: Option<String>,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct IdentifierArgs {
    /// 12-digit universal account number.
    #[arg(long)]
    uan: Option<String>,

    /// 10-digit mobile number.
    #[arg(long)]
    mobile: Option<String>,

    /// 10-character PAN.
    #[arg(long)]
    pan: Option<String>,
}

impl IdentifierArgs {
    fn parse(&self) -> anyhow::Result<RegistryIdentifier> {
        let identifier = match (&self.uan, &self.mobile, &self.pan) {
            (Some(uan), _, _) => RegistryIdentifier::uan(uan)?,
            (_, Some(mobile), _) => RegistryIdentifier::mobile(mobile)?,
            (_, _, Some(pan)) => RegistryIdentifier::pan(pan)?,
            _ => anyhow::bail!("one of --uan, --mobile or --pan is required"),
        };
        Ok(identifier)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_warning) = load_config(&cli);
    bgv_utils::init_logging(config.log_format, &config.log_level);
    if let Some(warning) = config_warning {
        tracing::warn!("{warning}");
    }

    let metrics = Arc::new(EngineMetrics::new()?);
    match cli.command {
        Command::Verify {
            entries,
            candidate,
            wait,
        } => {
            let engine = open_engine(&config, &metrics)?;
            let ids = track_all(&engine, &entries)?;
            let summary = match candidate {
                Some(candidate) => engine.verify_candidate(&CandidateId::new(candidate)).await,
                None => engine.verify_all(&ids).await,
            };
            print_json(&summary)?;

            if wait {
                wait_for_retries(&engine, &ids).await;
                let settled: Vec<WorkHistoryEntry> =
                    ids.iter().filter_map(|id| engine.entry(id)).collect();
                print_json(&settled)?;
            }
            engine.teardown();
        }
        Command::Registry {
            candidate,
            identifier,
            entries,
            force,
        } => {
            let identifier = identifier.parse()?;
            let engine = open_engine(&config, &metrics)?;
            if let Some(entries) = entries {
                track_all(&engine, &entries)?;
            }
            let report = engine
                .verify_registry(&CandidateId::new(candidate), &identifier, force)
                .await?;
            print_json(&report)?;
            engine.teardown();
        }
        Command::History { entry, registry } => {
            let id = match (entry, registry) {
                (Some(entry), _) => EntryId::new(entry),
                (None, Some(candidate)) => EntryId::for_registry(&CandidateId::new(candidate)),
                (None, None) => anyhow::bail!("--entry or --registry is required"),
            };
            let env = open_environment(&config.data_dir)?;
            let attempts = env.verification_store().attempts(&id)?;
            print_json(&attempts)?;
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    if let Some(path) = &cli.metrics_out {
        std::fs::write(path, metrics.encode()?)
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
    }
    Ok(())
}

/// File config (or defaults) with flag and env overrides applied.
///
/// A config file that cannot be read is reported once logging is up and the
/// defaults are used.
fn load_config(cli: &Cli) -> (EngineConfig, Option<String>) {
    let (mut config, warning) = match &cli.config {
        Some(path) => match EngineConfig::from_toml_file(path) {
            Ok(config) => (config, None),
            Err(e) => (
                EngineConfig::default(),
                Some(format!("{e}, using defaults")),
            ),
        },
        None => (EngineConfig::default(), None),
    };

    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(key) = &cli.api_key {
        config.provider.api_key = Some(key.clone());
    }
    (config, warning)
}

fn open_environment(data_dir: &Path) -> anyhow::Result<LmdbEnvironment> {
    LmdbEnvironment::open_default(data_dir)
        .with_context(|| format!("failed to open data directory {}", data_dir.display()))
}

fn open_engine(config: &EngineConfig, metrics: &Arc<EngineMetrics>) -> anyhow::Result<Arc<Engine>> {
    let env = open_environment(&config.data_dir)?;
    let transport = HttpTransport::new(&config.provider)?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        employment = %config.provider.employment_base_url,
        registry = %config.provider.registry_base_url,
        max_attempts = config.engine.max_attempts,
        "verification engine starting"
    );
    Ok(VerificationEngine::builder(transport, env.verification_store())
        .params(config.engine.clone())
        .metrics(Arc::clone(metrics))
        .build())
}

/// Track every entry in `path`, returning the ids that were accepted.
fn track_all(engine: &Engine, path: &Path) -> anyhow::Result<Vec<EntryId>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let entries: Vec<WorkHistoryEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of entries", path.display()))?;

    let mut ids = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = entry.id.clone();
        match engine.track(entry) {
            Ok(()) => ids.push(id),
            Err(e) => tracing::warn!(entry = %id, error = %e, "entry not tracked"),
        }
    }
    tracing::info!(tracked = ids.len(), "entries loaded");
    Ok(ids)
}

/// Block until no retry is armed or running, or until a shutdown signal.
async fn wait_for_retries(engine: &Arc<Engine>, ids: &[EntryId]) {
    let busy = || {
        !engine.is_torn_down()
            && (engine.pending_retries() > 0 || ids.iter().any(|id| engine.is_in_flight(id)))
    };
    if !busy() {
        return;
    }

    let _teardown = TeardownGuard::on_signal(Arc::clone(engine));
    let mut events = engine.subscribe();

    tracing::info!(pending = engine.pending_retries(), "waiting for scheduled retries");
    while busy() {
        tokio::select! {
            event = events.recv() => {
                if let Ok(EngineEvent::Settled { entry, status, .. }) = event {
                    tracing::info!(%entry, %status, "entry settled");
                }
            }
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
