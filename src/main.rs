// MIT License - Copyright (c) 2026 Peter Wright
// Yale Sync bridge

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use yale_sync_bridge::{PanelState, SimulatedClient, SyncConfig, SyncEngine, SyncEvent};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "yale-sync-bridge")]
#[command(about = "Keep a Yale Sync alarm panel in step with its security-system accessory")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    yale: YaleToml,
    #[serde(default)]
    simulation: SimulationToml,
}

#[derive(Debug, Deserialize)]
struct YaleToml {
    #[serde(default = "default_name")]
    name: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default = "default_background_refresh")]
    background_refresh: bool,
    #[serde(default = "default_refresh_interval")]
    refresh_interval: u64,
    #[serde(default = "default_api_host")]
    api_host: String,
    #[serde(default = "default_lookup_timeout")]
    lookup_timeout_ms: u64,
    #[serde(default = "default_request_timeout")]
    request_timeout_ms: u64,
}

fn default_name() -> String {
    "Yale Sync Alarm".to_string()
}
fn default_background_refresh() -> bool {
    true
}
fn default_refresh_interval() -> u64 {
    5
}
fn default_api_host() -> String {
    yale_sync_bridge::config::DEFAULT_API_HOST.to_string()
}
fn default_lookup_timeout() -> u64 {
    5000
}
fn default_request_timeout() -> u64 {
    30000
}

#[derive(Debug, Deserialize)]
struct SimulationToml {
    #[serde(default = "default_identifier")]
    identifier: String,
    #[serde(default = "default_initial_state")]
    initial_state: String,
    #[serde(default = "default_latency")]
    latency_ms: u64,
}

impl Default for SimulationToml {
    fn default() -> Self {
        Self {
            identifier: default_identifier(),
            initial_state: default_initial_state(),
            latency_ms: default_latency(),
        }
    }
}

fn default_identifier() -> String {
    "00:00:00:00:00:00".to_string()
}
fn default_initial_state() -> String {
    "disarmed".to_string()
}
fn default_latency() -> u64 {
    500
}

fn build_sync_config(toml: &YaleToml) -> SyncConfig {
    SyncConfig::builder()
        .name(&toml.name)
        .username(&toml.username)
        .password(&toml.password)
        .background_refresh(toml.background_refresh)
        .refresh_interval_secs(toml.refresh_interval)
        .api_host(&toml.api_host)
        .lookup_timeout_ms(toml.lookup_timeout_ms)
        .request_timeout_ms(toml.request_timeout_ms)
        .build()
}

fn build_client(toml: &SimulationToml) -> Result<SimulatedClient> {
    let initial = PanelState::from_name(&toml.initial_state)
        .with_context(|| format!("Unknown panel state: {}", toml.initial_state))?;
    Ok(SimulatedClient::new(
        toml.identifier.clone(),
        initial,
        Duration::from_millis(toml.latency_ms),
    ))
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

fn log_event(event: &SyncEvent) {
    match event {
        SyncEvent::PanelDiscovered { identifier, at } => {
            info!("[{at}] Panel discovered: {identifier}")
        }
        SyncEvent::CharacteristicUpdated {
            characteristic,
            value,
            ..
        } => debug!("{characteristic:?} -> {value}"),
        SyncEvent::StateChanged {
            previous, current, at,
        } => match previous {
            Some(previous) => info!("[{at}] Panel state {previous} -> {current}"),
            None => info!("[{at}] Panel state is {current}"),
        },
        SyncEvent::Heartbeat { state, at } => info!("[{at}] Panel still {state}"),
        SyncEvent::LoopStopped { reason, at } => warn!("[{at}] Polling stopped: {reason}"),
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=yale_sync_bridge=trace).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();

    let config_text =
        std::fs::read_to_string(&cli.config).context("Failed to read config file")?;
    let config: Config = toml::from_str(&config_text).context("Failed to parse config file")?;

    let sync_config = build_sync_config(&config.yale);
    let client = Arc::new(build_client(&config.simulation)?);

    let mut engine = SyncEngine::connect(sync_config, client)
        .await
        .context("Failed to start Yale Sync engine")?;

    let mut events = engine.subscribe();
    let event_handle = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Event receiver lagged, missed {n} events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    engine.start_polling();

    let mut sigterm = signal(SignalKind::terminate())?;
    info!("Yale Sync bridge running. Send SIGINT/SIGTERM to stop.");
    let finished = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
            None
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
            None
        }
        result = engine.wait() => Some(result),
    };

    let outcome = match finished {
        Some(result) => result,
        None => engine.shutdown().await,
    };
    event_handle.abort();

    if let Err(e) = outcome {
        error!("Yale Sync bridge stopped: {e}");
        return Err(e.into());
    }

    info!("Shutdown complete");
    Ok(())
}
