// MIT License - Copyright (c) 2026 Peter Wright
// Engine startup and shutdown

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::accessory::{AccessoryInfo, PanelAccessory, PanelContext};
use crate::client::AlarmClient;
use crate::config::SyncConfig;
use crate::connectivity::ConnectivityGate;
use crate::error::{Result, SyncError};
use crate::event::{event_channel, EventReceiver, SyncEvent};
use crate::lifecycle::SyncLoop;
use crate::session::PanelSession;

/// A discovered panel plus its background poll loop.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use yale_sync_bridge::{PanelState, SimulatedClient, SyncConfig, SyncEngine};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = SyncConfig::builder()
///         .name("Alarm")
///         .username("user@example.com")
///         .password("secret")
///         .build();
///     let client = Arc::new(SimulatedClient::new(
///         "00:11:22:33:44:55",
///         PanelState::Disarmed,
///         std::time::Duration::from_millis(200),
///     ));
///
///     let mut engine = SyncEngine::connect(config, client).await?;
///     let mut events = engine.subscribe();
///     tokio::spawn(async move {
///         while let Ok(event) = events.recv().await {
///             println!("Event: {:?}", event);
///         }
///     });
///
///     engine.start_polling();
///     tokio::signal::ctrl_c().await?;
///     engine.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct SyncEngine {
    config: SyncConfig,
    accessory: Arc<PanelAccessory>,
    shutdown_tx: watch::Sender<bool>,
    loop_handle: Option<JoinHandle<Result<()>>>,
}

impl SyncEngine {
    /// Validate the config, check connectivity and discover the panel,
    /// probing the configured API host with the system resolver.
    pub async fn connect(config: SyncConfig, client: Arc<dyn AlarmClient>) -> Result<Self> {
        let gate = ConnectivityGate::new(config.api_host.clone(), config.lookup_timeout());
        Self::connect_with_gate(config, client, gate).await
    }

    pub async fn connect_with_gate(
        config: SyncConfig,
        client: Arc<dyn AlarmClient>,
        gate: ConnectivityGate,
    ) -> Result<Self> {
        if let Err(e) = config.validate() {
            error!("Error in config: {e}");
            return Err(e);
        }

        if !gate.is_reachable().await {
            error!("Error: Unable to reach Yale servers.");
            return Err(SyncError::unavailable(format!("{} is not reachable", gate.host())));
        }

        let session = PanelSession::new(client, config.request_timeout());
        let panel = session.discover().await?;

        let context = PanelContext::new(panel.identifier.clone(), "panel", panel.state);
        let info = AccessoryInfo::yale_keypad(config.name.clone(), panel.identifier);
        let (event_tx, _event_rx) = event_channel(256);
        let accessory = Arc::new(PanelAccessory::new(info, context, session, gate, event_tx));
        info!("Panel accessory ready: {}", accessory.info().name);

        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        Ok(Self {
            config,
            accessory,
            shutdown_tx,
            loop_handle: None,
        })
    }

    /// The accessory hosts read from and write to.
    pub fn accessory(&self) -> Arc<PanelAccessory> {
        Arc::clone(&self.accessory)
    }

    /// Subscribe to engine events.
    pub fn subscribe(&self) -> EventReceiver {
        self.accessory.subscribe()
    }

    /// Announce the discovered panel, then spawn the background poll loop.
    /// Calling it again is a no-op.
    pub fn start_polling(&mut self) {
        if self.loop_handle.is_some() {
            warn!("Lifecycle already running");
            return;
        }
        let _ = self.accessory.events().send(SyncEvent::PanelDiscovered {
            identifier: self.accessory.info().serial_number.clone(),
            at: Utc::now(),
        });
        let sync_loop = SyncLoop::new(Arc::clone(&self.accessory), &self.config);
        let shutdown_rx = self.shutdown_tx.subscribe();
        self.loop_handle = Some(tokio::spawn(sync_loop.run(shutdown_rx)));
    }

    /// Wait for the poll loop to end on its own.
    ///
    /// Returns immediately if it was never started.
    pub async fn wait(&mut self) -> Result<()> {
        let Some(handle) = self.loop_handle.as_mut() else {
            return Ok(());
        };
        let joined = handle.await;
        self.loop_handle = None;
        Self::flatten(joined)
    }

    /// Stop the poll loop at its next sleep and wait for it.
    pub async fn shutdown(mut self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        match self.loop_handle.take() {
            Some(handle) => Self::flatten(handle.await),
            None => Ok(()),
        }
    }

    fn flatten(joined: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
        match joined {
            Ok(result) => result,
            Err(e) => {
                warn!("Lifecycle task ended abnormally: {e}");
                Ok(())
            }
        }
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}
