// MIT License - Copyright (c) 2026 Peter Wright
// Remote alarm client

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::error::ClientError;
use crate::state::PanelState;

/// A panel as listed in the Yale Sync account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelInfo {
    /// Stable device identifier, usually the panel's MAC address
    pub identifier: String,
    pub state: PanelState,
}

/// The remote Yale Sync service, as far as this engine needs it.
///
/// Implementations own authentication and transport. Every method is a
/// single attempt; retrying is the caller's business.
#[async_trait]
pub trait AlarmClient: Send + Sync {
    /// Fetch the panel state as the service's raw wire value.
    async fn get_panel_state(&self) -> Result<String, ClientError>;

    /// The panel registered to the account, if any.
    async fn panel(&self) -> Result<Option<PanelInfo>, ClientError>;

    async fn set_panel_state(&self, state: PanelState) -> Result<(), ClientError>;
}

/// In-memory stand-in for the Yale Sync service.
///
/// Behaves like the real service for a settled panel: reads return the last
/// state that was set, after a fixed latency.
pub struct SimulatedClient {
    identifier: String,
    state: Mutex<PanelState>,
    latency: Duration,
    fetches: AtomicUsize,
    sets: AtomicUsize,
}

impl SimulatedClient {
    pub fn new(identifier: impl Into<String>, initial: PanelState, latency: Duration) -> Self {
        Self {
            identifier: identifier.into(),
            state: Mutex::new(initial),
            latency,
            fetches: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
        }
    }

    /// Number of `get_panel_state` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Change the panel state out-of-band, as a keypad user would.
    pub async fn press_keypad(&self, state: PanelState) {
        *self.state.lock().await = state;
    }
}

#[async_trait]
impl AlarmClient for SimulatedClient {
    async fn get_panel_state(&self) -> Result<String, ClientError> {
        sleep(self.latency).await;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let state = *self.state.lock().await;
        debug!("Simulated panel reports {state}");
        Ok(state.as_str().to_string())
    }

    async fn panel(&self) -> Result<Option<PanelInfo>, ClientError> {
        let state = *self.state.lock().await;
        Ok(Some(PanelInfo {
            identifier: self.identifier.clone(),
            state,
        }))
    }

    async fn set_panel_state(&self, state: PanelState) -> Result<(), ClientError> {
        sleep(self.latency).await;
        self.sets.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().await = state;
        debug!("Simulated panel set to {state}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_simulated_client_roundtrip() {
        let client = SimulatedClient::new("00:11:22:33:44:55", PanelState::Disarmed, Duration::from_secs(2));
        assert_eq!(client.get_panel_state().await.unwrap(), "disarmed");

        client.set_panel_state(PanelState::Armed).await.unwrap();
        assert_eq!(client.get_panel_state().await.unwrap(), "armed");
        assert_eq!(client.fetch_count(), 2);
        assert_eq!(client.set_count(), 1);

        let info = client.panel().await.unwrap().unwrap();
        assert_eq!(info.identifier, "00:11:22:33:44:55");
        assert_eq!(info.state, PanelState::Armed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keypad_change_is_visible() {
        let client = SimulatedClient::new("panel", PanelState::Armed, Duration::ZERO);
        client.press_keypad(PanelState::Home).await;
        assert_eq!(client.get_panel_state().await.unwrap(), "home");
        assert_eq!(client.set_count(), 0);
    }
}
