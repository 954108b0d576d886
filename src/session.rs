// MIT License - Copyright (c) 2026 Peter Wright
// Yale Sync session

use std::future::Future;
use std::sync::Arc;

use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::client::{AlarmClient, PanelInfo};
use crate::error::{ClientError, Result, SyncError};
use crate::state::PanelState;

/// Owns the handle to the remote service.
///
/// Holds no cached state; every call goes to the client. Failures are
/// returned as-is, with no retry.
#[derive(Clone)]
pub struct PanelSession {
    client: Arc<dyn AlarmClient>,
    request_timeout: Option<Duration>,
}

impl PanelSession {
    pub fn new(client: Arc<dyn AlarmClient>, request_timeout: Option<Duration>) -> Self {
        Self {
            client,
            request_timeout,
        }
    }

    /// Fetch the current panel state from the service.
    pub async fn fetch_state(&self) -> Result<PanelState> {
        let raw = self
            .call("getPanelState", self.client.get_panel_state())
            .await?;
        PanelState::from_name(&raw).ok_or_else(|| {
            warn!("Yale Sync returned an unknown panel state: {raw:?}");
            SyncError::UnrecognizedState { value: raw }
        })
    }

    /// Ask the service to move the panel to `state`.
    pub async fn set_state(&self, state: PanelState) -> Result<()> {
        debug!("Setting panel to {state}");
        self.call("setPanelState", self.client.set_panel_state(state))
            .await
    }

    /// Find the panel registered to the account.
    ///
    /// The panel listing is only populated once a state fetch has happened,
    /// so the state is fetched (and validated) first.
    pub async fn discover(&self) -> Result<PanelInfo> {
        info!("Fetching 'Yale Sync Alarm Panel' from your account");
        self.fetch_state().await?;
        match self.call("panel", self.client.panel()).await? {
            Some(panel) => {
                info!("Panel found in Yale Sync account: {}", panel.identifier);
                Ok(panel)
            }
            None => Err(SyncError::NoPanel),
        }
    }

    async fn call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = std::result::Result<T, ClientError>>,
    ) -> Result<T> {
        let outcome = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| SyncError::RequestTimeout { operation })?,
            None => fut.await,
        };
        outcome.map_err(|source| SyncError::Remote { operation, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedClient {
        raw: &'static str,
        panel: Option<PanelInfo>,
        fail_set: bool,
    }

    #[async_trait]
    impl AlarmClient for FixedClient {
        async fn get_panel_state(&self) -> std::result::Result<String, ClientError> {
            Ok(self.raw.to_string())
        }

        async fn panel(&self) -> std::result::Result<Option<PanelInfo>, ClientError> {
            Ok(self.panel.clone())
        }

        async fn set_panel_state(&self, _state: PanelState) -> std::result::Result<(), ClientError> {
            if self.fail_set {
                Err("HTTP 503".into())
            } else {
                Ok(())
            }
        }
    }

    struct StuckClient;

    #[async_trait]
    impl AlarmClient for StuckClient {
        async fn get_panel_state(&self) -> std::result::Result<String, ClientError> {
            std::future::pending().await
        }

        async fn panel(&self) -> std::result::Result<Option<PanelInfo>, ClientError> {
            Ok(None)
        }

        async fn set_panel_state(&self, _state: PanelState) -> std::result::Result<(), ClientError> {
            std::future::pending().await
        }
    }

    fn session(raw: &'static str, panel: Option<PanelInfo>, fail_set: bool) -> PanelSession {
        PanelSession::new(Arc::new(FixedClient { raw, panel, fail_set }), None)
    }

    #[tokio::test]
    async fn test_fetch_state_parses_wire_value() {
        assert_eq!(session("home", None, false).fetch_state().await.unwrap(), PanelState::Home);
    }

    #[tokio::test]
    async fn test_fetch_state_rejects_unknown_value() {
        match session("alarm", None, false).fetch_state().await {
            Err(SyncError::UnrecognizedState { value }) => assert_eq!(value, "alarm"),
            other => panic!("expected UnrecognizedState, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_set_state_failure_is_remote_error() {
        match session("armed", None, true).set_state(PanelState::Armed).await {
            Err(SyncError::Remote { operation, source }) => {
                assert_eq!(operation, "setPanelState");
                assert_eq!(source.to_string(), "HTTP 503");
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_discover_without_panel() {
        assert!(matches!(
            session("disarmed", None, false).discover().await,
            Err(SyncError::NoPanel)
        ));
    }

    #[tokio::test]
    async fn test_discover_returns_panel() {
        let info = PanelInfo {
            identifier: "AA:BB".into(),
            state: PanelState::Disarmed,
        };
        let found = session("disarmed", Some(info.clone()), false).discover().await.unwrap();
        assert_eq!(found, info);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_call_times_out() {
        let session = PanelSession::new(Arc::new(StuckClient), Some(Duration::from_secs(30)));
        assert!(matches!(
            session.fetch_state().await,
            Err(SyncError::RequestTimeout { operation: "getPanelState" })
        ));
    }
}
