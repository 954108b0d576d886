// MIT License - Copyright (c) 2026 Peter Wright
// Security-system accessory

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::cache::{CallCache, Lookup};
use crate::connectivity::ConnectivityGate;
use crate::error::{Result, ServiceUnavailable, SyncError};
use crate::event::{Characteristic, EventReceiver, EventSender, SyncEvent};
use crate::session::PanelSession;
use crate::state::{to_native, to_observed, ObservedState, PanelState};

/// Per-accessory record of the panel being tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelContext {
    /// Remote device identifier
    pub identifier: String,
    /// Accessory kind tag, always "panel" for now
    pub kind: String,
    /// Last state confirmed by the service
    pub state: PanelState,
}

impl PanelContext {
    pub fn new(identifier: impl Into<String>, kind: impl Into<String>, state: PanelState) -> Self {
        Self {
            identifier: identifier.into(),
            kind: kind.into(),
            state,
        }
    }
}

/// Static accessory information shown by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryInfo {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
}

impl AccessoryInfo {
    pub fn yale_keypad(name: impl Into<String>, serial_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            manufacturer: "Yale".to_string(),
            model: "Yale IA-320".to_string(),
            serial_number: serial_number.into(),
        }
    }
}

/// What a host needs from a security-system accessory.
///
/// Failures are deliberately opaque: hosts only learn that the service is
/// unavailable.
#[async_trait]
pub trait SecuritySystem: Send + Sync {
    async fn get_current_observed(&self) -> std::result::Result<ObservedState, ServiceUnavailable>;

    async fn get_target_observed(&self) -> std::result::Result<ObservedState, ServiceUnavailable>;

    /// Request a new state using a HomeKit target-state code.
    /// Returns the state the panel settled in.
    async fn set_target_observed(&self, code: u8) -> std::result::Result<ObservedState, ServiceUnavailable>;
}

struct SyncState {
    context: PanelContext,
    cache: CallCache,
    current: ObservedState,
    target: ObservedState,
}

/// A Yale panel exposed as a security system.
///
/// The mutex around the sync state is held for a whole read or write step,
/// remote call included, so at most one call per panel is ever in flight
/// and cache and context writes never interleave.
pub struct PanelAccessory {
    info: AccessoryInfo,
    session: PanelSession,
    gate: ConnectivityGate,
    state: Mutex<SyncState>,
    event_tx: EventSender,
}

impl PanelAccessory {
    pub fn new(
        info: AccessoryInfo,
        context: PanelContext,
        session: PanelSession,
        gate: ConnectivityGate,
        event_tx: EventSender,
    ) -> Self {
        let observed = to_observed(context.state);
        Self {
            info,
            session,
            gate,
            state: Mutex::new(SyncState {
                context,
                cache: CallCache::new(),
                current: observed,
                target: observed,
            }),
            event_tx,
        }
    }

    pub fn info(&self) -> &AccessoryInfo {
        &self.info
    }

    /// Subscribe to characteristic updates and poll notifications.
    pub fn subscribe(&self) -> EventReceiver {
        self.event_tx.subscribe()
    }

    pub(crate) fn events(&self) -> &EventSender {
        &self.event_tx
    }

    /// Snapshot of the panel context.
    pub async fn context(&self) -> PanelContext {
        self.state.lock().await.context.clone()
    }

    /// Last values pushed for (current, target).
    pub async fn characteristics(&self) -> (ObservedState, ObservedState) {
        let state = self.state.lock().await;
        (state.current, state.target)
    }

    /// Read path: connectivity gate, throttle, fetch, then align both
    /// characteristics on the result.
    ///
    /// Freshness is judged once the lock is held, so a caller that queued
    /// behind another step sees the value that step just stored.
    pub async fn refresh(&self) -> Result<Lookup> {
        let mut state = self.state.lock().await;

        if !self.gate.is_reachable().await {
            return Err(SyncError::unavailable(format!(
                "{} is not reachable",
                self.gate.host()
            )));
        }

        let lookup = match state.cache.fresh(Instant::now()) {
            Some(value) => {
                debug!("Using cached panel state {value}");
                Lookup {
                    value,
                    from_cache: true,
                }
            }
            None => {
                let native = self.session.fetch_state().await?;
                let value = to_observed(native);
                state.cache.store(Instant::now(), value);
                state.context.state = native;
                Lookup {
                    value,
                    from_cache: false,
                }
            }
        };

        state.current = lookup.value;
        state.target = lookup.value;
        self.publish(Characteristic::CurrentState, lookup.value);
        self.publish(Characteristic::TargetState, lookup.value);
        Ok(lookup)
    }

    /// Write path: translate, set remotely, and only then commit.
    ///
    /// The cache is stamped when the service confirms the set, not when
    /// the request was made.
    pub async fn apply_target(&self, code: u8) -> Result<ObservedState> {
        let native = to_native(code)?;
        let mut state = self.state.lock().await;
        info!("Setting Panel to: {native} ({code})");

        self.session.set_state(native).await?;

        let observed = to_observed(native);
        info!("Panel Changed from: {} to {}", state.context.state, native);
        state.context.state = native;
        state.cache.store(Instant::now(), observed);
        state.current = observed;
        state.target = observed;
        self.publish(Characteristic::CurrentState, observed);
        self.publish(Characteristic::TargetState, observed);
        Ok(observed)
    }

    fn publish(&self, characteristic: Characteristic, value: ObservedState) {
        // No subscribers is fine.
        let _ = self.event_tx.send(SyncEvent::CharacteristicUpdated {
            characteristic,
            value,
            at: Utc::now(),
        });
    }
}

#[async_trait]
impl SecuritySystem for PanelAccessory {
    async fn get_current_observed(&self) -> std::result::Result<ObservedState, ServiceUnavailable> {
        debug!("Getting current state of the alarm system");
        match self.refresh().await {
            Ok(lookup) => Ok(lookup.value),
            Err(e) => {
                warn!("Failed to get current state: {e}");
                Err(e.into())
            }
        }
    }

    async fn get_target_observed(&self) -> std::result::Result<ObservedState, ServiceUnavailable> {
        debug!("Getting target state of the alarm system");
        match self.refresh().await {
            Ok(lookup) => Ok(lookup.value),
            Err(e) => {
                warn!("Failed to get target state: {e}");
                Err(e.into())
            }
        }
    }

    async fn set_target_observed(&self, code: u8) -> std::result::Result<ObservedState, ServiceUnavailable> {
        match self.apply_target(code).await {
            Ok(observed) => Ok(observed),
            Err(e) => {
                error!("Failed to set panel state ({code}): {e}");
                Err(e.into())
            }
        }
    }
}
