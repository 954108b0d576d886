// MIT License - Copyright (c) 2026 Peter Wright
// Background polling

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::accessory::PanelAccessory;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::event::SyncEvent;
use crate::state::ObservedState;

/// An unchanged state is reported at most once per this window.
pub const HEARTBEAT_WINDOW: Duration = Duration::from_secs(10 * 60);

/// What a poll tick decided to tell the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Changed {
        previous: Option<ObservedState>,
        current: ObservedState,
    },
    Heartbeat(ObservedState),
}

/// Decides when a poll result is worth logging.
#[derive(Debug, Clone)]
pub struct LogDebounce {
    last_logged: Instant,
    last_value: Option<ObservedState>,
}

impl LogDebounce {
    pub fn new(now: Instant) -> Self {
        Self {
            last_logged: now,
            last_value: None,
        }
    }

    /// Feed one poll result. A change is reported immediately; an unchanged
    /// value only once the heartbeat window has passed.
    pub fn observe(&mut self, now: Instant, value: ObservedState) -> Option<Notification> {
        let changed = self.last_value != Some(value);
        let heartbeat_due = now.saturating_duration_since(self.last_logged) > HEARTBEAT_WINDOW;
        if !changed && !heartbeat_due {
            return None;
        }

        let notification = if changed {
            Notification::Changed {
                previous: self.last_value,
                current: value,
            }
        } else {
            Notification::Heartbeat(value)
        };
        self.last_logged = now;
        self.last_value = Some(value);
        Some(notification)
    }
}

/// Result of one poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub value: ObservedState,
    pub from_cache: bool,
    pub notification: Option<Notification>,
}

/// Periodically refreshes one accessory.
///
/// Any error ends the loop for good; restarting is left to whoever
/// supervises the process.
pub struct SyncLoop {
    accessory: Arc<PanelAccessory>,
    background_refresh: bool,
    interval: Duration,
    debounce: LogDebounce,
    ticks: u64,
}

impl SyncLoop {
    pub fn new(accessory: Arc<PanelAccessory>, config: &SyncConfig) -> Self {
        Self {
            accessory,
            background_refresh: config.background_refresh,
            interval: config.refresh_interval(),
            debounce: LogDebounce::new(Instant::now()),
            ticks: 0,
        }
    }

    /// Number of ticks started so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run a single poll step.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        self.ticks += 1;
        let lookup = self.accessory.refresh().await?;
        let now = Instant::now();
        if lookup.from_cache {
            debug!("Poll {} served from cache", self.ticks);
        }

        let notification = self.debounce.observe(now, lookup.value);
        match notification {
            Some(Notification::Changed { previous, current }) => {
                info!("Panel state has changed: {current}");
                let _ = self.accessory.events().send(SyncEvent::StateChanged {
                    previous,
                    current,
                    at: Utc::now(),
                });
            }
            Some(Notification::Heartbeat(state)) => {
                info!("Panel state unchanged: {state}");
                let _ = self.accessory.events().send(SyncEvent::Heartbeat {
                    state,
                    at: Utc::now(),
                });
            }
            None => {}
        }

        Ok(TickOutcome {
            value: lookup.value,
            from_cache: lookup.from_cache,
            notification,
        })
    }

    /// Poll until disabled, shut down, or failed.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        info!(
            "Starting Yale Sync Keypad lifecycle. Fetching data every {} seconds",
            self.interval.as_secs()
        );

        loop {
            if *shutdown_rx.borrow() {
                self.stopped("shutdown requested");
                return Ok(());
            }

            if let Err(e) = self.tick().await {
                error!("Error fetching Yale Sync Panel State: {e}");
                self.stopped(&e.to_string());
                return Err(e);
            }

            if !self.background_refresh {
                warn!("Background refresh is disabled. Exiting lifecycle");
                self.stopped("background refresh disabled");
                return Ok(());
            }

            tokio::select! {
                _ = sleep(self.interval) => {}
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Lifecycle shutting down");
                        self.stopped("shutdown requested");
                        return Ok(());
                    }
                }
            }
        }
    }

    fn stopped(&self, reason: &str) {
        debug!("Lifecycle stopped after {} ticks: {reason}", self.ticks);
        let _ = self.accessory.events().send(SyncEvent::LoopStopped {
            reason: reason.to_string(),
            at: Utc::now(),
        });
    }
}
