// MIT License - Copyright (c) 2026 Peter Wright
// Engine events

use chrono::{DateTime, Utc};

use crate::state::ObservedState;

/// Which of the two security-system characteristics an update refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Characteristic {
    CurrentState,
    TargetState,
}

/// All events that can be emitted by the engine.
///
/// Hosts subscribe via `accessory.subscribe()` to receive a
/// `tokio::sync::broadcast::Receiver<SyncEvent>` and push the
/// characteristic updates on to their own clients.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Panel found in the account, accessory ready
    PanelDiscovered { identifier: String, at: DateTime<Utc> },
    /// A characteristic was given a (possibly unchanged) value
    CharacteristicUpdated {
        characteristic: Characteristic,
        value: ObservedState,
        at: DateTime<Utc>,
    },
    /// Background poll saw a different state than last time
    StateChanged {
        previous: Option<ObservedState>,
        current: ObservedState,
        at: DateTime<Utc>,
    },
    /// Background poll reporting an unchanged state after the debounce window
    Heartbeat { state: ObservedState, at: DateTime<Utc> },
    /// Background polling ended for good
    LoopStopped { reason: String, at: DateTime<Utc> },
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<SyncEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<SyncEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}
