// MIT License - Copyright (c) 2026 Peter Wright
//
//! # yale-sync-bridge
//!
//! Keeps a local view of a Yale Sync alarm panel consistent with the Yale
//! cloud service and exposes it as a HomeKit-style security system with
//! matching current and target states.
//!
//! Remote reads are gated by a DNS connectivity check and throttled to one
//! fetch per second; a background loop polls the panel and logs changes,
//! with a heartbeat at most every ten minutes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use yale_sync_bridge::{PanelState, SecuritySystem, SimulatedClient, SyncConfig, SyncEngine, NIGHT_ARM};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SyncConfig::builder()
//!         .name("Alarm")
//!         .username("user@example.com")
//!         .password("secret")
//!         .refresh_interval_secs(10)
//!         .build();
//!     let client = Arc::new(SimulatedClient::new(
//!         "00:11:22:33:44:55",
//!         PanelState::Disarmed,
//!         std::time::Duration::from_millis(200),
//!     ));
//!
//!     let mut engine = SyncEngine::connect(config, client).await?;
//!     engine.start_polling();
//!
//!     let accessory = engine.accessory();
//!     accessory.set_target_observed(NIGHT_ARM).await?;
//!     println!("Now {}", accessory.get_current_observed().await?);
//!
//!     engine.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod accessory;
pub mod cache;
pub mod client;
pub mod config;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod session;
pub mod state;

// Re-exports for convenience
pub use accessory::{AccessoryInfo, PanelAccessory, PanelContext, SecuritySystem};
pub use client::{AlarmClient, PanelInfo, SimulatedClient};
pub use config::{SyncConfig, SyncConfigBuilder};
pub use connectivity::{ConnectivityGate, ResolveError, Resolver, SystemResolver};
pub use engine::SyncEngine;
pub use error::{ClientError, Result, ServiceUnavailable, SyncError};
pub use event::{Characteristic, EventReceiver, SyncEvent};
pub use lifecycle::{LogDebounce, Notification, SyncLoop, TickOutcome};
pub use session::PanelSession;
pub use state::{ObservedState, PanelState, AWAY_ARM, DISARMED, NIGHT_ARM, STAY_ARM};
