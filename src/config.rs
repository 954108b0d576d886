// MIT License - Copyright (c) 2026 Peter Wright
// Engine configuration

use std::time::Duration;

use crate::error::{Result, SyncError};

/// Smallest allowed background refresh interval, in seconds.
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 5;

/// Host resolved by the connectivity gate.
pub const DEFAULT_API_HOST: &str = "mob.yalehomesystem.co.uk";

/// Configuration for the synchronization engine.
#[derive(Clone)]
pub struct SyncConfig {
    /// Accessory display name
    pub name: String,
    /// Yale Sync account username
    pub username: String,
    /// Yale Sync account password
    pub password: String,
    /// Whether the panel is polled in the background
    pub background_refresh: bool,
    /// Seconds between background polls (minimum 5 when background refresh is on)
    pub refresh_interval_secs: u64,
    /// Hostname resolved by the connectivity gate
    pub api_host: String,
    /// Upper bound on one connectivity lookup, in milliseconds
    pub lookup_timeout_ms: u64,
    /// Upper bound on one remote call, in milliseconds (0 = wait indefinitely)
    pub request_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            name: "Yale Sync Alarm".to_string(),
            username: String::new(),
            password: String::new(),
            background_refresh: true,
            refresh_interval_secs: MIN_REFRESH_INTERVAL_SECS,
            api_host: DEFAULT_API_HOST.to_string(),
            lookup_timeout_ms: 5000,
            request_timeout_ms: 30000,
        }
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("background_refresh", &self.background_refresh)
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .field("api_host", &self.api_host)
            .field("lookup_timeout_ms", &self.lookup_timeout_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl SyncConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Check required fields and limits. The first problem found is reported.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SyncError::ConfigInvalid("The name is required".into()));
        }
        if self.username.trim().is_empty() {
            return Err(SyncError::ConfigInvalid("The username is required".into()));
        }
        if self.password.trim().is_empty() {
            return Err(SyncError::ConfigInvalid("The password is required".into()));
        }
        if self.background_refresh && self.refresh_interval_secs < MIN_REFRESH_INTERVAL_SECS {
            return Err(SyncError::ConfigInvalid(
                "The refresh interval is required and must be at least 5 seconds".into(),
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

/// Builder for SyncConfig.
#[derive(Debug, Clone, Default)]
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    pub fn background_refresh(mut self, enabled: bool) -> Self {
        self.config.background_refresh = enabled;
        self
    }

    pub fn refresh_interval_secs(mut self, secs: u64) -> Self {
        self.config.refresh_interval_secs = secs;
        self
    }

    pub fn api_host(mut self, host: impl Into<String>) -> Self {
        self.config.api_host = host.into();
        self
    }

    pub fn lookup_timeout_ms(mut self, ms: u64) -> Self {
        self.config.lookup_timeout_ms = ms;
        self
    }

    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.request_timeout_ms = ms;
        self
    }

    pub fn build(self) -> SyncConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SyncConfigBuilder {
        SyncConfig::builder()
            .name("Alarm")
            .username("user@example.com")
            .password("secret")
    }

    fn invalid_reason(config: SyncConfig) -> String {
        match config.validate() {
            Err(SyncError::ConfigInvalid(reason)) => reason,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert!(config.background_refresh);
        assert_eq!(config.refresh_interval_secs, 5);
        assert_eq!(config.api_host, DEFAULT_API_HOST);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().build().validate().is_ok());
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(invalid_reason(valid().name("  ").build()), "The name is required");
        assert_eq!(invalid_reason(valid().username("").build()), "The username is required");
        assert_eq!(invalid_reason(valid().password(" ").build()), "The password is required");
    }

    #[test]
    fn test_refresh_interval_minimum() {
        assert_eq!(
            invalid_reason(valid().refresh_interval_secs(4).build()),
            "The refresh interval is required and must be at least 5 seconds"
        );
        assert_eq!(
            invalid_reason(valid().refresh_interval_secs(0).build()),
            "The refresh interval is required and must be at least 5 seconds"
        );
        assert!(valid().refresh_interval_secs(5).build().validate().is_ok());
    }

    #[test]
    fn test_interval_ignored_without_background_refresh() {
        let config = valid().background_refresh(false).refresh_interval_secs(0).build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_request_timeout_disabled() {
        let config = valid().request_timeout_ms(0).build();
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", valid().build());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
