//! Session configuration.

use std::time::Duration;

use crate::core::{
    ConfigError, DEFAULT_EVENT_CAPACITY, DEFAULT_HOST, DEFAULT_INBOUND_CAPACITY, DEFAULT_PORT,
    DEFAULT_RECONNECT_INTERVAL, DEFAULT_WAITING_RETRY_INTERVAL, ENV_EVENT_CAPACITY, ENV_HOST,
    ENV_MIN_LEVEL, ENV_PORT,
};
use crate::message::Level;
use crate::transport::ConnectionOptions;

/// Client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Companion host.
    pub host: String,

    /// Companion port.
    pub port: u16,

    /// Event Bus capacity.
    pub event_capacity: usize,

    /// Bound on buffered outbound records while disconnected. `None` keeps
    /// every record.
    pub outbound_limit: Option<usize>,

    /// Delay before reconnecting after a disconnect. `None` disables
    /// reconnecting.
    pub reconnect_interval: Option<Duration>,

    /// Delay between connect retries while the network is unavailable.
    pub waiting_retry_interval: Duration,

    /// Events below this level are discarded at the call site.
    pub min_level: Level,

    /// Capacity of the decoded inbound message channel.
    pub inbound_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            outbound_limit: None,
            reconnect_interval: Some(DEFAULT_RECONNECT_INTERVAL),
            waiting_retry_interval: DEFAULT_WAITING_RETRY_INTERVAL,
            min_level: Level::Trace,
            inbound_capacity: DEFAULT_INBOUND_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Defaults overlaid with `TAILBEAT_HOST`, `TAILBEAT_PORT`,
    /// `TAILBEAT_EVENT_CAPACITY` and `TAILBEAT_MIN_LEVEL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(ENV_HOST) {
            config.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            config.port = parse_var(ENV_PORT, &port)?;
        }
        if let Some(capacity) = lookup(ENV_EVENT_CAPACITY) {
            config.event_capacity = parse_var(ENV_EVENT_CAPACITY, &capacity)?;
        }
        if let Some(level) = lookup(ENV_MIN_LEVEL) {
            config.min_level = parse_var(ENV_MIN_LEVEL, &level)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Companion address as `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check values no component can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_capacity == 0 || self.inbound_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "host",
                value: self.host.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            inbound_capacity: self.inbound_capacity,
            outbound_limit: self.outbound_limit,
            waiting_retry_interval: self.waiting_retry_interval,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_owned(),
    })
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a builder holding the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the companion host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the companion port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the Event Bus capacity.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Bound the outbound buffer (drop-oldest).
    pub fn outbound_limit(mut self, limit: Option<usize>) -> Self {
        self.config.outbound_limit = limit;
        self
    }

    /// Set or disable the reconnect delay.
    pub fn reconnect_interval(mut self, interval: Option<Duration>) -> Self {
        self.config.reconnect_interval = interval;
        self
    }

    /// Set the retry delay used while the network is unavailable.
    pub fn waiting_retry_interval(mut self, interval: Duration) -> Self {
        self.config.waiting_retry_interval = interval;
        self
    }

    /// Set the minimum level kept by the logger.
    pub fn min_level(mut self, level: Level) -> Self {
        self.config.min_level = level;
        self
    }

    /// Set the inbound channel capacity.
    pub fn inbound_capacity(mut self, capacity: usize) -> Self {
        self.config.inbound_capacity = capacity;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
