//! Configuration data model

use std::time::Duration;

/// Default host the TouchFree service listens on
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";

/// Default WebSocket port of the TouchFree service
pub const DEFAULT_PORT: u16 = 9739;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub global: GlobalConfig,
    pub service: ServiceConfig,
    pub timing: TimingConfig,
    pub analytics: AnalyticsConfig,
}

/// Global settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// Where the TouchFree service can be reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub address: String,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServiceConfig {
    /// WebSocket URL for this address, e.g. `ws://127.0.0.1:9739`
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.address, self.port)
    }
}

/// Scheduling parameters of the protocol engine
///
/// The receiver tick drains at most one message per receiver; the sweep
/// removes callbacks whose response never arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingConfig {
    /// Receiver tick rate in Hz
    pub tick_rate: u32,
    /// How often pending callbacks are checked for expiry
    pub callback_sweep_interval: Duration,
    /// Age after which a pending callback is dropped
    pub callback_timeout: Duration,
    /// Expiry for license add/remove requests, which the service may take a while to answer
    pub license_change_timeout: Duration,
    /// Number of queued input actions retained when culling movement
    pub input_action_cull_to: usize,
    /// Minimum spacing between forwarded hand-render frames
    pub hand_data_min_interval: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            callback_sweep_interval: Duration::from_millis(300),
            callback_timeout: Duration::from_millis(500),
            license_change_timeout: Duration::from_secs(30),
            input_action_cull_to: 2,
            hand_data_min_interval: Duration::from_millis(50),
        }
    }
}

impl TimingConfig {
    /// Period of the receiver tick
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate.max(1)))
    }
}

/// Analytics session settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsConfig {
    /// Application name used as the session ID prefix
    pub application_name: String,
    /// How often accumulated event counts are sent while a session is active
    pub heartbeat_interval: Duration,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            application_name: "touchfree-client".to_string(),
            heartbeat_interval: Duration::from_secs(2),
        }
    }
}
