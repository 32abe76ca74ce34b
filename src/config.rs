use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{HardcourtError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP/WebSocket listen port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL. Without one the service keeps state in memory.
    #[serde(default)]
    pub url: Option<String>,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Run embedded migrations on startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            run_migrations: true,
        }
    }
}

/// Real-data fetch path
#[derive(Debug, Clone, Deserialize)]
pub struct LiveConfig {
    /// Seconds between periodic fetches of live matches
    #[serde(default = "default_fetch_interval")]
    pub fetch_interval_secs: u64,
    /// Minimum spacing between provider requests in milliseconds
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    /// Capacity of the producer -> bridge queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Run the simulator when no real live matches are available
    #[serde(default)]
    pub enable_simulator: bool,
}

fn default_fetch_interval() -> u64 {
    30
}

fn default_rate_limit_ms() -> u64 {
    2000
}

fn default_queue_capacity() -> usize {
    100
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            fetch_interval_secs: default_fetch_interval(),
            rate_limit_ms: default_rate_limit_ms(),
            queue_capacity: default_queue_capacity(),
            enable_simulator: false,
        }
    }
}

impl LiveConfig {
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_secs)
    }

    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Milliseconds between simulation ticks
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Fixed RNG seed; entropy-seeded when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Sets needed to win a match (2 = best of three)
    #[serde(default = "default_sets_to_win")]
    pub sets_to_win: u8,
    /// Chance that a point winner is credited with an ace
    #[serde(default = "default_ace_probability")]
    pub ace_probability: f64,
    /// Upper bound for the simulated rally length
    #[serde(default = "default_max_rally")]
    pub max_rally: u32,
    /// Message bus topic for simulated updates
    #[serde(default = "default_topic")]
    pub topic: String,
}

fn default_tick_ms() -> u64 {
    2000
}

fn default_sets_to_win() -> u8 {
    2
}

fn default_ace_probability() -> f64 {
    0.1
}

fn default_max_rally() -> u32 {
    15
}

fn default_topic() -> String {
    "live_scores".to_string()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            seed: None,
            sets_to_win: default_sets_to_win(),
            ace_probability: default_ace_probability(),
            max_rally: default_max_rally(),
            topic: default_topic(),
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between scrape cycles
    #[serde(default = "default_scheduler_interval")]
    pub interval_secs: u64,
    /// How much earlier than the interval a cycle is cut off
    #[serde(default = "default_timeout_margin")]
    pub timeout_margin_secs: u64,
}

fn default_scheduler_interval() -> u64 {
    60
}

fn default_timeout_margin() -> u64 {
    5
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_scheduler_interval(),
            timeout_margin_secs: default_timeout_margin(),
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Per-cycle timeout: interval minus the margin, or 90% of the interval
    /// when the margin does not fit.
    pub fn cycle_timeout(&self) -> Duration {
        cycle_timeout(self.interval(), Duration::from_secs(self.timeout_margin_secs))
    }
}

/// Cycle timeout slightly shorter than `interval`
pub fn cycle_timeout(interval: Duration, margin: Duration) -> Duration {
    if margin < interval && !margin.is_zero() {
        interval - margin
    } else {
        interval.mul_f64(0.9)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Outbound queue size per subscriber
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
    /// Queue size for register/unregister/broadcast commands
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

fn default_subscriber_buffer() -> usize {
    256
}

fn default_command_buffer() -> usize {
    256
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: default_subscriber_buffer(),
            command_buffer: default_command_buffer(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the live events API
    #[serde(default = "default_provider_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_provider_url() -> String {
    "https://api.sofascore.com/api/v1".to_string()
}

fn default_provider_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_url(),
            timeout_secs: default_provider_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            live: LiveConfig::default(),
            simulation: SimulationConfig::default(),
            scheduler: SchedulerConfig::default(),
            hub: HubConfig::default(),
            provider: ProviderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> std::result::Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("live.enable_simulator", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("HARDCOURT_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (HARDCOURT_LIVE__ENABLE_SIMULATOR, etc.)
            .add_source(
                Environment::with_prefix("HARDCOURT")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Reject settings that would stall a timer or break the scoring rules
    pub fn validate(&self) -> Result<()> {
        if self.live.fetch_interval_secs == 0 {
            return Err(HardcourtError::InvalidConfig(
                "live.fetch_interval_secs must be > 0".into(),
            ));
        }
        if self.simulation.tick_ms == 0 {
            return Err(HardcourtError::InvalidConfig(
                "simulation.tick_ms must be > 0".into(),
            ));
        }
        if self.scheduler.interval_secs == 0 {
            return Err(HardcourtError::InvalidConfig(
                "scheduler.interval_secs must be > 0".into(),
            ));
        }
        if self.simulation.sets_to_win == 0 {
            return Err(HardcourtError::InvalidConfig(
                "simulation.sets_to_win must be >= 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.simulation.ace_probability) {
            return Err(HardcourtError::InvalidConfig(
                "simulation.ace_probability must be within [0, 1]".into(),
            ));
        }
        if self.live.queue_capacity == 0 || self.hub.subscriber_buffer == 0 {
            return Err(HardcourtError::InvalidConfig(
                "queue capacities must be > 0".into(),
            ));
        }
        Ok(())
    }
}
