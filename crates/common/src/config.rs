//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Billing and lockout policy.
    #[serde(default)]
    pub membership: MembershipConfig,
    /// Initial seat map.
    #[serde(default)]
    pub seats: SeatLayoutConfig,
    /// Notification emitter configuration.
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Periodic lockout sweep configuration.
    #[serde(default)]
    pub sweep: SweepConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL (`postgres://…` or `sqlite://…`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Upper bound on waiting for a pooled connection, in seconds.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

/// Billing and lockout policy.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct MembershipConfig {
    /// Days a fee payment covers.
    #[serde(default = "default_billing_cycle_days")]
    pub billing_cycle_days: i64,
    /// Fixed grace days after the due date before lockout.
    #[serde(default = "default_grace_days")]
    pub grace_days: i64,
}

/// Initial seat map, created when the seat table is empty.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SeatLayoutConfig {
    /// Label prefix; seats are labelled `{prefix}-{n}`.
    #[serde(default = "default_seat_prefix")]
    pub prefix: String,
    /// Number of seats.
    #[serde(default = "default_seat_count")]
    pub count: u32,
    /// Every n-th seat has a locker (0 disables lockers).
    #[serde(default = "default_locker_every")]
    pub locker_every: u32,
}

/// Notification emitter configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NotificationConfig {
    /// Skip inserting a message already recorded for the same member and date.
    #[serde(default = "default_true")]
    pub deduplicate: bool,
}

/// Periodic lockout sweep configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SweepConfig {
    /// Whether the server runs the sweep at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,
}

/// Log output configuration.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    1
}

const fn default_acquire_timeout_secs() -> u64 {
    10
}

const fn default_billing_cycle_days() -> i64 {
    30
}

const fn default_grace_days() -> i64 {
    5
}

fn default_seat_prefix() -> String {
    "A".to_string()
}

const fn default_seat_count() -> u32 {
    100
}

const fn default_locker_every() -> u32 {
    5
}

const fn default_sweep_interval_secs() -> u64 {
    3600
}

const fn default_true() -> bool {
    true
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            billing_cycle_days: default_billing_cycle_days(),
            grace_days: default_grace_days(),
        }
    }
}

impl Default for SeatLayoutConfig {
    fn default() -> Self {
        Self {
            prefix: default_seat_prefix(),
            count: default_seat_count(),
            locker_every: default_locker_every(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            deduplicate: true,
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `STUDYHALL_ENV`)
    /// 4. Environment variables with `STUDYHALL_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("STUDYHALL_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("STUDYHALL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("STUDYHALL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                "[database]\nurl = \"sqlite::memory:\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.membership, MembershipConfig::default());
        assert_eq!(config.membership.billing_cycle_days, 30);
        assert_eq!(config.membership.grace_days, 5);
        assert_eq!(config.seats.prefix, "A");
        assert_eq!(config.seats.count, 100);
        assert!(config.notifications.deduplicate);
        assert!(!config.logging.json);
    }

    #[test]
    fn test_overrides_are_respected() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                "[database]\nurl = \"postgres://localhost/studyhall\"\n\
                 [membership]\ngrace_days = 7\n\
                 [seats]\nprefix = \"B\"\ncount = 12\nlocker_every = 0\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.membership.grace_days, 7);
        assert_eq!(config.membership.billing_cycle_days, 30);
        assert_eq!(config.seats.prefix, "B");
        assert_eq!(config.seats.count, 12);
        assert_eq!(config.seats.locker_every, 0);
    }
}
