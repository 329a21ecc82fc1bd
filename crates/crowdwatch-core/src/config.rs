//! Configuration loading and typed config structures for Crowdwatch.
//!
//! The canonical configuration lives in `crowdwatch-config.yaml` at the
//! project root. Every field has a default, so an empty file (or none at
//! all) yields a working in-memory deployment over the default campus.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::FixedOffset;
use crowdwatch_decision::{DecisionEngine, DecisionError, RerouteMap};
use crowdwatch_types::LocationSeed;
use serde::Deserialize;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The reroute map or threshold was rejected by the decision engine.
    #[error("invalid decision configuration: {0}")]
    Decision(#[from] DecisionError),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
///
/// Mirrors the structure of `crowdwatch-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Store of record settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Admin credential and token settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Status thresholds.
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Locations seeded at startup.
    #[serde(default = "default_locations")]
    pub locations: Vec<LocationSeed>,

    /// Reroute adjacency map.
    #[serde(default = "RerouteMap::campus")]
    pub reroute: RerouteMap,

    /// History and alert window sizes.
    #[serde(default)]
    pub queries: QueryConfig,

    /// Forecast heuristic parameters.
    #[serde(default)]
    pub forecast: ForecastConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            thresholds: ThresholdConfig::default(),
            locations: default_locations(),
            reroute: RerouteMap::campus(),
            queries: QueryConfig::default(),
            forecast: ForecastConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `DATABASE_URL` overrides `database.url`
    /// - `SECRET_KEY` overrides `auth.secret_key`
    /// - `ADMIN_USERNAME` / `ADMIN_PASSWORD` override the admin credential
    /// - `CROWDWATCH_PORT` overrides `server.port`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(secret) = lookup("SECRET_KEY") {
            self.auth.secret_key = secret;
        }
        if let Some(username) = lookup("ADMIN_USERNAME") {
            self.auth.admin_username = username;
        }
        if let Some(password) = lookup("ADMIN_PASSWORD") {
            self.auth.admin_password = password;
        }
        if let Some(port) = lookup("CROWDWATCH_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("CROWDWATCH_PORT '{port}': {e}")))?;
        }
        Ok(())
    }

    /// Check every section for out-of-range or inconsistent values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locations.is_empty() {
            return Err(invalid("at least one location must be configured"));
        }
        let mut names = BTreeSet::new();
        for seed in &self.locations {
            if seed.name.trim().is_empty() {
                return Err(invalid("location names must not be blank"));
            }
            if seed.capacity == 0 {
                return Err(ConfigError::Invalid(format!(
                    "location '{}' must have a positive capacity",
                    seed.name
                )));
            }
            if !names.insert(seed.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "location '{}' is configured more than once",
                    seed.name
                )));
            }
        }
        self.reroute.validate(names.iter().copied())?;

        if !(1..=100).contains(&self.thresholds.warning_percent) {
            return Err(DecisionError::InvalidThreshold(self.thresholds.warning_percent).into());
        }
        if self.queries.default_limit == 0 || self.queries.max_limit < self.queries.default_limit {
            return Err(invalid(
                "queries.default_limit must be positive and no larger than queries.max_limit",
            ));
        }
        if !(1..=24).contains(&self.forecast.hours) {
            return Err(invalid("forecast.hours must be between 1 and 24"));
        }
        if !(0.0..=1.0).contains(&self.forecast.jitter) {
            return Err(invalid("forecast.jitter must be between 0 and 1"));
        }
        self.forecast.offset()?;
        if self.auth.secret_key.is_empty() || self.auth.admin_username.is_empty() {
            return Err(invalid("auth.secret_key and auth.admin_username must be set"));
        }
        if self.auth.token_ttl_minutes == 0 {
            return Err(invalid("auth.token_ttl_minutes must be positive"));
        }
        if self.database.max_connections == 0 {
            return Err(invalid("database.max_connections must be positive"));
        }
        if self.database.acquire_timeout_secs == 0 {
            return Err(invalid("database.acquire_timeout_secs must be positive"));
        }
        Ok(())
    }

    /// Build the decision engine from the reroute map and threshold.
    pub fn decision_engine(&self) -> Result<DecisionEngine, ConfigError> {
        Ok(DecisionEngine::new(
            self.reroute.clone(),
            self.thresholds.warning_percent,
        )?)
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_owned())
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Store of record configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string. When absent the service runs on the
    /// in-memory store.
    #[serde(default)]
    pub url: Option<String>,

    /// Pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds a request waits for a pooled connection before failing.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

/// Admin credential and bearer token configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign tokens.
    #[serde(default = "default_secret_key")]
    pub secret_key: String,

    /// Token lifetime in minutes.
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: u32,

    /// The single admin username.
    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    /// The single admin password.
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: default_secret_key(),
            token_ttl_minutes: default_token_ttl_minutes(),
            admin_username: default_admin_username(),
            admin_password: default_admin_password(),
        }
    }
}

/// Status classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ThresholdConfig {
    /// Load (whole percent of capacity) at which a location turns `WARNING`.
    #[serde(default = "default_warning_percent")]
    pub warning_percent: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            warning_percent: default_warning_percent(),
        }
    }
}

/// History and alert window sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct QueryConfig {
    /// Window size when the caller gives none.
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Largest window a caller may request.
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl QueryConfig {
    /// Resolve a caller-supplied limit against the configured bounds.
    pub fn resolve(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

/// Forecast heuristic parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ForecastConfig {
    /// Number of hourly points.
    #[serde(default = "default_forecast_hours")]
    pub hours: u32,

    /// Local clock offset from UTC, in hours.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// Bound on the uniform jitter added to each base load.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl ForecastConfig {
    /// The configured local offset.
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "forecast.utc_offset_hours {} is out of range",
                    self.utc_offset_hours
                ))
            })
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            hours: default_forecast_hours(),
            utc_offset_hours: default_utc_offset_hours(),
            jitter: default_jitter(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error).
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_locations() -> Vec<LocationSeed> {
    vec![
        LocationSeed::new("Cafeteria", 30),
        LocationSeed::new("Admin Block", 50),
        LocationSeed::new("Academic Block", 150),
        LocationSeed::new("Basketball Court", 20),
    ]
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8000
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_secret_key() -> String {
    String::from("change-me-in-production")
}

const fn default_token_ttl_minutes() -> u32 {
    30
}

fn default_admin_username() -> String {
    String::from("admin")
}

fn default_admin_password() -> String {
    String::from("admin123")
}

const fn default_warning_percent() -> u32 {
    crowdwatch_decision::DEFAULT_WARNING_PERCENT
}

const fn default_limit() -> usize {
    50
}

const fn default_max_limit() -> usize {
    500
}

const fn default_forecast_hours() -> u32 {
    crowdwatch_decision::forecast::DEFAULT_FORECAST_HOURS
}

const fn default_utc_offset_hours() -> i32 {
    5
}

const fn default_jitter() -> f64 {
    crowdwatch_decision::forecast::DEFAULT_JITTER
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.locations.len(), 4);
        assert_eq!(config.thresholds.warning_percent, 80);
        assert_eq!(config.queries.default_limit, 50);
        assert_eq!(config.forecast.hours, 5);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        let mut config: ServiceConfig = serde_yml::from_str("{}").unwrap();
        config.apply_overrides(|_| None).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
server:
  port: 9100
thresholds:
  warning_percent: 75
locations:
  - name: Library
    capacity: 40
  - name: Gym
    capacity: 25
reroute:
  Library: [Gym]
  Gym: [Library]
queries:
  default_limit: 20
forecast:
  utc_offset_hours: 0
  jitter: 0.0
";
        let mut config: ServiceConfig = serde_yml::from_str(yaml).unwrap();
        config.apply_overrides(|_| None).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.thresholds.warning_percent, 75);
        assert_eq!(config.locations.len(), 2);
        assert_eq!(config.reroute.candidates("Gym"), Some(&[String::from("Library")][..]));
        assert_eq!(config.queries.default_limit, 20);
        assert_eq!(config.queries.max_limit, 500);
        assert!(config.validate().is_ok());
        assert_eq!(config.decision_engine().unwrap().warning_percent(), 75);
    }

    #[test]
    fn overrides_replace_yaml_values() {
        let vars: BTreeMap<&str, &str> = [
            ("DATABASE_URL", "postgresql://localhost/crowdwatch"),
            ("SECRET_KEY", "s3cret"),
            ("ADMIN_USERNAME", "ops"),
            ("CROWDWATCH_PORT", "8100"),
        ]
        .into_iter()
        .collect();
        let mut config = ServiceConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| (*v).to_owned()))
            .unwrap();
        assert_eq!(config.database.url.as_deref(), Some("postgresql://localhost/crowdwatch"));
        assert_eq!(config.auth.secret_key, "s3cret");
        assert_eq!(config.auth.admin_username, "ops");
        assert_eq!(config.auth.admin_password, "admin123");
        assert_eq!(config.server.port, 8100);
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = ServiceConfig::default();
        let result = config.apply_overrides(|key| (key == "CROWDWATCH_PORT").then(|| String::from("http")));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn duplicate_and_zero_capacity_locations_are_rejected() {
        let mut config = ServiceConfig::default();
        config.locations.push(LocationSeed::new("Cafeteria", 10));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ServiceConfig::default();
        config.locations[0].capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn reroute_map_must_match_locations() {
        let mut config = ServiceConfig::default();
        config.reroute = RerouteMap::new([("Cafeteria", vec!["Library"])]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Decision(DecisionError::UnknownCandidate { .. }))
        ));
    }

    #[test]
    fn threshold_and_limits_are_range_checked() {
        let mut config = ServiceConfig::default();
        config.thresholds.warning_percent = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Decision(DecisionError::InvalidThreshold(0)))
        ));

        let mut config = ServiceConfig::default();
        config.queries.max_limit = 10;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.forecast.utc_offset_hours = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn database_pool_settings_parse_and_validate() {
        let yaml = r"
database:
  max_connections: 4
  acquire_timeout_secs: 12
";
        let mut config: ServiceConfig = serde_yml::from_str(yaml).unwrap();
        config.apply_overrides(|_| None).unwrap();
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.database.acquire_timeout_secs, 12);
        assert!(config.validate().is_ok());
        assert_eq!(ServiceConfig::default().database.acquire_timeout_secs, 5);

        config.database.acquire_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn query_limits_resolve_against_bounds() {
        let queries = QueryConfig::default();
        assert_eq!(queries.resolve(None), 50);
        assert_eq!(queries.resolve(Some(10)), 10);
        assert_eq!(queries.resolve(Some(10_000)), 500);
    }

    #[test]
    fn forecast_offset_defaults_to_utc_plus_five() {
        let offset = ForecastConfig::default().offset().unwrap();
        assert_eq!(offset.local_minus_utc(), 5 * 3600);
    }
}
