use crate::session::RateConfig;
use anyhow::Result;
use serde::Deserialize;

/// Process configuration: an optional config file layered under
/// `VOXMETER`-prefixed environment variables.
///
/// Everything has a default, so the service starts with no file at all.
/// Env keys use `__` as the section separator, e.g.
/// `VOXMETER__RATES__LLM_PROMPT_PER_1K=0.001` or
/// `VOXMETER__DATABASE__PATH=/var/lib/voxmeter.db`.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// Billing rates; read once here, immutable afterwards
    #[serde(default)]
    pub rates: RateConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,

    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path (":memory:" for an ephemeral store)
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_service_name() -> String {
    "voxmeter".to_string()
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "voxmeter.db".to_string()
}

fn default_pool_size() -> u32 {
    8
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            pool_size: default_pool_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Config {
    /// Loads configuration, layering environment variables over the file
    /// at `path` (if given) over the defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("VOXMETER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
