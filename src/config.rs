use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_PREFIX: &str = "SPACEBUILD";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub controller: ControllerConfig,
    pub world: WorldConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub url: String,
    pub connect_timeout_ms: u64,
    /// Sent as a login message right after the connection opens.
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Server coordinates are multiplied by this before placement.
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
    pub file: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:2567".to_string(),
            connect_timeout_ms: 5000,
            nickname: None,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { scale: 10.0 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: None,
        }
    }
}

impl ServerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl ControllerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Layers defaults, then the optional file, then `SPACEBUILD__SECTION__KEY`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
