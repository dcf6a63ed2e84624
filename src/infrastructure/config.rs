use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:3001/api";
const DEFAULT_CONTROL_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    pub api: ApiSettings,
    #[serde(default)]
    pub monitor: MonitorSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub control_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MonitorSettings {
    /// Bearing to simulate; the first catalog entry is used when unset
    pub bearing: Option<String>,
}

impl ApiSettings {
    pub fn control_timeout(&self) -> Duration {
        Duration::from_secs(self.control_timeout_secs)
    }
}

fn with_defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("api.base_url", DEFAULT_BASE_URL)?
        .set_default("api.control_timeout_secs", DEFAULT_CONTROL_TIMEOUT_SECS)
}

/// Defaults, then `config/monitor.*` if present, then `MONITOR__*` variables.
pub fn load_monitor_config() -> anyhow::Result<MonitorConfig> {
    let settings = with_defaults()?
        .add_source(config::File::with_name("config/monitor").required(false))
        .add_source(config::Environment::with_prefix("MONITOR").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
fn parse_monitor_config(toml: &str) -> anyhow::Result<MonitorConfig> {
    let settings = with_defaults()?
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    Ok(settings.try_deserialize()?)
}
