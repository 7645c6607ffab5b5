use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    pub sweep_interval_ms: u64,
}

impl RelayConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub relay: RelayConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Self::defaults("development")?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(Self::environment());

        // The bare PORT variable wins over everything else
        Self::finish(builder, env::var("PORT").ok())
    }

    /// `APP_` prefixed variables, `__` between nesting levels.
    /// E.g., `APP_SERVER__PORT=5001` would set `Settings.server.port`
    fn environment() -> Environment {
        Environment::with_prefix("app")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn defaults(environment: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("relay.sweep_interval_ms", 5000)
    }

    fn finish(
        builder: ConfigBuilder<DefaultState>,
        port: Option<String>,
    ) -> Result<Self, ConfigError> {
        let settings: Settings = builder
            .set_override_option("server.port", port)?
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.relay.sweep_interval_ms == 0 {
            return Err(ConfigError::Message(
                "relay.sweep_interval_ms must be greater than zero".into(),
            ));
        }
        if self.server.workers == 0 {
            return Err(ConfigError::Message(
                "server.workers must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn new_for_test() -> Result<Self, ConfigError> {
        Self::finish(Self::defaults("test")?, None)
    }
}
