use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub wizard: WizardSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

/// Client-side profile store
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    /// Redis connection string; in-memory storage when absent
    pub redis_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WizardSettings {
    #[serde(default = "default_auto_advance_delay_ms")]
    pub auto_advance_delay_ms: u64,
    #[serde(default = "default_phone_verification_delay_ms")]
    pub phone_verification_delay_ms: u64,
    #[serde(default)]
    pub require_phone_verification: bool,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            auto_advance_delay_ms: default_auto_advance_delay_ms(),
            phone_verification_delay_ms: default_phone_verification_delay_ms(),
            require_phone_verification: false,
        }
    }
}

fn default_auto_advance_delay_ms() -> u64 { 300 }
fn default_phone_verification_delay_ms() -> u64 { 1000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "full".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with BLINDL_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // e.g., BLINDL__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("BLINDL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("BLINDL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply the conventional deployment variables on top of the layered config
///
/// `DATABASE_URL` sets the document store connection string and `PORT` the
/// listen port.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Ok(port) = env::var("PORT") {
        let port: u16 = port
            .parse()
            .map_err(|e| ConfigError::Message(format!("Invalid PORT {:?}: {}", port, e)))?;
        builder = builder.set_override("server.port", i64::from(port))?;
    }
    if let Ok(redis_url) = env::var("REDIS_URL") {
        builder = builder.set_override("store.redis_url", redis_url)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_wizard_settings() {
        let wizard = WizardSettings::default();
        assert_eq!(wizard.auto_advance_delay_ms, 300);
        assert_eq!(wizard.phone_verification_delay_ms, 1000);
        assert!(!wizard.require_phone_verification);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "full");
    }

    #[test]
    fn test_load_from_file_fills_defaults() {
        let path = std::env::temp_dir().join(format!("blindl-config-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nhost = \"127.0.0.1\"\nport = 8080\n\n[database]\nurl = \"postgres://localhost/test\"\n\n[wizard]\nrequire_phone_verification = true"
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.server.port, 8080);
        assert!(settings.wizard.require_phone_verification);
        assert_eq!(settings.wizard.auto_advance_delay_ms, 300);
        assert!(settings.store.redis_url.is_none());
        assert_eq!(settings.logging.format, "full");
    }
}
