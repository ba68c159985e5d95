//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Points accrual configuration.
    #[serde(default)]
    pub points: PointsConfig,
    /// Optional account seeded at startup.
    #[serde(default)]
    pub bootstrap: Option<BootstrapConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// JWT verification settings.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Shared secret used by the identity service to sign tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Points accrual settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PointsConfig {
    /// Points earned per currency unit spent on a purchase.
    #[serde(default = "default_base_rate", with = "rust_decimal::serde::str")]
    pub base_rate: Decimal,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            base_rate: default_base_rate(),
        }
    }
}

fn default_base_rate() -> Decimal {
    // one point per 0.25 spent
    Decimal::from(4)
}

/// Superuser seeded at startup so externally issued tokens have a principal.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    /// Handle of the seeded superuser.
    pub superuser_utorid: String,
    /// Display name of the seeded superuser.
    #[serde(default = "default_superuser_name")]
    pub superuser_name: String,
}

fn default_superuser_name() -> String {
    "Administrator".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("STELLAR").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
