use std::env;

use auth::HashCost;
use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

/// Longest token lifetime accepted from configuration (ten years).
pub const MAX_EXPIRATION_HOURS: i64 = 10 * 365 * 24;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub hashing: HashingConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

impl JwtConfig {
    /// Token lifetime as a duration.
    ///
    /// # Errors
    /// * `ConfigError::Message` - Hours are not positive or exceed
    ///   [`MAX_EXPIRATION_HOURS`]
    pub fn validity(&self) -> Result<Duration, ConfigError> {
        if self.expiration_hours <= 0 || self.expiration_hours > MAX_EXPIRATION_HOURS {
            return Err(ConfigError::Message(format!(
                "jwt.expiration_hours must be between 1 and {}, got {}",
                MAX_EXPIRATION_HOURS, self.expiration_hours
            )));
        }

        Duration::try_hours(self.expiration_hours).ok_or_else(|| {
            ConfigError::Message(format!(
                "jwt.expiration_hours is out of range: {}",
                self.expiration_hours
            ))
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl From<&HashingConfig> for HashCost {
    fn from(config: &HashingConfig) -> Self {
        HashCost::new(config.memory_kib, config.iterations, config.parallelism)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, SERVER__HTTP_PORT, DATABASE__URL, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .set_default("server.http_port", 8080)?
            .set_default("jwt.secret", "")?
            .set_default("jwt.expiration_hours", 72)?
            .set_default("hashing.memory_kib", 19456)?
            .set_default("hashing.iterations", 2)?
            .set_default("hashing.parallelism", 1)?
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject configurations the service must not start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "jwt.secret is not set (JWT__SECRET)".to_string(),
            ));
        }

        self.jwt.validity()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str, expiration_hours: i64) -> Config {
        Config {
            server: ServerConfig { http_port: 8080 },
            jwt: JwtConfig {
                secret: secret.to_string(),
                expiration_hours,
            },
            hashing: HashingConfig {
                memory_kib: 19456,
                iterations: 2,
                parallelism: 1,
            },
            database: None,
        }
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(config("a-long-enough-signing-secret", 72).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_secret() {
        assert!(config("", 72).validate().is_err());
        assert!(config("   ", 72).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_validity() {
        assert!(config("secret", 0).validate().is_err());
        assert!(config("secret", -1).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_validity() {
        assert!(config("secret", MAX_EXPIRATION_HOURS).validate().is_ok());
        assert!(config("secret", MAX_EXPIRATION_HOURS + 1).validate().is_err());
        assert!(config("secret", 1_000_000_000_000).validate().is_err());
        assert!(config("secret", i64::MAX / 1000).validate().is_err());
        assert!(config("secret", i64::MAX).validate().is_err());
    }

    #[test]
    fn test_validity() {
        let jwt = config("secret", 72).jwt;
        assert_eq!(jwt.validity().unwrap(), Duration::hours(72));

        let jwt = config("secret", i64::MAX / 1000).jwt;
        assert!(jwt.validity().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", config("super-secret-value", 72));

        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_hash_cost_from_config() {
        let cost = HashCost::from(&config("secret", 72).hashing);
        assert_eq!(cost, HashCost::default());
    }
}
