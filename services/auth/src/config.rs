use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::rate_limiter::RateLimiterConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub sign_in_limit: RateLimiterConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("sign_in_limit.max_attempts", 5)?
            .set_default("sign_in_limit.window_seconds", 300)?
            .set_default("sign_in_limit.ban_duration_seconds", 3600)?
            // Load from config/auth.toml
            .add_source(File::with_name("config/auth").required(false))
            // Override from environment (e.g., VALOR__SERVER__PORT)
            .add_source(Environment::with_prefix("VALOR").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults() {
        let config = AppConfig::load().unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.sign_in_limit.max_attempts, 5);
        assert_eq!(config.sign_in_limit.window_seconds, 300);
        assert_eq!(config.sign_in_limit.ban_duration_seconds, 3600);
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        unsafe {
            std::env::set_var("VALOR__SERVER__PORT", "4100");
            std::env::set_var("VALOR__SIGN_IN_LIMIT__MAX_ATTEMPTS", "3");
        }

        let config = AppConfig::load().unwrap();
        assert_eq!(config.server.port, 4100);
        assert_eq!(config.sign_in_limit.max_attempts, 3);

        unsafe {
            std::env::remove_var("VALOR__SERVER__PORT");
            std::env::remove_var("VALOR__SIGN_IN_LIMIT__MAX_ATTEMPTS");
        }
    }
}
