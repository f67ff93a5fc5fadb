use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MortgageConfig {
    /// Prevailing rate (percent) that assumable loans are compared against
    pub market_rate: f64,
    pub term_years: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub mortgage: MortgageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3001)?
            .set_default("mortgage.market_rate", mortgage::DEFAULT_MARKET_RATE)?
            .set_default("mortgage.term_years", mortgage::DEFAULT_TERM_YEARS)?
            // Load from config/api.toml
            .add_source(File::with_name("config/api").required(false))
            // Override from environment (e.g., VALOR__MORTGAGE__MARKET_RATE)
            .add_source(Environment::with_prefix("VALOR").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
