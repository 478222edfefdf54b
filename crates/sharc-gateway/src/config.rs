//! Gateway configuration

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use sharc_common::{Address, BasisPoints, CreditScore, Result, SharcError};
use sharc_ledger::{LedgerConfig, DEFAULT_SERVICE_FEE_RATE_BPS};

/// Placeholder owner used when none is configured
pub const DEFAULT_OWNER: &str = "0x0000000000000000000000000000000000000000";

/// Gateway service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Service host
    pub host: String,
    /// Service port
    pub port: u16,
    /// Emit logs as JSON lines
    pub json_logs: bool,
    /// Ledger bootstrap settings
    pub ledger: LedgerSettings,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            json_logs: false,
            ledger: LedgerSettings::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from defaults, `sharc.toml` and `SHARC_*` variables
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let builder = Config::builder()
            .add_source(Config::try_from(&Self::default()).map_err(config_error)?)
            .add_source(File::with_name("sharc").required(false))
            .add_source(
                Environment::with_prefix("SHARC")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        let mut cfg: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)?;

        // Bare PORT (set by most hosting platforms) takes priority
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse::<u16>() {
                cfg.port = p;
            }
        }

        Ok(cfg)
    }

    /// Defaults overlaid with an inline TOML document
    #[cfg(test)]
    pub fn from_toml(toml: &str) -> Result<Self> {
        Config::builder()
            .add_source(Config::try_from(&Self::default()).map_err(config_error)?)
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn config_error(err: ConfigError) -> SharcError {
    SharcError::Config(err.to_string())
}

/// Ledger bootstrap settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Administrative owner address
    pub owner: String,
    pub service_fee_rate_bps: BasisPoints,
    /// 0 disables gating
    pub min_credit_score: CreditScore,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            service_fee_rate_bps: DEFAULT_SERVICE_FEE_RATE_BPS,
            min_credit_score: 0,
        }
    }
}

impl LedgerSettings {
    /// Parse the owner and build the ledger configuration
    pub fn to_ledger_config(&self) -> Result<LedgerConfig> {
        let owner = Address::parse(&self.owner)?;
        let config = LedgerConfig::new(owner)
            .with_service_fee_rate(self.service_fee_rate_bps)
            .with_min_credit_score(self.min_credit_score);
        config.validate()?;
        Ok(config)
    }

    pub fn has_default_owner(&self) -> bool {
        self.owner == DEFAULT_OWNER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharc_common::LedgerError;

    #[test]
    fn test_defaults() {
        let cfg = GatewayConfig::from_toml("").unwrap();
        assert_eq!(cfg, GatewayConfig::default());
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
        assert!(cfg.ledger.has_default_owner());
    }

    #[test]
    fn test_toml_overrides() {
        let cfg = GatewayConfig::from_toml(
            r#"
            port = 9090
            json_logs = true

            [ledger]
            owner = "0x00000000000000000000000000000000000000AA"
            min_credit_score = 650
            "#,
        )
        .unwrap();

        assert_eq!(cfg.port, 9090);
        assert!(cfg.json_logs);
        assert_eq!(cfg.ledger.service_fee_rate_bps, 1_000);

        let ledger = cfg.ledger.to_ledger_config().unwrap();
        assert_eq!(
            ledger.owner.as_str(),
            "0x00000000000000000000000000000000000000aa"
        );
        assert_eq!(ledger.min_credit_score, 650);
    }

    #[test]
    fn test_invalid_ledger_settings() {
        let bad_owner = LedgerSettings {
            owner: "alice".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            bad_owner.to_ledger_config(),
            Err(SharcError::Address(_))
        ));

        let bad_fee = LedgerSettings {
            service_fee_rate_bps: 9_000,
            ..Default::default()
        };
        assert!(matches!(
            bad_fee.to_ledger_config(),
            Err(SharcError::Ledger(LedgerError::InvalidServiceFeeRate { .. }))
        ));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        assert!(matches!(
            GatewayConfig::from_toml("port = \"not a port\""),
            Err(SharcError::Config(_))
        ));
        assert!(matches!(
            GatewayConfig::from_toml("[ledger"),
            Err(SharcError::Config(_))
        ));
    }
}
