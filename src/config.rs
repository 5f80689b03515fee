use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::ftp::{EstimatorConfig, FtpEstimator, ValidationConfig};
use crate::pmc::{PmcCalculator, PmcConfig};

/// Engine configuration supplied by the caller.
///
/// Every section has defaults, so a TOML document only needs the values it
/// overrides:
///
/// ```toml
/// [estimator]
/// ramp_factor = 0.72
///
/// [pmc]
/// window_days = 90
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default factors for adjustable FTP estimators
    pub estimator: EstimatorConfig,

    /// FTP plausibility bounds and zone fallback
    pub validation: ValidationConfig,

    /// Training load time constants and window
    pub pmc: PmcConfig,
}

impl EngineConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).context("Failed to parse engine configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to pretty TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize engine configuration")
    }

    /// Reject values the calculators cannot use
    pub fn validate(&self) -> Result<()> {
        let factors = [
            ("estimator.eight_minute_factor", self.estimator.eight_minute_factor),
            ("estimator.five_minute_factor", self.estimator.five_minute_factor),
            ("estimator.one_minute_factor", self.estimator.one_minute_factor),
            ("estimator.ramp_factor", self.estimator.ramp_factor),
        ];
        for (name, factor) in factors {
            if !(factor.is_finite() && factor > 0.0 && factor < 1.0) {
                bail!("{} must be between 0 and 1 (exclusive), got {}", name, factor);
            }
        }

        if self.validation.min_plausible_watts >= self.validation.max_plausible_watts {
            bail!(
                "validation.min_plausible_watts ({}) must be below max_plausible_watts ({})",
                self.validation.min_plausible_watts,
                self.validation.max_plausible_watts
            );
        }
        if self.validation.zone_fallback_ftp == 0 {
            bail!("validation.zone_fallback_ftp must be positive");
        }

        if self.pmc.ctl_time_constant == 0 || self.pmc.atl_time_constant == 0 {
            bail!("pmc time constants must be at least one day");
        }

        Ok(())
    }

    pub fn ftp_estimator(&self) -> FtpEstimator {
        FtpEstimator::with_config(self.estimator.clone())
    }

    pub fn pmc_calculator(&self) -> PmcCalculator {
        PmcCalculator::with_config(self.pmc.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.estimator.eight_minute_factor, 0.90);
        assert_eq!(config.validation.min_plausible_watts, 50);
        assert_eq!(config.validation.max_plausible_watts, 500);
        assert_eq!(config.pmc.window_days, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [estimator]
            ramp_factor = 0.72

            [pmc]
            window_days = 90
            "#,
        )
        .unwrap();

        assert_eq!(config.estimator.ramp_factor, 0.72);
        assert_eq!(config.estimator.five_minute_factor, 0.85);
        assert_eq!(config.pmc.window_days, 90);
        assert_eq!(config.pmc.ctl_time_constant, 42);
        assert_eq!(config.ftp_estimator().estimate_from_ramp_test(400.0, None).unwrap(), 288);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EngineConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = EngineConfig::from_toml_str("[estimator]\nramp_factor = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("ramp_factor"));

        assert!(EngineConfig::from_toml_str("[pmc]\natl_time_constant = 0\n").is_err());
        assert!(EngineConfig::from_toml_str(
            "[validation]\nmin_plausible_watts = 600\nmax_plausible_watts = 500\n"
        )
        .is_err());
        assert!(EngineConfig::from_toml_str("pmc = 3").is_err());
    }
}
