//! Functional Threshold Power estimation
//!
//! Each field test has its own estimator returning a rounded wattage or an
//! [`EngineError`]. [`validate_ftp`] is the normalizing entry point: it always
//! resolves to a usable FTP so zone and workout calculations can proceed.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, RangeWarning, Result};
use crate::models::{AthleteLevel, AthleteProfile, FtpEstimate, FtpMethod, HeartRateProfile};
use crate::numeric::{positive_decimal, round_to_u16, to_decimal};

const TWENTY_MINUTE_FACTOR: Decimal = dec!(0.95);
const CRITICAL_POWER_FACTOR: Decimal = dec!(0.97);

/// Fraction of HRR above resting HR used as an estimated LTHR
const ESTIMATED_LTHR_FRACTION: Decimal = dec!(0.87);
const VO2_UTILIZATION: Decimal = dec!(0.75);
const VO2_POWER_COEFFICIENT: Decimal = dec!(0.0123);

/// Level used by the weight heuristic when the athlete's level is unknown
const FALLBACK_LEVEL: AthleteLevel = AthleteLevel::Intermediate;

/// Default factors for the adjustable short-test estimators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub eight_minute_factor: f64,
    pub five_minute_factor: f64,
    pub one_minute_factor: f64,
    pub ramp_factor: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig {
            eight_minute_factor: 0.90,
            five_minute_factor: 0.85,
            one_minute_factor: 0.75,
            ramp_factor: 0.75,
        }
    }
}

/// Plausibility bounds applied by [`validate_ftp`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Candidates below this are replaced
    pub min_plausible_watts: u16,

    /// Candidates above this are kept but flagged
    pub max_plausible_watts: u16,

    /// FTP substituted by zone calculations when given an unusable value
    pub zone_fallback_ftp: u16,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            min_plausible_watts: 50,
            max_plausible_watts: 500,
            zone_fallback_ftp: 200,
        }
    }
}

/// A field test result tagged with the protocol that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "test", rename_all = "snake_case")]
pub enum FtpTest {
    TwentyMinute { power: f64 },
    EightMinute { power: f64, factor: Option<f64> },
    FiveMinute { power: f64, factor: Option<f64> },
    OneMinute { power: f64, factor: Option<f64> },
    Ramp { max_power: f64, factor: Option<f64> },
    CriticalPower { cp: f64 },
    WeightLevel { weight_kg: f64, level: AthleteLevel },
    HeartRate(HeartRateProfile),
}

impl FtpTest {
    pub fn method(&self) -> FtpMethod {
        match self {
            FtpTest::TwentyMinute { .. } => FtpMethod::TwentyMinute,
            FtpTest::EightMinute { .. } => FtpMethod::EightMinute,
            FtpTest::FiveMinute { .. } => FtpMethod::FiveMinute,
            FtpTest::OneMinute { .. } => FtpMethod::OneMinute,
            FtpTest::Ramp { .. } => FtpMethod::Ramp,
            FtpTest::CriticalPower { .. } => FtpMethod::CriticalPower,
            FtpTest::WeightLevel { .. } => FtpMethod::WeightLevel,
            FtpTest::HeartRate(_) => FtpMethod::HeartRate,
        }
    }
}

/// Which heart-rate input drives the heart-rate estimate, in priority order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeartRateStrategy {
    /// Measured lactate threshold heart rate
    LactateThreshold(Decimal),
    /// Laboratory VO2max
    Vo2Max(Decimal),
    /// LTHR estimated from heart-rate reserve
    HeartRateReserve,
}

impl HeartRateStrategy {
    /// Pick the strategy from the inputs that are present and usable
    pub fn select(profile: &HeartRateProfile) -> Self {
        if let Some(lthr) = profile.lthr.and_then(positive_decimal) {
            HeartRateStrategy::LactateThreshold(lthr)
        } else if let Some(vo2max) = profile.vo2max.and_then(positive_decimal) {
            HeartRateStrategy::Vo2Max(vo2max)
        } else {
            HeartRateStrategy::HeartRateReserve
        }
    }
}

/// Where a validated FTP came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FtpSource {
    /// Candidate accepted unchanged
    Provided,
    /// Replaced by the weight/level heuristic
    WeightHeuristic,
    /// Replaced by the per-level default
    LevelDefault,
}

/// Outcome of [`validate_ftp`]; `watts` is always finite and positive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidatedFtp {
    pub watts: f64,
    pub source: FtpSource,
    pub warning: Option<RangeWarning>,
}

/// FTP estimation strategies
#[derive(Debug, Clone, Default)]
pub struct FtpEstimator {
    config: EstimatorConfig,
}

impl FtpEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EstimatorConfig) -> Self {
        FtpEstimator { config }
    }

    /// Estimate FTP from 20-minute power test (multiply by 0.95)
    pub fn estimate_from_20min_test(&self, power: f64) -> Result<u16> {
        scaled_power("20-minute test", "power", power, TWENTY_MINUTE_FACTOR)
    }

    /// Estimate FTP from an 8-minute test, default factor 0.90
    pub fn estimate_from_8min_test(&self, power: f64, factor: Option<f64>) -> Result<u16> {
        let factor = resolve_factor(factor, self.config.eight_minute_factor, dec!(0.90));
        scaled_power("8-minute test", "power", power, factor)
    }

    /// Estimate FTP from a 5-minute test, default factor 0.85
    pub fn estimate_from_5min_test(&self, power: f64, factor: Option<f64>) -> Result<u16> {
        let factor = resolve_factor(factor, self.config.five_minute_factor, dec!(0.85));
        scaled_power("5-minute test", "power", power, factor)
    }

    /// Estimate FTP from a 1-minute test, default factor 0.75
    pub fn estimate_from_1min_test(&self, power: f64, factor: Option<f64>) -> Result<u16> {
        let factor = resolve_factor(factor, self.config.one_minute_factor, dec!(0.75));
        scaled_power("1-minute test", "power", power, factor)
    }

    /// Estimate FTP from the best minute of a ramp test, default factor 0.75
    pub fn estimate_from_ramp_test(&self, max_power: f64, factor: Option<f64>) -> Result<u16> {
        let factor = resolve_factor(factor, self.config.ramp_factor, dec!(0.75));
        scaled_power("ramp test", "max_power", max_power, factor)
    }

    /// Estimate FTP as 97% of critical power
    pub fn estimate_from_cp(&self, cp: f64) -> Result<u16> {
        scaled_power("critical power", "cp", cp, CRITICAL_POWER_FACTOR)
    }

    /// Estimate FTP from body weight and the level's average watts per kilogram
    pub fn estimate_from_weight(&self, weight_kg: f64, level: AthleteLevel) -> Result<u16> {
        scaled_power("weight heuristic", "weight_kg", weight_kg, level.average_watts_per_kg())
    }

    /// Estimate FTP from heart-rate data, using the best available input
    pub fn estimate_from_heart_rate(&self, profile: &HeartRateProfile) -> Result<u16> {
        const CALCULATION: &str = "heart rate estimate";

        let max_hr = positive_decimal(profile.max_hr)
            .ok_or_else(|| EngineError::invalid_input(CALCULATION, "max_hr", profile.max_hr))?;
        let resting_hr = positive_decimal(profile.resting_hr).ok_or_else(|| {
            EngineError::invalid_input(CALCULATION, "resting_hr", profile.resting_hr)
        })?;
        let weight = positive_decimal(profile.weight_kg).ok_or_else(|| {
            EngineError::invalid_input(CALCULATION, "weight_kg", profile.weight_kg)
        })?;

        if max_hr <= resting_hr {
            return Err(EngineError::precondition(
                CALCULATION,
                format!(
                    "max HR ({}) must be greater than resting HR ({})",
                    max_hr, resting_hr
                ),
            ));
        }

        let strategy = HeartRateStrategy::select(profile);
        tracing::debug!(?strategy, "Selected heart rate FTP strategy");

        let ftp = match strategy {
            HeartRateStrategy::LactateThreshold(lthr) => {
                watts_per_kg_for_threshold(lthr / max_hr) * weight
            }
            HeartRateStrategy::Vo2Max(vo2max) => {
                vo2max * VO2_UTILIZATION * weight * VO2_POWER_COEFFICIENT
            }
            HeartRateStrategy::HeartRateReserve => {
                let estimated_lthr =
                    resting_hr + ESTIMATED_LTHR_FRACTION * (max_hr - resting_hr);
                watts_per_kg_for_threshold(estimated_lthr / max_hr) * weight
            }
        };

        round_to_u16(ftp).ok_or_else(|| EngineError::invalid_input(CALCULATION, "ftp", ftp))
    }

    /// Run the estimator matching `test` and tag the result with its method
    pub fn estimate(&self, test: &FtpTest) -> Result<FtpEstimate> {
        let value = match test {
            FtpTest::TwentyMinute { power } => self.estimate_from_20min_test(*power),
            FtpTest::EightMinute { power, factor } => self.estimate_from_8min_test(*power, *factor),
            FtpTest::FiveMinute { power, factor } => self.estimate_from_5min_test(*power, *factor),
            FtpTest::OneMinute { power, factor } => self.estimate_from_1min_test(*power, *factor),
            FtpTest::Ramp { max_power, factor } => {
                self.estimate_from_ramp_test(*max_power, *factor)
            }
            FtpTest::CriticalPower { cp } => self.estimate_from_cp(*cp),
            FtpTest::WeightLevel { weight_kg, level } => {
                self.estimate_from_weight(*weight_kg, *level)
            }
            FtpTest::HeartRate(profile) => self.estimate_from_heart_rate(profile),
        }?;

        Ok(FtpEstimate::new(value, test.method()))
    }
}

/// Normalize a candidate FTP with default plausibility bounds. Never fails.
pub fn validate_ftp(candidate: Option<f64>, profile: Option<&AthleteProfile>) -> ValidatedFtp {
    validate_ftp_with_config(candidate, profile, &ValidationConfig::default())
}

/// Normalize a candidate FTP:
///
/// 1. a finite candidate at or above the minimum is kept (flagged when above the maximum)
/// 2. otherwise the weight/level heuristic, when a positive weight is known
/// 3. otherwise the level's default FTP, 200 W when the level is unknown
pub fn validate_ftp_with_config(
    candidate: Option<f64>,
    profile: Option<&AthleteProfile>,
    config: &ValidationConfig,
) -> ValidatedFtp {
    let minimum = f64::from(config.min_plausible_watts);
    let maximum = f64::from(config.max_plausible_watts);

    let candidate = candidate.filter(|value| value.is_finite());

    if let Some(value) = candidate.filter(|value| *value > 0.0 && *value >= minimum) {
        let warning = (value > maximum).then_some(RangeWarning::AboveExpected {
            value,
            maximum: config.max_plausible_watts,
        });
        return ValidatedFtp {
            watts: value,
            source: FtpSource::Provided,
            warning,
        };
    }

    let warning = candidate
        .filter(|value| *value > 0.0)
        .map(|value| RangeWarning::BelowExpected {
            value,
            minimum: config.min_plausible_watts,
        });

    let level = profile.and_then(|p| p.level);

    let heuristic = profile
        .and_then(|p| p.weight_kg)
        .and_then(|weight| {
            FtpEstimator::new()
                .estimate_from_weight(weight, level.unwrap_or(FALLBACK_LEVEL))
                .ok()
        })
        .filter(|watts| *watts > 0);

    if let Some(watts) = heuristic {
        tracing::debug!(watts, "FTP replaced by weight heuristic");
        return ValidatedFtp {
            watts: f64::from(watts),
            source: FtpSource::WeightHeuristic,
            warning,
        };
    }

    let watts = level.map_or(FALLBACK_LEVEL.default_ftp(), |level| level.default_ftp());
    tracing::debug!(watts, "FTP replaced by level default");
    ValidatedFtp {
        watts: f64::from(watts),
        source: FtpSource::LevelDefault,
        warning,
    }
}

/// Stepped watts/kg bands keyed on threshold HR as a fraction of max HR
fn watts_per_kg_for_threshold(percent_of_max: Decimal) -> Decimal {
    if percent_of_max > dec!(0.92) {
        dec!(4.5)
    } else if percent_of_max > dec!(0.89) {
        dec!(4.0)
    } else if percent_of_max > dec!(0.85) {
        dec!(3.5)
    } else if percent_of_max > dec!(0.82) {
        dec!(3.0)
    } else {
        dec!(2.5)
    }
}

/// Caller factor if it lies strictly in (0, 1), else the configured default,
/// else the built-in default
fn resolve_factor(factor: Option<f64>, configured: f64, builtin: Decimal) -> Decimal {
    factor
        .and_then(valid_factor)
        .or_else(|| valid_factor(configured))
        .unwrap_or(builtin)
}

fn valid_factor(value: f64) -> Option<Decimal> {
    to_decimal(value).filter(|f| *f > Decimal::ZERO && *f < Decimal::ONE)
}

fn scaled_power(calculation: &str, parameter: &str, value: f64, factor: Decimal) -> Result<u16> {
    let value_decimal = positive_decimal(value)
        .ok_or_else(|| EngineError::invalid_input(calculation, parameter, value))?;
    round_to_u16(value_decimal * factor)
        .ok_or_else(|| EngineError::invalid_input(calculation, parameter, value))
}
