//! Critical power modeling for cycling
//!
//! Solves the two-parameter work-time relation `W(t) = CP·t + AWC` from a
//! maximal 5-minute and a maximal 1-minute effort, and predicts time to
//! exhaustion above critical power from the fitted model.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::PerformanceTest;
use crate::numeric::{positive_decimal, round_half_up, round_to_u32};

/// Duration of the short maximal effort (seconds)
pub const SHORT_TEST_SECONDS: u32 = 60;

/// Duration of the long maximal effort (seconds)
pub const LONG_TEST_SECONDS: u32 = 300;

const CALCULATION: &str = "critical power model";

/// Critical Power model parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalPowerModel {
    /// Critical Power in watts
    pub cp: i32,
    /// Anaerobic work capacity (W') in joules
    pub awc: u32,
}

impl CriticalPowerModel {
    /// Seconds a rider can hold `power_watts` before AWC is exhausted.
    ///
    /// Efforts at or below CP are sustainable in this model and return `None`.
    pub fn time_to_exhaustion(&self, power_watts: f64) -> Option<u32> {
        let power = positive_decimal(power_watts)?;
        let above_cp = power - Decimal::from(self.cp);
        if above_cp <= Decimal::ZERO {
            return None;
        }
        round_to_u32(Decimal::from(self.awc) / above_cp)
    }

    /// Highest power sustainable for `duration_seconds`: `CP + AWC / t`
    pub fn power_for_duration(&self, duration_seconds: u32) -> Option<u32> {
        if duration_seconds == 0 {
            return None;
        }
        let power = Decimal::from(self.cp)
            + Decimal::from(self.awc) / Decimal::from(duration_seconds);
        round_to_u32(power)
    }
}

/// Critical power calculations
pub struct PowerAnalyzer;

impl PowerAnalyzer {
    /// Fit CP and AWC from 5-minute and 1-minute maximal average power.
    ///
    /// - `CP = (P5·300 − P1·60) / 240`
    /// - `AWC = (P1 − CP)·60`
    ///
    /// The 1-minute power must be strictly greater than the 5-minute power;
    /// anything else means the efforts were not both maximal.
    pub fn calculate_critical_power(
        power_5min: f64,
        power_1min: f64,
    ) -> Result<CriticalPowerModel> {
        let p5 = positive_decimal(power_5min)
            .ok_or_else(|| EngineError::invalid_input(CALCULATION, "power_5min", power_5min))?;
        let p1 = positive_decimal(power_1min)
            .ok_or_else(|| EngineError::invalid_input(CALCULATION, "power_1min", power_1min))?;

        if p1 <= p5 {
            return Err(EngineError::precondition(
                CALCULATION,
                format!(
                    "1-minute power ({} W) must be greater than 5-minute power ({} W)",
                    p1, p5
                ),
            ));
        }

        let t1 = Decimal::from(SHORT_TEST_SECONDS);
        let t5 = Decimal::from(LONG_TEST_SECONDS);

        let cp = (p5 * t5 - p1 * t1) / (t5 - t1);
        let awc = (p1 - cp) * t1;

        let cp = round_half_up(cp, 0)
            .to_i32()
            .ok_or_else(|| EngineError::invalid_input(CALCULATION, "cp", cp))?;
        let awc = round_to_u32(awc)
            .ok_or_else(|| EngineError::invalid_input(CALCULATION, "awc", awc))?;

        tracing::debug!(cp, awc, "Fitted two-parameter critical power model");

        Ok(CriticalPowerModel { cp, awc })
    }

    /// Same as [`PowerAnalyzer::calculate_critical_power`], taking the efforts
    /// as [`PerformanceTest`]s. Durations must be exactly 300 s and 60 s.
    pub fn calculate_critical_power_from_tests(
        five_minute: &PerformanceTest,
        one_minute: &PerformanceTest,
    ) -> Result<CriticalPowerModel> {
        if five_minute.duration_seconds != LONG_TEST_SECONDS {
            return Err(EngineError::invalid_input(
                CALCULATION,
                "five_minute.duration_seconds",
                five_minute.duration_seconds,
            ));
        }
        if one_minute.duration_seconds != SHORT_TEST_SECONDS {
            return Err(EngineError::invalid_input(
                CALCULATION,
                "one_minute.duration_seconds",
                one_minute.duration_seconds,
            ));
        }

        Self::calculate_critical_power(
            five_minute.average_power_watts,
            one_minute.average_power_watts,
        )
    }
}
