use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::WorkoutInterval;
use crate::numeric::{f64_to_rounded, positive_decimal, round_half_up};

/// Load metrics for a structured workout, rounded for display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutMetrics {
    pub normalized_power: u16,
    /// NP / FTP, two decimal places
    pub intensity_factor: Decimal,
    pub tss: u32,
    pub average_power: u16,
    pub total_work_kj: u32,
    pub duration_minutes: u32,
}

/// Core workout metrics engine
pub struct WorkoutMetricsCalculator;

impl WorkoutMetricsCalculator {
    /// Calculate NP, IF, TSS, average power, work and duration for a workout.
    ///
    /// Normalized power here is the fourth-power mean of the declared interval
    /// targets weighted by duration, an approximation of the 30-second rolling
    /// normalized power used on recorded rides. Rest time dilutes the mean but
    /// adds nothing to the fourth-power sum.
    ///
    /// Empty workouts, zero total duration or an unusable FTP produce all-zero
    /// metrics rather than an error.
    pub fn calculate(ftp: f64, intervals: &[WorkoutInterval]) -> WorkoutMetrics {
        if positive_decimal(ftp).is_none() {
            tracing::debug!(ftp, "Unusable FTP, workout metrics degrade to zero");
            return WorkoutMetrics::default();
        }

        let total_duration: u64 = intervals
            .iter()
            .map(|i| {
                u64::from(i.duration_seconds) + u64::from(i.rest_duration_seconds.unwrap_or(0))
            })
            .sum();

        if total_duration == 0 {
            return WorkoutMetrics::default();
        }

        let total_work: u64 = intervals
            .iter()
            .map(|i| u64::from(i.duration_seconds) * u64::from(i.target_power_watts))
            .sum();

        // Fourth powers overflow integer types quickly; f64 like the rolling NP path
        let weighted_fourth_powers: f64 = intervals
            .iter()
            .map(|i| f64::from(i.duration_seconds) * f64::from(i.target_power_watts).powi(4))
            .sum();

        let duration = total_duration as f64;
        let normalized_power = (weighted_fourth_powers / duration).powf(0.25);
        let intensity_factor = normalized_power / ftp;
        let tss = (duration * normalized_power * intensity_factor) / (ftp * 3600.0) * 100.0;

        let average_power = Decimal::from(total_work) / Decimal::from(total_duration);

        WorkoutMetrics {
            normalized_power: f64_to_rounded(normalized_power, 0).to_u16().unwrap_or(0),
            intensity_factor: f64_to_rounded(intensity_factor, 2),
            tss: f64_to_rounded(tss, 0).to_u32().unwrap_or(0),
            average_power: round_half_up(average_power, 0).to_u16().unwrap_or(0),
            total_work_kj: round_half_up(Decimal::from(total_work) / Decimal::ONE_THOUSAND, 0)
                .to_u32()
                .unwrap_or(0),
            duration_minutes: round_half_up(Decimal::from(total_duration) / Decimal::from(60), 0)
                .to_u32()
                .unwrap_or(0),
        }
    }
}
