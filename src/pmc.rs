use chrono::{Days, NaiveDate};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::DailyTrainingLoad;
use crate::numeric::{f64_to_rounded, to_decimal};

/// CTL/ATL/TSB for one position of a TSS series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingLoadPoint {
    /// Chronic Training Load (fitness)
    pub ctl: Decimal,
    /// Acute Training Load (fatigue)
    pub atl: Decimal,
    /// Training Stress Balance (form), CTL - ATL
    pub tsb: Decimal,
}

/// Performance Management Chart (PMC) metrics for a specific date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PmcMetrics {
    /// Date these metrics are calculated for
    pub date: NaiveDate,

    /// Daily TSS value used in calculations
    pub daily_tss: Decimal,

    pub ctl: Decimal,
    pub atl: Decimal,
    pub tsb: Decimal,
}

/// PMC configuration with customizable time constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PmcConfig {
    /// CTL time constant and lookback in days (default: 42)
    pub ctl_time_constant: u16,

    /// ATL time constant and lookback in days (default: 7)
    pub atl_time_constant: u16,

    /// Days covered by a training load request ending today (default: 42)
    pub window_days: u16,
}

impl Default for PmcConfig {
    fn default() -> Self {
        PmcConfig {
            ctl_time_constant: 42,
            atl_time_constant: 7,
            window_days: 42,
        }
    }
}

/// Training Stress Balance interpretation ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TsbInterpretation {
    VeryFresh,    // +25 and above
    Fresh,        // +5 to +25
    Neutral,      // -10 to +5
    Fatigued,     // -30 to -10
    VeryFatigued, // Below -30
}

impl TsbInterpretation {
    /// Get TSB interpretation from numeric value
    pub fn from_tsb(tsb: Decimal) -> Self {
        if tsb >= Decimal::from(25) {
            TsbInterpretation::VeryFresh
        } else if tsb >= Decimal::from(5) {
            TsbInterpretation::Fresh
        } else if tsb >= Decimal::from(-10) {
            TsbInterpretation::Neutral
        } else if tsb >= Decimal::from(-30) {
            TsbInterpretation::Fatigued
        } else {
            TsbInterpretation::VeryFatigued
        }
    }

    /// Get interpretation description
    pub fn description(&self) -> &'static str {
        match self {
            TsbInterpretation::VeryFresh => "Very fresh (may be losing fitness)",
            TsbInterpretation::Fresh => "Fresh and ready for hard training/racing",
            TsbInterpretation::Neutral => "Neutral (normal training)",
            TsbInterpretation::Fatigued => "Fatigued (monitor closely)",
            TsbInterpretation::VeryFatigued => "Very fatigued (rest needed)",
        }
    }
}

/// Core PMC calculation engine
#[derive(Debug, Clone, Default)]
pub struct PmcCalculator {
    config: PmcConfig,
}

impl PmcCalculator {
    /// Create new PMC calculator with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create new PMC calculator with custom configuration
    pub fn with_config(config: PmcConfig) -> Self {
        PmcCalculator { config }
    }

    pub fn config(&self) -> &PmcConfig {
        &self.config
    }

    /// Sum TSS per day; several records on one date add up
    pub fn aggregate_daily_tss(
        &self,
        records: &[DailyTrainingLoad],
    ) -> BTreeMap<NaiveDate, Decimal> {
        let mut daily_tss: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();

        for record in records {
            *daily_tss.entry(record.date).or_insert(Decimal::ZERO) += sanitize_tss(record.tss);
        }

        daily_tss
    }

    /// CTL/ATL/TSB for every position of a dense daily TSS series.
    ///
    /// Each value is a finite weighted average over at most `time_constant`
    /// days, weights `e^(-k / time_constant)` for k days back. Nothing before
    /// index 0 is assumed, so the first days average over a shorter lookback.
    /// Non-finite or negative TSS counts as a rest day.
    pub fn calculate_from_series(&self, tss: &[f64]) -> Vec<TrainingLoadPoint> {
        let series: Vec<f64> = tss
            .iter()
            .map(|&value| if value.is_finite() && value > 0.0 { value } else { 0.0 })
            .collect();

        let ctl_weights = decay_weights(self.config.ctl_time_constant);
        let atl_weights = decay_weights(self.config.atl_time_constant);

        (0..series.len())
            .map(|day| {
                let ctl = f64_to_rounded(weighted_average(&series, day, &ctl_weights), 1);
                let atl = f64_to_rounded(weighted_average(&series, day, &atl_weights), 1);
                TrainingLoadPoint {
                    ctl,
                    atl,
                    tsb: ctl - atl,
                }
            })
            .collect()
    }

    /// Training load for the `window_days` days ending at `end_date`.
    ///
    /// Days without a record count as zero TSS; records outside the window
    /// are ignored. `None` uses the configured window (42 days by default).
    pub fn calculate_training_load(
        &self,
        records: &[DailyTrainingLoad],
        end_date: NaiveDate,
        window_days: Option<u16>,
    ) -> Vec<PmcMetrics> {
        let window_days = window_days.unwrap_or(self.config.window_days);
        if window_days == 0 {
            return Vec::new();
        }

        let start_date = end_date
            .checked_sub_days(Days::new(u64::from(window_days) - 1))
            .unwrap_or(NaiveDate::MIN);

        let daily_tss = self.aggregate_daily_tss(records);
        let dates: Vec<NaiveDate> = start_date
            .iter_days()
            .take_while(|date| *date <= end_date)
            .collect();

        let daily_values: Vec<Decimal> = dates
            .iter()
            .map(|date| daily_tss.get(date).copied().unwrap_or(Decimal::ZERO))
            .collect();
        let series: Vec<f64> = daily_values
            .iter()
            .map(|value| value.to_f64().unwrap_or(0.0))
            .collect();

        tracing::debug!(
            %start_date,
            %end_date,
            days = dates.len(),
            "Calculating training load window"
        );

        dates
            .into_iter()
            .zip(daily_values)
            .zip(self.calculate_from_series(&series))
            .map(|((date, daily_tss), point)| PmcMetrics {
                date,
                daily_tss,
                ctl: point.ctl,
                atl: point.atl,
                tsb: point.tsb,
            })
            .collect()
    }
}

fn sanitize_tss(tss: f64) -> Decimal {
    to_decimal(tss)
        .filter(|value| *value > Decimal::ZERO)
        .unwrap_or(Decimal::ZERO)
}

/// `e^(-k / time_constant)` for k in 0..time_constant
fn decay_weights(time_constant: u16) -> Vec<f64> {
    let time_constant = time_constant.max(1);
    (0..time_constant)
        .map(|k| (-f64::from(k) / f64::from(time_constant)).exp())
        .collect()
}

fn weighted_average(series: &[f64], day: usize, weights: &[f64]) -> f64 {
    let lookback = weights.len().min(day + 1);
    let (weighted_sum, weight_total) = (0..lookback).fold((0.0, 0.0), |(sum, total), k| {
        (sum + series[day - k] * weights[k], total + weights[k])
    });

    // weights[0] == 1, so the total is never zero
    weighted_sum / weight_total
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, day).unwrap()
    }

    #[test]
    fn test_daily_tss_aggregation() {
        let calculator = PmcCalculator::new();
        let records = vec![
            DailyTrainingLoad { date: date(23), tss: 50.0 },
            DailyTrainingLoad { date: date(23), tss: 30.0 },
            DailyTrainingLoad { date: date(24), tss: f64::NAN },
        ];

        let daily_tss = calculator.aggregate_daily_tss(&records);

        assert_eq!(daily_tss.len(), 2);
        assert_eq!(daily_tss[&date(23)], dec!(80));
        assert_eq!(daily_tss[&date(24)], Decimal::ZERO);
    }

    #[test]
    fn test_single_day_series() {
        let calculator = PmcCalculator::new();
        let points = calculator.calculate_from_series(&[100.0]);

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].ctl, dec!(100.0));
        assert_eq!(points[0].atl, dec!(100.0));
        assert_eq!(points[0].tsb, Decimal::ZERO);

        let rest = calculator.calculate_from_series(&[0.0]);
        assert_eq!(rest[0], TrainingLoadPoint { ctl: dec!(0), atl: dec!(0), tsb: dec!(0) });
    }

    #[test]
    fn test_empty_series() {
        let calculator = PmcCalculator::new();
        assert!(calculator.calculate_from_series(&[]).is_empty());
    }

    #[test]
    fn test_two_day_weighted_average() {
        let calculator = PmcCalculator::new();
        let points = calculator.calculate_from_series(&[0.0, 100.0]);

        // CTL = 100 / (1 + e^(-1/42)) = 50.6, ATL = 100 / (1 + e^(-1/7)) = 53.6
        assert_eq!(points[1].ctl, dec!(50.6));
        assert_eq!(points[1].atl, dec!(53.6));
        assert_eq!(points[1].tsb, dec!(-3.0));
    }

    #[test]
    fn test_constant_load_converges() {
        let calculator = PmcCalculator::new();
        let points = calculator.calculate_from_series(&vec![80.0; 60]);

        for point in &points {
            assert_eq!(point.ctl, dec!(80.0));
            assert_eq!(point.atl, dec!(80.0));
            assert_eq!(point.tsb, Decimal::ZERO);
        }
    }

    #[test]
    fn test_lookback_is_bounded() {
        let calculator = PmcCalculator::new();
        // A single hard day followed by more than a week of rest drops out of ATL entirely
        let mut series = vec![200.0];
        series.extend(vec![0.0; 7]);
        let points = calculator.calculate_from_series(&series);

        assert_eq!(points[7].atl, Decimal::ZERO);
        assert!(points[7].ctl > Decimal::ZERO);
        assert!(points[7].tsb > Decimal::ZERO);
    }

    #[test]
    fn test_fatigue_responds_faster_than_fitness() {
        let calculator = PmcCalculator::new();
        let mut series = vec![50.0; 20];
        series.extend(vec![150.0; 5]);
        let points = calculator.calculate_from_series(&series);

        let last = points.last().unwrap();
        assert!(last.atl > last.ctl);
        assert!(last.tsb < Decimal::ZERO);
    }

    #[test]
    fn test_invalid_tss_counts_as_rest() {
        let calculator = PmcCalculator::new();
        let points = calculator.calculate_from_series(&[f64::NAN, -20.0, f64::INFINITY]);
        assert!(points.iter().all(|p| p.ctl == Decimal::ZERO && p.atl == Decimal::ZERO));
    }

    #[test]
    fn test_training_load_window() {
        let calculator = PmcCalculator::new();
        let records = vec![
            // outside a 7-day window ending on the 10th
            DailyTrainingLoad { date: date(1), tss: 500.0 },
            DailyTrainingLoad { date: date(5), tss: 60.0 },
            DailyTrainingLoad { date: date(5), tss: 40.0 },
            DailyTrainingLoad { date: date(10), tss: 80.0 },
        ];

        let metrics = calculator.calculate_training_load(&records, date(10), Some(7));

        assert_eq!(metrics.len(), 7);
        assert_eq!(metrics[0].date, date(4));
        assert_eq!(metrics[0].daily_tss, Decimal::ZERO);
        assert_eq!(metrics[0].ctl, Decimal::ZERO);
        assert_eq!(metrics[1].daily_tss, dec!(100));
        assert_eq!(metrics[6].date, date(10));
        assert_eq!(metrics[6].daily_tss, dec!(80));
    }

    #[test]
    fn test_default_window_is_42_days() {
        let calculator = PmcCalculator::new();
        let records = vec![DailyTrainingLoad { date: date(30), tss: 100.0 }];
        let metrics = calculator.calculate_training_load(&records, date(30), None);

        assert_eq!(metrics.len(), 42);
        assert_eq!(metrics.last().unwrap().date, date(30));
        assert!(calculator.calculate_training_load(&records, date(30), Some(0)).is_empty());
    }

    #[test]
    fn test_custom_config() {
        let calculator = PmcCalculator::with_config(PmcConfig {
            ctl_time_constant: 28,
            atl_time_constant: 5,
            ..PmcConfig::default()
        });
        let mut series = vec![0.0; 5];
        series.push(100.0);
        let points = calculator.calculate_from_series(&series);
        let default_points = PmcCalculator::new().calculate_from_series(&series);

        // Shorter time constants weigh the recent day more heavily
        assert!(points[5].atl > default_points[5].atl);
        assert!(points[5].ctl > default_points[5].ctl);
    }

    #[test]
    fn test_tsb_interpretation() {
        assert_eq!(TsbInterpretation::from_tsb(dec!(30)), TsbInterpretation::VeryFresh);
        assert_eq!(TsbInterpretation::from_tsb(dec!(10)), TsbInterpretation::Fresh);
        assert_eq!(TsbInterpretation::from_tsb(dec!(0)), TsbInterpretation::Neutral);
        assert_eq!(TsbInterpretation::from_tsb(dec!(-20)), TsbInterpretation::Fatigued);
        assert_eq!(TsbInterpretation::from_tsb(dec!(-40)), TsbInterpretation::VeryFatigued);
        assert!(TsbInterpretation::Fresh.description().contains("racing"));
    }
}
