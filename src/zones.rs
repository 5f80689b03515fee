use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{EngineError, Result};
use crate::ftp::ValidationConfig;
use crate::models::{HeartRateZone, HeartRateZoneSet, PowerZone, PowerZoneSet};
use crate::numeric::{positive_decimal, round_to_u16, round_to_u32, to_decimal};

/// Power zone upper bounds as fractions of FTP; zone 7 has no upper bound
///
/// - Z1: 0-55% FTP (Active Recovery)
/// - Z2: 56-75% FTP (Endurance)
/// - Z3: 76-90% FTP (Tempo)
/// - Z4: 91-105% FTP (Lactate Threshold)
/// - Z5: 106-120% FTP (VO2 Max)
/// - Z6: 121-150% FTP (Anaerobic Capacity)
/// - Z7: > 150% FTP (Neuromuscular Power)
const POWER_ZONES: [(&str, &str, Option<Decimal>); 7] = [
    ("Active Recovery", "0-55%", Some(dec!(0.55))),
    ("Endurance", "56-75%", Some(dec!(0.75))),
    ("Tempo", "76-90%", Some(dec!(0.90))),
    ("Lactate Threshold", "91-105%", Some(dec!(1.05))),
    ("VO2 Max", "106-120%", Some(dec!(1.20))),
    ("Anaerobic Capacity", "121-150%", Some(dec!(1.50))),
    ("Neuromuscular Power", ">150%", None),
];

/// Upper bound of zone 6, the highest bound that must be representable
const TOP_BOUNDED_ZONE: Decimal = dec!(1.50);

/// Heart rate zones as (lower, upper) fractions of heart-rate reserve
const HEART_RATE_ZONES: [(&str, Decimal, Decimal); 5] = [
    ("Recovery", dec!(0.50), dec!(0.60)),
    ("Aerobic Endurance", dec!(0.60), dec!(0.70)),
    ("Tempo", dec!(0.70), dec!(0.80)),
    ("Lactate Threshold", dec!(0.80), dec!(0.90)),
    ("VO2 Max", dec!(0.90), dec!(1.00)),
];

/// Zone calculation utilities
pub struct ZoneCalculator;

impl ZoneCalculator {
    /// Calculate the seven power zones for an FTP.
    ///
    /// An unusable FTP (NaN, infinite, zero, negative, or so large that the
    /// zone bounds no longer fit in `u32` watts) is replaced by the default
    /// fallback of 200 W and `substituted_default` is set on the result.
    pub fn calculate_power_zones(ftp: f64) -> PowerZoneSet {
        Self::calculate_power_zones_with_config(ftp, &ValidationConfig::default())
    }

    pub fn calculate_power_zones_with_config(ftp: f64, config: &ValidationConfig) -> PowerZoneSet {
        let (ftp_decimal, substituted_default) = match Self::zone_ftp(ftp) {
            Some(value) => (value, false),
            None => {
                tracing::debug!(
                    ftp,
                    fallback = config.zone_fallback_ftp,
                    "Substituting fallback FTP for power zones"
                );
                (Decimal::from(config.zone_fallback_ftp), true)
            }
        };

        let mut zones = Vec::with_capacity(POWER_ZONES.len());
        let mut min_watts: u32 = 0;

        for (index, &(name, label, upper)) in POWER_ZONES.iter().enumerate() {
            // Rounded bounds can collapse for tiny FTPs; never let a max fall below its min
            let max_watts =
                upper.map(|pct| Self::calculate_percentage(ftp_decimal, pct).max(min_watts));

            zones.push(PowerZone {
                number: index as u8 + 1,
                name: name.to_string(),
                min_watts,
                max_watts,
                percent_ftp_label: label.to_string(),
            });

            if let Some(max) = max_watts {
                min_watts = max + 1;
            }
        }

        PowerZoneSet {
            ftp_watts: round_to_u32(ftp_decimal).unwrap_or(0),
            substituted_default,
            zones,
        }
    }

    /// Calculate five heart rate zones from heart-rate reserve (Karvonen).
    ///
    /// Each zone after the first starts 1 bpm above the previous zone's
    /// maximum, and zone 5 ends exactly at max HR. A reserve too small to
    /// give every zone at least one bpm fails with `ModelPrecondition`.
    pub fn calculate_heart_rate_zones(max_hr: f64, resting_hr: f64) -> Result<HeartRateZoneSet> {
        const CALCULATION: &str = "heart rate zones";

        let max = positive_decimal(max_hr)
            .ok_or_else(|| EngineError::invalid_input(CALCULATION, "max_hr", max_hr))?;
        let resting = positive_decimal(resting_hr)
            .ok_or_else(|| EngineError::invalid_input(CALCULATION, "resting_hr", resting_hr))?;

        if max <= resting {
            return Err(EngineError::precondition(
                CALCULATION,
                format!(
                    "max HR ({}) must be greater than resting HR ({})",
                    max, resting
                ),
            ));
        }

        let reserve = max - resting;
        let to_bpm = |value: Decimal, parameter: &str| {
            round_to_u16(value)
                .ok_or_else(|| EngineError::invalid_input(CALCULATION, parameter, value))
        };
        let max_bpm_total = to_bpm(max, "max_hr")?;
        let last_zone = HEART_RATE_ZONES.len() - 1;

        let mut zones = Vec::with_capacity(HEART_RATE_ZONES.len());
        let mut previous_max: Option<u16> = None;

        for (index, &(name, lower, upper)) in HEART_RATE_ZONES.iter().enumerate() {
            let min_bpm = match previous_max {
                Some(prev) => prev.saturating_add(1),
                None => to_bpm(resting + reserve * lower, "min_bpm")?,
            };
            let max_bpm = if index == last_zone {
                max_bpm_total
            } else {
                to_bpm(resting + reserve * upper, "max_bpm")?.max(min_bpm)
            };

            if min_bpm > max_bpm {
                return Err(EngineError::precondition(
                    CALCULATION,
                    format!(
                        "heart rate reserve of {} bpm is too small for {} distinct zones",
                        reserve,
                        HEART_RATE_ZONES.len()
                    ),
                ));
            }

            zones.push(HeartRateZone {
                number: index as u8 + 1,
                name: name.to_string(),
                min_bpm,
                max_bpm,
            });
            previous_max = Some(max_bpm);
        }

        Ok(HeartRateZoneSet {
            max_hr: max_bpm_total,
            resting_hr: to_bpm(resting, "resting_hr")?,
            heart_rate_reserve: to_bpm(reserve, "heart_rate_reserve")?,
            zones,
        })
    }

    /// Any finite FTP above zero whose highest bounded zone still fits in `u32`.
    /// FTPs below the import precision become zero and yield zero-width zones.
    fn zone_ftp(ftp: f64) -> Option<Decimal> {
        if !(ftp.is_finite() && ftp > 0.0) {
            return None;
        }
        let value = to_decimal(ftp)?;
        let top = value.checked_mul(TOP_BOUNDED_ZONE).and_then(round_to_u32)?;
        (top < u32::MAX).then_some(value)
    }

    fn calculate_percentage(value: Decimal, percentage: Decimal) -> u32 {
        round_to_u32(value * percentage).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn test_power_zones_calculation() {
        let zones = ZoneCalculator::calculate_power_zones(250.0);
        assert!(!zones.substituted_default);
        assert_eq!(zones.ftp_watts, 250);

        let bounds: Vec<(u32, Option<u32>)> =
            zones.zones.iter().map(|z| (z.min_watts, z.max_watts)).collect();
        assert_eq!(
            bounds,
            vec![
                (0, Some(138)),   // 250 * 0.55 = 137.5 -> 138
                (139, Some(188)), // 250 * 0.75 = 187.5 -> 188
                (189, Some(225)),
                (226, Some(263)), // 262.5 -> 263
                (264, Some(300)),
                (301, Some(375)),
                (376, None),
            ]
        );
        assert_eq!(zones.zones[3].percent_ftp_label, "91-105%");
    }

    #[test]
    fn test_invalid_ftp_uses_fallback() {
        for ftp in [0.0, -20.0, f64::NAN, f64::NEG_INFINITY] {
            let zones = ZoneCalculator::calculate_power_zones(ftp);
            assert!(zones.substituted_default);
            assert_eq!(zones.ftp_watts, 200);
            assert_eq!(zones.zones[0].max_watts, Some(110));
            assert_eq!(zones.zones[6].min_watts, 301);
        }
    }

    #[test]
    fn test_tiny_ftp_stays_monotonic() {
        let zones = ZoneCalculator::calculate_power_zones(1.0);
        for pair in zones.zones.windows(2) {
            let max = pair[0].max_watts.unwrap();
            assert!(pair[0].min_watts <= max);
            assert_eq!(max + 1, pair[1].min_watts);
        }
    }

    #[test]
    fn test_positive_ftp_below_import_precision_is_kept() {
        let zones = ZoneCalculator::calculate_power_zones(1e-10);
        assert!(!zones.substituted_default);
        assert_eq!(zones.ftp_watts, 0);
        assert_eq!(zones.zones[0].max_watts, Some(0));
        assert_eq!(zones.zones[6].min_watts, 6);
    }

    #[test]
    fn test_large_ftp_bounds_stay_contiguous() {
        let zones = ZoneCalculator::calculate_power_zones(50_000.0);
        assert!(!zones.substituted_default);
        assert_eq!(zones.ftp_watts, 50_000);
        assert_eq!(zones.zones[5].max_watts, Some(75_000));
        assert_eq!(zones.zones[6].min_watts, 75_001);

        // 1.5 * 3e9 no longer fits in u32 watts
        let zones = ZoneCalculator::calculate_power_zones(3.0e9);
        assert!(zones.substituted_default);
        assert_eq!(zones.ftp_watts, 200);
    }

    #[test]
    fn test_power_zone_lookup() {
        let zones = ZoneCalculator::calculate_power_zones(250.0);
        assert_eq!(zones.zone_for(100).unwrap().number, 1);
        assert_eq!(zones.zone_for(138).unwrap().number, 1);
        assert_eq!(zones.zone_for(139).unwrap().number, 2);
        assert_eq!(zones.zone_for(250).unwrap().number, 4);
        assert_eq!(zones.zone_for(1200).unwrap().number, 7);
    }

    #[test]
    fn test_heart_rate_zones() {
        let zones = ZoneCalculator::calculate_heart_rate_zones(180.0, 60.0).unwrap();
        assert_eq!(zones.heart_rate_reserve, 120);

        let bounds: Vec<(u16, u16)> = zones.zones.iter().map(|z| (z.min_bpm, z.max_bpm)).collect();
        assert_eq!(
            bounds,
            vec![(120, 132), (133, 144), (145, 156), (157, 168), (169, 180)]
        );
    }

    #[test]
    fn test_heart_rate_zones_do_not_overlap() {
        let zones = ZoneCalculator::calculate_heart_rate_zones(193.0, 47.0).unwrap();
        for pair in zones.zones.windows(2) {
            assert_eq!(pair[0].max_bpm + 1, pair[1].min_bpm);
        }
        assert_eq!(zones.zones[4].max_bpm, 193);
        assert_eq!(zones.zone_for(140).unwrap().number, 2);
        assert_eq!(zones.zone_for(150).unwrap().number, 3);
        assert!(zones.zone_for(100).is_none());
    }

    #[test]
    fn test_heart_rate_zone_failures() {
        let err = ZoneCalculator::calculate_heart_rate_zones(60.0, 60.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelPrecondition);

        let err = ZoneCalculator::calculate_heart_rate_zones(150.0, 170.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelPrecondition);

        let err = ZoneCalculator::calculate_heart_rate_zones(f64::NAN, 60.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = ZoneCalculator::calculate_heart_rate_zones(180.0, 0.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_small_heart_rate_reserve() {
        // 9 bpm is the smallest reserve above 60 bpm that fits five zones
        let zones = ZoneCalculator::calculate_heart_rate_zones(69.0, 60.0).unwrap();
        let bounds: Vec<(u16, u16)> = zones.zones.iter().map(|z| (z.min_bpm, z.max_bpm)).collect();
        assert_eq!(bounds, vec![(65, 65), (66, 66), (67, 67), (68, 68), (69, 69)]);

        for max_hr in [61.0, 65.0, 68.0] {
            let err = ZoneCalculator::calculate_heart_rate_zones(max_hr, 60.0).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ModelPrecondition);
        }
    }

    proptest! {
        #[test]
        fn test_power_zones_are_contiguous(
            ftp in prop_oneof![1e-12f64..1.0f64, 1.0f64..2000.0f64, 2000.0f64..2.0e9f64]
        ) {
            let zones = ZoneCalculator::calculate_power_zones(ftp);

            prop_assert!(!zones.substituted_default);
            prop_assert_eq!(zones.zones.len(), 7);
            prop_assert_eq!(zones.zones[0].min_watts, 0);
            prop_assert!(zones.zones[6].max_watts.is_none());
            for pair in zones.zones.windows(2) {
                let max = pair[0].max_watts.unwrap();
                prop_assert_eq!(max + 1, pair[1].min_watts);
                prop_assert!(pair[0].min_watts <= max);
            }
        }

        #[test]
        fn test_heart_rate_zones_end_at_max(resting in 35u16..90u16, reserve in 1u16..150u16) {
            let max = resting + reserve;
            let result =
                ZoneCalculator::calculate_heart_rate_zones(f64::from(max), f64::from(resting));

            match result {
                Ok(zones) => {
                    prop_assert_eq!(zones.zones.len(), 5);
                    prop_assert_eq!(zones.zones[4].max_bpm, max);
                    for zone in &zones.zones {
                        prop_assert!(zone.min_bpm <= zone.max_bpm);
                    }
                    for pair in zones.zones.windows(2) {
                        prop_assert_eq!(pair[0].max_bpm + 1, pair[1].min_bpm);
                    }
                }
                Err(err) => {
                    prop_assert_eq!(err.kind(), ErrorKind::ModelPrecondition);
                    prop_assert!(reserve < 10);
                }
            }
        }
    }
}
