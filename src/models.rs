use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Self-reported training level, used by the weight heuristic and FTP defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AthleteLevel {
    Beginner,
    Intermediate,
    Advanced,
    Elite,
}

impl AthleteLevel {
    /// Average sustainable watts per kilogram at threshold for this level
    pub fn average_watts_per_kg(&self) -> Decimal {
        match self {
            AthleteLevel::Beginner => dec!(2.0),
            AthleteLevel::Intermediate => dec!(3.0),
            AthleteLevel::Advanced => dec!(4.0),
            AthleteLevel::Elite => dec!(5.2),
        }
    }

    /// FTP assumed when nothing better is known
    pub fn default_ftp(&self) -> u16 {
        match self {
            AthleteLevel::Beginner => 150,
            AthleteLevel::Intermediate => 200,
            AthleteLevel::Advanced => 250,
            AthleteLevel::Elite => 300,
        }
    }
}

impl std::str::FromStr for AthleteLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(AthleteLevel::Beginner),
            "intermediate" => Ok(AthleteLevel::Intermediate),
            "advanced" => Ok(AthleteLevel::Advanced),
            "elite" | "pro" => Ok(AthleteLevel::Elite),
            _ => Err(format!("Invalid athlete level: {}", s)),
        }
    }
}

/// Optional athlete context for FTP validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    /// Body weight in kilograms
    pub weight_kg: Option<f64>,

    /// Training level, if known
    pub level: Option<AthleteLevel>,
}

impl AthleteProfile {
    pub fn new(weight_kg: f64, level: AthleteLevel) -> Self {
        AthleteProfile {
            weight_kg: Some(weight_kg),
            level: Some(level),
        }
    }
}

/// Heart-rate measurements used for the heart-rate-derived FTP estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateProfile {
    pub max_hr: f64,
    pub resting_hr: f64,
    pub weight_kg: f64,

    /// Lactate threshold heart rate, preferred when present
    pub lthr: Option<f64>,

    /// VO2max in ml/kg/min
    pub vo2max: Option<f64>,
}

/// A maximal sustained effort
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceTest {
    pub duration_seconds: u32,
    pub average_power_watts: f64,
}

impl PerformanceTest {
    pub fn new(duration_seconds: u32, average_power_watts: f64) -> Self {
        PerformanceTest {
            duration_seconds,
            average_power_watts,
        }
    }
}

/// How an FTP value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FtpMethod {
    TwentyMinute,
    EightMinute,
    FiveMinute,
    OneMinute,
    Ramp,
    CriticalPower,
    WeightLevel,
    HeartRate,
}

impl FtpMethod {
    /// Get description of this FTP method
    pub fn description(&self) -> &'static str {
        match self {
            FtpMethod::TwentyMinute => "95% of 20-minute power",
            FtpMethod::EightMinute => "Fraction of 8-minute power",
            FtpMethod::FiveMinute => "Fraction of 5-minute power",
            FtpMethod::OneMinute => "Fraction of 1-minute power",
            FtpMethod::Ramp => "Fraction of ramp test peak minute",
            FtpMethod::CriticalPower => "97% of critical power",
            FtpMethod::WeightLevel => "Body weight and training level",
            FtpMethod::HeartRate => "Heart rate thresholds",
        }
    }
}

/// A single FTP estimation result; history is kept by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtpEstimate {
    pub value_watts: u16,
    pub method: FtpMethod,
    pub timestamp: DateTime<Utc>,
}

impl FtpEstimate {
    pub fn new(value_watts: u16, method: FtpMethod) -> Self {
        FtpEstimate {
            value_watts,
            method,
            timestamp: Utc::now(),
        }
    }
}

/// One power zone; `max_watts == None` means no upper bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerZone {
    pub number: u8,
    pub name: String,
    pub min_watts: u32,
    pub max_watts: Option<u32>,
    pub percent_ftp_label: String,
}

impl PowerZone {
    /// Upper bound as a float, `f64::INFINITY` for the open top zone
    pub fn upper_bound(&self) -> f64 {
        self.max_watts.map_or(f64::INFINITY, f64::from)
    }

    pub fn contains(&self, watts: u32) -> bool {
        watts >= self.min_watts && self.max_watts.map_or(true, |max| watts <= max)
    }
}

/// Seven contiguous power zones derived from one FTP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerZoneSet {
    /// FTP the zones were computed from
    pub ftp_watts: u32,

    /// True when the supplied FTP was unusable and the fallback was applied
    pub substituted_default: bool,

    pub zones: Vec<PowerZone>,
}

impl PowerZoneSet {
    /// Determine which power zone a given power falls into
    pub fn zone_for(&self, watts: u32) -> Option<&PowerZone> {
        self.zones.iter().find(|zone| zone.contains(watts))
    }
}

/// One heart-rate zone, bounds inclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateZone {
    pub number: u8,
    pub name: String,
    pub min_bpm: u16,
    pub max_bpm: u16,
}

/// Five non-overlapping heart-rate reserve zones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateZoneSet {
    pub max_hr: u16,
    pub resting_hr: u16,
    pub heart_rate_reserve: u16,
    pub zones: Vec<HeartRateZone>,
}

impl HeartRateZoneSet {
    /// Determine which heart-rate zone a given HR falls into.
    /// Values below zone 1 or above max HR have no zone.
    pub fn zone_for(&self, bpm: u16) -> Option<&HeartRateZone> {
        self.zones
            .iter()
            .find(|zone| bpm >= zone.min_bpm && bpm <= zone.max_bpm)
    }
}

/// Interval categories of a structured workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalType {
    Warmup,
    Work,
    Recovery,
    Cooldown,
    Steady,
}

/// One step of a structured workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutInterval {
    pub interval_type: IntervalType,
    pub duration_seconds: u32,
    pub target_power_watts: u16,

    /// Rest after the interval; counted in duration, not in intensity
    #[serde(default)]
    pub rest_duration_seconds: Option<u32>,
}

impl WorkoutInterval {
    pub fn new(
        interval_type: IntervalType,
        duration_seconds: u32,
        target_power_watts: u16,
    ) -> Self {
        WorkoutInterval {
            interval_type,
            duration_seconds,
            target_power_watts,
            rest_duration_seconds: None,
        }
    }

    pub fn with_rest(mut self, rest_duration_seconds: u32) -> Self {
        self.rest_duration_seconds = Some(rest_duration_seconds);
        self
    }
}

/// Training stress recorded on one day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTrainingLoad {
    pub date: NaiveDate,
    pub tss: f64,
}
