// Library interface for wattlab
// Cycling performance calculations: critical power, FTP, zones, workout load and fitness/fatigue

pub mod config;
pub mod error;
pub mod ftp;
pub mod logging;
pub mod models;
mod numeric;
pub mod pmc;
pub mod power;
pub mod tss;
pub mod zones;

// Re-export commonly used types for convenience
pub use config::EngineConfig;
pub use error::{EngineError, ErrorKind, ErrorSeverity, RangeWarning, Result};
pub use ftp::{
    validate_ftp, validate_ftp_with_config, EstimatorConfig, FtpEstimator, FtpSource, FtpTest,
    ValidatedFtp, ValidationConfig,
};
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use pmc::{PmcCalculator, PmcConfig, PmcMetrics, TrainingLoadPoint, TsbInterpretation};
pub use power::{CriticalPowerModel, PowerAnalyzer};
pub use tss::{WorkoutMetrics, WorkoutMetricsCalculator};
pub use zones::ZoneCalculator;
