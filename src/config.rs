use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Every tunable of spec §6, as a plain struct with named fields and a
/// `Default` impl — matching the small config structs in `abstutil` (e.g.
/// `WeightedUsizeChoice`) rather than a builder.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub min_green: f64,
    pub max_green: f64,
    pub clearance_rate: f64,
    pub exit_capacity_default: u32,
    pub wait_boost: f64,
    pub starvation_limit: u32,
    pub ambulance_safety_margin: f64,
    pub reaction_margin: f64,
    /// Informational only: communicated to actuators, never read by the
    /// core's decision logic (spec §6).
    pub yellow_time: f64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            min_green: 3.0,
            max_green: 15.0,
            clearance_rate: 3.0,
            exit_capacity_default: 20,
            wait_boost: 0.4,
            starvation_limit: 8,
            ambulance_safety_margin: 1.5,
            reaction_margin: 0.5,
            yellow_time: 3.0,
        }
    }
}

impl Config {
    /// Checked construction for configs loaded from outside the process
    /// (the demo harness's config file). The library's own `Default::default()`
    /// path is always valid and never needs this.
    pub fn validate(self) -> Result<Config, ConfigError> {
        if !(self.min_green > 0.0) {
            return Err(ConfigError::new("min_green must be positive"));
        }
        if self.max_green < self.min_green {
            return Err(ConfigError::new("max_green must be >= min_green"));
        }
        if !(self.clearance_rate > 0.0) {
            return Err(ConfigError::new("clearance_rate must be positive"));
        }
        if self.exit_capacity_default == 0 {
            return Err(ConfigError::new("exit_capacity_default must be > 0"));
        }
        if self.wait_boost < 0.0 {
            return Err(ConfigError::new("wait_boost must be non-negative"));
        }
        if self.ambulance_safety_margin < 0.0 {
            return Err(ConfigError::new("ambulance_safety_margin must be non-negative"));
        }
        if self.reaction_margin < 0.0 {
            return Err(ConfigError::new("reaction_margin must be non-negative"));
        }
        Ok(self)
    }
}
