use std::num::ParseIntError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use env::EnvBuilder;

use crate::platform::MeasurementConfig;
use crate::{DeviceError, DeviceResult};

mod env;

/// Delay between two consecutive device reads.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Environment variables read by [`MonitorConfig::from_env`].
pub mod vars {
    pub const DELAY_MS: &str = "NPU_MONITOR_DELAY_MS";
    pub const AVERAGING_INTERVAL_MS: &str = "NPU_MONITOR_AVERAGING_INTERVAL_MS";
    pub const DEVFS: &str = "NPU_MONITOR_DEVFS";
    pub const SYSFS: &str = "NPU_MONITOR_SYSFS";
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
struct Millis(Duration);

impl FromStr for Millis {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(|ms| Millis(Duration::from_millis(ms)))
    }
}

/// Settings of a [`PollingMonitor`](crate::PollingMonitor).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MonitorConfig {
    /// Sleep before each device read.
    pub delay: Duration,
    pub measurement: MeasurementConfig,
    pub devfs: PathBuf,
    pub sysfs: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            measurement: MeasurementConfig::default(),
            devfs: PathBuf::from("/dev"),
            sysfs: PathBuf::from("/sys"),
        }
    }
}

impl MonitorConfig {
    /// Builds a config from the `NPU_MONITOR_*` environment variables, falling
    /// back to the defaults for unset ones.
    pub fn from_env() -> DeviceResult<Self> {
        let default = Self::default();

        let Millis(delay) = EnvBuilder::new()
            .or_env(vars::DELAY_MS)
            .or(Millis(default.delay))
            .build()?;
        let Millis(averaging_interval) = EnvBuilder::new()
            .or_env(vars::AVERAGING_INTERVAL_MS)
            .or(Millis(default.measurement.averaging_interval))
            .build()?;
        let devfs = EnvBuilder::new()
            .or_env(vars::DEVFS)
            .or(default.devfs)
            .build()?;
        let sysfs = EnvBuilder::new()
            .or_env(vars::SYSFS)
            .or(default.sysfs)
            .build()?;

        let config = Self {
            delay,
            measurement: MeasurementConfig { averaging_interval },
            devfs,
            sysfs,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn validate(&self) -> DeviceResult<()> {
        if self.delay.is_zero() {
            return Err(DeviceError::config_error(
                vars::DELAY_MS,
                "delay must be greater than zero",
            ));
        }
        if self.measurement.averaging_interval.is_zero() {
            return Err(DeviceError::config_error(
                vars::AVERAGING_INTERVAL_MS,
                "averaging interval must be greater than zero",
            ));
        }
        Ok(())
    }
}
