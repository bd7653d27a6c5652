use tracing::debug;

use crate::hwmon::{Fetcher, HwmonType};
use crate::platform::{ChipTemperature, Control, DeviceInfo, MeasurementConfig, PowerMeasurement};
use crate::{DeviceError, DeviceResult};

const POWER_CHANNEL: usize = 0;
const TS0_CHANNEL: usize = 0;
const TS1_CHANNEL: usize = 1;

mod item {
    pub const AVERAGE: &str = "average";
    pub const AVERAGE_LOWEST: &str = "average_lowest";
    pub const AVERAGE_HIGHEST: &str = "average_highest";
    pub const AVERAGE_INTERVAL: &str = "average_interval";
    pub const ENABLE: &str = "enable";
    pub const INPUT: &str = "input";
}

/// An NPU device opened through sysfs, measured by its hwmon sensors.
#[derive(Debug, Clone)]
pub struct SysfsDevice {
    info: DeviceInfo,
    fetcher: Fetcher,
    measuring: bool,
}

impl SysfsDevice {
    pub(crate) fn new(info: DeviceInfo, fetcher: Fetcher) -> Self {
        Self {
            info,
            fetcher,
            measuring: false,
        }
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Returns the hwmon fetcher of the device.
    pub fn hwmon_fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn is_measuring(&self) -> bool {
        self.measuring
    }

    fn set_power_enable(&self, enable: bool) -> DeviceResult<()> {
        let written = self.fetcher.write_value(
            HwmonType::Power,
            POWER_CHANNEL,
            item::ENABLE,
            i64::from(enable),
        )?;
        if !written {
            debug!("{}: power enable is not exposed by the driver", self.info.name());
        }
        Ok(())
    }
}

fn micro_to_unit(value: i64) -> f64 {
    value as f64 / 1_000_000.0
}

fn milli_to_unit(value: i64) -> f64 {
    value as f64 / 1000.0
}

impl Control for SysfsDevice {
    fn stop_power_measurement(&mut self) -> DeviceResult<()> {
        debug!("{}: stop power measurement", self.info.name());
        self.set_power_enable(false)?;
        self.measuring = false;
        Ok(())
    }

    fn set_power_measurement(&mut self, config: &MeasurementConfig) -> DeviceResult<()> {
        if self.measuring {
            return Err(DeviceError::measurement_active(self.info.name()));
        }

        let interval_ms = i64::try_from(config.averaging_interval.as_millis())
            .map_err(|_| DeviceError::unexpected_value("averaging interval is too long"))?;
        debug!(
            "{}: set power measurement, averaging interval {interval_ms}ms",
            self.info.name()
        );
        let written = self.fetcher.write_value(
            HwmonType::Power,
            POWER_CHANNEL,
            item::AVERAGE_INTERVAL,
            interval_ms,
        )?;
        if !written {
            debug!(
                "{}: averaging interval is not exposed by the driver",
                self.info.name()
            );
        }
        Ok(())
    }

    fn start_power_measurement(&mut self) -> DeviceResult<()> {
        debug!("{}: start power measurement", self.info.name());
        self.set_power_enable(true)?;
        self.measuring = true;
        Ok(())
    }

    fn get_power_measurement(&mut self) -> DeviceResult<PowerMeasurement> {
        if !self.measuring {
            return Err(DeviceError::measurement_inactive(self.info.name()));
        }

        let fetcher = &self.fetcher;
        let average = fetcher.read_value(HwmonType::Power, POWER_CHANNEL, item::AVERAGE)?;
        let lowest =
            fetcher.read_optional_value(HwmonType::Power, POWER_CHANNEL, item::AVERAGE_LOWEST)?;
        let highest =
            fetcher.read_optional_value(HwmonType::Power, POWER_CHANNEL, item::AVERAGE_HIGHEST)?;

        Ok(PowerMeasurement {
            average_value: micro_to_unit(average),
            min_value: lowest.map(micro_to_unit),
            max_value: highest.map(micro_to_unit),
        })
    }

    fn get_chip_temperature(&mut self) -> DeviceResult<ChipTemperature> {
        let fetcher = &self.fetcher;
        let ts0 = fetcher.read_value(HwmonType::Temperature, TS0_CHANNEL, item::INPUT)?;
        let ts1 = fetcher.read_optional_value(HwmonType::Temperature, TS1_CHANNEL, item::INPUT)?;

        Ok(ChipTemperature {
            ts0_temperature: milli_to_unit(ts0),
            ts1_temperature: ts1.map(milli_to_unit),
        })
    }
}
