use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use crate::DeviceResult;

/// Identity of a discovered device.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct DeviceInfo {
    index: u8,
    busname: String,
}

impl DeviceInfo {
    pub fn new<S: ToString>(index: u8, busname: S) -> Self {
        Self {
            index,
            busname: busname.to_string(),
        }
    }

    /// Returns the device index, e.g. `0` for `npu0`.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Returns the PCI bus name (BDF) of the device.
    pub fn busname(&self) -> &str {
        &self.busname
    }

    /// Returns the device name, e.g. `npu0`.
    pub fn name(&self) -> String {
        format!("npu{}", self.index)
    }
}

impl Display for DeviceInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.busname)
    }
}

/// Parameters handed to [`Control::set_power_measurement`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MeasurementConfig {
    pub averaging_interval: Duration,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            averaging_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct PowerMeasurement {
    /// Average power in watts.
    pub average_value: f64,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ChipTemperature {
    /// Temperature of the first on-chip sensor in degrees Celsius.
    pub ts0_temperature: f64,
    pub ts1_temperature: Option<f64>,
}

/// Control surface of an open device.
pub trait Control {
    /// Stops the power measurement and resets its accumulators.
    fn stop_power_measurement(&mut self) -> DeviceResult<()>;

    /// Configures the power measurement. The measurement must be stopped.
    fn set_power_measurement(&mut self, config: &MeasurementConfig) -> DeviceResult<()>;

    fn start_power_measurement(&mut self) -> DeviceResult<()>;

    fn get_power_measurement(&mut self) -> DeviceResult<PowerMeasurement>;

    fn get_chip_temperature(&mut self) -> DeviceResult<ChipTemperature>;
}

/// A binding to the devices of a system.
pub trait Platform {
    type Device: Control;

    /// Lists the available devices, sorted by their index.
    fn scan(&self) -> DeviceResult<Vec<DeviceInfo>>;

    fn open(&self, info: &DeviceInfo) -> DeviceResult<Self::Device>;
}
