//! A diagnostic tool to watch the power draw and chip temperature of NPU devices.
//!
//! [`run_periodic`] discovers the devices of a [`Platform`], restarts the power
//! measurement on each of them and prints one reading per device at a fixed
//! interval until interrupted:
//!
//! ```text
//! [0000:6d:00.0] 12.346W 45.678C
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use npu_power_monitor::{run_periodic, MonitorConfig, Shutdown, SysfsPlatform};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> eyre::Result<()> {
//! let config = MonitorConfig::from_env()?;
//! let platform = SysfsPlatform::with_roots(&config.devfs, &config.sysfs);
//! let shutdown = Shutdown::on_interrupt()?;
//! run_periodic(&platform, &config, &mut std::io::stdout(), shutdown).await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`SysfsPlatform`] reads the devices from devfs and sysfs. Any other binding can
//! be monitored by implementing [`Platform`] and [`Control`].

pub use crate::config::{MonitorConfig, DEFAULT_DELAY};
pub use crate::device::SysfsDevice;
pub use crate::error::{DeviceError, DeviceResult};
pub use crate::list::SysfsPlatform;
pub use crate::monitor::{run_periodic, PollingMonitor, Reading};
pub use crate::platform::{
    ChipTemperature, Control, DeviceInfo, MeasurementConfig, Platform, PowerMeasurement,
};
pub use crate::shutdown::{Shutdown, ShutdownTrigger};

pub mod config;
mod devfs;
mod device;
mod error;
pub mod hwmon;
mod list;
mod monitor;
mod platform;
pub mod shutdown;
mod sysfs;
