use std::fmt::{self, Display, Formatter};
use std::io::Write;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::platform::{Control, DeviceInfo, Platform};
use crate::shutdown::Shutdown;
use crate::{DeviceError, DeviceResult};

/// A single power and temperature sample of a device.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Reading {
    pub power_watts: f64,
    pub temperature_celsius: f64,
}

impl Display for Reading {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3}W {:.3}C",
            self.power_watts, self.temperature_celsius
        )
    }
}

struct MonitoredDevice<D> {
    info: DeviceInfo,
    handle: D,
}

impl<D: Control> MonitoredDevice<D> {
    fn read(&mut self) -> DeviceResult<Reading> {
        let power = self.handle.get_power_measurement()?;
        let temperature = self.handle.get_chip_temperature()?;

        Ok(Reading {
            power_watts: power.average_value,
            temperature_celsius: temperature.ts0_temperature,
        })
    }
}

/// Polls the power draw and chip temperature of every discovered device.
///
/// Devices are read one after another in discovery order, each read preceded
/// by a sleep of the configured delay.
pub struct PollingMonitor<D> {
    devices: Vec<MonitoredDevice<D>>,
    delay: Duration,
}

impl<D: Control> PollingMonitor<D> {
    /// Discovers the devices of `platform` and starts the power measurement on each.
    ///
    /// Fails if no device is found. A failure on any device aborts the start.
    pub fn start<P>(platform: &P, config: &MonitorConfig) -> DeviceResult<Self>
    where
        P: Platform<Device = D>,
    {
        config.validate()?;

        let infos = platform.scan().map_err(DeviceError::discovery_error)?;
        if infos.is_empty() {
            return Err(DeviceError::NoDeviceFound);
        }

        let mut devices = Vec::with_capacity(infos.len());
        for info in infos {
            let mut handle = platform.open(&info)?;
            // stop first so that the accumulators are reset by the reconfiguration
            handle.stop_power_measurement()?;
            handle.set_power_measurement(&config.measurement)?;
            handle.start_power_measurement()?;
            info!("{} ({info}): power measurement started", info.name());

            devices.push(MonitoredDevice { info, handle });
        }

        Ok(Self {
            devices,
            delay: config.delay,
        })
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceInfo> {
        self.devices.iter().map(|device| &device.info)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Prints a reading of each device in turn until `shutdown` fires.
    ///
    /// Each line is terminated by a carriage return so that the next one
    /// overwrites it. Returns `Ok` once cancelled; a failed read ends the loop
    /// with its error.
    pub async fn run_loop<W: Write>(
        &mut self,
        out: &mut W,
        shutdown: &mut Shutdown,
    ) -> DeviceResult<()> {
        if self.devices.is_empty() {
            shutdown.triggered().await;
            return Ok(());
        }

        let delay = self.delay;
        loop {
            for device in self.devices.iter_mut() {
                if shutdown.is_triggered() {
                    return Ok(());
                }

                tokio::select! {
                    biased;
                    _ = shutdown.triggered() => return Ok(()),
                    _ = tokio::time::sleep(delay) => {}
                }

                let reading = device.read()?;
                write!(out, "[{}] {reading}\r", device.info)?;
                out.flush()?;
            }
        }
    }

    /// Stops the power measurement of every device, once each.
    ///
    /// A failing device does not keep the others from being stopped; the
    /// failures are returned.
    pub fn stop_all(&mut self) -> Vec<DeviceError> {
        let mut failures = vec![];
        for device in self.devices.iter_mut() {
            match device.handle.stop_power_measurement() {
                Ok(()) => debug!("{}: power measurement stopped", device.info.name()),
                Err(e) => {
                    warn!("{}: failed to stop power measurement: {e}", device.info.name());
                    failures.push(e);
                }
            }
        }
        failures
    }
}

/// Starts the measurement on every device, prints readings until `shutdown`
/// fires, then stops the measurement.
///
/// The measurement is stopped only on cancellation. Errors from the start or
/// from a read are returned as they are.
pub async fn run_periodic<P, W>(
    platform: &P,
    config: &MonitorConfig,
    out: &mut W,
    mut shutdown: Shutdown,
) -> DeviceResult<()>
where
    P: Platform,
    W: Write,
{
    let mut monitor = PollingMonitor::start(platform, config)?;
    monitor.run_loop(out, &mut shutdown).await?;

    let res = writeln!(out, "\nReceived keyboard interrupt, exiting").and_then(|_| out.flush());
    let failures = monitor.stop_all();
    if !failures.is_empty() {
        warn!("{} device(s) failed to stop", failures.len());
    }

    Ok(res?)
}
