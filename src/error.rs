use std::fmt::Display;
use std::io;

use thiserror::Error;

use crate::hwmon::error::HwmonError;
use crate::DeviceError::{IncompatibleDriver, UnexpectedValue};

/// Type alias for `Result<T, DeviceError>`.
pub type DeviceResult<T> = Result<T, DeviceError>;

/// An error that occurred during discovering, controlling or reading devices.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Device {name} not found")]
    DeviceNotFound { name: String },
    #[error("No device found in the system")]
    NoDeviceFound,
    #[error("Failed to discover devices: {cause}")]
    DiscoveryError { cause: Box<DeviceError> },
    #[error("IoError: {cause}")]
    IoError { cause: io::Error },
    #[error("PermissionDenied: {cause}")]
    PermissionDenied { cause: io::Error },
    #[error("Incompatible device driver: {cause}")]
    IncompatibleDriver { cause: String },
    #[error("HwmonError: [npu{device_index}] {cause}")]
    HwmonError { device_index: u8, cause: HwmonError },
    #[error("Power measurement is not running on {device}")]
    MeasurementInactive { device: String },
    #[error("Power measurement is still running on {device}, stop it first")]
    MeasurementActive { device: String },
    #[error("Unexpected value: {message}")]
    UnexpectedValue { message: String },
    #[error("Invalid configuration {key}: {cause}")]
    ConfigError { key: String, cause: String },
}

impl DeviceError {
    pub(crate) fn device_not_found<D: Display>(name: D) -> DeviceError {
        DeviceError::DeviceNotFound {
            name: name.to_string(),
        }
    }

    pub(crate) fn discovery_error(cause: DeviceError) -> DeviceError {
        if cause.is_discovery_error() {
            cause
        } else {
            DeviceError::DiscoveryError {
                cause: Box::new(cause),
            }
        }
    }

    pub(crate) fn unrecognized_file<F: Display>(file: F) -> DeviceError {
        IncompatibleDriver {
            cause: format!("{file} file cannot be recognized"),
        }
    }

    pub(crate) fn hwmon_error(device_index: u8, cause: HwmonError) -> DeviceError {
        DeviceError::HwmonError {
            device_index,
            cause,
        }
    }

    pub(crate) fn measurement_inactive<D: Display>(device: D) -> DeviceError {
        DeviceError::MeasurementInactive {
            device: device.to_string(),
        }
    }

    pub(crate) fn measurement_active<D: Display>(device: D) -> DeviceError {
        DeviceError::MeasurementActive {
            device: device.to_string(),
        }
    }

    pub(crate) fn unexpected_value<S: ToString>(message: S) -> DeviceError {
        UnexpectedValue {
            message: message.to_string(),
        }
    }

    pub(crate) fn config_error<K: ToString, C: ToString>(key: K, cause: C) -> DeviceError {
        DeviceError::ConfigError {
            key: key.to_string(),
            cause: cause.to_string(),
        }
    }

    /// Whether this error was raised while looking for devices, before any
    /// measurement started.
    pub fn is_discovery_error(&self) -> bool {
        matches!(
            self,
            DeviceError::NoDeviceFound
                | DeviceError::DiscoveryError { .. }
                | DeviceError::DeviceNotFound { .. }
        )
    }
}

impl From<io::Error> for DeviceError {
    fn from(e: io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { cause: e }
        } else {
            Self::IoError { cause: e }
        }
    }
}
