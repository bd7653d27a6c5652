use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use crate::devfs::{self, is_character_device, DeviceFileKind};
use crate::device::SysfsDevice;
use crate::hwmon::Fetcher;
use crate::platform::{DeviceInfo, Platform};
use crate::sysfs::npu_mgmt;
use crate::{DeviceError, DeviceResult};

/// Discovers NPU devices from devfs and sysfs.
#[derive(Debug, Clone)]
pub struct SysfsPlatform {
    devfs: PathBuf,
    sysfs: PathBuf,
}

impl Default for SysfsPlatform {
    fn default() -> Self {
        Self::with_roots("/dev", "/sys")
    }
}

impl SysfsPlatform {
    /// Allow to specify arbitrary devfs, sysfs paths, e.g. for unit testing
    pub fn with_roots<P: AsRef<Path>, Q: AsRef<Path>>(devfs: P, sysfs: Q) -> Self {
        Self {
            devfs: devfs.as_ref().to_path_buf(),
            sysfs: sysfs.as_ref().to_path_buf(),
        }
    }

    pub fn devfs(&self) -> &Path {
        &self.devfs
    }

    pub fn sysfs(&self) -> &Path {
        &self.sysfs
    }

    /// Return a specific device if it exists.
    ///
    /// # Arguments
    ///
    /// * `idx` - An index number of the device (e.g., 0, 1)
    pub fn get_device_info(&self, idx: u8) -> DeviceResult<DeviceInfo> {
        let name = format!("npu{idx}");
        if !devfs::path(&self.devfs, &name).exists() {
            return Err(DeviceError::device_not_found(name));
        }

        self.identify(idx)?
            .ok_or_else(|| DeviceError::device_not_found(name))
    }

    /// Returns the device at `idx` if given, or every device found otherwise.
    pub fn select(&self, idx: Option<u8>) -> DeviceResult<Vec<DeviceInfo>> {
        match idx {
            Some(idx) => Ok(vec![self.get_device_info(idx)?]),
            None => self.scan(),
        }
    }

    /// Returns `None` if the device belongs to another platform.
    fn identify(&self, idx: u8) -> DeviceResult<Option<DeviceInfo>> {
        let mgmt_root = npu_mgmt::path(&self.sysfs, idx);

        match npu_mgmt::read_mgmt_to_string(&mgmt_root, npu_mgmt::file::PLATFORM_TYPE) {
            Ok(platform) if npu_mgmt::is_furiosa_platform(&platform) => {}
            Ok(platform) => {
                debug!("npu{idx}: skip unsupported platform '{platform}'");
                return Ok(None);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("npu{idx}: no management files");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        let busname = npu_mgmt::read_mgmt_to_string(&mgmt_root, npu_mgmt::file::BUS_NAME)?;
        let busname = busname.trim();
        if busname.is_empty() {
            return Err(DeviceError::unexpected_value(format!(
                "npu{idx} has an empty bus name"
            )));
        }

        Ok(Some(DeviceInfo::new(idx, busname)))
    }
}

impl Platform for SysfsPlatform {
    type Device = SysfsDevice;

    fn scan(&self) -> DeviceResult<Vec<DeviceInfo>> {
        let mut devices = Vec::new();
        for idx in list_device_indices(&self.devfs)? {
            if let Some(info) = self.identify(idx)? {
                devices.push(info);
            }
        }

        devices.sort();
        info!("found {} device(s) in {}", devices.len(), self.devfs.display());
        Ok(devices)
    }

    fn open(&self, info: &DeviceInfo) -> DeviceResult<SysfsDevice> {
        let fetcher = Fetcher::new(&self.sysfs, info.index(), info.busname())?;
        Ok(SysfsDevice::new(info.clone(), fetcher))
    }
}

/// Collects the indices of whole-device files (`npu<N>`), skipping per-core files.
fn list_device_indices<P: AsRef<Path>>(devfs: P) -> io::Result<Vec<u8>> {
    let read_dir = match std::fs::read_dir(devfs) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(e),
    };

    let mut indices = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        if !is_character_device(entry.file_type()?) {
            continue;
        }

        let filename = entry.file_name().to_string_lossy().to_string();
        match devfs::parse_device_file(&filename) {
            Ok(DeviceFileKind::Whole(idx)) => indices.push(idx),
            Ok(DeviceFileKind::Cores(idx)) => trace!("npu{idx}: skip per-core file {filename}"),
            Err(_) => {}
        }
    }

    indices.sort_unstable();
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_platform() -> SysfsPlatform {
        SysfsPlatform::with_roots("test_data/test-0/dev", "test_data/test-0/sys")
    }

    #[test]
    fn test_list_device_indices() -> io::Result<()> {
        // npu0pe0, npu0pe1, npu0pe0-1 and npu1pe0 are skipped
        assert_eq!(list_device_indices("test_data/test-0/dev")?, vec![0, 1, 2]);
        assert_eq!(list_device_indices("invalid_path")?, Vec::<u8>::new());
        Ok(())
    }

    #[test]
    fn test_scan() -> DeviceResult<()> {
        // npu2 is not a FuriosaAI platform
        let devices = test_platform().scan()?;
        assert_eq!(
            devices,
            vec![
                DeviceInfo::new(0, "0000:6d:00.0"),
                DeviceInfo::new(1, "0000:6e:00.0"),
            ]
        );

        let devices = SysfsPlatform::with_roots("invalid_path", "invalid_path").scan()?;
        assert!(devices.is_empty());

        Ok(())
    }

    #[test]
    fn test_get_device_info() -> DeviceResult<()> {
        let platform = test_platform();
        assert_eq!(
            platform.get_device_info(1)?,
            DeviceInfo::new(1, "0000:6e:00.0")
        );
        assert!(matches!(
            platform.get_device_info(2),
            Err(DeviceError::DeviceNotFound { .. })
        ));
        assert!(matches!(
            platform.get_device_info(9),
            Err(DeviceError::DeviceNotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_select() -> DeviceResult<()> {
        let platform = test_platform();
        assert_eq!(platform.select(None)?, platform.scan()?);
        assert_eq!(
            platform.select(Some(0))?,
            vec![DeviceInfo::new(0, "0000:6d:00.0")]
        );
        assert!(matches!(
            platform.select(Some(2)),
            Err(DeviceError::DeviceNotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_open() -> DeviceResult<()> {
        let platform = test_platform();
        let device = platform.open(&DeviceInfo::new(0, "0000:6d:00.0"))?;
        assert_eq!(device.info().index(), 0);
        assert!(!device.is_measuring());
        let temperatures = device.hwmon_fetcher().read_temperatures()?;
        assert_eq!(
            temperatures.iter().map(|v| v.label.as_str()).collect::<Vec<_>>(),
            vec!["ts0", "ts1"]
        );

        assert!(matches!(
            platform.open(&DeviceInfo::new(3, "0000:00:00.0")),
            Err(DeviceError::HwmonError {
                device_index: 3,
                ..
            })
        ));

        Ok(())
    }
}
