pub mod npu_mgmt {
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};

    pub mod file {
        pub const BUS_NAME: &str = "busname";
        pub const PLATFORM_TYPE: &str = "platform_type";
    }

    pub(crate) fn path<P: AsRef<Path>>(sysfs: P, idx: u8) -> PathBuf {
        sysfs
            .as_ref()
            .join(format!("class/npu_mgmt/npu{idx}_mgmt"))
    }

    pub(crate) fn read_mgmt_to_string<P: AsRef<Path>, F: AsRef<Path>>(
        mgmt_root: P,
        file: F,
    ) -> io::Result<String> {
        let path = mgmt_root.as_ref().join(file);
        fs::read_to_string(path).map(|s| s.trim_end().to_string())
    }

    /// It can be used to check `platform_type`.
    pub(crate) fn is_furiosa_platform(contents: &str) -> bool {
        let contents = contents.trim();
        contents == "FuriosaAI"
    }
}

pub(crate) mod pci {
    pub(crate) mod hwmon {
        use std::path::{Path, PathBuf};

        pub fn path<P: AsRef<Path>>(sysfs: P, bdf: &str) -> PathBuf {
            sysfs
                .as_ref()
                .join(format!("bus/pci/devices/{}/hwmon", bdf.trim()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_mgmt_path() {
        assert_eq!(
            npu_mgmt::path("/sys", 3),
            PathBuf::from("/sys/class/npu_mgmt/npu3_mgmt")
        );
    }

    #[test]
    fn test_hwmon_path() {
        assert_eq!(
            pci::hwmon::path("/sys", "0000:6d:00.0\n"),
            PathBuf::from("/sys/bus/pci/devices/0000:6d:00.0/hwmon")
        );
    }

    #[test]
    fn test_is_furiosa_platform() {
        assert!(npu_mgmt::is_furiosa_platform("FuriosaAI\n"));
        assert!(!npu_mgmt::is_furiosa_platform("VITIS"));
        assert!(!npu_mgmt::is_furiosa_platform(""));
    }

    #[test]
    fn test_read_mgmt_to_string() -> std::io::Result<()> {
        let mgmt = npu_mgmt::path("test_data/test-0/sys", 0);
        let busname = npu_mgmt::read_mgmt_to_string(mgmt, npu_mgmt::file::BUS_NAME)?;
        assert_eq!(busname, "0000:6d:00.0");
        Ok(())
    }
}
