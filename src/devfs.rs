use std::fs::FileType;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::{DeviceError, DeviceResult};

lazy_static! {
    static ref DEVICE_FILE_PATTERN: Regex =
        Regex::new(r"^npu(?P<device_id>\d+)(?P<cores>pe\d+(-\d+)?)?$").unwrap();
}

/// A device file name split into its parts.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum DeviceFileKind {
    /// `npu0`, the file addressing the whole device.
    Whole(u8),
    /// `npu0pe0`, `npu0pe0-1` and the like, addressing a subset of cores.
    Cores(u8),
}

pub(crate) fn path<P: AsRef<Path>>(base_path: P, filename: &str) -> PathBuf {
    base_path.as_ref().join(filename)
}

pub(crate) fn is_character_device(file_type: FileType) -> bool {
    // allow just a file too for unit testing
    if cfg!(test) {
        file_type.is_file()
    } else {
        file_type.is_char_device()
    }
}

pub(crate) fn parse_device_file<S: AsRef<str>>(filename: S) -> DeviceResult<DeviceFileKind> {
    let name = filename.as_ref();
    let matches = DEVICE_FILE_PATTERN
        .captures(name)
        .ok_or_else(|| DeviceError::unrecognized_file(name))?;

    let device_id: u8 = matches
        .name("device_id")
        .ok_or_else(|| DeviceError::unrecognized_file(name))?
        .as_str()
        .parse()
        .map_err(|_| DeviceError::unrecognized_file(name))?;

    if matches.name("cores").is_some() {
        Ok(DeviceFileKind::Cores(device_id))
    } else {
        Ok(DeviceFileKind::Whole(device_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_pattern() {
        let items = DEVICE_FILE_PATTERN.captures("npu0").unwrap();
        assert_eq!("0", items.name("device_id").unwrap().as_str());
        assert!(items.name("cores").is_none());

        let items = DEVICE_FILE_PATTERN.captures("npu12pe4-7").unwrap();
        assert_eq!("12", items.name("device_id").unwrap().as_str());
        assert_eq!("pe4-7", items.name("cores").unwrap().as_str());

        assert!(DEVICE_FILE_PATTERN.captures("npu0pe").is_none());
        assert!(DEVICE_FILE_PATTERN.captures("npu0pe0-").is_none());
        assert!(DEVICE_FILE_PATTERN.captures("npu0_mgmt").is_none());
    }

    #[test]
    fn test_parse_device_file() -> DeviceResult<()> {
        assert_eq!(parse_device_file("npu0")?, DeviceFileKind::Whole(0));
        assert_eq!(parse_device_file("npu3")?, DeviceFileKind::Whole(3));
        assert_eq!(parse_device_file("npu3pe4")?, DeviceFileKind::Cores(3));
        assert_eq!(parse_device_file("npu3pe4-7")?, DeviceFileKind::Cores(3));

        assert!(parse_device_file("npu").is_err());
        assert!(parse_device_file("npu256").is_err());
        assert!(parse_device_file("tty0").is_err());

        Ok(())
    }
}
