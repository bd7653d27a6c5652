/* https://www.kernel.org/doc/Documentation/hwmon/sysfs-interface */
/* The common scheme for files naming is: <type><number>_<item>. */

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use itertools::Itertools;
use tracing::trace;

use crate::sysfs::pci::hwmon;
use crate::{DeviceError, DeviceResult};

pub mod error {
    use std::io;

    use thiserror::Error;

    use super::HwmonType;

    pub type HwmonResult<T> = Result<T, HwmonError>;

    /// An error that occurred during parsing, reading or writing hwmon sensors.
    #[derive(Debug, Error)]
    pub enum HwmonError {
        #[error("IoError: {cause}")]
        IoError { cause: io::Error },
        #[error("Unsupported type: {name}")]
        UnsupportedType { name: String },
        #[error("Invalid file name: {name}")]
        InvalidFileName { name: String },
        #[error("No {hwmon_type:?} sensor at channel {channel}")]
        SensorNotFound { hwmon_type: HwmonType, channel: usize },
        #[error("Item Not found: {sensor_name} {item_name}")]
        ItemNameNotFound {
            sensor_name: String,
            item_name: String,
        },
        #[error("Unexpected value format: {sensor_name} {value}")]
        UnexpectedValueFormat { sensor_name: String, value: String },
    }

    impl From<io::Error> for HwmonError {
        fn from(e: io::Error) -> Self {
            Self::IoError { cause: e }
        }
    }
}

use error::{HwmonError, HwmonResult};

/// Sensor types this crate collects. Other hwmon types are skipped.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum HwmonType {
    /// `power<N>_*`, in microwatts.
    Power,
    /// `temp<N>_*`, in millidegrees Celsius.
    Temperature,
}

impl FromStr for HwmonType {
    type Err = HwmonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "power" => Ok(HwmonType::Power),
            "temp" => Ok(HwmonType::Temperature),
            _ => Err(HwmonError::UnsupportedType {
                name: String::from(s),
            }),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
struct MetricType {
    hwmon_type: HwmonType,
    idx: u8,
}

impl TryFrom<&str> for MetricType {
    type Error = HwmonError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let idx_pos = value
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| HwmonError::InvalidFileName {
                name: value.to_string(),
            })?;

        let (name_str, idx_str) = value.split_at(idx_pos);
        let hwmon_type = HwmonType::from_str(name_str)?;
        let idx = idx_str
            .parse::<u8>()
            .map_err(|_| HwmonError::InvalidFileName {
                name: value.to_string(),
            })?;

        Ok(MetricType { hwmon_type, idx })
    }
}

#[derive(Debug)]
struct MetricItem {
    item_name: String,
    path: PathBuf,
}

#[derive(Debug)]
struct MetricEntry {
    metric_type: MetricType,
    metric_item: MetricItem,
}

impl TryFrom<std::fs::DirEntry> for MetricEntry {
    type Error = HwmonError;

    fn try_from(value: std::fs::DirEntry) -> Result<Self, Self::Error> {
        let filename = value.file_name().to_string_lossy().to_string();

        let (metric_type_str, metric_item_str) =
            filename
                .split_once('_')
                .ok_or_else(|| HwmonError::InvalidFileName {
                    name: filename.clone(),
                })?;

        let metric_type = MetricType::try_from(metric_type_str)?;
        let metric_item = MetricItem {
            item_name: metric_item_str.to_string(),
            path: value.path(),
        };

        Ok(MetricEntry {
            metric_type,
            metric_item,
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) struct Sensor {
    name: String,
    items: HashMap<String, PathBuf>,
}

impl Sensor {
    fn new(name: String, items: Vec<MetricItem>) -> Self {
        let items = items
            .into_iter()
            .map(|item| (item.item_name, item.path))
            .collect();

        Self { name, items }
    }

    fn has_item(&self, item_name: &str) -> bool {
        self.items.contains_key(item_name)
    }

    fn read_item(&self, item_name: &str) -> HwmonResult<i64> {
        let path = self.item_path(item_name)?;
        let value = std::fs::read_to_string(path)?;
        let value = value.trim();

        value
            .parse::<i64>()
            .map_err(|_| HwmonError::UnexpectedValueFormat {
                sensor_name: self.name.clone(),
                value: value.to_string(),
            })
    }

    fn write_item(&self, item_name: &str, value: i64) -> HwmonResult<()> {
        let path = self.item_path(item_name)?;
        trace!("write {value} to {}", path.display());
        std::fs::write(path, value.to_string())?;
        Ok(())
    }

    fn item_path(&self, item_name: &str) -> HwmonResult<&PathBuf> {
        self.items
            .get(item_name)
            .ok_or_else(|| HwmonError::ItemNameNotFound {
                sensor_name: self.name.clone(),
                item_name: item_name.to_string(),
            })
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) struct SensorContainer(HashMap<HwmonType, Vec<Sensor>>);

impl SensorContainer {
    fn new(sysfs: &Path, busname: &str) -> HwmonResult<Self> {
        let path = hwmon::path(sysfs, busname);
        let entries = Self::fetch_entries(path)?;
        let value_map = Self::build_value_map(entries);

        let sensors: HashMap<HwmonType, Vec<Sensor>> = value_map
            .into_iter()
            .map(|(hwmon_type, v)| {
                let sensors: Vec<Sensor> = v
                    .into_iter()
                    .map(|(sensor_name, items)| Sensor::new(sensor_name, items))
                    .collect();

                (hwmon_type, sensors)
            })
            .collect();

        Ok(SensorContainer(sensors))
    }

    fn get(&self, t: HwmonType) -> &[Sensor] {
        self.0.get(&t).map(Vec::as_slice).unwrap_or_default()
    }

    fn fetch_entries(mut path: PathBuf) -> HwmonResult<Vec<MetricEntry>> {
        let mut vec = vec![];

        let mut read_dir = std::fs::read_dir(&path)?;
        if let Some(entry) = read_dir.next() {
            let entry = entry?;
            // Note: Assume that there is only one 'hwmon' per device
            path.push(entry.file_name());

            for entry in std::fs::read_dir(&path)? {
                // Note: Unrecognized entries are ignored
                if let Ok(metric_entry) = MetricEntry::try_from(entry?) {
                    vec.push(metric_entry);
                }
            }
        }

        Ok(vec)
    }

    fn build_value_map(
        entries: Vec<MetricEntry>,
    ) -> HashMap<HwmonType, Vec<(String, Vec<MetricItem>)>> {
        let (labels, metrics): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| entry.metric_item.item_name == "label");
        let label_map = Self::build_label_map(labels);

        let mut map_by_metric_type = HashMap::new();
        for entry in metrics {
            map_by_metric_type
                .entry(entry.metric_type)
                .or_insert_with(Vec::new)
                .push(entry.metric_item);
        }

        let mut res = HashMap::new();
        for (k, items) in map_by_metric_type
            .into_iter()
            .sorted_by(|a, b| a.0.idx.cmp(&b.0.idx))
        {
            let label = label_map
                .get(&k)
                .cloned()
                .unwrap_or_else(|| k.idx.to_string());

            res.entry(k.hwmon_type)
                .or_insert_with(Vec::new)
                .push((label, items));
        }

        res
    }

    fn build_label_map(label_entries: Vec<MetricEntry>) -> HashMap<MetricType, String> {
        let mut map = HashMap::new();

        for entry in label_entries {
            if let Ok(text) = std::fs::read_to_string(&entry.metric_item.path) {
                map.insert(entry.metric_type, text.trim().to_string());
            }
        }

        map
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct SensorValue {
    pub label: String,
    pub value: i64,
}

/// Reads and writes the hwmon sensors of a single device.
///
/// Channels are addressed by position: channel 0 is the sensor of the given
/// type with the lowest hwmon index.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Fetcher {
    device_index: u8,
    sensor_container: SensorContainer,
}

impl Fetcher {
    pub(crate) fn new<P: AsRef<Path>>(
        sysfs: P,
        device_index: u8,
        busname: &str,
    ) -> DeviceResult<Self> {
        let sensor_container = SensorContainer::new(sysfs.as_ref(), busname)
            .map_err(|e| DeviceError::hwmon_error(device_index, e))?;

        Ok(Self {
            device_index,
            sensor_container,
        })
    }

    pub fn device_index(&self) -> u8 {
        self.device_index
    }

    pub fn read_powers_average(&self) -> DeviceResult<Vec<SensorValue>> {
        self.read_values(HwmonType::Power, "average")
    }

    pub fn read_temperatures(&self) -> DeviceResult<Vec<SensorValue>> {
        self.read_values(HwmonType::Temperature, "input")
    }

    /// Reads `item` of the sensor at `channel`, failing if either is missing.
    pub fn read_value(&self, t: HwmonType, channel: usize, item: &str) -> DeviceResult<i64> {
        self.sensor(t, channel)
            .and_then(|sensor| sensor.read_item(item))
            .map_err(|e| self.error(e))
    }

    /// Like [`Fetcher::read_value`], but a missing sensor or item is `None`.
    pub fn read_optional_value(
        &self,
        t: HwmonType,
        channel: usize,
        item: &str,
    ) -> DeviceResult<Option<i64>> {
        match self.sensor_container.get(t).get(channel) {
            Some(sensor) if sensor.has_item(item) => sensor
                .read_item(item)
                .map(Some)
                .map_err(|e| self.error(e)),
            _ => Ok(None),
        }
    }

    /// Writes `value` to `item` of the sensor at `channel`.
    ///
    /// Returns `false` without touching anything if the driver does not expose the item.
    pub fn write_value(
        &self,
        t: HwmonType,
        channel: usize,
        item: &str,
        value: i64,
    ) -> DeviceResult<bool> {
        match self.sensor_container.get(t).get(channel) {
            Some(sensor) if sensor.has_item(item) => {
                sensor.write_item(item, value).map_err(|e| self.error(e))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn read_values(&self, t: HwmonType, item: &str) -> DeviceResult<Vec<SensorValue>> {
        self.sensor_container
            .get(t)
            .iter()
            .map(|sensor| {
                let value = sensor.read_item(item).map_err(|e| self.error(e))?;
                Ok(SensorValue {
                    label: sensor.name.clone(),
                    value,
                })
            })
            .collect()
    }

    fn sensor(&self, t: HwmonType, channel: usize) -> HwmonResult<&Sensor> {
        self.sensor_container
            .get(t)
            .get(channel)
            .ok_or(HwmonError::SensorNotFound {
                hwmon_type: t,
                channel,
            })
    }

    fn error(&self, cause: HwmonError) -> DeviceError {
        DeviceError::hwmon_error(self.device_index, cause)
    }
}
