use cli_table::{print_stdout, Cell, Style, Table};
use itertools::join;
use npu_power_monitor::hwmon::SensorValue;
use npu_power_monitor::{DeviceError, MonitorConfig, Platform, SysfsPlatform};
use tracing_subscriber::EnvFilter;

fn format_values(values: &[SensorValue], scale: f64, unit: &str) -> String {
    join(
        values
            .iter()
            .map(|v| format!("{} {:.2}{unit}", v.label, v.value as f64 / scale)),
        ", ",
    )
}

/// Usage: list_npu [INDEX]
fn main() -> Result<(), DeviceError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let index = match std::env::args().nth(1) {
        Some(arg) => Some(arg.parse::<u8>().map_err(|_| DeviceError::UnexpectedValue {
            message: format!("'{arg}' is not a device index"),
        })?),
        None => None,
    };

    let config = MonitorConfig::from_env()?;
    let platform = SysfsPlatform::with_roots(&config.devfs, &config.sysfs);

    let mut rows = vec![];
    for info in platform.select(index)? {
        let device = platform.open(&info)?;
        let fetcher = device.hwmon_fetcher();
        rows.push(vec![
            format!("npu{}", fetcher.device_index()).cell(),
            info.busname().cell(),
            format_values(&fetcher.read_powers_average()?, 1_000_000.0, "W").cell(),
            format_values(&fetcher.read_temperatures()?, 1000.0, "°C").cell(),
        ]);
    }

    let table = rows.table().title(vec![
        "NPU".cell().bold(true),
        "Bus".cell().bold(true),
        "Power".cell().bold(true),
        "Temperature".cell().bold(true),
    ]);
    print_stdout(table)?;

    Ok(())
}
