use npu_power_monitor::{run_periodic, DeviceError, MonitorConfig, Shutdown, SysfsPlatform};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), DeviceError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = MonitorConfig::from_env()?;
    let platform = SysfsPlatform::with_roots(&config.devfs, &config.sysfs);
    let shutdown = Shutdown::on_interrupt()?;

    run_periodic(&platform, &config, &mut std::io::stdout(), shutdown).await
}
