use anyhow::Result;
use tracing::info;

use kernel32_adapter::config::{load_config, validate_config, Config};
use kernel32_adapter::logging;

fn main() -> Result<()> {
    let config = load_config()?;
    validate_config(&config)?;
    logging::init(&config.logging)?;

    info!("Starting kernel32-adapter v{}", env!("CARGO_PKG_VERSION"));

    report(&config)
}

#[cfg(not(windows))]
fn report(_config: &Config) -> Result<()> {
    Ok(kernel32_adapter::windows::require_supported_platform()?)
}

#[cfg(windows)]
fn report(config: &Config) -> Result<()> {
    use kernel32_adapter::process::{enumerate_modules, enumerate_processes};
    use kernel32_adapter::{drive_letters, Kernel32, SystemApi};

    let k32 = Kernel32::new(SystemApi::from_config(&config.library)?);
    info!(library = %config.library.path, "Loaded call table");
    info!("Architecture: {}", std::env::consts::ARCH);
    info!("User locale: 0x{:04X}", k32.get_user_default_lcid());

    for letter in drive_letters(k32.get_logical_drives()) {
        let root = format!("{}:\\", letter);
        match k32.get_disk_free_space(&root) {
            (true, space) => info!(
                drive = %root,
                free = space.free_bytes_available,
                total = space.total_bytes,
                "Disk space"
            ),
            (false, _) => info!(drive = %root, "Disk space unavailable"),
        }
    }

    let processes = enumerate_processes(&k32)?;
    info!("{} processes running", processes.len());

    let modules = enumerate_modules(&k32, std::process::id())?;
    for module in &modules {
        info!("{}", module);
    }

    let time = k32.get_system_time()?;
    info!(
        "System time (UTC): {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        time.year, time.month, time.day, time.hour, time.minute, time.second
    );
    Ok(())
}
