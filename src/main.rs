//! hyperflash - HyperFlash block device tool
//!
//! Drives the HyperFlash block device driver against an emulated chip
//! whose contents live in an image file. Every command goes through the
//! same `BlockDevice` interface a filesystem would use, so the image ends
//! up laid out exactly as on hardware: the reserved region in front,
//! block device data behind it.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use hyperflash_core::config::DeviceConfig;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let config = load_device_config(cli.config.as_deref())?;
    let image = cli.command.device().image.clone();
    let mut device = commands::open_device(&image, config)?;

    let result = match &cli.command {
        Commands::Info { .. } => {
            commands::info::run_info(&device);
            Ok(())
        }
        Commands::Read {
            output,
            offset,
            length,
            ..
        } => commands::read::run_read(&mut device, output, *offset, *length),
        Commands::Write {
            input,
            offset,
            no_erase,
            verify,
            ..
        } => commands::write::run_write(&mut device, input, *offset, !*no_erase, *verify),
        Commands::Erase { offset, length, .. } => {
            commands::erase::run_erase(&mut device, *offset, *length)
        }
        Commands::Verify { input, offset, .. } => {
            commands::verify::run_verify(&mut device, input, *offset)
        }
    };

    // Whatever reached the chip before a failure is kept, like on hardware
    if cli.command.is_mutating() {
        commands::close_device(device, &image)?;
    }

    result
}

/// Load the device configuration from the specified path or use the default
fn load_device_config(path: Option<&Path>) -> Result<DeviceConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let config = DeviceConfig::from_toml_file(path)?;
            log::info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(DeviceConfig::default()),
    }
}
