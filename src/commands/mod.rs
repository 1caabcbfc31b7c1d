//! CLI command implementations
//!
//! Every command runs against a `HyperFlashBlockDevice` on top of the
//! emulated chip. Requests are checked against the usable part of the
//! device before they reach the driver, which asserts on bad requests
//! instead of reporting them.

pub mod erase;
pub mod info;
pub mod read;
pub mod verify;
pub mod write;

use hyperflash_core::block::{BlockDevice, HyperFlashBlockDevice};
use hyperflash_core::config::DeviceConfig;
use hyperflash_dummy::{DummyConfig, DummyHyperFlash};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use thiserror::Error;

/// Block device over the emulated chip
pub type Device = HyperFlashBlockDevice<DummyHyperFlash>;

/// Request errors reported before anything reaches the device
#[derive(Debug, Error)]
pub enum CommandError {
    /// Range extends past the usable part of the device
    #[error("range 0x{offset:08X}+0x{len:X} exceeds usable size 0x{usable:08X}")]
    OutOfRange { offset: u32, len: u64, usable: u32 },

    /// Offset or length not a multiple of the required granularity
    #[error("range 0x{offset:08X}+0x{len:X} is not aligned to {granularity} bytes")]
    Misaligned {
        offset: u32,
        len: u64,
        granularity: u32,
    },

    /// Device contents differ from the expected data
    #[error("verification failed: {count} byte(s) differ, first at 0x{addr:08X}: expected 0x{expected:02X}, got 0x{found:02X}")]
    VerifyFailed {
        count: usize,
        addr: u32,
        expected: u8,
        found: u8,
    },
}

/// Open the image and bring up the block device on it
pub fn open_device(image: &Path, config: DeviceConfig) -> Result<Device, Box<dyn std::error::Error>> {
    let chip = DummyHyperFlash::open_image(
        image,
        DummyConfig {
            size: config.geometry.size as usize,
            sector_size: config.geometry.erase_size as usize,
            write_buffer_size: config.geometry.write_buffer_size as usize,
            ..DummyConfig::default()
        },
    )?;

    let mut device = HyperFlashBlockDevice::new(chip, config)?;
    device.init()?;
    log::debug!("block device ready on {}", image.display());
    Ok(device)
}

/// Shut the block device down and write the chip contents back
pub fn close_device(mut device: Device, image: &Path) -> Result<(), Box<dyn std::error::Error>> {
    device.deinit()?;
    let chip = device.into_inner();
    chip.save_image(image)?;
    log::info!("Saved image to {}", image.display());
    Ok(())
}

/// Resolve an optional length to the rest of the usable device
pub fn remaining_length(device: &Device, offset: u32, length: Option<u32>) -> Result<u32, CommandError> {
    let usable = device.config().usable_size();
    match length {
        Some(len) => Ok(len),
        None => usable.checked_sub(offset).ok_or(CommandError::OutOfRange {
            offset,
            len: 0,
            usable,
        }),
    }
}

/// Check that a request fits the usable device and the given granularity
pub fn check_range(device: &Device, offset: u32, len: u64, granularity: u32) -> Result<(), CommandError> {
    let usable = device.config().usable_size();
    if offset as u64 + len > usable as u64 {
        return Err(CommandError::OutOfRange { offset, len, usable });
    }
    if offset % granularity != 0 || len % granularity as u64 != 0 {
        return Err(CommandError::Misaligned {
            offset,
            len,
            granularity,
        });
    }
    Ok(())
}

/// Round `len` up to a multiple of `granularity`
pub fn align_up(len: usize, granularity: u32) -> usize {
    let granularity = granularity as usize;
    len.div_ceil(granularity) * granularity
}

/// Chunk size used for progress reporting
pub fn chunk_size(device: &Device) -> usize {
    device.erase_size() as usize
}

/// Create a progress bar with custom phase message
pub fn progress_bar(total: u64, phase: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Read file contents into a Vec
pub fn read_file(path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let data = std::fs::read(path)?;
    println!("Read {} bytes from {:?}", data.len(), path);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperflash_core::config::Geometry;

    fn device() -> Device {
        let config = DeviceConfig {
            geometry: Geometry {
                size: 4 * 256 * 1024,
                ..Geometry::HYPERFLASH_512M
            },
            ..DeviceConfig::default()
        };
        let chip = DummyHyperFlash::new(DummyConfig {
            size: 4 * 256 * 1024,
            ..DummyConfig::default()
        });
        HyperFlashBlockDevice::new(chip, config).unwrap()
    }

    #[test]
    fn test_remaining_length() {
        let dev = device();
        assert_eq!(remaining_length(&dev, 0, None).unwrap(), 3 * 256 * 1024);
        assert_eq!(remaining_length(&dev, 0x100, Some(16)).unwrap(), 16);
        assert!(remaining_length(&dev, 4 * 256 * 1024, None).is_err());
    }

    #[test]
    fn test_check_range() {
        let dev = device();
        let usable = 3 * 256 * 1024;

        assert!(check_range(&dev, 0, usable, 2).is_ok());
        assert!(matches!(
            check_range(&dev, 2, usable, 2),
            Err(CommandError::OutOfRange { .. })
        ));
        assert!(matches!(
            check_range(&dev, 1, 2, 2),
            Err(CommandError::Misaligned { .. })
        ));
        assert!(matches!(
            check_range(&dev, 0, 4096, 256 * 1024),
            Err(CommandError::Misaligned { .. })
        ));
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 2), 0);
        assert_eq!(align_up(3, 2), 4);
        assert_eq!(align_up(512, 512), 512);
    }
}
