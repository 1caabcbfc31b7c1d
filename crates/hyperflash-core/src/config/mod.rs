//! Device configuration
//!
//! Everything the driver needs to know about the chip is fixed at
//! construction time: the block geometry, the size of the region reserved
//! ahead of the block device, the status polling budget and the bus/init
//! settings. Nothing is discovered from the chip.
//!
//! With the `std` feature the configuration can be loaded from TOML:
//!
//! ```toml
//! reserved_offset = "256 KiB"
//! strict_status = false
//!
//! [geometry]
//! size = "64 MiB"
//! read_size = 2
//! program_size = 2
//! erase_size = "256 KiB"
//! erase_value = 0xFF
//! write_buffer_size = 512
//!
//! [poll]
//! interval_us = 1000
//! max_polls = 10000
//!
//! [init]
//! vcr = 0x8E0B
//! verify = false
//! ```

#[cfg(feature = "std")]
mod toml;

#[cfg(feature = "std")]
pub use self::toml::{parse_size, ConfigError};

use crate::bus::BusConfig;
use crate::error::{Error, Result};

/// Block geometry of the flash device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Total size exposed through the block device, in bytes
    pub size: u32,
    /// Read granularity in bytes
    pub read_size: u32,
    /// Program granularity in bytes
    pub program_size: u32,
    /// Erase sector size in bytes
    pub erase_size: u32,
    /// Value of every byte after an erase
    pub erase_value: u8,
    /// Size of the chip's program buffer; a single program command must not
    /// cross a boundary of this size
    pub write_buffer_size: u32,
}

impl Geometry {
    /// 512 Mbit HyperFlash (S26KS512S class): 64 MiB, 256 KiB sectors
    pub const HYPERFLASH_512M: Self = Self {
        size: 64 * 1024 * 1024,
        read_size: 2,
        program_size: 2,
        erase_size: 256 * 1024,
        erase_value: 0xFF,
        write_buffer_size: 512,
    };

    /// Check the size invariants a block device relies on
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            self.size,
            self.read_size,
            self.program_size,
            self.erase_size,
            self.write_buffer_size,
        ];
        if sizes.contains(&0) {
            return Err(Error::InvalidGeometry);
        }

        let ok = self.program_size % self.read_size == 0
            && self.erase_size % self.program_size == 0
            && self.write_buffer_size % self.program_size == 0
            && self.erase_size % self.write_buffer_size == 0
            && self.size % self.erase_size == 0;

        if ok {
            Ok(())
        } else {
            Err(Error::InvalidGeometry)
        }
    }

    /// Number of erase sectors covered by the block device
    pub fn sector_count(&self) -> u32 {
        self.size / self.erase_size
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::HYPERFLASH_512M
    }
}

/// Status polling budget for program and erase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between two status reads, in microseconds
    pub interval_us: u32,
    /// Number of status reads before giving up
    pub max_polls: u32,
}

impl PollConfig {
    /// 1 ms interval, 10000 polls: about ten seconds worst case
    pub const DEFAULT: Self = Self {
        interval_us: 1000,
        max_polls: 10_000,
    };

    /// Worst case time spent polling before a timeout, in microseconds
    pub fn timeout_us(&self) -> u64 {
        self.interval_us as u64 * self.max_polls as u64
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Volatile configuration register setup done by `init()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitConfig {
    /// Value loaded into the volatile configuration register
    pub vcr: u16,
    /// Read the register back after writing it and fail on mismatch
    pub verify: bool,
}

impl InitConfig {
    /// Volatile configuration with 5 initial latency cycles
    pub const VCR_5_LATENCY: u16 = 0x8E0B;
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            vcr: Self::VCR_5_LATENCY,
            verify: false,
        }
    }
}

/// Complete driver configuration
///
/// The default describes a 64 MiB HyperFlash whose first 256 KiB are kept
/// for the application image and never exposed through the block device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Block geometry
    pub geometry: Geometry,
    /// Offset added to every block address before it reaches the chip
    pub reserved_offset: u32,
    /// Status polling budget
    pub poll: PollConfig,
    /// Bus transport settings
    pub bus: BusConfig,
    /// Configuration register setup
    pub init: InitConfig,
    /// Fail program/erase when the ready status also carries error bits
    pub strict_status: bool,
}

impl DeviceConfig {
    /// Default reserved region: one 256 KiB sector
    pub const DEFAULT_RESERVED_OFFSET: u32 = 256 * 1024;

    /// Validate geometry and offset
    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        if self.reserved_offset % self.geometry.erase_size != 0
            || self.reserved_offset >= self.geometry.size
        {
            return Err(Error::InvalidGeometry);
        }
        Ok(())
    }

    /// Translate a block device address into a chip address
    pub fn physical_address(&self, addr: u32) -> u32 {
        addr.wrapping_add(self.reserved_offset)
    }

    /// Bytes at the start of the block device that do not alias the
    /// reserved region
    ///
    /// The block device advertises the full chip size, so its last
    /// `reserved_offset` bytes translate past the end of the chip. On parts
    /// that ignore the upper address bits those bytes land on the reserved
    /// region.
    pub fn usable_size(&self) -> u32 {
        self.geometry.size - self.reserved_offset
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            geometry: Geometry::HYPERFLASH_512M,
            reserved_offset: Self::DEFAULT_RESERVED_OFFSET,
            poll: PollConfig::DEFAULT,
            bus: BusConfig::HYPERFLASH,
            init: InitConfig::default(),
            strict_status: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry_invariants() {
        let g = Geometry::default();
        assert!(g.validate().is_ok());
        assert_eq!(g.program_size % g.read_size, 0);
        assert_eq!(g.erase_size % g.program_size, 0);
        assert_eq!(g.size, 64 * 1024 * 1024);
        assert_eq!(g.sector_count(), 256);
    }

    #[test]
    fn test_invalid_geometry() {
        let mut g = Geometry::default();
        g.program_size = 3;
        assert_eq!(g.validate(), Err(Error::InvalidGeometry));

        let mut g = Geometry::default();
        g.read_size = 0;
        assert_eq!(g.validate(), Err(Error::InvalidGeometry));

        let mut g = Geometry::default();
        g.write_buffer_size = 384;
        assert_eq!(g.validate(), Err(Error::InvalidGeometry));
    }

    #[test]
    fn test_address_translation() {
        let cfg = DeviceConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.physical_address(0), 256 * 1024);
        assert_eq!(cfg.physical_address(0x100), 256 * 1024 + 0x100);
        assert_eq!(cfg.usable_size(), 64 * 1024 * 1024 - 256 * 1024);
    }

    #[test]
    fn test_reserved_offset_must_be_sector_aligned() {
        let cfg = DeviceConfig {
            reserved_offset: 4096,
            ..DeviceConfig::default()
        };
        assert_eq!(cfg.validate(), Err(Error::InvalidGeometry));
    }

    #[test]
    fn test_poll_timeout() {
        assert_eq!(PollConfig::DEFAULT.timeout_us(), 10_000_000);
    }
}
