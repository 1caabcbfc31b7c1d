//! Bus trait definitions
//!
//! These traits use `maybe_async` to support both sync and async modes.
//! - By default, traits are async (suitable for Embassy)
//! - With the `is_sync` feature, traits become synchronous

use crate::error::Result;
use maybe_async::maybe_async;

/// Address space targeted by a bus transaction
///
/// HyperBus distinguishes the memory array from the register space of the
/// device. All flash command cycles target the memory space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessSpace {
    /// Memory array (command cycles and data)
    #[default]
    Memory,
    /// Device register space
    Register,
}

/// Access timing applied by the bus controller, in controller clock cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct BusTiming {
    /// Minimum chip select high time between transactions
    pub cs_high: u8,
    /// Chip select setup time before the first clock edge
    pub cs_setup: u8,
    /// Chip select hold time after the last clock edge
    pub cs_hold: u8,
    /// Additional initial access latency
    pub latency: u8,
}

impl BusTiming {
    /// Timing used for HyperFlash memory access
    pub const HYPERFLASH: Self = Self {
        cs_high: 4,
        cs_setup: 4,
        cs_hold: 4,
        latency: 0,
    };
}

impl Default for BusTiming {
    fn default() -> Self {
        Self::HYPERFLASH
    }
}

/// Transport configuration applied once, when the driver is constructed
///
/// The same settings are used for both transmit and receive directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct BusConfig {
    /// Maximum number of bytes per burst transaction
    pub max_transfer_len: u16,
    /// Whether the maximum transfer length limit is enforced
    pub burst: bool,
    /// Access timing
    pub timing: BusTiming,
}

impl BusConfig {
    /// Configuration used for HyperFlash memory access
    pub const HYPERFLASH: Self = Self {
        max_transfer_len: 0x1FF,
        burst: true,
        timing: BusTiming::HYPERFLASH,
    };
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::HYPERFLASH
    }
}

/// HyperBus master trait (sync or async depending on `is_sync` feature)
///
/// This trait represents a bus controller with a HyperFlash device attached.
/// Addresses are byte addresses on the bus. Chip command addresses are word
/// addresses, so callers shift them left by one before handing them over.
///
/// ## Example
///
/// ```ignore
/// #[maybe_async]
/// impl HyperBus for Gap8HyperBus {
///     async fn write(&mut self, addr: u32, value: u16, space: AccessSpace) -> Result<()> {
///         self.udma.write16(self.device, addr, value, space.into()).await
///     }
///     // ...
/// }
/// ```
#[maybe_async(AFIT)]
pub trait HyperBus {
    /// Apply the maximum transfer length and access timing
    async fn configure(&mut self, config: &BusConfig) -> Result<()>;

    /// Write a single 16-bit word (command cycle or register write)
    async fn write(&mut self, addr: u32, value: u16, space: AccessSpace) -> Result<()>;

    /// Read a single 16-bit word
    async fn read(&mut self, addr: u32, space: AccessSpace) -> Result<u16>;

    /// Write a block of data starting at `addr`
    async fn write_block(&mut self, addr: u32, data: &[u8], space: AccessSpace) -> Result<()>;

    /// Read a block of data starting at `addr` into `buf`
    async fn read_block(&mut self, addr: u32, buf: &mut [u8], space: AccessSpace) -> Result<()>;

    /// Delay for the specified number of microseconds
    async fn delay_us(&mut self, us: u32);
}
