//! HyperFlash block device
//!
//! This module provides `HyperFlashBlockDevice`, which implements
//! `BlockDevice` for a NOR flash attached through a `HyperBus`.

use super::BlockDevice;
use crate::bus::{AccessSpace, HyperBus};
use crate::config::{DeviceConfig, Geometry};
use crate::error::{Error, Result};
use crate::protocol::{self, StatusRegister};
use maybe_async::maybe_async;

/// Embedded operation being waited on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Program,
    Erase,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::Program => "program",
            Operation::Erase => "erase",
        }
    }

    fn error_bits(self) -> StatusRegister {
        match self {
            Operation::Program => StatusRegister::PROGRAM_ERRORS,
            Operation::Erase => StatusRegister::ERASE_ERRORS,
        }
    }

    fn failure(self, addr: u32) -> Error {
        match self {
            Operation::Program => Error::ProgramFailed { addr },
            Operation::Erase => Error::EraseFailed { addr },
        }
    }
}

fn len_u32(len: usize) -> u32 {
    // Oversized buffers saturate to an odd length so they fail validation
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Block device backed by a HyperFlash NOR chip
///
/// Owns the bus. Every block address is shifted by the configured reserved
/// offset before it reaches the chip, so the region in front of it (the
/// application image) is never visible through this device.
///
/// Operations block until the chip reports ready or the polling budget
/// runs out. No state is kept between calls, and there is no locking:
/// callers sharing a device must serialize access themselves.
///
/// # Example
///
/// ```ignore
/// use hyperflash_core::block::{BlockDevice, HyperFlashBlockDevice};
/// use hyperflash_core::config::DeviceConfig;
/// use hyperflash_dummy::DummyHyperFlash;
///
/// let bus = DummyHyperFlash::new_default();
/// let mut bd = HyperFlashBlockDevice::new(bus, DeviceConfig::default()).unwrap();
/// bd.init().unwrap();
/// bd.erase(0, bd.erase_size()).unwrap();
/// ```
pub struct HyperFlashBlockDevice<B: HyperBus> {
    bus: B,
    config: DeviceConfig,
}

#[maybe_async]
impl<B: HyperBus> HyperFlashBlockDevice<B> {
    /// Create a new block device, applying the bus configuration
    ///
    /// # Errors
    /// * `InvalidGeometry` - If the configuration violates the size invariants
    /// * `Bus` - If the transport rejects the configuration
    pub async fn new(mut bus: B, config: DeviceConfig) -> Result<Self> {
        config.validate()?;
        bus.configure(&config.bus).await?;
        log::debug!(
            "HyperFlash: {} bytes, {} byte sectors, reserved offset 0x{:08X}",
            config.geometry.size,
            config.geometry.erase_size,
            config.reserved_offset
        );
        Ok(Self { bus, config })
    }

    /// Read back the volatile configuration register
    pub async fn read_configuration(&mut self) -> Result<u16> {
        protocol::read_vcr(&mut self.bus).await
    }

    /// Read the current status register
    pub async fn status(&mut self) -> Result<StatusRegister> {
        protocol::read_status(&mut self.bus).await
    }

    /// Wait for the running operation to finish and check its outcome
    async fn sync(&mut self, op: Operation, addr: u32) -> Result<()> {
        let status = match protocol::wait_ready(&mut self.bus, &self.config.poll).await {
            Ok(status) => status,
            Err(Error::Timeout) => {
                log::error!(
                    "{} at 0x{:08X} timed out after {} polls",
                    op.name(),
                    addr,
                    self.config.poll.max_polls
                );
                return Err(Error::Timeout);
            }
            Err(e) => return Err(e),
        };

        let errors = status & op.error_bits();
        if errors.is_empty() {
            return Ok(());
        }

        log::warn!(
            "{} at 0x{:08X} finished with status 0x{:04X} ({:?})",
            op.name(),
            addr,
            status.bits(),
            errors
        );

        if !self.config.strict_status {
            return Ok(());
        }

        protocol::clear_status(&mut self.bus).await?;
        Err(op.failure(addr))
    }
}

impl<B: HyperBus> HyperFlashBlockDevice<B> {
    /// Get the device configuration
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Get the block geometry
    pub fn geometry(&self) -> &Geometry {
        &self.config.geometry
    }

    /// Get a reference to the underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Get a mutable reference to the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Consume the device and return the bus
    pub fn into_inner(self) -> B {
        self.bus
    }
}

#[maybe_async(AFIT)]
impl<B: HyperBus> BlockDevice for HyperFlashBlockDevice<B> {
    /// Load the volatile configuration register (initial read latency)
    ///
    /// The register is not read back unless `InitConfig::verify` is set.
    async fn init(&mut self) -> Result<()> {
        let vcr = self.config.init.vcr;
        log::debug!("loading VCR 0x{:04X}", vcr);
        protocol::load_vcr(&mut self.bus, vcr).await?;

        if self.config.init.verify {
            let found = protocol::read_vcr(&mut self.bus).await?;
            if found != vcr {
                log::error!("VCR readback 0x{:04X}, expected 0x{:04X}", found, vcr);
                return Err(Error::ConfigMismatch {
                    expected: vcr,
                    found,
                });
            }
        }

        Ok(())
    }

    async fn deinit(&mut self) -> Result<()> {
        Ok(())
    }

    async fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        assert!(
            self.is_valid_read(addr, len_u32(buf.len())),
            "invalid read: addr=0x{:08X} len={}",
            addr,
            buf.len()
        );

        let phys = self.config.physical_address(addr);
        self.bus.read_block(phys, buf, AccessSpace::Memory).await
    }

    async fn program(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        assert!(
            self.is_valid_program(addr, len_u32(data.len())),
            "invalid program: addr=0x{:08X} len={}",
            addr,
            data.len()
        );

        let page = self.config.geometry.write_buffer_size;
        let mut addr = addr;
        let mut data = data;

        while !data.is_empty() {
            // Never cross a write buffer boundary in one command
            let room = (page - addr % page) as usize;
            let chunk_len = core::cmp::min(data.len(), room);
            let (chunk, rest) = data.split_at(chunk_len);

            let phys = self.config.physical_address(addr);
            log::trace!("program {} bytes at 0x{:08X}", chunk_len, phys);
            protocol::program_buffer(&mut self.bus, phys, chunk).await?;

            addr += chunk_len as u32;
            data = rest;

            self.sync(Operation::Program, phys).await?;
        }

        Ok(())
    }

    async fn erase(&mut self, addr: u32, len: u32) -> Result<()> {
        assert!(
            self.is_valid_erase(addr, len),
            "invalid erase: addr=0x{:08X} len={}",
            addr,
            len
        );

        // One sector per command whatever the requested length
        let sector = self.config.geometry.erase_size;
        let mut addr = addr;
        let mut remaining = len;

        while remaining > 0 {
            let phys = self.config.physical_address(addr);
            log::debug!("erase sector at 0x{:08X}", phys);
            protocol::erase_sector(&mut self.bus, phys).await?;

            addr += sector;
            remaining -= sector;

            self.sync(Operation::Erase, phys).await?;
        }

        Ok(())
    }

    fn read_size(&self) -> u32 {
        self.config.geometry.read_size
    }

    fn program_size(&self) -> u32 {
        self.config.geometry.program_size
    }

    fn erase_size(&self) -> u32 {
        self.config.geometry.erase_size
    }

    fn erase_value(&self) -> Option<u8> {
        Some(self.config.geometry.erase_value)
    }

    fn size(&self) -> u32 {
        self.config.geometry.size
    }
}
