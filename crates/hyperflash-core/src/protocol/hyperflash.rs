//! HyperFlash command sequences
//!
//! Uses `maybe_async` to support both sync and async modes:
//! - With `is_sync` feature: blocking/synchronous
//! - Without `is_sync` feature: async (for Embassy)
//!
//! None of these functions keep state between calls. Each one writes a
//! complete command sequence, so a sequence interrupted by an error leaves
//! the chip waiting for cycles that never come; the next unlock cycle
//! restarts its decoder.

use super::commands;
use super::status::StatusRegister;
use crate::bus::{AccessSpace, HyperBus};
use crate::config::PollConfig;
use crate::error::{Error, Result};
use maybe_async::maybe_async;

/// Issue the two unlock cycles
#[maybe_async]
pub async fn unlock<B: HyperBus + ?Sized>(bus: &mut B) -> Result<()> {
    bus.write(commands::UNLOCK1_ADDR, commands::UNLOCK1_DATA, AccessSpace::Memory)
        .await?;
    bus.write(commands::UNLOCK2_ADDR, commands::UNLOCK2_DATA, AccessSpace::Memory)
        .await
}

/// Unlock and write a command byte to the command address
#[maybe_async]
pub async fn unlocked_command<B: HyperBus + ?Sized>(bus: &mut B, cmd: u16) -> Result<()> {
    unlock(bus).await?;
    bus.write(commands::CMD_ADDR, cmd, AccessSpace::Memory).await
}

/// Read the status register
#[maybe_async]
pub async fn read_status<B: HyperBus + ?Sized>(bus: &mut B) -> Result<StatusRegister> {
    bus.write(commands::CMD_ADDR, commands::READ_STATUS, AccessSpace::Memory)
        .await?;
    let raw = bus.read(commands::STATUS_ADDR, AccessSpace::Memory).await?;
    Ok(StatusRegister::from_bits_retain(raw))
}

/// Clear the error bits of the status register
#[maybe_async]
pub async fn clear_status<B: HyperBus + ?Sized>(bus: &mut B) -> Result<()> {
    bus.write(commands::CMD_ADDR, commands::CLEAR_STATUS, AccessSpace::Memory)
        .await
}

/// Wait for the device ready bit to set
///
/// Polls the status register at a fixed interval, up to `poll.max_polls`
/// reads. Returns the status snapshot that reported ready, so callers can
/// inspect the error bits of the finished operation.
#[maybe_async]
pub async fn wait_ready<B: HyperBus + ?Sized>(
    bus: &mut B,
    poll: &PollConfig,
) -> Result<StatusRegister> {
    for i in 0..poll.max_polls {
        let status = read_status(bus).await?;
        if status.is_ready() {
            log::trace!("device ready after {} poll(s), status 0x{:04X}", i + 1, status.bits());
            return Ok(status);
        }
        bus.delay_us(poll.interval_us).await;
    }

    Err(Error::Timeout)
}

/// Start a buffer program of `data` at `addr`
///
/// The data must not cross a write buffer boundary. The caller polls for
/// completion.
#[maybe_async]
pub async fn program_buffer<B: HyperBus + ?Sized>(
    bus: &mut B,
    addr: u32,
    data: &[u8],
) -> Result<()> {
    unlocked_command(bus, commands::PROGRAM).await?;
    bus.write_block(addr, data, AccessSpace::Memory).await
}

/// Start a sector erase of the sector containing `addr`
///
/// The caller polls for completion.
#[maybe_async]
pub async fn erase_sector<B: HyperBus + ?Sized>(bus: &mut B, addr: u32) -> Result<()> {
    unlocked_command(bus, commands::ERASE_SETUP).await?;
    unlock(bus).await?;
    bus.write(addr, commands::SECTOR_ERASE, AccessSpace::Memory)
        .await
}

/// Load the volatile configuration register
#[maybe_async]
pub async fn load_vcr<B: HyperBus + ?Sized>(bus: &mut B, value: u16) -> Result<()> {
    unlocked_command(bus, commands::LOAD_VCR).await?;
    bus.write(commands::VCR_ADDR, value, AccessSpace::Memory)
        .await
}

/// Read the volatile configuration register
#[maybe_async]
pub async fn read_vcr<B: HyperBus + ?Sized>(bus: &mut B) -> Result<u16> {
    unlocked_command(bus, commands::READ_VCR).await?;
    bus.read(commands::VCR_ADDR, AccessSpace::Memory).await
}
