//! hyperflash-dummy - In-memory HyperFlash emulator for testing
//!
//! This crate provides a `HyperBus` implementation with a HyperFlash chip
//! emulated in memory. It decodes the same unlock and command cycles the
//! real part does, counts every command sequence it sees, and can be told
//! to misbehave (stay busy forever, report status errors, fail transfers)
//! so driver code can be tested without hardware.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
mod image;


#[cfg(feature = "std")]
pub use image::ImageError;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

#[cfg(feature = "alloc")]
use hyperflash_core::bus::{AccessSpace, BusConfig, HyperBus};
#[cfg(feature = "alloc")]
use hyperflash_core::error::{Error, Result};
#[cfg(feature = "alloc")]
use hyperflash_core::protocol::{commands, StatusRegister};

/// Command byte that aborts any partial sequence
pub const RESET: u16 = 0xF0;

/// Configuration for the dummy chip
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Physical chip size in bytes
    pub size: usize,
    /// Erase sector size in bytes
    pub sector_size: usize,
    /// Write buffer size in bytes; a program must not cross its boundary
    pub write_buffer_size: usize,
    /// Number of status reads that report busy after a program or erase
    pub busy_polls: u32,
    /// Power-on value of the volatile configuration register
    pub vcr: u16,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            size: 64 * 1024 * 1024, // S26KS512S
            sector_size: 256 * 1024,
            write_buffer_size: 512,
            busy_polls: 1,
            vcr: 0x8EBB,
        }
    }
}

/// Per-command counters kept by the dummy chip
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandCounters {
    /// `configure()` calls
    pub configure_calls: u32,
    /// Completed two-cycle unlock sequences
    pub unlock_sequences: u32,
    /// Accepted buffer programs
    pub programs: u32,
    /// Bytes accepted by buffer programs
    pub bytes_programmed: u64,
    /// Executed sector erases
    pub sector_erases: u32,
    /// Status register reads
    pub status_reads: u32,
    /// Clear status commands
    pub status_clears: u32,
    /// Volatile configuration register loads
    pub vcr_loads: u32,
    /// Volatile configuration register reads
    pub vcr_reads: u32,
    /// Cycles that did not fit the command set
    pub protocol_errors: u32,
    /// Total time requested through `delay_us()`
    pub delay_us: u64,
}

/// Command decoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandState {
    Idle,
    Unlock1,
    Unlocked,
    ProgramArmed,
    EraseSetup,
    EraseUnlock1,
    EraseUnlocked,
    StatusRead,
    VcrLoad,
    VcrRead,
}

/// Dummy HyperFlash chip
///
/// Emulates a HyperFlash chip in memory for testing purposes. Addresses
/// beyond the end of the array wrap around, like a part that ignores the
/// upper address bits.
#[cfg(feature = "alloc")]
pub struct DummyHyperFlash {
    config: DummyConfig,
    data: Vec<u8>,
    state: CommandState,
    vcr: u16,
    vcr_locked: bool,
    status_errors: StatusRegister,
    pending_errors: StatusRegister,
    busy_remaining: u32,
    stuck_busy: bool,
    bus_fault: bool,
    bus_config: Option<BusConfig>,
    counters: CommandCounters,
}

#[cfg(feature = "alloc")]
impl DummyHyperFlash {
    /// Create a new dummy chip with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        Self {
            vcr: config.vcr,
            config,
            data,
            state: CommandState::Idle,
            vcr_locked: false,
            status_errors: StatusRegister::empty(),
            pending_errors: StatusRegister::empty(),
            busy_remaining: 0,
            stuck_busy: false,
            bus_fault: false,
            bus_config: None,
            counters: CommandCounters::default(),
        }
    }

    /// Create a new dummy chip with default configuration (64 MiB)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy chip with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash array
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash array
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Get the command counters
    pub fn counters(&self) -> &CommandCounters {
        &self.counters
    }

    /// Reset all command counters to zero
    pub fn reset_counters(&mut self) {
        self.counters = CommandCounters::default();
    }

    /// Bus configuration last applied through `configure()`
    pub fn bus_config(&self) -> Option<&BusConfig> {
        self.bus_config.as_ref()
    }

    /// Current value of the volatile configuration register
    pub fn vcr(&self) -> u16 {
        self.vcr
    }

    /// Ignore configuration register loads
    pub fn set_vcr_locked(&mut self, locked: bool) {
        self.vcr_locked = locked;
    }

    /// Report busy on every status read, forever
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Number of status reads that report busy after each operation
    pub fn set_busy_polls(&mut self, polls: u32) {
        self.config.busy_polls = polls;
    }

    /// Report `errors` in the status register once the next program or
    /// erase completes
    pub fn inject_status_errors(&mut self, errors: StatusRegister) {
        self.pending_errors = errors;
    }

    /// Fail every bus transaction with `Error::Bus`
    pub fn set_bus_fault(&mut self, fault: bool) {
        self.bus_fault = fault;
    }

    fn index(&self, addr: u32) -> usize {
        addr as usize % self.data.len()
    }

    fn check_bus(&self) -> Result<()> {
        if self.bus_fault {
            Err(Error::Bus)
        } else {
            Ok(())
        }
    }

    fn protocol_error(&mut self, what: &str, addr: u32, value: u16) {
        log::warn!(
            "dummy: unexpected {} 0x{:04X} @ 0x{:08X} in state {:?}",
            what,
            value,
            addr,
            self.state
        );
        self.counters.protocol_errors += 1;
        self.state = CommandState::Idle;
    }

    fn start_busy(&mut self) {
        self.busy_remaining = self.config.busy_polls;
        self.status_errors |= self.pending_errors;
        self.pending_errors = StatusRegister::empty();
    }

    fn status_word(&mut self) -> u16 {
        self.counters.status_reads += 1;
        if self.stuck_busy {
            return self.status_errors.bits();
        }
        if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
            return self.status_errors.bits();
        }
        (StatusRegister::DEVICE_READY | self.status_errors).bits()
    }

    fn read_word(&self, addr: u32) -> u16 {
        let lo = self.data[self.index(addr)];
        let hi = self.data[self.index(addr.wrapping_add(1))];
        u16::from_le_bytes([lo, hi])
    }

    fn copy_out(&self, addr: u32, buf: &mut [u8]) {
        let start = self.index(addr);
        let len = self.data.len();
        if start + buf.len() <= len {
            buf.copy_from_slice(&self.data[start..start + buf.len()]);
        } else {
            for (i, byte) in buf.iter_mut().enumerate() {
                *byte = self.data[(start + i) % len];
            }
        }
    }

    fn handle_sector_erase(&mut self, addr: u32) {
        let sector = self.config.sector_size;
        let start = (self.index(addr) / sector) * sector;
        let end = core::cmp::min(start + sector, self.data.len());

        // Erase sets all bytes to 0xFF
        for byte in &mut self.data[start..end] {
            *byte = 0xFF;
        }

        self.counters.sector_erases += 1;
        self.start_busy();
    }

    fn handle_buffer_program(&mut self, addr: u32, data: &[u8]) {
        let wbs = self.config.write_buffer_size;
        let start = self.index(addr);

        if data.is_empty() || start % wbs + data.len() > wbs {
            log::warn!(
                "dummy: {} byte program at 0x{:08X} crosses a write buffer boundary",
                data.len(),
                addr
            );
            self.counters.protocol_errors += 1;
            self.pending_errors |= StatusRegister::WRITE_BUFFER_ABORT;
            self.start_busy();
            return;
        }

        // Flash programming: can only change 1 -> 0
        let len = self.data.len();
        for (i, &byte) in data.iter().enumerate() {
            self.data[(start + i) % len] &= byte;
        }

        self.counters.programs += 1;
        self.counters.bytes_programmed += data.len() as u64;
        self.start_busy();
    }

    fn handle_write(&mut self, addr: u32, value: u16) {
        use CommandState::*;

        self.state = match (self.state, addr, value) {
            (Idle, commands::UNLOCK1_ADDR, commands::UNLOCK1_DATA) => Unlock1,
            (Unlock1, commands::UNLOCK2_ADDR, commands::UNLOCK2_DATA) => {
                self.counters.unlock_sequences += 1;
                Unlocked
            }

            (Unlocked, commands::CMD_ADDR, commands::PROGRAM) => ProgramArmed,
            (Unlocked, commands::CMD_ADDR, commands::ERASE_SETUP) => EraseSetup,
            (Unlocked, commands::CMD_ADDR, commands::LOAD_VCR) => VcrLoad,
            (Unlocked, commands::CMD_ADDR, commands::READ_VCR) => VcrRead,

            (EraseSetup, commands::UNLOCK1_ADDR, commands::UNLOCK1_DATA) => EraseUnlock1,
            (EraseUnlock1, commands::UNLOCK2_ADDR, commands::UNLOCK2_DATA) => {
                self.counters.unlock_sequences += 1;
                EraseUnlocked
            }
            (EraseUnlocked, sector, commands::SECTOR_ERASE) => {
                self.handle_sector_erase(sector);
                Idle
            }

            (VcrLoad, commands::VCR_ADDR, vcr) => {
                self.counters.vcr_loads += 1;
                if !self.vcr_locked {
                    self.vcr = vcr;
                }
                Idle
            }

            (Idle, commands::CMD_ADDR, commands::READ_STATUS) => StatusRead,
            (Idle, commands::CMD_ADDR, commands::CLEAR_STATUS) => {
                self.counters.status_clears += 1;
                self.status_errors = StatusRegister::empty();
                Idle
            }

            (_, _, RESET) => Idle,

            _ => {
                self.protocol_error("write", addr, value);
                Idle
            }
        };
    }
}

#[cfg(feature = "alloc")]
impl HyperBus for DummyHyperFlash {
    fn configure(&mut self, config: &BusConfig) -> Result<()> {
        self.check_bus()?;
        self.counters.configure_calls += 1;
        self.bus_config = Some(*config);
        Ok(())
    }

    fn write(&mut self, addr: u32, value: u16, space: AccessSpace) -> Result<()> {
        self.check_bus()?;
        match space {
            AccessSpace::Memory => self.handle_write(addr, value),
            AccessSpace::Register => {
                log::trace!("dummy: register write 0x{:04X} @ 0x{:08X}", value, addr)
            }
        }
        Ok(())
    }

    fn read(&mut self, addr: u32, space: AccessSpace) -> Result<u16> {
        self.check_bus()?;
        if space == AccessSpace::Register {
            return Ok(0);
        }

        let value = match self.state {
            CommandState::Idle => self.read_word(addr),
            CommandState::StatusRead => {
                self.state = CommandState::Idle;
                self.status_word()
            }
            CommandState::VcrRead => {
                self.state = CommandState::Idle;
                self.counters.vcr_reads += 1;
                self.vcr
            }
            _ => {
                self.protocol_error("read", addr, 0);
                self.read_word(addr)
            }
        };
        Ok(value)
    }

    fn write_block(&mut self, addr: u32, data: &[u8], space: AccessSpace) -> Result<()> {
        self.check_bus()?;
        if space == AccessSpace::Register || self.state != CommandState::ProgramArmed {
            self.protocol_error("block write", addr, data.len() as u16);
            return Ok(());
        }

        self.state = CommandState::Idle;
        self.handle_buffer_program(addr, data);
        Ok(())
    }

    fn read_block(&mut self, addr: u32, buf: &mut [u8], space: AccessSpace) -> Result<()> {
        self.check_bus()?;
        if space == AccessSpace::Register {
            buf.fill(0);
            return Ok(());
        }
        if self.state != CommandState::Idle {
            self.protocol_error("block read", addr, buf.len() as u16);
        }

        self.copy_out(addr, buf);
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        // No delay needed for in-memory operations
        self.counters.delay_us += us as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperflash_core::config::PollConfig;
    use hyperflash_core::protocol;

    fn small_chip() -> DummyHyperFlash {
        DummyHyperFlash::new(DummyConfig {
            size: 1024 * 1024,
            ..DummyConfig::default()
        })
    }

    #[test]
    fn test_program_sequence() {
        let mut flash = small_chip();

        protocol::program_buffer(&mut flash, 0x1000, &[0x12, 0x34, 0x56, 0x78]).unwrap();
        let status = protocol::wait_ready(&mut flash, &PollConfig::DEFAULT).unwrap();
        assert!(status.is_ready());

        assert_eq!(&flash.data()[0x1000..0x1004], &[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(flash.counters().programs, 1);
        assert_eq!(flash.counters().unlock_sequences, 1);
        assert_eq!(flash.counters().protocol_errors, 0);
    }

    #[test]
    fn test_program_only_clears_bits() {
        let mut flash = small_chip();
        flash.data_mut()[0] = 0xF0;

        protocol::program_buffer(&mut flash, 0, &[0x0F, 0xAA]).unwrap();

        assert_eq!(&flash.data()[..2], &[0x00, 0xAA]);
    }

    #[test]
    fn test_sector_erase() {
        let mut flash = small_chip();
        flash.data_mut()[..16].fill(0x00);
        flash.data_mut()[256 * 1024] = 0x00;

        protocol::erase_sector(&mut flash, 0).unwrap();
        protocol::wait_ready(&mut flash, &PollConfig::DEFAULT).unwrap();

        assert!(flash.data()[..256 * 1024].iter().all(|&b| b == 0xFF));
        // Next sector untouched
        assert_eq!(flash.data()[256 * 1024], 0x00);
        assert_eq!(flash.counters().sector_erases, 1);
        assert_eq!(flash.counters().unlock_sequences, 2);
    }

    #[test]
    fn test_busy_polls() {
        let mut flash = small_chip();
        flash.set_busy_polls(3);

        protocol::erase_sector(&mut flash, 0).unwrap();
        protocol::wait_ready(&mut flash, &PollConfig::DEFAULT).unwrap();

        assert_eq!(flash.counters().status_reads, 4);
        assert_eq!(flash.counters().delay_us, 3 * 1000);
    }

    #[test]
    fn test_vcr_load_and_read() {
        let mut flash = small_chip();
        assert_eq!(flash.vcr(), 0x8EBB);

        protocol::load_vcr(&mut flash, 0x8E0B).unwrap();
        assert_eq!(flash.vcr(), 0x8E0B);
        assert_eq!(protocol::read_vcr(&mut flash).unwrap(), 0x8E0B);
    }

    #[test]
    fn test_status_errors_are_sticky_until_cleared() {
        let mut flash = small_chip();
        flash.inject_status_errors(StatusRegister::PROGRAM_STATUS);

        protocol::program_buffer(&mut flash, 0, &[0x00, 0x00]).unwrap();
        let status = protocol::wait_ready(&mut flash, &PollConfig::DEFAULT).unwrap();
        assert!(status.contains(StatusRegister::PROGRAM_STATUS));

        let status = protocol::read_status(&mut flash).unwrap();
        assert!(status.contains(StatusRegister::PROGRAM_STATUS));

        protocol::clear_status(&mut flash).unwrap();
        let status = protocol::read_status(&mut flash).unwrap();
        assert_eq!(status, StatusRegister::DEVICE_READY);
    }

    #[test]
    fn test_page_crossing_program_is_rejected() {
        let mut flash = small_chip();

        protocol::program_buffer(&mut flash, 510, &[0x00; 4]).unwrap();
        let status = protocol::wait_ready(&mut flash, &PollConfig::DEFAULT).unwrap();

        assert!(status.contains(StatusRegister::WRITE_BUFFER_ABORT));
        assert_eq!(flash.counters().protocol_errors, 1);
        assert!(flash.data()[..1024].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_block_write_without_command_is_ignored() {
        let mut flash = small_chip();

        flash.write_block(0, &[0x00; 2], AccessSpace::Memory).unwrap();

        assert_eq!(flash.counters().protocol_errors, 1);
        assert_eq!(&flash.data()[..2], &[0xFF, 0xFF]);
    }

    #[test]
    fn test_reads_wrap_around() {
        let mut flash = small_chip();
        flash.data_mut()[0] = 0x5A;
        let size = flash.data().len() as u32;

        let mut buf = [0u8; 2];
        flash.read_block(size - 1, &mut buf, AccessSpace::Memory).unwrap();

        assert_eq!(buf, [0xFF, 0x5A]);
    }

    #[test]
    fn test_bus_fault() {
        let mut flash = small_chip();
        flash.set_bus_fault(true);

        assert_eq!(protocol::read_status(&mut flash), Err(Error::Bus));
    }
}
