//! HyperFlash command cycle addresses and values
//!
//! Command addresses are chip word addresses. The bus is byte addressed, so
//! every command address is shifted left by one before use.

// ============================================================================
// Unlock cycles
// ============================================================================

/// First unlock cycle address (word 0x555)
pub const UNLOCK1_ADDR: u32 = 0x555 << 1;
/// Second unlock cycle address (word 0x2AA)
pub const UNLOCK2_ADDR: u32 = 0x2AA << 1;
/// First unlock cycle data
pub const UNLOCK1_DATA: u16 = 0xAA;
/// Second unlock cycle data
pub const UNLOCK2_DATA: u16 = 0x55;

/// Address that takes command bytes after the unlock cycles
pub const CMD_ADDR: u32 = UNLOCK1_ADDR;

// ============================================================================
// Program / erase
// ============================================================================

/// Word/buffer program
pub const PROGRAM: u16 = 0xA0;
/// Erase setup, followed by a second unlock and the erase type
pub const ERASE_SETUP: u16 = 0x80;
/// Sector erase, written to the sector address
pub const SECTOR_ERASE: u16 = 0x30;

// ============================================================================
// Status register
// ============================================================================

/// Status register read, value is read back from `STATUS_ADDR`
pub const READ_STATUS: u16 = 0x70;
/// Clear status register error bits
pub const CLEAR_STATUS: u16 = 0x71;
/// Address to read the status word from
pub const STATUS_ADDR: u32 = 0;

// ============================================================================
// Volatile configuration register
// ============================================================================

/// Load volatile configuration register, value is written to `VCR_ADDR`
pub const LOAD_VCR: u16 = 0x38;
/// Read volatile configuration register, value is read from `VCR_ADDR`
pub const READ_VCR: u16 = 0xC7;
/// Address of the configuration value cycle
pub const VCR_ADDR: u32 = 0;
