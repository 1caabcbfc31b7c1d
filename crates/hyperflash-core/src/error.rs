//! Error types for hyperflash-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate, along with the integer codes of the block device
//! contract that callers on the C side of the fence expect.

use core::fmt;

/// Operation completed successfully
pub const BD_ERROR_OK: i32 = 0;
/// Device specific error (timeout or hardware fault)
pub const BD_ERROR_DEVICE_ERROR: i32 = -4001;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The device ready bit never set within the polling budget
    Timeout,
    /// The bus transport failed to carry out a transaction
    Bus,
    /// The chip reported a program failure in its status register
    ProgramFailed {
        /// Physical address of the chunk being programmed
        addr: u32,
    },
    /// The chip reported an erase failure in its status register
    EraseFailed {
        /// Physical address of the sector being erased
        addr: u32,
    },
    /// Configuration register read back differs from what was written
    ConfigMismatch {
        /// Value written during init
        expected: u16,
        /// Value read back from the chip
        found: u16,
    },
    /// Geometry violates the block device size invariants
    InvalidGeometry,
}

impl Error {
    /// Map this error onto the block device integer contract
    ///
    /// Every failure the driver can report collapses onto
    /// `BD_ERROR_DEVICE_ERROR`: a chip that is faulty and a chip that is
    /// merely slow look the same to the caller.
    pub const fn code(&self) -> i32 {
        BD_ERROR_DEVICE_ERROR
    }
}

/// Convert an operation result into a block device status code
///
/// Zero means success, a negative value is an error code.
pub fn status_code<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => BD_ERROR_OK,
        Err(e) => e.code(),
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "device did not become ready in time"),
            Self::Bus => write!(f, "HyperBus transfer failed"),
            Self::ProgramFailed { addr } => {
                write!(f, "program failed at address 0x{:08X}", addr)
            }
            Self::EraseFailed { addr } => {
                write!(f, "erase failed at address 0x{:08X}", addr)
            }
            Self::ConfigMismatch { expected, found } => write!(
                f,
                "configuration register mismatch: wrote 0x{:04X}, read 0x{:04X}",
                expected, found
            ),
            Self::InvalidGeometry => write!(f, "invalid flash geometry"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let ok: Result<()> = Ok(());
        assert_eq!(status_code(&ok), BD_ERROR_OK);

        let timeout: Result<()> = Err(Error::Timeout);
        assert_eq!(status_code(&timeout), BD_ERROR_DEVICE_ERROR);

        let failed: Result<()> = Err(Error::EraseFailed { addr: 0x40000 });
        assert!(status_code(&failed) < 0);
    }
}
