//! Status register definition

use bitflags::bitflags;

bitflags! {
    /// HyperFlash status register
    ///
    /// Only `DEVICE_READY` is meaningful while an embedded operation runs;
    /// the remaining bits are valid once the device reports ready.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusRegister: u16 {
        /// Device ready (no embedded operation in progress)
        const DEVICE_READY       = 1 << 7;
        /// Erase suspended
        const ERASE_SUSPEND      = 1 << 6;
        /// Last erase failed
        const ERASE_STATUS       = 1 << 5;
        /// Last program failed
        const PROGRAM_STATUS     = 1 << 4;
        /// Write buffer program aborted
        const WRITE_BUFFER_ABORT = 1 << 3;
        /// Program suspended
        const PROGRAM_SUSPEND    = 1 << 2;
        /// Operation targeted a locked sector
        const SECTOR_LOCK        = 1 << 1;

        /// Bits reporting a failed program
        const PROGRAM_ERRORS = Self::PROGRAM_STATUS.bits()
            | Self::WRITE_BUFFER_ABORT.bits()
            | Self::SECTOR_LOCK.bits();
        /// Bits reporting a failed erase
        const ERASE_ERRORS = Self::ERASE_STATUS.bits() | Self::SECTOR_LOCK.bits();
    }
}

impl StatusRegister {
    /// Whether the device has finished its embedded operation
    pub fn is_ready(&self) -> bool {
        self.contains(Self::DEVICE_READY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_bit() {
        assert!(StatusRegister::from_bits_retain(0x80).is_ready());
        assert!(StatusRegister::from_bits_retain(0xFF80).is_ready());
        assert!(!StatusRegister::from_bits_retain(0x7F).is_ready());
    }

    #[test]
    fn test_error_masks() {
        let status = StatusRegister::DEVICE_READY | StatusRegister::PROGRAM_STATUS;
        assert!(status.intersects(StatusRegister::PROGRAM_ERRORS));
        assert!(!status.intersects(StatusRegister::ERASE_ERRORS));
    }
}
