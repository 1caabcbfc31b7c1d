//! Block device abstraction
//!
//! This module provides the `BlockDevice` trait a filesystem or storage
//! layer consumes, and `HyperFlashBlockDevice`, which implements it on top
//! of a `HyperBus`.
//!
//! Uses `maybe_async` to support both sync and async modes.

mod hyperflash;

pub use hyperflash::HyperFlashBlockDevice;

use crate::error::Result;
use maybe_async::maybe_async;

/// Block device trait
///
/// Addresses and sizes are in bytes. Reads, programs and erases must be
/// aligned to `read_size()`, `program_size()` and `erase_size()`
/// respectively and lie within `size()`. Passing a misaligned or out of
/// range request is a programming error: implementations assert on it
/// instead of returning an error, so validate with the `is_valid_*`
/// helpers first when the request comes from outside.
///
/// # Example
///
/// ```ignore
/// use hyperflash_core::block::BlockDevice;
///
/// fn rewrite_first_block<D: BlockDevice>(bd: &mut D, data: &[u8]) -> Result<()> {
///     bd.erase(0, bd.erase_size())?;
///     bd.program(0, data)
/// }
/// ```
#[maybe_async(AFIT)]
pub trait BlockDevice {
    /// Initialize the device
    async fn init(&mut self) -> Result<()>;

    /// Deinitialize the device
    async fn deinit(&mut self) -> Result<()>;

    /// Read `buf.len()` bytes starting at `addr`
    async fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()>;

    /// Program `data` starting at `addr`
    ///
    /// The target region must have been erased first. On error, a prefix of
    /// `data` may already have been committed to the device.
    async fn program(&mut self, addr: u32, data: &[u8]) -> Result<()>;

    /// Erase `len` bytes starting at `addr`
    ///
    /// On error, the state of the sector being erased is undefined.
    async fn erase(&mut self, addr: u32, len: u32) -> Result<()>;

    /// Size of a readable block in bytes
    fn read_size(&self) -> u32;

    /// Size of a programmable block in bytes
    ///
    /// Always a multiple of `read_size()`.
    fn program_size(&self) -> u32;

    /// Size of an erasable block in bytes
    ///
    /// Always a multiple of `program_size()`.
    fn erase_size(&self) -> u32;

    /// Value of storage after an erase
    ///
    /// `None` if erased storage cannot be relied on to hold any particular
    /// value.
    fn erase_value(&self) -> Option<u8>;

    /// Total size of the device in bytes
    fn size(&self) -> u32;

    /// Check a read request for alignment and bounds
    fn is_valid_read(&self, addr: u32, len: u32) -> bool {
        is_valid_request(addr, len, self.read_size(), self.size())
    }

    /// Check a program request for alignment and bounds
    fn is_valid_program(&self, addr: u32, len: u32) -> bool {
        is_valid_request(addr, len, self.program_size(), self.size())
    }

    /// Check an erase request for alignment and bounds
    fn is_valid_erase(&self, addr: u32, len: u32) -> bool {
        is_valid_request(addr, len, self.erase_size(), self.size())
    }
}

fn is_valid_request(addr: u32, len: u32, granularity: u32, size: u32) -> bool {
    // Use u64 arithmetic so addr + len cannot wrap
    addr % granularity == 0 && len % granularity == 0 && addr as u64 + len as u64 <= size as u64
}

#[cfg(test)]
mod tests {
    use super::is_valid_request;

    #[test]
    fn test_request_validation() {
        let size = 1024 * 1024;
        assert!(is_valid_request(0, 0, 2, size));
        assert!(is_valid_request(0, size, 2, size));
        assert!(is_valid_request(2, 4, 2, size));
        assert!(!is_valid_request(1, 2, 2, size));
        assert!(!is_valid_request(0, 3, 2, size));
        assert!(!is_valid_request(size - 2, 4, 2, size));
        assert!(!is_valid_request(u32::MAX - 1, 4, 2, size));
    }
}
