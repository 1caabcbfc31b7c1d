//! hyperflash-core - Block device driver for HyperBus NOR flash
//!
//! This crate adapts a HyperFlash NOR chip (S26KS512S class, 64 MiB) to a
//! generic block device interface. Block reads go straight to the bus; program
//! and erase are translated into the chip's unlock/command cycles followed by
//! status register polling. It is designed to be `no_std` compatible for use
//! on the target itself.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`, TOML config)
//! - `alloc` - Enable heap allocation
//! - `is_sync` - Compile the bus and block device traits as blocking
//!
//! # Example
//!
//! ```ignore
//! use hyperflash_core::block::{BlockDevice, HyperFlashBlockDevice};
//! use hyperflash_core::config::DeviceConfig;
//!
//! fn hello<B: HyperBus>(bus: B) -> hyperflash_core::Result<()> {
//!     let mut bd = HyperFlashBlockDevice::new(bus, DeviceConfig::default())?;
//!     bd.init()?;
//!
//!     let sector = bd.erase_size();
//!     bd.erase(0, sector)?;
//!     bd.program(0, b"Hello World!\n\0\0\0")?;
//!
//!     let mut buf = [0u8; 16];
//!     bd.read(0, &mut buf)?;
//!     bd.deinit()
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod block;
pub mod bus;
pub mod config;
pub mod error;
pub mod protocol;

pub use error::{Error, Result};
