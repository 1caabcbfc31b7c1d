//! HyperFlash command protocol
//!
//! Command sequences of the HyperFlash (CFI AMD/Spansion style) command set:
//! unlock cycles, program and sector erase setup, status register polling
//! and volatile configuration register access.

pub mod commands;
mod hyperflash;
mod status;

pub use hyperflash::*;
pub use status::StatusRegister;
