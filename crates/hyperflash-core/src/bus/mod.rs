//! HyperBus transport abstraction
//!
//! The driver never touches the bus controller directly. Everything it needs
//! (single word writes for commands, word reads for status, bulk block
//! transfers for data) goes through the `HyperBus` trait so the command logic
//! can run against real hardware or an emulator alike.

mod traits;

pub use traits::*;
