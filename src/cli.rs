//! CLI argument parsing

use clap::{Parser, Subcommand};
use hyperflash_core::config::parse_size;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hyperflash")]
#[command(author, version, about = "HyperFlash block device tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Chip configuration file (TOML format)
    /// Defaults to the 64 MiB HyperFlash layout
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Device options shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Chip image file (created erased if it does not exist)
    #[arg(long)]
    pub image: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show device geometry and layout
    Info {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Read block device contents to file
    Read {
        #[command(flatten)]
        device: DeviceArgs,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Block device address to start at (e.g. 0x40000, "256 KiB")
        #[arg(long, value_parser = parse_size, default_value = "0")]
        offset: u32,

        /// Number of bytes to read (defaults to the rest of the device)
        #[arg(long, value_parser = parse_size)]
        length: Option<u32>,
    },

    /// Write file to the block device
    Write {
        #[command(flatten)]
        device: DeviceArgs,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Block device address to start at
        #[arg(long, value_parser = parse_size, default_value = "0")]
        offset: u32,

        /// Don't erase before writing
        #[arg(long)]
        no_erase: bool,

        /// Verify after writing
        #[arg(long)]
        verify: bool,
    },

    /// Erase sectors of the block device
    Erase {
        #[command(flatten)]
        device: DeviceArgs,

        /// Block device address to start at (sector aligned)
        #[arg(long, value_parser = parse_size, default_value = "0")]
        offset: u32,

        /// Number of bytes to erase (defaults to the rest of the device)
        #[arg(long, value_parser = parse_size)]
        length: Option<u32>,
    },

    /// Verify block device contents against file
    Verify {
        #[command(flatten)]
        device: DeviceArgs,

        /// Input file path to verify against
        #[arg(short, long)]
        input: PathBuf,

        /// Block device address the file starts at
        #[arg(long, value_parser = parse_size, default_value = "0")]
        offset: u32,
    },
}

impl Commands {
    /// Device options of the selected command
    pub fn device(&self) -> &DeviceArgs {
        match self {
            Commands::Info { device }
            | Commands::Read { device, .. }
            | Commands::Write { device, .. }
            | Commands::Erase { device, .. }
            | Commands::Verify { device, .. } => device,
        }
    }

    /// Whether the command changes the chip contents
    pub fn is_mutating(&self) -> bool {
        matches!(self, Commands::Write { .. } | Commands::Erase { .. })
    }
}
