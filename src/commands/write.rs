//! Write command implementation

use super::erase::erase_with_progress;
use super::verify::verify_with_progress;
use super::{align_up, check_range, chunk_size, progress_bar, read_file, Device};
use hyperflash_core::block::BlockDevice;
use std::path::Path;

/// Run the write command
///
/// With `erase` set the covered sectors are erased first, so `offset` must
/// be sector aligned. Without it the target must already be erased and
/// `offset` only needs to be program aligned.
pub fn run_write(
    device: &mut Device,
    input: &Path,
    offset: u32,
    erase: bool,
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = pad_to_program_size(device, read_file(input)?);
    check_range(device, offset, data.len() as u64, device.program_size())?;

    if erase {
        let erase_len = align_up(data.len(), device.erase_size());
        check_range(device, offset, erase_len as u64, device.erase_size())?;
        erase_with_progress(device, offset, erase_len as u32)?;
    }

    program_with_progress(device, offset, &data)?;
    println!("Wrote {} bytes at 0x{:08X}", data.len(), offset);

    if verify {
        verify_with_progress(device, offset, &data)?;
        println!("Verification passed!");
    }

    Ok(())
}

/// Pad `data` with the erase value up to a whole number of program units
fn pad_to_program_size(device: &Device, mut data: Vec<u8>) -> Vec<u8> {
    let len = align_up(data.len(), device.program_size());
    if len != data.len() {
        log::debug!("padding {} bytes to {}", data.len(), len);
        data.resize(len, device.erase_value().unwrap_or(0xFF));
    }
    data
}

/// Program `data` at `offset` with progress bar
fn program_with_progress(
    device: &mut Device,
    offset: u32,
    data: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = progress_bar(data.len() as u64, "Writing")?;

    let mut done = 0usize;
    for chunk in data.chunks(chunk_size(device)) {
        if let Err(e) = device.program(offset + done as u32, chunk) {
            pb.abandon_with_message("Write failed");
            return Err(e.into());
        }
        done += chunk.len();
        pb.set_position(done as u64);
    }

    pb.finish_with_message("Write complete");
    Ok(())
}
