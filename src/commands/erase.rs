//! Erase command implementation

use super::{check_range, progress_bar, remaining_length, Device};
use hyperflash_core::block::BlockDevice;

/// Run the erase command
pub fn run_erase(
    device: &mut Device,
    offset: u32,
    length: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let len = remaining_length(device, offset, length)?;
    check_range(device, offset, len as u64, device.erase_size())?;

    println!(
        "Erasing 0x{:08X} - 0x{:08X} ({} sectors)",
        offset,
        (offset + len).saturating_sub(1),
        len / device.erase_size()
    );

    erase_with_progress(device, offset, len)?;

    println!("Erase complete");
    Ok(())
}

/// Erase `len` bytes starting at `offset`, one sector at a time
pub fn erase_with_progress(
    device: &mut Device,
    offset: u32,
    len: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let sector = device.erase_size();
    let pb = progress_bar(len as u64, "Erasing")?;

    let mut done = 0u32;
    while done < len {
        if let Err(e) = device.erase(offset + done, sector) {
            pb.abandon_with_message("Erase failed");
            return Err(e.into());
        }
        done += sector;
        pb.set_position(done as u64);
    }

    pb.finish_with_message("Erase complete");
    Ok(())
}
