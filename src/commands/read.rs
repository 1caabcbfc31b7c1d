//! Read command implementation

use super::{check_range, chunk_size, progress_bar, remaining_length, Device};
use hyperflash_core::block::BlockDevice;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Run the read command
pub fn run_read(
    device: &mut Device,
    output: &Path,
    offset: u32,
    length: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let len = remaining_length(device, offset, length)?;
    check_range(device, offset, len as u64, device.read_size())?;

    let data = read_with_progress(device, offset, len as usize)?;

    let mut file = File::create(output)?;
    file.write_all(&data)?;

    println!("Wrote {} bytes to {:?}", data.len(), output);

    Ok(())
}

/// Read `len` bytes starting at `offset` with progress bar
pub fn read_with_progress(
    device: &mut Device,
    offset: u32,
    len: usize,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut data = vec![0u8; len];
    let chunk = chunk_size(device);

    let pb = progress_bar(len as u64, "Reading")?;

    let mut done = 0usize;
    for buf in data.chunks_mut(chunk) {
        device.read(offset + done as u32, buf)?;
        done += buf.len();
        pb.set_position(done as u64);
    }

    pb.finish_with_message("Read complete");
    Ok(data)
}
