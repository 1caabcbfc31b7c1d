//! Verify command implementation

use super::{align_up, check_range, chunk_size, progress_bar, read_file, CommandError, Device};
use hyperflash_core::block::BlockDevice;
use std::path::Path;

/// Run the verify command
pub fn run_verify(
    device: &mut Device,
    input: &Path,
    offset: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let expected = read_file(input)?;

    verify_with_progress(device, offset, &expected)?;

    println!("Verification passed!");
    Ok(())
}

/// Compare device contents at `offset` against `expected` with progress bar
pub fn verify_with_progress(
    device: &mut Device,
    offset: u32,
    expected: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    // Reads must cover whole read units
    let len = align_up(expected.len(), device.read_size());
    check_range(device, offset, len as u64, device.read_size())?;

    let mut buf = vec![0u8; chunk_size(device)];
    let pb = progress_bar(expected.len() as u64, "Verifying")?;

    let mut done = 0usize;
    let mut mismatch_count = 0usize;
    let mut first_mismatch: Option<(usize, u8, u8)> = None;

    while done < len {
        let chunk = std::cmp::min(buf.len(), len - done);
        let actual = &mut buf[..chunk];
        device.read(offset + done as u32, actual)?;

        let end = std::cmp::min(done + chunk, expected.len());
        for (i, (a, e)) in actual.iter().zip(&expected[done..end]).enumerate() {
            if a != e {
                if first_mismatch.is_none() {
                    first_mismatch = Some((done + i, *a, *e));
                }
                mismatch_count += 1;
            }
        }

        done += chunk;
        pb.set_position(end as u64);
    }

    if let Some((pos, found, expected)) = first_mismatch {
        pb.abandon_with_message("Verification failed!");
        return Err(CommandError::VerifyFailed {
            count: mismatch_count,
            addr: offset + pos as u32,
            expected,
            found,
        }
        .into());
    }

    pb.finish_with_message("Verification passed");
    Ok(())
}
