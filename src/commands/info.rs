//! Info command implementation

use super::Device;
use hyperflash_core::block::BlockDevice;

fn format_size(size: u32) -> String {
    if size >= 1024 * 1024 && size % (1024 * 1024) == 0 {
        format!("{} MiB", size / (1024 * 1024))
    } else if size >= 1024 && size % 1024 == 0 {
        format!("{} KiB", size / 1024)
    } else {
        format!("{} bytes", size)
    }
}

/// Print geometry, reserved region and usable layout
pub fn run_info(device: &Device) {
    let config = device.config();
    let geometry = device.geometry();

    println!("HyperFlash Block Device");
    println!("=======================");
    println!();
    println!(
        "Size:            {} bytes ({})",
        device.size(),
        format_size(device.size())
    );
    println!("Read size:       {} bytes", device.read_size());
    println!("Program size:    {} bytes", device.program_size());
    println!(
        "Erase size:      {} bytes ({}, {} sectors)",
        device.erase_size(),
        format_size(device.erase_size()),
        geometry.sector_count()
    );
    match device.erase_value() {
        Some(value) => println!("Erase value:     0x{:02X}", value),
        None => println!("Erase value:     undefined"),
    }
    println!("Write buffer:    {} bytes", geometry.write_buffer_size);
    println!();
    println!(
        "Reserved (chip): 0x{:08X} - 0x{:08X} ({})",
        0,
        config.reserved_offset.saturating_sub(1),
        format_size(config.reserved_offset)
    );
    println!(
        "Usable:          0x{:08X} - 0x{:08X} ({})",
        0,
        config.usable_size().saturating_sub(1),
        format_size(config.usable_size())
    );
    println!();
    println!("VCR:             0x{:04X}", config.init.vcr);
    println!(
        "Poll:            {} x {} us",
        config.poll.max_polls, config.poll.interval_us
    );
    println!(
        "Strict status:   {}",
        if config.strict_status { "yes" } else { "no" }
    );
}

#[cfg(test)]
mod tests {
    use super::format_size;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(64 * 1024 * 1024), "64 MiB");
        assert_eq!(format_size(256 * 1024), "256 KiB");
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(1536), "1536 bytes");
    }
}
