use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use hotspot_core::io::thermal::THERMAL_HEADER_SIZE;
use hotspot_core::io::ThermalReader;

#[derive(Args)]
pub struct InfoArgs {
    /// Input thermal clip
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let reader = ThermalReader::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let header = &reader.header;

    println!("File:        {}", args.file.display());
    println!("Device:      {}", header.device_name);
    println!("Frames:      {}", header.frame_count);
    println!("Dimensions:  {}x{}", header.width, header.height);
    println!("Frame rate:  {} fps", header.frames_per_second);
    println!("Preview:     {} s", header.preview_secs);
    match header.start_time() {
        Ok(start) => println!("Recorded:    {}", start.to_rfc3339()),
        Err(_) => println!("Recorded:    invalid timestamp ({})", header.timestamp_us),
    }

    let data_bytes = header.file_byte_size()? - THERMAL_HEADER_SIZE;
    let total_mb = data_bytes as f64 / (1024.0 * 1024.0);
    println!("Data size:   {:.1} MB", total_mb);

    Ok(())
}
