/// MGT file reader
///
/// MGT files are raw sector dumps used by:
/// - MGT +D / DISCiPLE for ZX Spectrum
/// - SAM Coupe
///
/// Format:
/// - Fixed 819,200 bytes (800KB)
/// - 80 cylinders, 2 sides, 10 sectors per track, 512 bytes each
/// - Cylinders interleave sides: C0S0, C0S1, C1S0, C1S1, ...

use crate::error::Result;
use crate::image::DiskImage;
use log::debug;
use std::fs;
use std::path::Path;

/// Check if a file is likely an MGT file based on extension
pub fn is_mgt_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("mgt"))
        .unwrap_or(false)
}

/// Read an MGT file from disk
pub fn read_mgt<P: AsRef<Path>>(path: P) -> Result<DiskImage> {
    let filename = path
        .as_ref()
        .file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.to_string());

    let data = fs::read(&path)?;
    debug!("read {} bytes from {}", data.len(), path.as_ref().display());

    let mut image = DiskImage::from_bytes(&data)?;
    image.filename = filename;
    Ok(image)
}
