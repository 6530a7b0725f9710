/// MGT file writer

use crate::error::Result;
use crate::image::DiskImage;
use log::debug;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write the raw image bytes to a file
pub fn write_mgt<P: AsRef<Path>>(image: &DiskImage, path: P) -> Result<()> {
    let mut file = File::create(&path)?;
    file.write_all(image.as_bytes())?;
    file.flush()?;
    debug!("wrote {} bytes to {}", image.as_bytes().len(), path.as_ref().display());
    Ok(())
}
