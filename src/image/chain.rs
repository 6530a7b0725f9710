/// Linked chains of file sectors
///
/// A file's raw bytes (9-byte header + body) are spread over 510-byte sector
/// payloads. Each sector names the next one in its last two bytes; the pointer
/// of the final sector is zero and never followed.

use super::sector::SectorData;
use super::DiskImage;
use crate::error::{Result, SamError};
use crate::format::{SectorAddress, MGT_PAYLOAD_SIZE, SAM_FILE_HEADER_SIZE};
use log::trace;

/// Number of sectors needed to store a body of `body_len` bytes plus its header
pub fn sectors_required(body_len: usize) -> usize {
    (body_len + SAM_FILE_HEADER_SIZE).div_ceil(MGT_PAYLOAD_SIZE)
}

impl DiskImage {
    /// Read `count` sectors of a chain starting at `first`
    pub fn read_chain(&self, first: SectorAddress, count: usize) -> Result<Vec<u8>> {
        let mut raw = Vec::with_capacity(count * MGT_PAYLOAD_SIZE);
        let mut current = first;

        for link in 0..count {
            trace!("chain link {} at {}", link, current);
            let sector = self.read_sector(current).map_err(|_| SamError::BrokenChain {
                link,
                track: current.track,
                sector: current.sector,
            })?;
            let (payload, next) = sector.split();
            raw.extend_from_slice(payload);
            current = next;
        }

        Ok(raw)
    }

    /// Write `raw` across `sectors`, linking each sector to the next
    ///
    /// Every coordinate is checked before anything is written.
    pub fn write_chain(&mut self, sectors: &[SectorAddress], raw: &[u8]) -> Result<()> {
        let needed = raw.len().div_ceil(MGT_PAYLOAD_SIZE).max(1);
        if sectors.len() != needed {
            return Err(SamError::disk_full(format!(
                "{} bytes need {} sectors but {} were supplied",
                raw.len(),
                needed,
                sectors.len()
            )));
        }
        for (link, address) in sectors.iter().enumerate() {
            if !address.is_valid() || address.is_directory() {
                return Err(SamError::BrokenChain {
                    link,
                    track: address.track,
                    sector: address.sector,
                });
            }
        }

        for (i, address) in sectors.iter().enumerate() {
            let start = (i * MGT_PAYLOAD_SIZE).min(raw.len());
            let end = ((i + 1) * MGT_PAYLOAD_SIZE).min(raw.len());
            let next = sectors.get(i + 1).copied();
            trace!("writing chain link {} to {} (next {:?})", i, address, next);
            self.write_sector(*address, &SectorData::join(&raw[start..end], next))?;
        }

        Ok(())
    }
}
