/// Track/sector addressing for MGT disks
///
/// A track byte carries the side in bit 7 and the cylinder in bits 0-6, so
/// valid tracks are 0-79 (side 0) and 128-207 (side 1). Sectors are numbered
/// 1-10. Cylinders are stored interleaved in the image: side 0 then side 1
/// of cylinder 0, then cylinder 1, and so on.
///
/// The 1560 data sectors are also numbered by a bit index into the per-file
/// sector address map. The 40 directory sectors (side 0, cylinders 0-3) have
/// no bit, so the numbering starts at track 4 sector 1 and runs through side 0
/// before continuing at track 128.

use crate::error::{Result, SamError};
use crate::format::constants::*;

/// Sectors per side as counted by the address map numbering
const SIDE_SPAN: usize = MGT_TRACKS_PER_SIDE as usize * MGT_SECTORS_PER_TRACK as usize;

/// A (track, sector) coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SectorAddress {
    /// Track byte: 0-79 or 128-207
    pub track: u8,
    /// Sector number: 1-10
    pub sector: u8,
}

impl SectorAddress {
    /// Create a sector address (not validated)
    pub fn new(track: u8, sector: u8) -> Self {
        Self { track, sector }
    }

    /// Disk side (0 or 1)
    pub fn side(&self) -> u8 {
        self.track >> 7
    }

    /// Cylinder on the side (0-127 before validation)
    pub fn cylinder(&self) -> u8 {
        self.track & !MGT_SIDE_FLAG
    }

    /// Whether the coordinate lies on the disk
    pub fn is_valid(&self) -> bool {
        (1..=MGT_SECTORS_PER_TRACK).contains(&self.sector)
            && self.cylinder() < MGT_TRACKS_PER_SIDE
    }

    /// Whether the coordinate is one of the directory sectors
    pub fn is_directory(&self) -> bool {
        self.is_valid() && self.side() == 0 && self.cylinder() < MGT_DIR_TRACKS
    }

    fn check(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SamError::OutOfRange {
                track: self.track,
                sector: self.sector,
            })
        }
    }

    /// Byte offset of the sector within the image
    pub fn offset(&self) -> Result<usize> {
        self.check()?;
        Ok(self.side() as usize * MGT_TRACK_SIZE
            + (self.sector as usize - 1) * MGT_SECTOR_SIZE
            + self.cylinder() as usize * MGT_CYLINDER_SIZE)
    }

    /// Position of the sector in the address map numbering
    pub fn bit(&self) -> Result<usize> {
        self.check()?;
        if self.is_directory() {
            return Err(SamError::OutOfRange {
                track: self.track,
                sector: self.sector,
            });
        }
        Ok(self.cylinder() as usize * MGT_SECTORS_PER_TRACK as usize + self.sector as usize - 1
            + self.side() as usize * SIDE_SPAN
            - MGT_DIR_SECTORS)
    }

    /// Byte offset and mask of the sector within a sector address map
    pub fn bit_index(&self) -> Result<(usize, u8)> {
        let bit = self.bit()?;
        Ok((bit >> 3, 1 << (bit & 7)))
    }

    /// Inverse of [`SectorAddress::bit`]
    pub fn from_bit(bit: usize) -> Option<Self> {
        if bit >= MGT_DATA_SECTORS {
            return None;
        }
        let n = bit + MGT_DIR_SECTORS;
        let side = (n / SIDE_SPAN) as u8;
        let rem = n % SIDE_SPAN;
        let cylinder = (rem / MGT_SECTORS_PER_TRACK as usize) as u8;
        let sector = (rem % MGT_SECTORS_PER_TRACK as usize) as u8 + 1;
        Some(Self {
            track: cylinder | (side << 7),
            sector,
        })
    }

    /// All data sectors in address map order
    pub fn data_sectors() -> impl Iterator<Item = SectorAddress> {
        (0..MGT_DATA_SECTORS).filter_map(SectorAddress::from_bit)
    }

    /// All directory sectors in directory order
    pub fn directory_sectors() -> impl Iterator<Item = SectorAddress> {
        (0..MGT_DIR_TRACKS).flat_map(|track| {
            (1..=MGT_SECTORS_PER_TRACK).map(move |sector| SectorAddress::new(track, sector))
        })
    }
}

impl std::fmt::Display for SectorAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Track {} / Sector {}", self.track, self.sector)
    }
}
