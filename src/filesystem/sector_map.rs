/// Sector address maps
///
/// Every directory entry owns a 195-byte bitmap with one bit per data sector
/// (see [`SectorAddress::bit`]). The disk-wide free space is never stored:
/// it is the complement of the OR of all used entries' maps.

use crate::error::Result;
use crate::format::{SectorAddress, MGT_DATA_SECTORS, MGT_SECTOR_MAP_SIZE};

/// Per-file sector allocation bitmap
#[derive(Clone, PartialEq, Eq)]
pub struct SectorAddressMap(pub [u8; MGT_SECTOR_MAP_SIZE]);

impl Default for SectorAddressMap {
    fn default() -> Self {
        Self([0; MGT_SECTOR_MAP_SIZE])
    }
}

impl SectorAddressMap {
    /// An empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// OR another map into this one
    pub fn merge(&mut self, other: &SectorAddressMap) {
        for (byte, other) in self.0.iter_mut().zip(other.0.iter()) {
            *byte |= other;
        }
    }

    /// Union of several maps
    pub fn combined<'a, I>(maps: I) -> Self
    where
        I: IntoIterator<Item = &'a SectorAddressMap>,
    {
        let mut combined = Self::new();
        for map in maps {
            combined.merge(map);
        }
        combined
    }

    /// Mark a sector as allocated
    pub fn mark(&mut self, address: SectorAddress) -> Result<()> {
        let (offset, mask) = address.bit_index()?;
        self.0[offset] |= mask;
        Ok(())
    }

    /// Whether a sector is allocated
    pub fn contains(&self, address: SectorAddress) -> bool {
        match address.bit_index() {
            Ok((offset, mask)) => self.0[offset] & mask != 0,
            Err(_) => false,
        }
    }

    fn is_set(&self, bit: usize) -> bool {
        self.0[bit >> 3] & (1 << (bit & 7)) != 0
    }

    fn filter_sectors(&self, used: bool) -> Vec<SectorAddress> {
        (0..MGT_DATA_SECTORS)
            .filter(|&bit| self.is_set(bit) == used)
            .filter_map(SectorAddress::from_bit)
            .collect()
    }

    /// Allocated sectors in map order
    pub fn used_sectors(&self) -> Vec<SectorAddress> {
        self.filter_sectors(true)
    }

    /// Unallocated sectors in map order (the allocation order for new files)
    pub fn free_sectors(&self) -> Vec<SectorAddress> {
        self.filter_sectors(false)
    }

    /// Number of allocated sectors
    pub fn used_count(&self) -> usize {
        self.0.iter().map(|b| b.count_ones() as usize).sum()
    }
}

impl std::fmt::Display for SectorAddressMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for SectorAddressMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SectorAddressMap({})", self)
    }
}
