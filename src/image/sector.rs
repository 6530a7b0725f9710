/// Sector data and single-sector access to the image buffer

use super::DiskImage;
use crate::error::Result;
use crate::format::{SectorAddress, MGT_PAYLOAD_SIZE, MGT_SECTOR_SIZE};

/// The 512 bytes of one sector
///
/// File sectors hold 510 bytes of payload followed by the track and sector
/// of the next sector in the file's chain.
#[derive(Clone, PartialEq, Eq)]
pub struct SectorData([u8; MGT_SECTOR_SIZE]);

impl SectorData {
    /// Wrap raw sector bytes
    pub fn new(data: [u8; MGT_SECTOR_SIZE]) -> Self {
        Self(data)
    }

    /// A sector of zero bytes
    pub fn zeroed() -> Self {
        Self([0; MGT_SECTOR_SIZE])
    }

    /// Raw sector bytes
    pub fn data(&self) -> &[u8; MGT_SECTOR_SIZE] {
        &self.0
    }

    /// Mutable raw sector bytes
    pub fn data_mut(&mut self) -> &mut [u8; MGT_SECTOR_SIZE] {
        &mut self.0
    }

    /// Split into payload and chain pointer
    pub fn split(&self) -> (&[u8], SectorAddress) {
        let next = SectorAddress::new(self.0[MGT_PAYLOAD_SIZE], self.0[MGT_PAYLOAD_SIZE + 1]);
        (&self.0[..MGT_PAYLOAD_SIZE], next)
    }

    /// Build a file sector from a payload and chain pointer
    ///
    /// Payloads shorter than 510 bytes are zero filled; extra bytes are
    /// ignored. `None` leaves the pointer zeroed, as for the last sector of a
    /// chain.
    pub fn join(payload: &[u8], next: Option<SectorAddress>) -> Self {
        let mut data = [0u8; MGT_SECTOR_SIZE];
        let len = payload.len().min(MGT_PAYLOAD_SIZE);
        data[..len].copy_from_slice(&payload[..len]);
        if let Some(next) = next {
            data[MGT_PAYLOAD_SIZE] = next.track;
            data[MGT_PAYLOAD_SIZE + 1] = next.sector;
        }
        Self(data)
    }
}

impl std::fmt::Debug for SectorData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (_, next) = self.split();
        f.debug_struct("SectorData").field("next", &next).finish_non_exhaustive()
    }
}

impl DiskImage {
    /// Read a sector
    pub fn read_sector(&self, address: SectorAddress) -> Result<SectorData> {
        let offset = address.offset()?;
        let mut data = [0u8; MGT_SECTOR_SIZE];
        data.copy_from_slice(&self.data[offset..offset + MGT_SECTOR_SIZE]);
        Ok(SectorData(data))
    }

    /// Write a sector
    pub fn write_sector(&mut self, address: SectorAddress, sector: &SectorData) -> Result<()> {
        let offset = address.offset()?;
        self.data[offset..offset + MGT_SECTOR_SIZE].copy_from_slice(&sector.0);
        self.changed = true;
        Ok(())
    }
}
