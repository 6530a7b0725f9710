/// The directory journal: 80 entries in the first 4 tracks of side 0

use super::entry::FileEntry;
use super::sector_map::SectorAddressMap;
use crate::error::Result;
use crate::format::*;
use crate::image::DiskImage;
use log::{debug, warn};

/// A snapshot of all directory slots
///
/// Slots whose sector could not be read are `None`.
#[derive(Debug, Clone)]
pub struct DiskJournal {
    slots: Vec<Option<FileEntry>>,
}

impl DiskJournal {
    /// Read every directory slot from the image
    pub fn scan(image: &DiskImage) -> Self {
        let mut slots = Vec::with_capacity(MGT_MAX_DIR_ENTRIES);

        for address in SectorAddress::directory_sectors() {
            let sector = match image.read_sector(address) {
                Ok(sector) => sector,
                Err(e) => {
                    warn!("Error reading directory sector {}: {}", address, e);
                    slots.extend((0..MGT_ENTRIES_PER_SECTOR).map(|_| None));
                    continue;
                }
            };

            for chunk in sector.data().chunks_exact(MGT_DIR_ENTRY_SIZE) {
                let mut raw = [0u8; MGT_DIR_ENTRY_SIZE];
                raw.copy_from_slice(chunk);
                slots.push(Some(FileEntry::decode(&raw)));
            }
        }

        Self { slots }
    }

    /// All slots in directory order
    pub fn slots(&self) -> &[Option<FileEntry>] {
        &self.slots
    }

    /// Entry in a slot, if it could be read
    pub fn get(&self, index: usize) -> Option<&FileEntry> {
        self.slots.get(index).and_then(|slot| slot.as_ref())
    }

    /// Used entries with their slot indexes
    pub fn used_entries(&self) -> impl Iterator<Item = (usize, &FileEntry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|e| (i, e)))
            .filter(|(_, e)| e.is_used())
    }

    /// Indexes of slots available for a new file
    pub fn free_entries(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, Some(e) if !e.is_used()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Lowest free slot index
    pub fn first_free_slot(&self) -> Option<usize> {
        self.free_entries().into_iter().next()
    }

    /// Find a used entry by name
    ///
    /// The first match in directory order wins; further matches are logged.
    pub fn find(&self, name: &str) -> Option<(usize, &FileEntry)> {
        let mut matches = self.used_entries().filter(|(_, e)| e.name.matches(name));
        let first = matches.next();
        if let Some((index, _)) = first {
            for (duplicate, _) in matches {
                warn!(
                    "Duplicate filename {:?} in slot {} (using slot {})",
                    name, duplicate, index
                );
            }
        }
        first
    }

    /// Union of the sector maps of all used entries
    pub fn combined_sector_map(&self) -> SectorAddressMap {
        SectorAddressMap::combined(self.used_entries().map(|(_, e)| &e.sector_map))
    }
}

/// Directory sector and byte offset within it for a slot index
fn slot_location(index: usize) -> (SectorAddress, usize) {
    let sector_index = index / MGT_ENTRIES_PER_SECTOR;
    let track = (sector_index / MGT_SECTORS_PER_TRACK as usize) as u8;
    let sector = (sector_index % MGT_SECTORS_PER_TRACK as usize) as u8 + 1;
    (
        SectorAddress::new(track, sector),
        (index % MGT_ENTRIES_PER_SECTOR) * MGT_DIR_ENTRY_SIZE,
    )
}

impl DiskImage {
    /// Scan the directory
    pub fn directory(&self) -> DiskJournal {
        DiskJournal::scan(self)
    }

    /// Encode an entry into a directory slot
    pub fn write_entry(&mut self, index: usize, entry: &FileEntry) -> Result<()> {
        let (address, offset) = slot_location(index);
        let mut sector = self.read_sector(address)?;
        sector.data_mut()[offset..offset + MGT_DIR_ENTRY_SIZE].copy_from_slice(&entry.encode());
        debug!("writing directory slot {} to {} +{}", index, address, offset);
        self.write_sector(address, &sector)
    }
}
