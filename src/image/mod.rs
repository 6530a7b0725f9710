/// MGT disk image and file operations

/// Linked sector chains
pub mod chain;
/// Sector data and single-sector access
pub mod sector;

pub use chain::sectors_required;
pub use sector::SectorData;

use crate::error::{Result, SamError};
use crate::filesystem::{File, FileEntry};
use crate::format::*;
use log::{debug, info};
use std::path::Path;

/// An 819,200-byte MGT disk image held in memory
///
/// All reads go through shared references; [`DiskImage::add_code_file`] and
/// the sector writers need exclusive access. Nothing is written to the host
/// until [`DiskImage::save`] is called.
#[derive(Clone)]
pub struct DiskImage {
    /// Raw image bytes, always `MGT_IMAGE_SIZE` long
    pub(crate) data: Vec<u8>,
    /// Has the image been modified?
    pub(crate) changed: bool,
    /// Original filename if loaded from disk
    pub(crate) filename: Option<String>,
}

impl DiskImage {
    /// Create a blank (freshly formatted) image
    pub fn blank() -> Self {
        Self {
            data: vec![0; MGT_IMAGE_SIZE],
            changed: false,
            filename: None,
        }
    }

    /// Load an image from bytes
    ///
    /// Input longer than 819,200 bytes is truncated; shorter input is an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MGT_IMAGE_SIZE {
            return Err(SamError::ImageSize {
                expected: MGT_IMAGE_SIZE,
                actual: bytes.len(),
            });
        }
        if bytes.len() > MGT_IMAGE_SIZE {
            debug!(
                "ignoring {} bytes after end of disk image",
                bytes.len() - MGT_IMAGE_SIZE
            );
        }
        Ok(Self {
            data: bytes[..MGT_IMAGE_SIZE].to_vec(),
            changed: false,
            filename: None,
        })
    }

    /// Open an MGT file from the host filesystem
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::io::read_mgt(path)
    }

    /// Save the image to a file on the host filesystem
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        crate::io::write_mgt(self, path)?;
        self.changed = false;
        Ok(())
    }

    /// Raw image bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy of the raw image bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Get the original filename if loaded from disk
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Check if the image has been modified
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Read a file by name
    pub fn file(&self, name: &str) -> Result<File> {
        let journal = self.directory();
        let (index, entry) = journal
            .find(name)
            .ok_or_else(|| SamError::FileNotFound(name.to_string()))?;
        self.read_entry_file(index, entry)
    }

    /// Read the file described by the entry in slot `index`
    pub fn read_entry_file(&self, index: usize, entry: &FileEntry) -> Result<File> {
        entry.validate(index)?;
        let raw = self.read_chain(entry.first_sector, entry.sectors as usize)?;
        Ok(File::from_raw(&raw))
    }

    /// Add a CODE file
    ///
    /// `load` must be at least 16384 and leave room for the body below 512K.
    /// A non-zero `execution` address must fall inside the loaded region.
    /// Nothing is written unless every check passes.
    pub fn add_code_file(
        &mut self,
        name: &str,
        body: &[u8],
        load: u32,
        execution: Option<u32>,
    ) -> Result<()> {
        let execution = execution.filter(|&address| address != 0);
        let length = body.len() as u64;

        if load < SAM_PAGE_SIZE {
            return Err(SamError::invalid_address(format!(
                "Load address {} of {:?} is in ROM but must be {} or higher to be loaded into RAM",
                load, name, SAM_PAGE_SIZE
            )));
        }
        if length > SAM_ADDRESS_LIMIT as u64 || load as u64 > SAM_ADDRESS_LIMIT as u64 - length {
            return Err(SamError::invalid_address(format!(
                "Load address {} of {} byte file {:?} is higher than maximum allowed {}",
                load,
                length,
                name,
                (SAM_ADDRESS_LIMIT as u64).saturating_sub(length)
            )));
        }
        if let Some(address) = execution {
            if address < load {
                return Err(SamError::invalid_address(format!(
                    "Execution address {} of {:?} is lower than load address {}",
                    address, name, load
                )));
            }
            if address as u64 >= load as u64 + length {
                return Err(SamError::invalid_address(format!(
                    "Execution address {} of {:?} is outside the loaded region ({} to {})",
                    address,
                    name,
                    load,
                    (load as u64 + length).saturating_sub(1)
                )));
            }
        }

        let journal = self.directory();
        let slot = journal.first_free_slot().ok_or_else(|| {
            SamError::disk_full(format!(
                "cannot add {:?}; disk already holds the maximum of {} files",
                name, MGT_MAX_DIR_ENTRIES
            ))
        })?;
        let required = sectors_required(body.len());
        let free = journal.combined_sector_map().free_sectors();
        if free.len() < required {
            return Err(SamError::disk_full(format!(
                "cannot add {:?}; {} free sectors required but only {} available",
                name,
                required,
                free.len()
            )));
        }
        let sectors = &free[..required];

        let mut entry = FileEntry::new_code(name, body.len(), load, execution);
        entry.sectors = required as u16;
        entry.first_sector = sectors[0];
        for address in sectors {
            entry.sector_map.mark(*address)?;
        }

        let file = File {
            header: entry.header(),
            body: body.to_vec(),
        };
        self.write_chain(sectors, &file.to_raw())?;
        self.write_entry(slot, &entry)?;

        info!(
            "Added {:?} ({} bytes) in slot {} using {} sectors from {}",
            name,
            body.len(),
            slot,
            required,
            entry.first_sector
        );
        Ok(())
    }

    /// Summarise directory and sector usage
    pub fn info(&self) -> DiskInfo {
        let journal = self.directory();
        let used_sectors = journal.combined_sector_map().used_count();
        DiskInfo {
            file_count: journal.used_entries().count(),
            free_slots: journal.free_entries().len(),
            used_sectors,
            free_sectors: MGT_DATA_SECTORS - used_sectors,
        }
    }
}

impl std::fmt::Debug for DiskImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskImage")
            .field("filename", &self.filename)
            .field("changed", &self.changed)
            .finish_non_exhaustive()
    }
}

/// Directory and space usage of an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskInfo {
    /// Number of used directory entries
    pub file_count: usize,
    /// Directory slots available
    pub free_slots: usize,
    /// Data sectors allocated to files
    pub used_sectors: usize,
    /// Data sectors available
    pub free_sectors: usize,
}

impl std::fmt::Display for DiskInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SAM Coupe MGT Filesystem")?;
        writeln!(f, "  Files: {} ({} slots free)", self.file_count, self.free_slots)?;
        writeln!(
            f,
            "  Used: {} sectors ({} KB)",
            self.used_sectors,
            self.used_sectors / 2
        )?;
        write!(
            f,
            "  Free: {} sectors ({} KB)",
            self.free_sectors,
            self.free_sectors / 2
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::FileType;

    #[test]
    fn test_blank_image() {
        let image = DiskImage::blank();
        assert_eq!(image.as_bytes().len(), MGT_IMAGE_SIZE);
        assert!(!image.is_changed());
        assert_eq!(
            image.info(),
            DiskInfo {
                file_count: 0,
                free_slots: 80,
                used_sectors: 0,
                free_sectors: 1560,
            }
        );
    }

    #[test]
    fn test_from_bytes_size() {
        let result = DiskImage::from_bytes(&[0u8; 1000]);
        assert!(matches!(
            result,
            Err(SamError::ImageSize { expected: MGT_IMAGE_SIZE, actual: 1000 })
        ));

        let mut long = vec![0u8; MGT_IMAGE_SIZE + 10];
        long[5] = 0x42;
        let image = DiskImage::from_bytes(&long).unwrap();
        assert_eq!(image.to_bytes().len(), MGT_IMAGE_SIZE);
        assert_eq!(image.as_bytes()[5], 0x42);
    }

    #[test]
    fn test_add_and_read_file() {
        let mut image = DiskImage::blank();
        let body: Vec<u8> = (0..1500).map(|i| (i * 7) as u8).collect();

        image.add_code_file("PROGRAM", &body, 32768, Some(33000)).unwrap();
        assert!(image.is_changed());

        let journal = image.directory();
        let (index, entry) = journal.find("PROGRAM").unwrap();
        assert_eq!(index, 0);
        assert_eq!(entry.file_type, FileType::Code);
        assert_eq!(entry.sectors, 3);
        assert_eq!(entry.first_sector, SectorAddress::new(4, 1));
        assert_eq!(
            entry.sector_map.used_sectors(),
            vec![
                SectorAddress::new(4, 1),
                SectorAddress::new(4, 2),
                SectorAddress::new(4, 3)
            ]
        );
        assert_eq!(entry.execution_address(), Some(33000));

        let file = image.file("PROGRAM").unwrap();
        assert_eq!(file.body, body);
        assert_eq!(file.header.start(), 32768);
        assert_eq!(file.header.length(), 1500);
    }

    #[test]
    fn test_second_file_uses_next_free_sectors() {
        let mut image = DiskImage::blank();
        image.add_code_file("ONE", &[1; 600], 16384, None).unwrap();
        image.add_code_file("TWO", &[2; 10], 16384, None).unwrap();

        let journal = image.directory();
        let (index, entry) = journal.find("TWO").unwrap();
        assert_eq!(index, 1);
        assert_eq!(entry.first_sector, SectorAddress::new(4, 3));
        assert_eq!(image.info().used_sectors, 3);
    }

    #[test]
    fn test_address_validation() {
        let mut image = DiskImage::blank();
        let body = [0u8; 100];

        let cases = [
            (16383, None),
            (524_288 - 99, None),
            (32768, Some(32767)),
            (32768, Some(32868)),
        ];
        for (load, execution) in cases {
            let result = image.add_code_file("BAD", &body, load, execution);
            assert!(
                matches!(result, Err(SamError::InvalidAddress(_))),
                "load {} exec {:?}",
                load,
                execution
            );
        }
        assert!(!image.is_changed());

        image.add_code_file("EDGE", &body, 524_288 - 100, Some(524_287)).unwrap();
        image.add_code_file("ZERO", &body, 32768, Some(0)).unwrap();
        assert_eq!(image.file("ZERO").unwrap().body.len(), 100);
        let journal = image.directory();
        assert_eq!(journal.find("ZERO").unwrap().1.execution_address(), None);
    }

    #[test]
    fn test_flagged_status_slot_is_reused() {
        let mut image = DiskImage::blank();
        let mut stale = FileEntry::new_code("STALE", 10, 32768, None);
        stale.file_type = FileType::Other(0x93);
        stale.sectors = 1;
        stale.first_sector = SectorAddress::new(4, 1);
        stale.sector_map.mark(stale.first_sector).unwrap();
        image.write_entry(0, &stale).unwrap();

        let journal = image.directory();
        assert!(!journal.get(0).unwrap().is_used());
        assert_eq!(journal.first_free_slot(), Some(0));

        image.add_code_file("NEW", &[1, 2, 3], 32768, None).unwrap();
        let journal = image.directory();
        let (index, entry) = journal.find("NEW").unwrap();
        assert_eq!(index, 0);
        assert_eq!(entry.first_sector, SectorAddress::new(4, 1));
    }

    #[test]
    fn test_non_ascii_name_round_trip() {
        let mut image = DiskImage::blank();
        image.add_code_file("café", b"xyz", 32768, None).unwrap();

        let journal = image.directory();
        let (index, entry) = journal.find("café").unwrap();
        assert_eq!(entry.name.to_string(), "café");
        assert_eq!(image.read_entry_file(index, entry).unwrap().body, b"xyz");
        assert_eq!(image.file("café").unwrap().body, b"xyz");
    }

    #[test]
    fn test_file_not_found() {
        let image = DiskImage::blank();
        assert!(matches!(image.file("NOPE"), Err(SamError::FileNotFound(_))));
    }

    #[test]
    fn test_malformed_entry_is_reported() {
        let mut image = DiskImage::blank();
        let mut entry = FileEntry::new_code("BROKEN", 10, 32768, None);
        entry.sectors = 1;
        entry.first_sector = SectorAddress::new(2, 1);
        image.write_entry(0, &entry).unwrap();

        assert!(matches!(
            image.file("BROKEN"),
            Err(SamError::MalformedEntry { index: 0, track: 2 })
        ));
    }

    #[test]
    fn test_info_display() {
        let mut image = DiskImage::blank();
        image.add_code_file("A", &[0; 1000], 32768, None).unwrap();
        let text = image.info().to_string();
        assert!(text.contains("Files: 1 (79 slots free)"));
        assert!(text.contains("Used: 2 sectors (1 KB)"));
    }
}
