/// SAM/MGT directory entries
///
/// Each of the 80 directory slots is 256 bytes. Every byte belongs to exactly
/// one field in [`layout`], and [`FileEntry::decode`]/[`FileEntry::encode`]
/// are the only code that touches the raw slot, so decoding and re-encoding a
/// slot reproduces it byte for byte.

use super::file::{paged_address, FileHeader};
use super::sector_map::SectorAddressMap;
use crate::error::{Result, SamError};
use crate::format::*;
use log::warn;

/// Byte ranges of the fields in a 256-byte directory entry
pub mod layout {
    use std::ops::Range;

    /// File type; the whole byte is the type code
    pub const STATUS: usize = 0x00;
    /// Space padded filename
    pub const NAME: Range<usize> = 0x01..0x0B;
    /// Sector count, big endian
    pub const SECTORS: Range<usize> = 0x0B..0x0D;
    /// Track of the first sector
    pub const FIRST_TRACK: usize = 0x0D;
    /// Sector of the first sector
    pub const FIRST_SECTOR: usize = 0x0E;
    /// Sector address map
    pub const SECTOR_MAP: Range<usize> = 0x0F..0xD2;
    /// Reserved by MGT
    pub const MGT_RESERVED: Range<usize> = 0xD2..0xDC;
    /// MGT flags
    pub const MGT_FLAGS: usize = 0xDC;
    /// Type specific information
    pub const FILE_TYPE_INFO: Range<usize> = 0xDD..0xE8;
    /// Reserved
    pub const RESERVED_A: Range<usize> = 0xE8..0xEC;
    /// Start page
    pub const START_PAGE: usize = 0xEC;
    /// Start offset within the page, little endian
    pub const START_OFFSET: Range<usize> = 0xED..0xEF;
    /// Length in whole pages
    pub const PAGES: usize = 0xEF;
    /// Length modulo 16K, little endian
    pub const LENGTH_MOD_16K: Range<usize> = 0xF0..0xF2;
    /// Execution page, 0xFF for none
    pub const EXECUTION_PAGE: usize = 0xF2;
    /// Execution offset, little endian (BASIC start line for BASIC files)
    pub const EXECUTION_OFFSET: Range<usize> = 0xF3..0xF5;
    /// Reserved
    pub const RESERVED_B: Range<usize> = 0xF5..0x100;
}

const HIDDEN_FLAG: u8 = 0x80;
const PROTECTED_FLAG: u8 = 0x40;

/// Execution page meaning "no execution address"
pub const NO_EXECUTION_PAGE: u8 = 0xFF;
/// Execution offset stored alongside [`NO_EXECUTION_PAGE`]
pub const NO_EXECUTION_OFFSET: u16 = 0xFFFF;

/// File type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Erased entry (0x00)
    Erased,
    /// ZX Spectrum snapshot (0x05)
    ZxSnapshot,
    /// SAM BASIC program (0x10)
    SamBasic,
    /// Numeric array (0x11)
    NumericArray,
    /// String array (0x12)
    StringArray,
    /// CODE/binary (0x13)
    Code,
    /// SCREEN$ (0x14)
    Screen,
    /// Unrecognized type
    Other(u8),
}

impl FileType {
    /// Parse a type code
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => FileType::Erased,
            0x05 => FileType::ZxSnapshot,
            0x10 => FileType::SamBasic,
            0x11 => FileType::NumericArray,
            0x12 => FileType::StringArray,
            0x13 => FileType::Code,
            0x14 => FileType::Screen,
            other => FileType::Other(other),
        }
    }

    /// Get type code
    pub fn code(&self) -> u8 {
        match self {
            FileType::Erased => 0x00,
            FileType::ZxSnapshot => 0x05,
            FileType::SamBasic => 0x10,
            FileType::NumericArray => 0x11,
            FileType::StringArray => 0x12,
            FileType::Code => 0x13,
            FileType::Screen => 0x14,
            FileType::Other(code) => *code,
        }
    }

    /// Whether this is one of the known types
    pub fn is_recognized(&self) -> bool {
        !matches!(self, FileType::Other(_))
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileType::Erased => write!(f, "Erased"),
            FileType::ZxSnapshot => write!(f, "ZX Snapshot"),
            FileType::SamBasic => write!(f, "SAM BASIC"),
            FileType::NumericArray => write!(f, "Number Array"),
            FileType::StringArray => write!(f, "String Array"),
            FileType::Code => write!(f, "CODE"),
            FileType::Screen => write!(f, "SCREEN$"),
            FileType::Other(code) => write!(f, "Type 0x{:02X}", code),
        }
    }
}

/// A 10-byte space padded filename
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Filename(pub [u8; MGT_FILENAME_LEN]);

impl Filename {
    /// Pad a name to 10 bytes; longer names are truncated
    pub fn new(name: &str) -> Self {
        let bytes = name.as_bytes();
        if bytes.len() > MGT_FILENAME_LEN {
            warn!(
                "Filename {:?} is longer than {} bytes and will be truncated",
                name, MGT_FILENAME_LEN
            );
        }
        let mut raw = [b' '; MGT_FILENAME_LEN];
        let len = bytes.len().min(MGT_FILENAME_LEN);
        raw[..len].copy_from_slice(&bytes[..len]);
        Self(raw)
    }

    /// Stored bytes up to the first NUL, without trailing spaces
    pub fn trimmed(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(MGT_FILENAME_LEN);
        let name = &self.0[..end];
        let len = name.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
        &name[..len]
    }

    /// Whether this filename holds the bytes of `name`, ignoring padding
    pub fn matches(&self, name: &str) -> bool {
        self.trimmed() == name.trim_end_matches(' ').as_bytes()
    }
}

impl std::fmt::Display for Filename {
    /// Names are stored as UTF-8 bytes; invalid sequences show as U+FFFD
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.trimmed()))
    }
}

impl std::fmt::Debug for Filename {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.to_string())
    }
}

/// One directory slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File type, from the full status byte
    pub file_type: FileType,
    /// Filename
    pub name: Filename,
    /// Number of sectors in the file's chain
    pub sectors: u16,
    /// First sector of the chain
    pub first_sector: SectorAddress,
    /// Sectors owned by this file
    pub sector_map: SectorAddressMap,
    /// MGT reserved bytes
    pub mgt_reserved: [u8; 10],
    /// MGT flags
    pub mgt_flags: u8,
    /// Type specific information
    pub file_type_info: [u8; 11],
    /// Reserved bytes 0xE8-0xEB
    pub reserved_a: [u8; 4],
    /// Start page, zero based from 16K
    pub start_page: u8,
    /// Start offset within the page
    pub start_offset: u16,
    /// Length in whole pages
    pub pages: u8,
    /// Length modulo 16K
    pub length_mod_16k: u16,
    /// Execution page, [`NO_EXECUTION_PAGE`] for none
    pub execution_page: u8,
    /// Execution offset (start line for BASIC)
    pub execution_offset: u16,
    /// Reserved bytes 0xF5-0xFF
    pub reserved_b: [u8; 11],
}

fn field<const N: usize>(raw: &[u8], range: std::ops::Range<usize>) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&raw[range]);
    out
}

fn le16(raw: &[u8], range: std::ops::Range<usize>) -> u16 {
    u16::from_le_bytes(field(raw, range))
}

impl FileEntry {
    /// Decode a 256-byte directory slot
    pub fn decode(raw: &[u8; MGT_DIR_ENTRY_SIZE]) -> Self {
        use layout::*;

        Self {
            file_type: FileType::from_code(raw[STATUS]),
            name: Filename(field(raw, NAME)),
            sectors: u16::from_be_bytes(field(raw, SECTORS)),
            first_sector: SectorAddress::new(raw[FIRST_TRACK], raw[FIRST_SECTOR]),
            sector_map: SectorAddressMap(field(raw, SECTOR_MAP)),
            mgt_reserved: field(raw, MGT_RESERVED),
            mgt_flags: raw[MGT_FLAGS],
            file_type_info: field(raw, FILE_TYPE_INFO),
            reserved_a: field(raw, RESERVED_A),
            start_page: raw[START_PAGE],
            start_offset: le16(raw, START_OFFSET),
            pages: raw[PAGES],
            length_mod_16k: le16(raw, LENGTH_MOD_16K),
            execution_page: raw[EXECUTION_PAGE],
            execution_offset: le16(raw, EXECUTION_OFFSET),
            reserved_b: field(raw, RESERVED_B),
        }
    }

    /// Encode into a 256-byte directory slot
    pub fn encode(&self) -> [u8; MGT_DIR_ENTRY_SIZE] {
        use layout::*;

        let mut raw = [0u8; MGT_DIR_ENTRY_SIZE];
        raw[STATUS] = self.file_type.code();
        raw[NAME].copy_from_slice(&self.name.0);
        raw[SECTORS].copy_from_slice(&self.sectors.to_be_bytes());
        raw[FIRST_TRACK] = self.first_sector.track;
        raw[FIRST_SECTOR] = self.first_sector.sector;
        raw[SECTOR_MAP].copy_from_slice(&self.sector_map.0);
        raw[MGT_RESERVED].copy_from_slice(&self.mgt_reserved);
        raw[MGT_FLAGS] = self.mgt_flags;
        raw[FILE_TYPE_INFO].copy_from_slice(&self.file_type_info);
        raw[RESERVED_A].copy_from_slice(&self.reserved_a);
        raw[START_PAGE] = self.start_page;
        raw[START_OFFSET].copy_from_slice(&self.start_offset.to_le_bytes());
        raw[PAGES] = self.pages;
        raw[LENGTH_MOD_16K].copy_from_slice(&self.length_mod_16k.to_le_bytes());
        raw[EXECUTION_PAGE] = self.execution_page;
        raw[EXECUTION_OFFSET].copy_from_slice(&self.execution_offset.to_le_bytes());
        raw[RESERVED_B].copy_from_slice(&self.reserved_b);
        raw
    }

    /// A fresh CODE entry with no sectors allocated yet
    ///
    /// Addresses must already be validated: `load` at least 16K and
    /// `execution`, when given, inside the loaded region.
    pub fn new_code(name: &str, length: usize, load: u32, execution: Option<u32>) -> Self {
        let (execution_page, execution_offset) = match execution {
            Some(address) => (
                ((address >> 14) - 1) as u8,
                (address & 0x3FFF) as u16 | 0x8000,
            ),
            None => (NO_EXECUTION_PAGE, NO_EXECUTION_OFFSET),
        };

        Self {
            file_type: FileType::Code,
            name: Filename::new(name),
            sectors: 0,
            first_sector: SectorAddress::default(),
            sector_map: SectorAddressMap::new(),
            mgt_reserved: [0; 10],
            mgt_flags: 0,
            file_type_info: [0; 11],
            reserved_a: [0; 4],
            start_page: ((load >> 14) - 1) as u8,
            start_offset: (load & 0x3FFF) as u16,
            pages: (length >> 14) as u8,
            length_mod_16k: (length & 0x3FFF) as u16,
            execution_page,
            execution_offset,
            reserved_b: [0; 11],
        }
    }

    /// Hidden bit of the status byte
    ///
    /// Only meaningful for display; a status with this bit set is not one of
    /// the known types, so such a slot counts as free.
    pub fn is_hidden(&self) -> bool {
        self.file_type.code() & HIDDEN_FLAG != 0
    }

    /// Protected bit of the status byte, with the same caveat as [`FileEntry::is_hidden`]
    pub fn is_protected(&self) -> bool {
        self.file_type.code() & PROTECTED_FLAG != 0
    }

    /// Whether the slot describes a file
    ///
    /// The status byte must be exactly one of the known type codes and the
    /// first track non-zero.
    pub fn is_used(&self) -> bool {
        self.file_type.is_recognized() && self.first_sector.track != 0
    }

    /// Check a used slot does not point into the directory tracks
    pub fn validate(&self, index: usize) -> Result<()> {
        if self.is_used() && self.first_sector.track < MGT_DIR_TRACKS {
            return Err(SamError::MalformedEntry {
                index,
                track: self.first_sector.track,
            });
        }
        Ok(())
    }

    /// Load address in the 512K paged address space
    pub fn start_address(&self) -> u32 {
        paged_address(self.start_page, self.start_offset)
    }

    /// File length in bytes
    pub fn length(&self) -> u32 {
        (self.length_mod_16k & 0x3FFF) as u32 | (self.pages as u32) << 14
    }

    /// Execution address, if the file has one
    pub fn execution_address(&self) -> Option<u32> {
        if self.execution_page == NO_EXECUTION_PAGE {
            None
        } else {
            Some(paged_address(self.execution_page, self.execution_offset))
        }
    }

    /// Auto-run line of a BASIC program
    pub fn basic_start_line(&self) -> Option<u16> {
        if self.file_type == FileType::SamBasic && self.execution_page != NO_EXECUTION_PAGE {
            Some(self.execution_offset)
        } else {
            None
        }
    }

    /// Three-byte length in type info: page count, then offset in the page (LE)
    ///
    /// Same page form as the start and length fields, so a page weighs 16K and
    /// bits 14-15 of the offset are ignored.
    fn info_length(&self, at: usize) -> u32 {
        let info = &self.file_type_info;
        info[at] as u32 * SAM_PAGE_SIZE
            + (u16::from_le_bytes([info[at + 1], info[at + 2]]) & 0x3FFF) as u32
    }

    /// BASIC program length excluding variables
    pub fn program_length(&self) -> u32 {
        self.info_length(0)
    }

    /// Offset of the BASIC numeric variables
    pub fn numeric_variables_offset(&self) -> u32 {
        self.info_length(3)
    }

    /// Offset of the BASIC string and array variables
    pub fn string_array_variables_offset(&self) -> u32 {
        self.info_length(6)
    }

    /// Screen mode of a SCREEN$ file
    pub fn screen_mode(&self) -> Option<u8> {
        match self.file_type {
            FileType::Screen => Some(self.file_type_info[0]),
            _ => None,
        }
    }

    /// The header written in front of the file body
    pub fn header(&self) -> FileHeader {
        FileHeader {
            file_type: self.file_type,
            length_mod_16k: self.length_mod_16k,
            page_offset: self.start_offset,
            pages: self.pages,
            start_page: self.start_page & 0x1F,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_raw() -> [u8; MGT_DIR_ENTRY_SIZE] {
        let mut raw = [0u8; MGT_DIR_ENTRY_SIZE];
        raw[0x00] = 0x13;
        raw[0x01..0x0B].copy_from_slice(b"TESTFILE  ");
        raw[0x0B] = 0x01;
        raw[0x0C] = 0x02;
        raw[0x0D] = 4;
        raw[0x0E] = 1;
        raw[0x0F] = 0xFF;
        raw[0xEC] = 1;
        raw[0xED] = 0x34;
        raw[0xEE] = 0x12;
        raw[0xEF] = 2;
        raw[0xF0] = 0x10;
        raw[0xF1] = 0x00;
        raw[0xF2] = 0xFF;
        raw[0xF3] = 0xFF;
        raw[0xF4] = 0xFF;
        raw
    }

    #[test]
    fn test_layout_covers_entry() {
        use layout::*;
        let ranges = [
            STATUS..STATUS + 1,
            NAME,
            SECTORS,
            FIRST_TRACK..FIRST_TRACK + 1,
            FIRST_SECTOR..FIRST_SECTOR + 1,
            SECTOR_MAP,
            MGT_RESERVED,
            MGT_FLAGS..MGT_FLAGS + 1,
            FILE_TYPE_INFO,
            RESERVED_A,
            START_PAGE..START_PAGE + 1,
            START_OFFSET,
            PAGES..PAGES + 1,
            LENGTH_MOD_16K,
            EXECUTION_PAGE..EXECUTION_PAGE + 1,
            EXECUTION_OFFSET,
            RESERVED_B,
        ];
        let mut next = 0;
        for range in ranges {
            assert_eq!(range.start, next);
            next = range.end;
        }
        assert_eq!(next, MGT_DIR_ENTRY_SIZE);
        assert_eq!(SECTOR_MAP.len(), MGT_SECTOR_MAP_SIZE);
    }

    #[test]
    fn test_decode_fields() {
        let entry = FileEntry::decode(&sample_raw());
        assert_eq!(entry.file_type, FileType::Code);
        assert_eq!(entry.name.to_string(), "TESTFILE");
        assert_eq!(entry.sectors, 0x0102);
        assert_eq!(entry.first_sector, SectorAddress::new(4, 1));
        assert_eq!(entry.sector_map.used_count(), 8);
        assert_eq!(entry.start_offset, 0x1234);
        assert_eq!(entry.start_address(), 0x1234 | 2 << 14);
        assert_eq!(entry.length(), 2 * 16384 + 16);
        assert_eq!(entry.execution_address(), None);
        assert!(entry.is_used());
        assert!(!entry.is_hidden());
    }

    #[test]
    fn test_status_byte_is_whole_type() {
        for status in [0x93, 0xD3, 0x45] {
            let mut raw = sample_raw();
            raw[0] = status;
            let entry = FileEntry::decode(&raw);
            assert_eq!(entry.file_type, FileType::Other(status));
            assert!(!entry.is_used(), "status 0x{:02X}", status);
            assert_eq!(entry.encode()[0], status);
        }

        let mut raw = sample_raw();
        raw[0] = 0xD3;
        let entry = FileEntry::decode(&raw);
        assert!(entry.is_hidden());
        assert!(entry.is_protected());
    }

    #[test]
    fn test_used_classification() {
        let mut raw = sample_raw();
        raw[0] = 0x33;
        assert!(!FileEntry::decode(&raw).is_used());

        let mut raw = sample_raw();
        raw[0x0D] = 0;
        assert!(!FileEntry::decode(&raw).is_used());

        let blank = FileEntry::decode(&[0u8; MGT_DIR_ENTRY_SIZE]);
        assert!(!blank.is_used());
    }

    #[test]
    fn test_malformed_entry() {
        let mut raw = sample_raw();
        raw[0x0D] = 2;
        let entry = FileEntry::decode(&raw);
        assert!(matches!(
            entry.validate(7),
            Err(SamError::MalformedEntry { index: 7, track: 2 })
        ));
        assert!(FileEntry::decode(&sample_raw()).validate(7).is_ok());
    }

    #[test]
    fn test_new_code_entry() {
        let entry = FileEntry::new_code("LOADER", 20000, 32768, Some(32800));
        assert_eq!(entry.file_type, FileType::Code);
        assert_eq!(entry.name.0, *b"LOADER    ");
        assert_eq!(entry.start_page, 1);
        assert_eq!(entry.start_offset, 0);
        assert_eq!(entry.start_address(), 32768);
        assert_eq!(entry.length(), 20000);
        assert_eq!(entry.execution_page, 1);
        assert_eq!(entry.execution_offset, 0x8020);
        assert_eq!(entry.execution_address(), Some(32800));

        let raw = entry.encode();
        assert!(raw[layout::MGT_RESERVED].iter().all(|&b| b == 0));
        assert!(raw[layout::RESERVED_B].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_no_execution_address() {
        let entry = FileEntry::new_code("DATA", 10, 16384, None);
        assert_eq!(entry.execution_page, 0xFF);
        assert_eq!(entry.execution_offset, 0xFFFF);
        assert_eq!(entry.execution_address(), None);
    }

    #[test]
    fn test_basic_metadata() {
        let mut raw = sample_raw();
        raw[0] = 0x10;
        raw[0xDD..0xE0].copy_from_slice(&[1, 0x10, 0x00]);
        raw[0xF2] = 0;
        raw[0xF3] = 10;
        raw[0xF4] = 0;
        let entry = FileEntry::decode(&raw);
        assert_eq!(entry.program_length(), 16384 + 16);
        assert_eq!(entry.basic_start_line(), Some(10));
    }

    #[test]
    fn test_basic_variable_offsets() {
        // 4660 byte program, numeric variables at 20000, arrays at 20512
        let mut raw = sample_raw();
        raw[0] = 0x10;
        raw[0xDD..0xE6].copy_from_slice(&[0, 0x34, 0x12, 1, 0x20, 0x0E, 1, 0x20, 0x10]);
        let entry = FileEntry::decode(&raw);
        assert_eq!(entry.program_length(), 0x1234);
        assert_eq!(entry.numeric_variables_offset(), 20000);
        assert_eq!(entry.string_array_variables_offset(), 20512);

        // Bits 14 and 15 of the offset are not part of the length
        raw[0xDD..0xE0].copy_from_slice(&[0, 0x34, 0xD2]);
        assert_eq!(FileEntry::decode(&raw).program_length(), 0x1234);
        assert_eq!(entry.screen_mode(), None);
    }

    #[test]
    fn test_filename() {
        let name = Filename::new("ABC");
        assert_eq!(name.0, *b"ABC       ");
        assert!(name.matches("ABC"));
        assert!(!name.matches("ABCD"));
        assert_eq!(Filename::new("LONGFILENAME1").to_string(), "LONGFILENA");
        assert_eq!(Filename(*b"NUL\0XXXXXX").to_string(), "NUL");
    }

    #[test]
    fn test_non_ascii_filename() {
        let name = Filename::new("café");
        assert_eq!(&name.0[..5], "café".as_bytes());
        assert_eq!(name.trimmed(), "café".as_bytes());
        assert_eq!(name.to_string(), "café");
        assert!(name.matches("café"));
        assert!(name.matches("café  "));
        assert!(!name.matches("cafe"));
        assert!(!name.matches("caf\u{c3}\u{a9}"));
    }

    #[test]
    fn test_header_from_entry() {
        let entry = FileEntry::new_code("X", 100, 65536 + 5, None);
        let header = entry.header();
        assert_eq!(header.file_type, FileType::Code);
        assert_eq!(header.start(), 65536 + 5);
        assert_eq!(header.length(), 100);
    }

    proptest! {
        #[test]
        fn prop_entry_round_trip(bytes in prop::collection::vec(any::<u8>(), MGT_DIR_ENTRY_SIZE)) {
            let mut raw = [0u8; MGT_DIR_ENTRY_SIZE];
            raw.copy_from_slice(&bytes);
            let entry = FileEntry::decode(&raw);
            prop_assert_eq!(entry.encode(), raw);
            prop_assert_eq!(FileEntry::decode(&entry.encode()), entry);
        }
    }
}
