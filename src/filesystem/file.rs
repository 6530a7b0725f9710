/// File header and contents as stored in a file's sector chain

use super::entry::FileType;
use crate::format::{SAM_FILE_HEADER_SIZE, SAM_PAGE_SIZE};

/// The 9-byte header at the start of every file's raw data
///
/// Layout: type, length mod 16K (LE), page offset (LE), two reserved bytes,
/// page count, start page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// File type
    pub file_type: FileType,
    /// Length modulo 16K
    pub length_mod_16k: u16,
    /// Offset of the start address within its page
    pub page_offset: u16,
    /// Length in whole 16K pages
    pub pages: u8,
    /// Start page, zero based from the page at 16K
    pub start_page: u8,
}

impl FileHeader {
    /// Parse a header from the first 9 bytes of a file
    pub fn parse(raw: &[u8; SAM_FILE_HEADER_SIZE]) -> Self {
        Self {
            file_type: FileType::from_code(raw[0]),
            length_mod_16k: u16::from_le_bytes([raw[1], raw[2]]),
            page_offset: u16::from_le_bytes([raw[3], raw[4]]),
            pages: raw[7],
            start_page: raw[8] & 0x1F,
        }
    }

    /// Encode the header
    pub fn to_bytes(&self) -> [u8; SAM_FILE_HEADER_SIZE] {
        let length = self.length_mod_16k.to_le_bytes();
        let offset = self.page_offset.to_le_bytes();
        [
            self.file_type.code(),
            length[0],
            length[1],
            offset[0],
            offset[1],
            0,
            0,
            self.pages,
            self.start_page,
        ]
    }

    /// Start address in the 512K paged address space
    pub fn start(&self) -> u32 {
        paged_address(self.start_page, self.page_offset)
    }

    /// Body length in bytes
    pub fn length(&self) -> u32 {
        (self.length_mod_16k & 0x3FFF) as u32 | (self.pages as u32) << 14
    }
}

/// Convert a stored page/offset pair to a linear address
///
/// Stored pages count from the first page above the 16K ROM bank.
pub fn paged_address(page: u8, offset: u16) -> u32 {
    (offset & 0x3FFF) as u32 | ((page & 0x1F) as u32 + 1) * SAM_PAGE_SIZE
}

/// A file read from the disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// Header from the first sector
    pub header: FileHeader,
    /// File contents, sized by the header length
    pub body: Vec<u8>,
}

impl File {
    /// Assemble a file from the raw bytes of its sector chain
    ///
    /// The body is truncated or zero-extended to the header's length.
    pub fn from_raw(raw: &[u8]) -> Self {
        let mut header_bytes = [0u8; SAM_FILE_HEADER_SIZE];
        let len = raw.len().min(SAM_FILE_HEADER_SIZE);
        header_bytes[..len].copy_from_slice(&raw[..len]);
        let header = FileHeader::parse(&header_bytes);

        let mut body = raw.get(SAM_FILE_HEADER_SIZE..).unwrap_or_default().to_vec();
        body.resize(header.length() as usize, 0);

        Self { header, body }
    }

    /// Header followed by body, as written to the sector chain
    pub fn to_raw(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(SAM_FILE_HEADER_SIZE + self.body.len());
        raw.extend_from_slice(&self.header.to_bytes());
        raw.extend_from_slice(&self.body);
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_header() -> FileHeader {
        FileHeader {
            file_type: FileType::Code,
            length_mod_16k: 0x0123,
            page_offset: 0x8000,
            pages: 1,
            start_page: 1,
        }
    }

    #[test]
    fn test_header_bytes() {
        let header = code_header();
        let raw = header.to_bytes();
        assert_eq!(raw, [0x13, 0x23, 0x01, 0x00, 0x80, 0, 0, 1, 1]);
        assert_eq!(FileHeader::parse(&raw), header);
    }

    #[test]
    fn test_header_addresses() {
        let header = code_header();
        assert_eq!(header.start(), 32768);
        assert_eq!(header.length(), 16384 + 0x123);
    }

    #[test]
    fn test_start_page_masked() {
        let raw = [0x13, 0, 0, 0, 0, 0, 0, 0, 0xE2];
        assert_eq!(FileHeader::parse(&raw).start_page, 2);
    }

    #[test]
    fn test_from_raw_truncates_and_extends() {
        let mut raw = vec![0x13, 4, 0, 0, 0, 0, 0, 0, 0];
        raw.extend_from_slice(b"ABCDEFG");
        let file = File::from_raw(&raw);
        assert_eq!(file.body, b"ABCD");

        let raw = [0x13, 4, 0, 0, 0, 0, 0, 0, 0, b'X'];
        let file = File::from_raw(&raw);
        assert_eq!(file.body, vec![b'X', 0, 0, 0]);
    }

    #[test]
    fn test_to_raw() {
        let file = File {
            header: FileHeader {
                file_type: FileType::Code,
                length_mod_16k: 2,
                page_offset: 0,
                pages: 0,
                start_page: 0,
            },
            body: vec![0xAA, 0xBB],
        };
        let raw = file.to_raw();
        assert_eq!(raw.len(), 11);
        assert_eq!(File::from_raw(&raw), file);
    }
}
