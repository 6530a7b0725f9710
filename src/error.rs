use thiserror::Error;

/// Result type alias for SAM disk operations
pub type Result<T> = std::result::Result<T, SamError>;

/// Errors that can occur when working with MGT disk images
#[derive(Debug, Error)]
pub enum SamError {
    /// I/O error occurred while reading or writing a host file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image buffer is too short to be an MGT disk
    #[error("Disk image should be {expected} bytes, got {actual}")]
    ImageSize {
        /// Required size in bytes
        expected: usize,
        /// Size supplied
        actual: usize,
    },

    /// Track or sector coordinate outside the disk geometry
    #[error("Sector out of range: track {track}, sector {sector} (tracks 0-79 or 128-207, sectors 1-10)")]
    OutOfRange {
        /// Track byte (bit 7 = side)
        track: u8,
        /// Sector number
        sector: u8,
    },

    /// File not found in the directory
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// No free directory slot or not enough free sectors
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// Load or execution address violates the paged memory constraints
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// A sector chain pointed at an invalid coordinate
    #[error("Broken sector chain at link {link}: track {track}, sector {sector}")]
    BrokenChain {
        /// Position of the offending sector within the chain
        link: usize,
        /// Track byte found
        track: u8,
        /// Sector number found
        sector: u8,
    },

    /// Directory entry whose data would live in the directory tracks
    #[error("Malformed directory entry {index}: first sector has track {track} < 4")]
    MalformedEntry {
        /// Directory slot index
        index: usize,
        /// First sector track
        track: u8,
    },

    /// Tokenized BASIC byte with no keyword
    #[error("Unknown SAM BASIC token: 0x{0:02X}")]
    UnknownToken(u8),

    /// Output sink refused decoded text
    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),
}

impl SamError {
    /// Create a disk full error
    pub fn disk_full<S: Into<String>>(message: S) -> Self {
        SamError::DiskFull(message.into())
    }

    /// Create an invalid address error
    pub fn invalid_address<S: Into<String>>(message: S) -> Self {
        SamError::InvalidAddress(message.into())
    }
}
