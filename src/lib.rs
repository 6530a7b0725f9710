/*!
# samfile

A Rust library for reading and writing SAM Coupe MGT disk images and listing
SAM BASIC programs.

## Features

- Read and write 819,200-byte MGT images (2 sides, 80 tracks, 10 sectors of 512 bytes)
- SAMDOS directory with 80 entries and per-file sector address maps
- Add CODE files with load and execution addresses
- Decode tokenized SAM BASIC programs to text listings
- Idiomatic Rust API with comprehensive error handling

## Quick Start

```rust,no_run
use samfile::{decode_sam_basic_file, DiskImage};

// Open an existing MGT file
let mut image = DiskImage::open("disk.mgt")?;

// List files
for (index, entry) in image.directory().used_entries() {
    println!("{:>2} {} {} bytes", index, entry.name, entry.length());
}

// Read a file
let file = image.file("auto")?;
if let Some(listing) = decode_sam_basic_file(&file)? {
    print!("{}", listing);
}

// Add a CODE file loading at 32768 and running from its first byte
image.add_code_file("game", &[0xC9], 32768, Some(32768))?;
image.save("disk.mgt")?;
# Ok::<(), samfile::SamError>(())
```

## Modules

- `format`: Disk geometry and constants
- `image`: The in-memory image, sector access and file chains
- `filesystem`: Directory entries, file headers and sector maps
- `io`: Reading and writing image files
- `sam_basic`: SAM BASIC decoder
- `map`: Sector map visualization
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// Error types and Result alias
pub mod error;
/// Directory entries, file headers and sector maps
pub mod filesystem;
/// Disk geometry and constants
pub mod format;
/// The in-memory disk image
pub mod image;
/// I/O operations for reading and writing MGT files
pub mod io;
/// Sector map visualization
pub mod map;
/// SAM BASIC program decoding
pub mod sam_basic;

// Re-export common types
pub use error::{Result, SamError};
pub use filesystem::{
    DiskJournal, File, FileEntry, FileHeader, FileType, Filename, SectorAddressMap,
};
pub use format::SectorAddress;
pub use image::{sectors_required, DiskImage, DiskInfo, SectorData};
pub use sam_basic::{
    can_decode_sam_basic, decode_sam_basic, decode_sam_basic_file, KeywordTable,
    SamBasicDecoder,
};
