/// MGT disk geometry and layout constants

/// Size of an MGT disk image in bytes
pub const MGT_IMAGE_SIZE: usize = 819_200;

/// Sector size in bytes
pub const MGT_SECTOR_SIZE: usize = 512;

/// Data bytes carried by each file sector (the rest is the chain pointer)
pub const MGT_PAYLOAD_SIZE: usize = 510;

/// Sectors per track
pub const MGT_SECTORS_PER_TRACK: u8 = 10;

/// Cylinders per side
pub const MGT_TRACKS_PER_SIDE: u8 = 80;

/// Number of sides
pub const MGT_SIDES: u8 = 2;

/// Track byte flag selecting side 1
pub const MGT_SIDE_FLAG: u8 = 0x80;

/// Bytes per cylinder (both sides)
pub const MGT_CYLINDER_SIZE: usize = MGT_SIDES as usize * MGT_TRACK_SIZE;

/// Bytes per track (one side)
pub const MGT_TRACK_SIZE: usize = MGT_SECTORS_PER_TRACK as usize * MGT_SECTOR_SIZE;

/// Number of directory tracks (side 0)
pub const MGT_DIR_TRACKS: u8 = 4;

/// Number of directory sectors
pub const MGT_DIR_SECTORS: usize = MGT_DIR_TRACKS as usize * MGT_SECTORS_PER_TRACK as usize;

/// Size of each directory entry
pub const MGT_DIR_ENTRY_SIZE: usize = 256;

/// Entries per sector
pub const MGT_ENTRIES_PER_SECTOR: usize = MGT_SECTOR_SIZE / MGT_DIR_ENTRY_SIZE;

/// Maximum directory entries
pub const MGT_MAX_DIR_ENTRIES: usize = MGT_DIR_SECTORS * MGT_ENTRIES_PER_SECTOR;

/// Total sectors on the disk
pub const MGT_TOTAL_SECTORS: usize =
    MGT_SIDES as usize * MGT_TRACKS_PER_SIDE as usize * MGT_SECTORS_PER_TRACK as usize;

/// Sectors available for file data
pub const MGT_DATA_SECTORS: usize = MGT_TOTAL_SECTORS - MGT_DIR_SECTORS;

/// Size of the per-file sector address map in bytes
pub const MGT_SECTOR_MAP_SIZE: usize = MGT_DATA_SECTORS / 8;

/// Length of a filename
pub const MGT_FILENAME_LEN: usize = 10;

/// Size of the header stored in front of every file body
pub const SAM_FILE_HEADER_SIZE: usize = 9;

/// Size of a SAM memory page
pub const SAM_PAGE_SIZE: u32 = 1 << 14;

/// Top of the paged address space (512K)
pub const SAM_ADDRESS_LIMIT: u32 = 1 << 19;
