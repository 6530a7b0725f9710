/// SAMDOS/MGT filesystem structures

/// Directory entries and their byte layout
pub mod entry;
/// File headers and contents
pub mod file;
/// The 80-slot directory
pub mod journal;
/// Per-file sector address maps
pub mod sector_map;

pub use entry::{FileEntry, FileType, Filename};
pub use file::{File, FileHeader};
pub use journal::DiskJournal;
pub use sector_map::SectorAddressMap;
