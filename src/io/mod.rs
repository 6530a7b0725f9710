/// Host file I/O for MGT images

/// Reader implementation for MGT files
pub mod mgt_reader;
/// Writer implementation for MGT files
pub mod writer;

pub use mgt_reader::{is_mgt_file, read_mgt};
pub use writer::write_mgt;
