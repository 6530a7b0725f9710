/// MGT disk geometry and constants

/// Geometry and layout constants
pub mod constants;
/// Track/sector coordinates, byte offsets and map bit indexes
pub mod geometry;

pub use constants::*;
pub use geometry::SectorAddress;
