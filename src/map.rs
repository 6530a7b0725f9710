/// Sector map visualization

use crate::error::Result;
use crate::format::{SectorAddress, MGT_SECTORS_PER_TRACK, MGT_SIDES, MGT_TRACKS_PER_SIDE};
use crate::image::DiskImage;
use std::fmt::Write;

/// ANSI color codes for sector map
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BRIGHT_WHITE: &str = "\x1b[97m";
    pub const DARK_WHITE: &str = "\x1b[37m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
}

const BLOCK_NO_DATA: &str = "\u{2591}"; // ░ - Light shade (free)
const BLOCK_HAS_DATA: &str = "\u{2593}"; // ▓ - Dark shade (in-use)

/// How a sector is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorUse {
    /// Part of the directory
    Directory,
    /// Allocated to a file
    Used,
    /// Available
    Free,
}

/// Classify every sector of one side, indexed `[cylinder][sector - 1]`
pub fn side_usage(image: &DiskImage, side: u8) -> Vec<Vec<SectorUse>> {
    let map = image.directory().combined_sector_map();

    (0..MGT_TRACKS_PER_SIDE)
        .map(|cylinder| {
            (1..=MGT_SECTORS_PER_TRACK)
                .map(|sector| {
                    let address = SectorAddress::new(cylinder | side << 7, sector);
                    if address.is_directory() {
                        SectorUse::Directory
                    } else if map.contains(address) {
                        SectorUse::Used
                    } else {
                        SectorUse::Free
                    }
                })
                .collect()
        })
        .collect()
}

/// Render the sector map of one side
///
/// Rows are sectors (10 at the top), columns are cylinders.
pub fn render_sector_map(image: &DiskImage, side: u8) -> Result<String> {
    let usage = side_usage(image, side);
    let mut out = String::new();

    writeln!(out, "=== Sector Map (Side {}) ===", side)?;
    writeln!(
        out,
        "Legend: {}Directory{} {}In Use{} {}Free{}",
        colors::BRIGHT_YELLOW,
        colors::RESET,
        colors::BRIGHT_WHITE,
        colors::RESET,
        colors::DARK_WHITE,
        colors::RESET
    )?;
    out.push('\n');

    for sector in (0..MGT_SECTORS_PER_TRACK as usize).rev() {
        write!(out, "{:>2} ", sector + 1)?;
        for cylinder in &usage {
            let (color, block) = match cylinder[sector] {
                SectorUse::Directory => (colors::BRIGHT_YELLOW, BLOCK_HAS_DATA),
                SectorUse::Used => (colors::BRIGHT_WHITE, BLOCK_HAS_DATA),
                SectorUse::Free => (colors::DARK_WHITE, BLOCK_NO_DATA),
            };
            write!(out, "{}{}{}", color, block, colors::RESET)?;
        }
        out.push('\n');
    }

    // Cylinder axis, labelled every 5 columns
    out.push_str("   ");
    let columns = MGT_TRACKS_PER_SIDE as usize;
    let mut column = 0;
    while column < columns {
        if column % 5 == 0 {
            let label = column.to_string();
            let width = label.len().min(columns - column);
            out.push_str(&label[..width]);
            column += width;
        } else {
            out.push(' ');
            column += 1;
        }
    }
    out.push('\n');
    Ok(out)
}

/// Draw a visual sector map for both sides of a disk
pub fn draw_sector_map(image: &DiskImage) -> Result<()> {
    for side in 0..MGT_SIDES {
        println!("{}", render_sector_map(image, side)?);
    }
    Ok(())
}
