// SNES ROM image helpers.
//
// - `header`   — Internal header location and decoding (LoROM/HiROM/ExHiROM)
// - `checksum` — Checksum / complement computation and repair
//
// Copier header handling lives here directly: some dumping devices prepend
// 512 bytes of their own metadata to the image.

pub mod checksum;
pub mod header;

pub use checksum::{compute_checksum, fix_checksum};
pub use header::{MapLayout, RomHeader, locate_header, read_header_at};

/// Size of the copier header prepended by backup units.
pub const COPIER_HEADER_LEN: usize = 512;

/// ROM images are built from 1 KiB-aligned banks; an extra 512 bytes
/// indicates a copier header.
const BANK_ALIGN: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum RomError {
    #[error("ROM does not contain a valid header")]
    NoHeader,
    #[error("ROM too short: {len} bytes, need at least {needed}")]
    TooShort { len: usize, needed: usize },
}

/// Whether the image size suggests a 512-byte copier header.
pub fn has_copier_header(rom: &[u8]) -> bool {
    rom.len() % BANK_ALIGN == COPIER_HEADER_LEN
}

/// Offset of the cartridge image inside `rom`: past the copier header when
/// the size says there is one, otherwise zero.
pub fn image_offset(rom: &[u8]) -> usize {
    if has_copier_header(rom) {
        COPIER_HEADER_LEN
    } else {
        0
    }
}

/// The image with its first 512 bytes removed.
pub fn strip_copier_header(rom: &[u8]) -> Result<&[u8], RomError> {
    rom.get(COPIER_HEADER_LEN..).ok_or(RomError::TooShort {
        len: rom.len(),
        needed: COPIER_HEADER_LEN,
    })
}
