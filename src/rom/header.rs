// SNES internal cartridge header.
//
// The 32-byte header sits at a fixed address that depends on the memory
// map the cartridge uses. Candidates are probed in LoROM, HiROM, ExHiROM
// order; the first one with a printable title and a consistent
// checksum / complement pair is accepted.

use std::borrow::Cow;
use std::fmt;

use super::RomError;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Length of the internal header.
pub const HEADER_LEN: usize = 32;

/// Length of the title field.
pub const TITLE_LEN: usize = 21;

// Field offsets within the header.
const MAP_MODE: usize = 21;
const CHIPSET: usize = 22;
const ROM_SIZE: usize = 23;
const RAM_SIZE: usize = 24;
const COUNTRY: usize = 25;
const DEVELOPER: usize = 26;
const VERSION: usize = 27;
pub(crate) const COMPLEMENT: usize = 28;
pub(crate) const CHECKSUM: usize = 30;

/// Cartridge memory map, which determines where the header lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapLayout {
    LoRom,
    HiRom,
    ExHiRom,
}

impl MapLayout {
    /// Probe order used by [`locate_header`].
    pub const ALL: [MapLayout; 3] = [MapLayout::LoRom, MapLayout::HiRom, MapLayout::ExHiRom];

    /// File offset of the internal header (no copier header).
    pub const fn header_offset(self) -> usize {
        match self {
            Self::LoRom => 0x7FC0,
            Self::HiRom => 0xFFC0,
            Self::ExHiRom => 0x40_FFC0,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::LoRom => "LoROM",
            Self::HiRom => "HiROM",
            Self::ExHiRom => "ExHiROM",
        }
    }
}

impl fmt::Display for MapLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// RomHeader
// ---------------------------------------------------------------------------

/// Decoded internal header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomHeader {
    /// Which memory map the header was found for.
    pub layout: MapLayout,
    /// File offset of the header.
    pub offset: usize,
    pub title: [u8; TITLE_LEN],
    pub map_mode: u8,
    pub chipset: u8,
    /// ROM size as log2 of KiB.
    pub rom_size: u8,
    /// RAM size as log2 of KiB.
    pub ram_size: u8,
    pub country: u8,
    pub developer: u8,
    pub version: u8,
    pub complement: u16,
    pub checksum: u16,
}

impl RomHeader {
    /// Decode the 32 header bytes.
    pub fn parse(layout: MapLayout, bytes: &[u8; HEADER_LEN]) -> Self {
        let mut title = [0u8; TITLE_LEN];
        title.copy_from_slice(&bytes[..TITLE_LEN]);
        Self {
            layout,
            offset: layout.header_offset(),
            title,
            map_mode: bytes[MAP_MODE],
            chipset: bytes[CHIPSET],
            rom_size: bytes[ROM_SIZE],
            ram_size: bytes[RAM_SIZE],
            country: bytes[COUNTRY],
            developer: bytes[DEVELOPER],
            version: bytes[VERSION],
            complement: u16::from_le_bytes([bytes[COMPLEMENT], bytes[COMPLEMENT + 1]]),
            checksum: u16::from_le_bytes([bytes[CHECKSUM], bytes[CHECKSUM + 1]]),
        }
    }

    pub fn title_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.title)
    }

    pub fn rom_size_kib(&self) -> u64 {
        1u64.checked_shl(self.rom_size as u32).unwrap_or(0)
    }

    pub fn ram_size_kib(&self) -> u64 {
        1u64.checked_shl(self.ram_size as u32).unwrap_or(0)
    }

    pub fn title_is_printable(&self) -> bool {
        self.title.iter().all(|&b| (0x20..=0x7E).contains(&b))
    }

    /// Checksum and complement add up to 0xFFFF.
    pub fn checksum_pair_consistent(&self) -> bool {
        self.checksum as u32 + self.complement as u32 == 0xFFFF
    }

    pub fn is_valid(&self) -> bool {
        self.title_is_printable() && self.checksum_pair_consistent()
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Decode the header at `layout`'s address without validating it.
pub fn read_header_at(rom: &[u8], layout: MapLayout) -> Result<RomHeader, RomError> {
    let offset = layout.header_offset();
    let bytes = rom
        .get(offset..offset + HEADER_LEN)
        .and_then(|s| <&[u8; HEADER_LEN]>::try_from(s).ok())
        .ok_or(RomError::TooShort {
            len: rom.len(),
            needed: offset + HEADER_LEN,
        })?;
    Ok(RomHeader::parse(layout, bytes))
}

/// Find the first valid internal header.
pub fn locate_header(rom: &[u8]) -> Result<RomHeader, RomError> {
    for layout in MapLayout::ALL {
        let Ok(header) = read_header_at(rom, layout) else {
            log::debug!("header: ROM too short for {layout} candidate");
            continue;
        };
        if header.is_valid() {
            log::debug!("header: {layout} header at {:#X}", header.offset);
            return Ok(header);
        }
        log::debug!(
            "header: rejected {layout} candidate at {:#X} (printable title: {}, checksum pair: {})",
            header.offset,
            header.title_is_printable(),
            header.checksum_pair_consistent()
        );
    }
    Err(RomError::NoHeader)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn put_header(rom: &mut [u8], layout: MapLayout, title: &[u8], checksum: u16) {
        let off = layout.header_offset();
        let h = &mut rom[off..off + HEADER_LEN];
        h[..TITLE_LEN].fill(b' ');
        h[..title.len()].copy_from_slice(title);
        h[MAP_MODE] = 0x20;
        h[CHIPSET] = 0x02;
        h[ROM_SIZE] = 0x0A;
        h[RAM_SIZE] = 0x03;
        h[COUNTRY] = 0x01;
        h[DEVELOPER] = 0x33;
        h[VERSION] = 0x00;
        h[COMPLEMENT..COMPLEMENT + 2].copy_from_slice(&(!checksum).to_le_bytes());
        h[CHECKSUM..CHECKSUM + 2].copy_from_slice(&checksum.to_le_bytes());
    }

    #[test]
    fn finds_lorom_header() {
        let mut rom = vec![0u8; 0x8000];
        put_header(&mut rom, MapLayout::LoRom, b"SUPER TEST", 0x1234);
        let h = locate_header(&rom).unwrap();
        assert_eq!(h.layout, MapLayout::LoRom);
        assert_eq!(h.offset, 0x7FC0);
        assert_eq!(h.title_str(), "SUPER TEST           ");
        assert_eq!(h.checksum, 0x1234);
        assert_eq!(h.complement, 0xEDCB);
        assert_eq!(h.rom_size_kib(), 1024);
        assert_eq!(h.ram_size_kib(), 8);
        assert_eq!(h.developer, 0x33);
    }

    #[test]
    fn finds_hirom_when_lorom_invalid() {
        let mut rom = vec![0u8; 0x10000];
        put_header(&mut rom, MapLayout::HiRom, b"HIGH", 0xBEEF);
        let h = locate_header(&rom).unwrap();
        assert_eq!(h.layout, MapLayout::HiRom);
        assert_eq!(h.offset, 0xFFC0);
    }

    #[test]
    fn lorom_preferred_when_both_valid() {
        let mut rom = vec![0u8; 0x10000];
        put_header(&mut rom, MapLayout::LoRom, b"LOW", 1);
        put_header(&mut rom, MapLayout::HiRom, b"HIGH", 2);
        assert_eq!(locate_header(&rom).unwrap().layout, MapLayout::LoRom);
    }

    #[test]
    fn unprintable_title_rejects_candidate() {
        let mut rom = vec![0u8; 0x8000];
        put_header(&mut rom, MapLayout::LoRom, b"BAD\x01", 0x1000);
        assert!(matches!(locate_header(&rom), Err(RomError::NoHeader)));
    }

    #[test]
    fn inconsistent_checksum_rejects_candidate() {
        let mut rom = vec![0u8; 0x8000];
        put_header(&mut rom, MapLayout::LoRom, b"GAME", 0x1000);
        rom[0x7FC0 + CHECKSUM] ^= 1;
        assert!(matches!(locate_header(&rom), Err(RomError::NoHeader)));
    }

    #[test]
    fn tiny_rom_has_no_header() {
        assert!(matches!(locate_header(&[0u8; 64]), Err(RomError::NoHeader)));
        assert!(matches!(
            read_header_at(&[0u8; 64], MapLayout::LoRom),
            Err(RomError::TooShort { len: 64, needed: 0x7FE0 })
        ));
    }

    #[test]
    fn oversized_rom_size_exponent() {
        let mut bytes = [0x20u8; HEADER_LEN];
        bytes[ROM_SIZE] = 200;
        let h = RomHeader::parse(MapLayout::LoRom, &bytes);
        assert_eq!(h.rom_size_kib(), 0);
    }
}
