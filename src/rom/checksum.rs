// Internal checksum computation.
//
// The checksum is the 16-bit sum of every byte in the image, computed as if
// the checksum field held 0x0000 and the complement field 0xFFFF. Images
// whose size is not a power of two are summed the way the cartridge mirrors
// them: the trailing part is repeated until it fills the next power-of-two
// boundary.

use super::RomError;
use super::header::{CHECKSUM, COMPLEMENT, MapLayout, locate_header, read_header_at};

/// Sum of `data` with non-power-of-two tails mirrored. `mask` is the largest
/// power of two not exceeding `data.len()`.
///
/// Returns the sum and the length the image covers once mirrored.
fn mirrored_sum(data: &[u8], mut mask: usize) -> (u32, usize) {
    while mask > 0 && data.len() & mask == 0 {
        mask >>= 1;
    }
    if mask == 0 {
        return (0, 0);
    }

    let base: u32 = data[..mask]
        .iter()
        .fold(0u32, |acc, &b| acc.wrapping_add(b as u32));

    if data.len() == mask {
        return (base, mask);
    }
    let (mut tail, mut tail_len) = mirrored_sum(&data[mask..], mask >> 1);
    while tail_len < mask {
        tail_len += tail_len;
        tail = tail.wrapping_add(tail);
    }
    (base.wrapping_add(tail), mask + mask)
}

fn top_bit(len: usize) -> usize {
    if len == 0 {
        0
    } else {
        1 << (usize::BITS - 1 - len.leading_zeros())
    }
}

/// Compute the checksum of `rom`, treating the pair at `header_offset` as
/// the 0xFFFF / 0x0000 placeholders.
pub fn compute_checksum(rom: &[u8], header_offset: usize) -> u16 {
    let pair = header_offset + COMPLEMENT..header_offset + CHECKSUM + 2;
    if rom.len() < pair.end {
        return mirrored_sum(rom, top_bit(rom.len())).0 as u16;
    }

    // Mirroring may count the header more than once, so patch a scratch
    // copy instead of correcting the sum afterwards.
    let mut scratch = rom.to_vec();
    scratch[pair].copy_from_slice(&[0xFF, 0xFF, 0x00, 0x00]);
    mirrored_sum(&scratch, top_bit(scratch.len())).0 as u16
}

/// Recompute and store the checksum / complement pair.
///
/// With `layout` set, the header at that address is rewritten without
/// validating it first; otherwise the header is located the usual way.
/// Returns `(old_checksum, new_checksum)`.
pub fn fix_checksum(rom: &mut [u8], layout: Option<MapLayout>) -> Result<(u16, u16), RomError> {
    let header = match layout {
        Some(layout) => read_header_at(rom, layout)?,
        None => locate_header(rom)?,
    };
    let offset = header.offset;
    let checksum = compute_checksum(rom, offset);
    let complement = !checksum;

    rom[offset + COMPLEMENT..offset + COMPLEMENT + 2].copy_from_slice(&complement.to_le_bytes());
    rom[offset + CHECKSUM..offset + CHECKSUM + 2].copy_from_slice(&checksum.to_le_bytes());

    log::debug!(
        "checksum: {} header at {offset:#X}: {:#06X} -> {checksum:#06X}",
        header.layout,
        header.checksum
    );
    Ok((header.checksum, checksum))
}
