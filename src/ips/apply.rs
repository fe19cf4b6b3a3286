// Applying IPS patch streams to a PatchBuffer.
//
// Each stream is validated up front (magic) and then applied record by
// record in stream order. Multiple streams applied to one buffer compose:
// every stream sees the bytes left by the one before it.

use std::io::Read;

use super::buffer::PatchBuffer;
use super::record::{PatchError, Record, RecordReader};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Counters collected while applying one patch stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Literal records applied.
    pub literal_records: u64,
    /// Run-length records applied.
    pub rle_records: u64,
    /// Total target bytes written (overlapping writes count twice).
    pub bytes_written: u64,
    /// Buffer length after the patch.
    pub final_len: u64,
}

impl ApplyStats {
    /// Total records applied, literal and run-length.
    pub fn records(&self) -> u64 {
        self.literal_records + self.rle_records
    }
}

// ---------------------------------------------------------------------------
// apply_patch / apply_patches
// ---------------------------------------------------------------------------

/// Apply one IPS stream to `buffer`.
///
/// Fails with [`PatchError::InvalidFormat`] before touching the buffer if
/// the magic is missing or wrong. Truncated trailing records are applied
/// with whatever bytes are present.
pub fn apply_patch<R: Read>(buffer: &mut PatchBuffer, patch: R) -> Result<ApplyStats, PatchError> {
    let mut reader = RecordReader::new(patch)?;
    let mut stats = ApplyStats::default();

    while let Some(record) = reader.next_record()? {
        log::trace!(
            "ips record at {:#08X}: {} bytes ({})",
            record.offset(),
            record.write_len(),
            match record {
                Record::Literal { .. } => "literal",
                Record::RunLength { .. } => "rle",
            }
        );
        match record {
            Record::Literal { .. } => stats.literal_records += 1,
            Record::RunLength { .. } => stats.rle_records += 1,
        }
        stats.bytes_written += record.write_len() as u64;
        record.apply(buffer);
    }

    stats.final_len = buffer.len() as u64;
    log::debug!(
        "ips: applied {} records ({} literal, {} rle), {} bytes written, target now {} bytes",
        stats.records(),
        stats.literal_records,
        stats.rle_records,
        stats.bytes_written,
        stats.final_len
    );
    Ok(stats)
}

/// Apply several IPS streams in order, stopping at the first failure.
///
/// On error the buffer keeps the changes of the streams applied before the
/// failing one; the failing stream itself is rejected before any write.
pub fn apply_patches<I, R>(
    buffer: &mut PatchBuffer,
    patches: I,
) -> Result<Vec<ApplyStats>, PatchError>
where
    I: IntoIterator<Item = R>,
    R: Read,
{
    patches
        .into_iter()
        .map(|patch| apply_patch(buffer, patch))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(offset: u32, bytes: &[u8]) -> Vec<u8> {
        let mut out = offset.to_be_bytes()[1..].to_vec();
        out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        out.extend_from_slice(bytes);
        out
    }

    fn rle(offset: u32, length: u16, value: u8) -> Vec<u8> {
        let mut out = offset.to_be_bytes()[1..].to_vec();
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&length.to_be_bytes());
        out.push(value);
        out
    }

    fn patch(records: &[Vec<u8>]) -> Vec<u8> {
        let mut out = b"PATCH".to_vec();
        for r in records {
            out.extend_from_slice(r);
        }
        out.extend_from_slice(b"EOF");
        out
    }

    #[test]
    fn literal_inside_seed() {
        let mut buf = PatchBuffer::from(vec![0u8; 8]);
        let p = patch(&[literal(2, &[0xAA, 0xBB, 0xCC, 0xDD])]);
        let stats = apply_patch(&mut buf, &p[..]).unwrap();
        assert_eq!(
            buf.as_slice(),
            &[0x00, 0x00, 0xAA, 0xBB, 0xCC, 0xDD, 0x00, 0x00]
        );
        assert_eq!(stats.literal_records, 1);
        assert_eq!(stats.bytes_written, 4);
        assert_eq!(stats.final_len, 8);
    }

    #[test]
    fn rle_grows_buffer() {
        let mut buf = PatchBuffer::from(vec![0u8; 4]);
        let p = patch(&[rle(0, 6, 0xFF)]);
        let stats = apply_patch(&mut buf, &p[..]).unwrap();
        assert_eq!(buf.as_slice(), &[0xFF; 6]);
        assert_eq!(stats.rle_records, 1);
        assert_eq!(stats.final_len, 6);
    }

    #[test]
    fn later_record_wins_in_overlap() {
        let mut buf = PatchBuffer::from(vec![0u8; 6]);
        let p = patch(&[literal(0, &[1, 1, 1, 1]), literal(2, &[2, 2, 2])]);
        apply_patch(&mut buf, &p[..]).unwrap();
        assert_eq!(buf.as_slice(), &[1, 1, 2, 2, 2, 0]);
    }

    #[test]
    fn bad_magic_leaves_buffer_untouched() {
        let seed = vec![5u8; 4];
        let mut buf = PatchBuffer::from(seed.clone());
        let mut p = patch(&[literal(0, &[9, 9, 9, 9, 9, 9])]);
        p[0] = b'X';
        let err = apply_patch(&mut buf, &p[..]).unwrap_err();
        assert!(matches!(err, PatchError::InvalidFormat { .. }));
        assert_eq!(buf.as_slice(), &seed[..]);
    }

    #[test]
    fn empty_patch_is_noop() {
        let mut buf = PatchBuffer::from_slice(&[1, 2, 3]);
        let stats = apply_patch(&mut buf, &b"PATCHEOF"[..]).unwrap();
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
        assert_eq!(stats.records(), 0);
    }

    #[test]
    fn missing_sentinel_behaves_like_eof() {
        let mut with_eof = PatchBuffer::from(vec![0u8; 4]);
        let mut without = with_eof.clone();
        let p = patch(&[literal(1, &[7, 7])]);
        apply_patch(&mut with_eof, &p[..]).unwrap();
        apply_patch(&mut without, &p[..p.len() - 3]).unwrap();
        assert_eq!(with_eof, without);
    }

    #[test]
    fn truncated_literal_writes_partial_payload() {
        let mut buf = PatchBuffer::from(vec![0u8; 2]);
        let mut p = b"PATCH".to_vec();
        p.extend_from_slice(&[0, 0, 1, 0, 4, 0xA1, 0xA2]);
        apply_patch(&mut buf, &p[..]).unwrap();
        assert_eq!(buf.as_slice(), &[0, 0xA1, 0xA2]);
    }

    #[test]
    fn sequential_patches_compose() {
        let mut buf = PatchBuffer::from(vec![0u8; 4]);
        let a = patch(&[rle(0, 4, 0x11)]);
        let b = patch(&[literal(3, &[0x22, 0x33])]);
        let stats = apply_patches(&mut buf, [&a[..], &b[..]]).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(buf.as_slice(), &[0x11, 0x11, 0x11, 0x22, 0x33]);
    }

    #[test]
    fn apply_patches_stops_at_first_failure() {
        let mut buf = PatchBuffer::from(vec![0u8; 2]);
        let good = patch(&[literal(0, &[1])]);
        let bad = b"NOPE!EOF".to_vec();
        let never = patch(&[literal(1, &[2])]);
        let err = apply_patches(&mut buf, [&good[..], &bad[..], &never[..]]).unwrap_err();
        assert!(matches!(err, PatchError::InvalidFormat { .. }));
        assert_eq!(buf.as_slice(), &[1, 0]);
    }

    #[test]
    fn max_offset_record() {
        let mut buf = PatchBuffer::new();
        let p = patch(&[literal(0xFF_FFFF, &[0xEE])]);
        apply_patch(&mut buf, &p[..]).unwrap();
        assert_eq!(buf.len(), 0x100_0000);
        assert_eq!(buf.as_slice()[0xFF_FFFF], 0xEE);
    }
}
