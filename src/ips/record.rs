// IPS record decoding.
//
// Stream layout:
//   "PATCH"
//   { offset:u24be  size:u16be  ( size > 0: data[size]
//                               | size = 0: run_len:u16be value:u8 ) }*
//   "EOF"
//
// Exhaustion of the input ends the record stream exactly like the "EOF"
// sentinel does. Fields cut short by exhaustion are built from whatever
// bytes were available.

use std::io::{self, Read};

use super::buffer::PatchBuffer;
use super::{IPS_EOF, IPS_MAGIC};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// Missing, truncated or wrong "PATCH" magic.
    #[error("invalid IPS file: expected magic \"PATCH\", found {found:02X?}")]
    InvalidFormat { found: Vec<u8> },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One decoded IPS record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// Copy `bytes` verbatim to `offset`.
    Literal { offset: u32, bytes: Vec<u8> },
    /// Fill `length` bytes at `offset` with `value`.
    RunLength { offset: u32, length: u16, value: u8 },
}

impl Record {
    /// Target offset of the first byte written.
    pub fn offset(&self) -> u32 {
        match self {
            Self::Literal { offset, .. } | Self::RunLength { offset, .. } => *offset,
        }
    }

    /// Number of target bytes this record writes.
    pub fn write_len(&self) -> usize {
        match self {
            Self::Literal { bytes, .. } => bytes.len(),
            Self::RunLength { length, .. } => *length as usize,
        }
    }

    /// Apply this record to `buffer`, growing it as needed.
    pub fn apply(&self, buffer: &mut PatchBuffer) {
        match self {
            Self::Literal { offset, bytes } => buffer.write_slice(*offset as usize, bytes),
            Self::RunLength {
                offset,
                length,
                value,
            } => buffer.write_run(*offset as usize, *value, *length as usize),
        }
    }
}

// ---------------------------------------------------------------------------
// Low-level reads
// ---------------------------------------------------------------------------

/// Fill as much of `buf` as the reader allows. A short count means the
/// stream is exhausted.
fn read_up_to<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Big-endian value of `bytes`; an empty slice is zero.
#[inline]
fn be_value(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

// ---------------------------------------------------------------------------
// RecordReader
// ---------------------------------------------------------------------------

/// Sequential IPS record decoder over any `Read`.
///
/// Construction validates the magic; records are then pulled one at a time
/// with [`RecordReader::next_record`] or through the `Iterator` impl.
pub struct RecordReader<R> {
    inner: R,
    finished: bool,
}

impl<R: Read> RecordReader<R> {
    /// Read and check the 5-byte "PATCH" magic.
    pub fn new(mut inner: R) -> Result<Self, PatchError> {
        let mut magic = [0u8; IPS_MAGIC.len()];
        let n = read_up_to(&mut inner, &mut magic)?;
        if n < magic.len() || magic != IPS_MAGIC {
            return Err(PatchError::InvalidFormat {
                found: magic[..n].to_vec(),
            });
        }
        Ok(Self {
            inner,
            finished: false,
        })
    }

    /// Decode the next record, or `None` once the sentinel or the end of
    /// input has been reached.
    pub fn next_record(&mut self) -> Result<Option<Record>, PatchError> {
        if self.finished {
            return Ok(None);
        }

        let mut tag = [0u8; 3];
        let n = read_up_to(&mut self.inner, &mut tag)?;
        if n < tag.len() || tag == IPS_EOF {
            self.finished = true;
            return Ok(None);
        }
        let offset = be_value(&tag);

        let mut size_buf = [0u8; 2];
        let n = read_up_to(&mut self.inner, &mut size_buf)?;
        let size = be_value(&size_buf[..n]) as usize;

        if size == 0 {
            let mut rle = [0u8; 3];
            let n = read_up_to(&mut self.inner, &mut rle)?;
            if n < rle.len() {
                // No fill byte left to write with.
                self.finished = true;
                return Ok(None);
            }
            return Ok(Some(Record::RunLength {
                offset,
                length: be_value(&rle[..2]) as u16,
                value: rle[2],
            }));
        }

        let mut bytes = Vec::with_capacity(size);
        (&mut self.inner).take(size as u64).read_to_end(&mut bytes)?;
        if bytes.len() < size {
            self.finished = true;
        }
        Ok(Some(Record::Literal { offset, bytes }))
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record, PatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(parts: &[&[u8]]) -> Vec<u8> {
        parts.concat()
    }

    fn records(data: &[u8]) -> Vec<Record> {
        RecordReader::new(data)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn rejects_wrong_magic() {
        let err = RecordReader::new(&b"PATCX\x00\x00\x00EOF"[..]).err().unwrap();
        match err {
            PatchError::InvalidFormat { found } => assert_eq!(found, b"PATCX"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_truncated_magic() {
        let err = RecordReader::new(&b"PAT"[..]).err().unwrap();
        assert!(matches!(err, PatchError::InvalidFormat { ref found } if found == b"PAT"));
        assert!(RecordReader::new(&b""[..]).is_err());
    }

    #[test]
    fn empty_patch_has_no_records() {
        assert!(records(b"PATCHEOF").is_empty());
        assert!(records(b"PATCH").is_empty());
    }

    #[test]
    fn decodes_literal_record() {
        let data = stream(&[b"PATCH", &[0x01, 0x02, 0x03], &[0x00, 0x02], &[0xAB, 0xCD], b"EOF"]);
        assert_eq!(
            records(&data),
            vec![Record::Literal {
                offset: 0x010203,
                bytes: vec![0xAB, 0xCD],
            }]
        );
    }

    #[test]
    fn decodes_run_length_record() {
        let data = stream(&[b"PATCH", &[0, 0, 0x10], &[0, 0], &[0x01, 0x00], &[0x5A], b"EOF"]);
        assert_eq!(
            records(&data),
            vec![Record::RunLength {
                offset: 0x10,
                length: 0x100,
                value: 0x5A,
            }]
        );
    }

    #[test]
    fn trailing_bytes_after_sentinel_are_ignored() {
        let data = stream(&[b"PATCH", b"EOF", &[0, 0, 0, 0, 1, 0xFF]]);
        assert!(records(&data).is_empty());
    }

    #[test]
    fn short_tag_ends_stream() {
        let data = stream(&[b"PATCH", &[0, 0, 0], &[0, 1], &[7], &[0x00, 0x01]]);
        assert_eq!(
            records(&data),
            vec![Record::Literal {
                offset: 0,
                bytes: vec![7],
            }]
        );
    }

    #[test]
    fn truncated_literal_keeps_available_bytes() {
        let data = stream(&[b"PATCH", &[0, 0, 4], &[0, 8], &[1, 2, 3]]);
        assert_eq!(
            records(&data),
            vec![Record::Literal {
                offset: 4,
                bytes: vec![1, 2, 3],
            }]
        );
    }

    #[test]
    fn truncated_run_length_is_dropped() {
        let data = stream(&[b"PATCH", &[0, 0, 4], &[0, 0], &[0, 8]]);
        assert!(records(&data).is_empty());
    }

    #[test]
    fn half_size_field_is_read_as_single_byte_value() {
        let mut reader = RecordReader::new(&b"PATCH\x00\x00\x02\x03"[..]).unwrap();
        assert_eq!(
            reader.next_record().unwrap(),
            Some(Record::Literal {
                offset: 2,
                bytes: Vec::new(),
            })
        );
        assert_eq!(reader.next_record().unwrap(), None);
    }

    #[test]
    fn eof_tag_only_matches_full_sentinel() {
        // "EOG" is a regular offset.
        let data = stream(&[b"PATCH", b"EOG", &[0, 1], &[0x42], b"EOF"]);
        let recs = records(&data);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].offset(), 0x454F47);
    }

    #[test]
    fn record_apply_and_write_len() {
        let rec = Record::RunLength {
            offset: 2,
            length: 3,
            value: 9,
        };
        assert_eq!(rec.write_len(), 3);
        let mut buf = PatchBuffer::new();
        rec.apply(&mut buf);
        assert_eq!(buf.as_slice(), &[0, 0, 9, 9, 9]);
    }
}
