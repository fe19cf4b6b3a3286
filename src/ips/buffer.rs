// Growable patch target.
//
// The buffer only ever grows. Writes past the current end extend it, and
// any gap between the old end and the write offset is zero-filled.

// ---------------------------------------------------------------------------
// PatchBuffer
// ---------------------------------------------------------------------------

/// Offset-addressable byte storage that expands on demand.
///
/// Seed it with the original ROM, apply patches, then take the result with
/// [`PatchBuffer::into_inner`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchBuffer {
    data: Vec<u8>,
}

impl PatchBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer seeded with a copy of `data`.
    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    /// Current length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Grow to exactly `min_len` bytes if currently shorter. Never truncates.
    pub fn ensure_len(&mut self, min_len: usize) {
        if self.data.len() < min_len {
            self.data.resize(min_len, 0);
        }
    }

    /// Fill `[offset, offset + count)` with `value`.
    ///
    /// A zero `count` still extends the buffer up to `offset`.
    pub fn write_run(&mut self, offset: usize, value: u8, count: usize) {
        let end = offset + count;
        self.ensure_len(end);
        self.data[offset..end].fill(value);
    }

    /// Copy `bytes` verbatim to `offset`.
    pub fn write_slice(&mut self, offset: usize, bytes: &[u8]) {
        let end = offset + bytes.len();
        self.ensure_len(end);
        self.data[offset..end].copy_from_slice(bytes);
    }

    /// Borrowed view of the full contents.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, returning its contents.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for PatchBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl AsRef<[u8]> for PatchBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
