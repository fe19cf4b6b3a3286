// IPS patch format.
//
// This module provides the patch-application core:
//
// - `buffer` — PatchBuffer: growable, offset-addressable patch target
// - `record` — Record decoding from a byte stream (literal / RLE)
// - `apply`  — Applying one or more patch streams to a PatchBuffer

pub mod apply;
pub mod buffer;
pub mod record;

/// Leading magic of every IPS stream.
pub const IPS_MAGIC: [u8; 5] = *b"PATCH";

/// End-of-records sentinel.
pub const IPS_EOF: [u8; 3] = *b"EOF";

/// Largest offset addressable by the 24-bit record offset.
pub const IPS_MAX_OFFSET: u32 = 0x00FF_FFFF;

// Re-export key types for convenience.
pub use apply::{ApplyStats, apply_patch, apply_patches};
pub use buffer::PatchBuffer;
pub use record::{PatchError, Record, RecordReader};
