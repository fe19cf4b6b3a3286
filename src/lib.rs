//! romtool: SNES ROM image utilities in Rust.
//!
//! The crate provides:
//! - An IPS patch engine over a growable buffer (`ips`)
//! - Internal header decoding, checksum repair and copier-header handling (`rom`)
//! - SHA-1 / SHA-256 content digests (`hash` feature)
//! - File-oriented workflows (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use romtool::ips::{PatchBuffer, apply_patch};
//!
//! let mut rom = PatchBuffer::from(vec![0u8; 8]);
//! let patch = b"PATCH\x00\x00\x02\x00\x04\xAA\xBB\xCC\xDDEOF";
//! apply_patch(&mut rom, &patch[..]).unwrap();
//! assert_eq!(rom.as_slice(), &[0, 0, 0xAA, 0xBB, 0xCC, 0xDD, 0, 0]);
//! ```

pub mod io;
pub mod ips;
pub mod rom;

#[cfg(feature = "hash")]
pub mod hash;

#[cfg(feature = "cli")]
pub mod cli;
