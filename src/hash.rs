// Content digests for ROM and patch files.
//
// SHA-1 is the default: it is what ROM databases and patch readmes quote.

use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }
}

/// Lowercase hex digest of `data`.
pub fn digest_hex(algorithm: HashAlgorithm, data: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Sha1 => hex::encode(Sha1::digest(data)),
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
    }
}

/// Shorthand for the SHA-1 hex digest.
pub fn sha1_hex(data: &[u8]) -> String {
    digest_hex(HashAlgorithm::Sha1, data)
}
