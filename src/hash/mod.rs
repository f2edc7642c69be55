//! Hash functions used to turn a challenge and nonce into a digest

mod ring_digest;

use crate::prelude::*;
use enumset::EnumSetType;
use ring::digest;
pub use ring_digest::RingHasher;

/// A deterministic hash function with a fixed output length.
pub trait Hasher {
    /// The length of every digest produced, in bytes
    fn output_len(&self) -> usize;

    /// Hash the concatenation of `parts`.
    fn digest(&self, parts: &[&[u8]]) -> Vec<u8>;
}

impl<H: Hasher + ?Sized> Hasher for &H {
    fn output_len(&self) -> usize {
        (**self).output_len()
    }

    fn digest(&self, parts: &[&[u8]]) -> Vec<u8> {
        (**self).digest(parts)
    }
}

/// Select a hash algorithm to use
#[derive(Debug, EnumSetType, PartialOrd, Ord)]
pub enum HashAlgorithm {
    /// SHA-256, 32 byte digests.
    Sha256,

    /// SHA-384, 48 byte digests.
    Sha384,

    /// SHA-512, 64 byte digests.
    Sha512,

    /// SHA-512 truncated to 256 bits, 32 byte digests.
    Sha512_256,
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid hash algorithm: {0}")]
pub struct InvalidHashAlgorithm(String);

impl HashAlgorithm {
    pub fn output_len(self) -> usize {
        match self {
            Self::Sha256 => digest::SHA256_OUTPUT_LEN,
            Self::Sha384 => digest::SHA384_OUTPUT_LEN,
            Self::Sha512 => digest::SHA512_OUTPUT_LEN,
            Self::Sha512_256 => digest::SHA512_256_OUTPUT_LEN,
        }
    }

    pub(crate) fn ring_algorithm(self) -> &'static digest::Algorithm {
        match self {
            Self::Sha256 => &digest::SHA256,
            Self::Sha384 => &digest::SHA384,
            Self::Sha512 => &digest::SHA512,
            Self::Sha512_256 => &digest::SHA512_256,
        }
    }

    pub fn hasher(self) -> RingHasher {
        RingHasher::new(self)
    }
}

impl FromStr for HashAlgorithm {
    type Err = InvalidHashAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().replace('-', "").as_ref() {
            "sha256" => Self::Sha256,
            "sha384" => Self::Sha384,
            "sha512" => Self::Sha512,
            "sha512/256" | "sha512_256" => Self::Sha512_256,
            _ => return Err(InvalidHashAlgorithm(s.to_string())),
        })
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Sha256
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Sha512_256 => "sha512/256",
        };

        write!(f, "{}", name)
    }
}
