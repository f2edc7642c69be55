use super::bits::leading_zeros_in_sequence;
use crate::prelude::*;

/// A difficulty target, encoded as a digest-shaped byte sequence.
///
/// The encoding is never compared numerically against a digest. Its own
/// leading zero bit count is the number of leading zero bits a digest needs,
/// so both sides are measured with [`leading_zeros_in_sequence`].
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Difficulty(Vec<u8>);

/// An error caused by an invalid difficulty encoding
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidDifficulty {
    #[error("difficulty encoding is empty")]
    Empty,

    #[error("invalid hex in difficulty: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("{bits} leading zero bits don't fit in a {len} byte encoding")]
    TooManyBits { bits: u32, len: usize },
}

impl Difficulty {
    /// The encoding length used with 256 bit digests, in bytes
    pub const DEFAULT_LENGTH: usize = 32;

    /// The starting difficulty for a fresh chain of solutions: a single
    /// leading zero bit.
    pub const INITIAL: [u8; Difficulty::DEFAULT_LENGTH] = [
        0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFF, 0xFF,
    ];

    /// Wrap a raw encoding.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, InvalidDifficulty> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(InvalidDifficulty::Empty);
        }

        Ok(Self(bytes))
    }

    /// Build the canonical `len` byte encoding of a leading zero bit count:
    /// whole zero bytes, one partial byte, then `0xFF` filler.
    pub fn with_zero_bits(bits: u32, len: usize) -> Result<Self, InvalidDifficulty> {
        if len == 0 {
            return Err(InvalidDifficulty::Empty);
        }
        if (bits as usize) > len * 8 {
            return Err(InvalidDifficulty::TooManyBits { bits, len });
        }

        let mut difficulty = Self(vec![0xFF; len]);
        difficulty.set_zero_bits(bits);
        Ok(difficulty)
    }

    /// Rewrite the encoding in place as the canonical encoding of `bits`,
    /// keeping its length. `bits` must fit in the encoding.
    pub(crate) fn set_zero_bits(&mut self, bits: u32) {
        let whole = bits as usize / 8;
        for (i, byte) in self.0.iter_mut().enumerate() {
            *byte = match i.cmp(&whole) {
                std::cmp::Ordering::Less => 0x00,
                std::cmp::Ordering::Equal => 0xFF >> (bits % 8),
                std::cmp::Ordering::Greater => 0xFF,
            };
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of leading zero bits a digest needs to meet this difficulty
    pub fn required_zero_bits(&self) -> u32 {
        required_zero_bits(&self.0)
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(Self::INITIAL.to_vec())
    }
}

impl FromStr for Difficulty {
    type Err = InvalidDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        Self::from_bytes(hex::decode(s)?)
    }
}

impl TryFrom<String> for Difficulty {
    type Error = InvalidDifficulty;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl From<Difficulty> for String {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.to_string()
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl Debug for Difficulty {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Difficulty({} bits, {})", self.required_zero_bits(), self)
    }
}

/// Derive the required leading zero bit count from a difficulty encoding.
#[inline]
pub fn required_zero_bits(encoding: &[u8]) -> u32 {
    leading_zeros_in_sequence(encoding)
}

/// Check whether `digest` has at least `required` leading zero bits. Equal
/// counts pass.
#[inline]
pub fn meets_difficulty(digest: &[u8], required: u32) -> bool {
    leading_zeros_in_sequence(digest) >= required
}

/// A digest whose length doesn't match the difficulty encoding it was judged
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("digest is {actual} bytes but the difficulty encoding is {expected} bytes")]
pub struct LengthMismatch {
    pub expected: usize,
    pub actual: usize,
}

/// Judges digests against a single difficulty, caching the required count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluator {
    required: u32,
    len: usize,
}

impl Evaluator {
    pub fn new(difficulty: &Difficulty) -> Self {
        Self {
            required: difficulty.required_zero_bits(),
            len: difficulty.len(),
        }
    }

    pub fn required_zero_bits(&self) -> u32 {
        self.required
    }

    /// The digest length this evaluator expects
    pub fn digest_len(&self) -> usize {
        self.len
    }

    /// Judge a digest without checking its length.
    #[inline]
    pub fn meets(&self, digest: &[u8]) -> bool {
        meets_difficulty(digest, self.required)
    }

    /// Judge a digest, rejecting it if its length differs from the encoding.
    pub fn check(&self, digest: &[u8]) -> Result<bool, LengthMismatch> {
        self.expect_len(digest.len())?;
        Ok(self.meets(digest))
    }

    pub(crate) fn expect_len(&self, actual: usize) -> Result<(), LengthMismatch> {
        if actual == self.len {
            Ok(())
        } else {
            Err(LengthMismatch {
                expected: self.len,
                actual,
            })
        }
    }
}
