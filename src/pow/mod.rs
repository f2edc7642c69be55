//! Leading-zero-bit proof-of-work criterion

pub mod bits;
pub mod difficulty;
pub mod retarget;

use crate::hash::Hasher;
use difficulty::Evaluator;

pub use bits::{leading_zeros_in_byte, leading_zeros_in_sequence};
pub use difficulty::{meets_difficulty, required_zero_bits, Difficulty, LengthMismatch};

/// Check a previously found nonce by hashing `challenge || nonce` again and
/// judging the digest.
pub fn verify(
    hasher: &impl Hasher,
    challenge: &[u8],
    nonce: &[u8],
    evaluator: &Evaluator,
) -> bool {
    evaluator.meets(&hasher.digest(&[challenge, nonce]))
}

/// Like [`verify`], but rejects digests whose length differs from the
/// difficulty encoding.
pub fn verify_checked(
    hasher: &impl Hasher,
    challenge: &[u8],
    nonce: &[u8],
    evaluator: &Evaluator,
) -> Result<bool, LengthMismatch> {
    evaluator.check(&hasher.digest(&[challenge, nonce]))
}
