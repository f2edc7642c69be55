use super::{HashAlgorithm, Hasher};
use ring::digest::Context;

/// A [`Hasher`] backed by `ring`'s SHA-2 implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingHasher {
    algorithm: HashAlgorithm,
}

impl RingHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

impl Default for RingHasher {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

impl Hasher for RingHasher {
    fn output_len(&self) -> usize {
        self.algorithm.output_len()
    }

    #[inline]
    fn digest(&self, parts: &[&[u8]]) -> Vec<u8> {
        let mut ctx = Context::new(self.algorithm.ring_algorithm());
        for part in parts {
            ctx.update(part);
        }
        ctx.finish().as_ref().to_vec()
    }
}
