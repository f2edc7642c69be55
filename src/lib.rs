//! Leading-zero-bit proof-of-work: counting, difficulty evaluation and random
//! nonce sampling.

pub mod config;
pub mod hash;
pub mod pow;
pub(crate) mod prelude;
pub mod report;
pub mod sampler;
