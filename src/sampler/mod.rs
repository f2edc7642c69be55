//! Random nonce sampling against a difficulty

pub mod parallel;
mod thread_priority;

use crate::hash::Hasher;
use crate::pow::difficulty::{Evaluator, LengthMismatch};
use crate::pow::leading_zeros_in_sequence;
use crate::report::HashRate;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::iter::FusedIterator;
use std::time::Duration;

/// The nonce length used when none is given, in bytes
pub const DEFAULT_NONCE_LENGTH: usize = 10;

/// The number of attempts made when none is given
pub const DEFAULT_ATTEMPTS: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("nonce length must be positive, got {nonce_length}")]
    InvalidLength { nonce_length: usize },

    #[error("random source exhausted: {0}")]
    RandomSourceExhausted(#[source] rand::Error),

    #[error(transparent)]
    LengthMismatch(#[from] LengthMismatch),

    #[error("couldn't spawn sampler thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("a sampler thread panicked")]
    WorkerPanicked,
}

/// When a sampling run should end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    /// Make every requested attempt, passing or not.
    Exhaustive,

    /// Stop right after the first passing attempt.
    UntilPass,
}

impl Default for SampleMode {
    fn default() -> Self {
        SampleMode::Exhaustive
    }
}

/// A single hashed nonce and its verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub nonce: Vec<u8>,
    pub leading_zeros: u32,
    pub passed: bool,
}

/// A lazy, non-restartable stream of attempts. Created by [`sample`].
pub struct Samples<'a, H, R> {
    hasher: H,
    challenge: &'a [u8],
    evaluator: Evaluator,
    nonce_length: usize,
    remaining: usize,
    mode: SampleMode,
    rng: R,
    done: bool,
}

/// Start sampling `attempts` random nonces of `nonce_length` bytes, each
/// hashed after `challenge` and judged by `evaluator`.
///
/// Fails up front if the nonce length is zero or if the hasher's digests
/// can't be compared with the evaluator's difficulty encoding. A random
/// source that runs dry ends the stream with
/// [`SampleError::RandomSourceExhausted`].
pub fn sample<'a, H: Hasher, R: RngCore>(
    hasher: H,
    challenge: &'a [u8],
    evaluator: Evaluator,
    attempts: usize,
    nonce_length: usize,
    rng: R,
) -> Result<Samples<'a, H, R>, SampleError> {
    if nonce_length == 0 {
        return Err(SampleError::InvalidLength { nonce_length });
    }
    evaluator.expect_len(hasher.output_len())?;

    Ok(Samples {
        hasher,
        challenge,
        evaluator,
        nonce_length,
        remaining: attempts,
        mode: SampleMode::default(),
        rng,
        done: false,
    })
}

impl<'a, H: Hasher, R: RngCore> Samples<'a, H, R> {
    pub fn with_mode(mut self, mode: SampleMode) -> Self {
        self.mode = mode;
        self
    }

    /// End the stream after the first passing attempt.
    pub fn until_pass(self) -> Self {
        self.with_mode(SampleMode::UntilPass)
    }
}

impl<'a, H: Hasher, R: RngCore> Iterator for Samples<'a, H, R> {
    type Item = Result<Attempt, SampleError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let mut nonce = vec![0u8; self.nonce_length];
        if let Err(e) = self.rng.try_fill_bytes(&mut nonce) {
            self.done = true;
            return Some(Err(SampleError::RandomSourceExhausted(e)));
        }

        let digest = self.hasher.digest(&[self.challenge, &nonce]);
        let leading_zeros = leading_zeros_in_sequence(&digest);
        let passed = leading_zeros >= self.evaluator.required_zero_bits();

        if passed && self.mode == SampleMode::UntilPass {
            self.done = true;
        }

        Some(Ok(Attempt {
            nonce,
            leading_zeros,
            passed,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, Some(self.remaining))
        }
    }
}

impl<'a, H: Hasher, R: RngCore> FusedIterator for Samples<'a, H, R> {}

/// Create the random source for sampling stream `stream`. Seeded streams are
/// reproducible, unseeded ones are drawn from the thread-local generator.
///
/// The seed and stream index occupy separate halves of the generator seed, so
/// no two `(seed, stream)` pairs share a stream.
pub fn rng_for(seed: Option<u64>, stream: usize) -> Result<StdRng, SampleError> {
    match seed {
        Some(seed) => {
            let mut key = <StdRng as SeedableRng>::Seed::default();
            key[..8].copy_from_slice(&seed.to_le_bytes());
            key[8..16].copy_from_slice(&(stream as u64).to_le_bytes());
            Ok(StdRng::from_seed(key))
        }
        None => {
            StdRng::from_rng(rand::thread_rng()).map_err(SampleError::RandomSourceExhausted)
        }
    }
}

/// Totals for a finished sampling run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub attempts: usize,
    pub passed: usize,
    pub elapsed: Duration,
}

impl Summary {
    fn record(&mut self, attempt: &Attempt) {
        self.attempts += 1;
        if attempt.passed {
            self.passed += 1;
        }
    }

    pub fn hash_rate(&self) -> HashRate {
        HashRate {
            hashes: self.attempts,
            elapsed: self.elapsed,
        }
    }
}

/// Run a stream of attempts to completion on the current thread, handing
/// each one to `sink`.
pub fn drain<I, F, E>(samples: I, mut sink: F) -> Result<Summary, E>
where
    I: IntoIterator<Item = Result<Attempt, SampleError>>,
    F: FnMut(Attempt) -> Result<(), E>,
    E: From<SampleError>,
{
    let start = std::time::Instant::now();
    let mut summary = Summary::default();

    for attempt in samples {
        let attempt = attempt?;
        summary.record(&attempt);
        sink(attempt)?;
    }

    summary.elapsed = start.elapsed();
    Ok(summary)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::hash::HashAlgorithm;
    use crate::pow::{verify, Difficulty};
    use rand::rngs::mock::StepRng;

    /// Digests are the first nonce byte followed by `0xFF` filler.
    pub(crate) struct FirstNonceByte;

    impl Hasher for FirstNonceByte {
        fn output_len(&self) -> usize {
            4
        }

        fn digest(&self, parts: &[&[u8]]) -> Vec<u8> {
            let first = parts.last().and_then(|p| p.first()).copied().unwrap_or(0);
            vec![first, 0xFF, 0xFF, 0xFF]
        }
    }

    /// A random source that runs dry after a number of draws.
    pub(crate) struct Exhausted {
        pub draws: usize,
    }

    impl RngCore for Exhausted {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for b in dest {
                *b = 0;
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            if self.draws == 0 {
                return Err(rand::Error::new("entropy pool drained"));
            }
            self.draws -= 1;
            self.fill_bytes(dest);
            Ok(())
        }
    }

    fn reference_evaluator() -> Evaluator {
        Evaluator::new(&Difficulty::with_zero_bits(4, 32).unwrap())
    }

    /// Counts down from 0xFF, so the low nonce byte reaches 0x03 (6 leading
    /// zero bits) on attempt 253.
    fn countdown() -> StepRng {
        StepRng::new(0xFF, u64::MAX)
    }

    #[test]
    fn test_exact_attempt_count_and_reproducible_verdicts() {
        let hasher = HashAlgorithm::Sha256.hasher();
        let challenge = hasher.digest(&[b"text"]);
        let evaluator = reference_evaluator();

        let attempts: Vec<Attempt> = sample(
            &hasher,
            &challenge,
            evaluator,
            1000,
            DEFAULT_NONCE_LENGTH,
            StdRng::seed_from_u64(7),
        )
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

        assert_eq!(attempts.len(), 1000);
        for attempt in &attempts {
            assert_eq!(attempt.nonce.len(), DEFAULT_NONCE_LENGTH);
            assert_eq!(
                attempt.passed,
                verify(&hasher, &challenge, &attempt.nonce, &evaluator)
            );
            assert_eq!(attempt.passed, attempt.leading_zeros >= 4);
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let hasher = HashAlgorithm::Sha256.hasher();
        let run = |seed| {
            let rng = rng_for(Some(seed), 0).unwrap();
            sample(&hasher, b"challenge", reference_evaluator(), 50, 10, rng)
                .unwrap()
                .collect::<Result<Vec<_>, _>>()
                .unwrap()
        };

        assert_eq!(run(1), run(1));
        assert_ne!(run(1), run(2));
    }

    #[test]
    fn test_neighbouring_seeds_dont_share_streams() {
        let first_draw = |seed, stream| {
            let mut rng = rng_for(Some(seed), stream).unwrap();
            let mut nonce = [0u8; 16];
            rng.fill_bytes(&mut nonce);
            nonce
        };

        assert_eq!(first_draw(1, 1), first_draw(1, 1));
        assert_ne!(first_draw(1, 1), first_draw(2, 0));
        assert_ne!(first_draw(1, 0), first_draw(0, 1));
        assert_ne!(first_draw(5, 3), first_draw(3, 5));
    }

    #[test]
    fn test_zero_attempts_is_empty() {
        let hasher = HashAlgorithm::Sha256.hasher();
        let rng = StdRng::seed_from_u64(0);
        let mut samples = sample(&hasher, b"", reference_evaluator(), 0, 10, rng).unwrap();
        assert!(samples.next().is_none());
    }

    #[test]
    fn test_zero_nonce_length_is_rejected() {
        let hasher = HashAlgorithm::Sha256.hasher();
        let rng = StdRng::seed_from_u64(0);
        let result = sample(&hasher, b"", reference_evaluator(), 10, 0, rng);
        assert!(matches!(
            result,
            Err(SampleError::InvalidLength { nonce_length: 0 })
        ));
    }

    #[test]
    fn test_mismatched_digest_length_is_rejected() {
        let hasher = HashAlgorithm::Sha512.hasher();
        let rng = StdRng::seed_from_u64(0);
        let result = sample(&hasher, b"", reference_evaluator(), 10, 10, rng);
        assert!(matches!(
            result,
            Err(SampleError::LengthMismatch(LengthMismatch {
                expected: 32,
                actual: 64
            }))
        ));
    }

    #[test]
    fn test_exhausted_random_source() {
        let hasher = HashAlgorithm::Sha256.hasher();
        let rng = Exhausted { draws: 2 };
        let mut samples = sample(&hasher, b"", reference_evaluator(), 10, 10, rng).unwrap();

        assert!(samples.next().unwrap().is_ok());
        assert!(samples.next().unwrap().is_ok());
        assert!(matches!(
            samples.next(),
            Some(Err(SampleError::RandomSourceExhausted(_)))
        ));
        assert!(samples.next().is_none());
    }

    #[test]
    fn test_exhaustive_mode_keeps_going() {
        let evaluator = Evaluator::new(&Difficulty::with_zero_bits(6, 4).unwrap());
        let attempts: Vec<Attempt> = sample(FirstNonceByte, b"", evaluator, 300, 8, countdown())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(attempts.len(), 300);
        // only 0x03, 0x02, 0x01 and 0x00 have six or more leading zero bits
        assert_eq!(attempts.iter().filter(|a| a.passed).count(), 4);
    }

    #[test]
    fn test_until_pass_stops_at_first_pass() {
        let evaluator = Evaluator::new(&Difficulty::with_zero_bits(6, 4).unwrap());
        let attempts: Vec<Attempt> = sample(FirstNonceByte, b"", evaluator, 300, 8, countdown())
            .unwrap()
            .until_pass()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(attempts.len(), 253);
        let (last, rest) = attempts.split_last().unwrap();
        assert!(last.passed);
        assert_eq!(last.nonce[0], 0x03);
        assert_eq!(last.leading_zeros, 6);
        assert!(rest.iter().all(|a| !a.passed));
    }

    #[test]
    fn test_drain_summary() {
        let evaluator = Evaluator::new(&Difficulty::with_zero_bits(6, 4).unwrap());
        let samples = sample(FirstNonceByte, b"", evaluator, 300, 8, countdown()).unwrap();

        let mut seen = 0;
        let summary = drain(samples, |_| {
            seen += 1;
            Ok::<_, SampleError>(())
        })
        .unwrap();

        assert_eq!(seen, 300);
        assert_eq!(summary.attempts, 300);
        assert_eq!(summary.passed, 4);
    }

    #[test]
    fn test_drain_stops_on_error() {
        let evaluator = Evaluator::new(&Difficulty::with_zero_bits(0, 4).unwrap());
        let rng = Exhausted { draws: 3 };
        let samples = sample(FirstNonceByte, b"", evaluator, 10, 8, rng).unwrap();

        let mut seen = 0;
        let result = drain(samples, |_| {
            seen += 1;
            Ok::<_, SampleError>(())
        });

        assert!(matches!(result, Err(SampleError::RandomSourceExhausted(_))));
        assert_eq!(seen, 3);
    }
}
