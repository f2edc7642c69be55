//! Sampling on a pool of scoped worker threads

use super::{rng_for, sample, thread_priority, Attempt, SampleError, SampleMode, Summary};
use crate::hash::{HashAlgorithm, Hasher};
use crate::pow::difficulty::Evaluator;
use crate::prelude::*;
use enumset::EnumSet;
use itertools::Itertools;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// How a parallel sampling run is spread over threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    pub threads: usize,

    /// Seed for the worker random sources. Worker `i` draws stream `i` of it.
    pub seed: Option<u64>,

    pub mode: SampleMode,

    /// Leave worker threads at normal scheduling priority.
    pub keep_thread_priority: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            seed: None,
            mode: SampleMode::default(),
            keep_thread_priority: false,
        }
    }
}

#[derive(Debug)]
pub struct HostInfo {
    threads: usize,
    algorithms: EnumSet<HashAlgorithm>,
}

impl Display for HostInfo {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "Host:\n\
            \tThreads: {threads}\n\
            \tHash algorithms: {algorithms}",
            threads = self.threads,
            algorithms = self
                .algorithms
                .iter()
                .map(|a| format!("{} ({} bytes)", a, a.output_len()))
                .join(", "),
        )
    }
}

pub fn get_host_info() -> HostInfo {
    HostInfo {
        threads: num_cpus::get(),
        algorithms: EnumSet::all(),
    }
}

/// The number of attempts worker `index` of `threads` is responsible for.
fn share(attempts: usize, threads: usize, index: usize) -> usize {
    attempts / threads + if index < attempts % threads { 1 } else { 0 }
}

/// Sample `attempts` nonces across `config.threads` workers, handing each
/// attempt to `sink` on the calling thread as it arrives.
///
/// Attempts arrive in no particular order. In [`SampleMode::UntilPass`] the
/// first passing attempt to reach `sink` is the last one it sees.
pub fn sample_parallel<H, F, E>(
    hasher: &H,
    challenge: &[u8],
    evaluator: Evaluator,
    attempts: usize,
    nonce_length: usize,
    config: WorkerConfig,
    mut sink: F,
) -> Result<Summary, E>
where
    H: Hasher + Sync,
    F: FnMut(Attempt) -> Result<(), E>,
    E: From<SampleError>,
{
    if nonce_length == 0 {
        return Err(SampleError::InvalidLength { nonce_length }.into());
    }
    evaluator
        .expect_len(hasher.output_len())
        .map_err(SampleError::from)?;

    let threads = config.threads.max(1).min(attempts.max(1));
    debug!(
        "Sampling {} attempts on {} threads with {:?}",
        attempts, threads, config
    );

    let start = Instant::now();
    let stop = AtomicBool::new(false);
    let (tx, rx) = crossbeam::channel::bounded::<Result<Attempt, SampleError>>(1024);
    let mut summary = Summary::default();
    let mut failure: Option<E> = None;

    // convert bindings to references to avoid lifetime/ownership complications
    let stop = &stop;
    let summary_ref = &mut summary;
    let failure_ref = &mut failure;

    let scoped = crossbeam::scope(move |s| {
        for i in 0..threads {
            let tx = tx.clone();
            let spawned = s
                .builder()
                .name(format!("sampler {}", i))
                .spawn(move |_| {
                    if !config.keep_thread_priority {
                        thread_priority::set_low_priority();
                    }

                    let samples = rng_for(config.seed, i).and_then(|rng| {
                        sample(
                            hasher,
                            challenge,
                            evaluator,
                            share(attempts, threads, i),
                            nonce_length,
                            rng,
                        )
                    });

                    let samples = match samples {
                        Ok(samples) => samples.with_mode(config.mode),
                        Err(e) => {
                            let _ = tx.send(Err(e));
                            return;
                        }
                    };

                    for item in samples {
                        if stop.load(Ordering::Relaxed) || tx.send(item).is_err() {
                            break;
                        }
                    }
                });

            if let Err(e) = spawned {
                stop.store(true, Ordering::Relaxed);
                *failure_ref = Some(SampleError::Spawn(e).into());
                break;
            }
        }
        drop(tx);

        // management loop
        if failure_ref.is_none() {
            for item in rx.iter() {
                let attempt = match item {
                    Ok(attempt) => attempt,
                    Err(e) => {
                        *failure_ref = Some(e.into());
                        break;
                    }
                };

                let passed = attempt.passed;
                summary_ref.record(&attempt);

                if let Err(e) = sink(attempt) {
                    *failure_ref = Some(e);
                    break;
                }

                if passed && config.mode == SampleMode::UntilPass {
                    break;
                }
            }
        }

        // unblock any worker still waiting to send
        stop.store(true, Ordering::Relaxed);
        drop(rx);
    });

    if scoped.is_err() {
        return Err(SampleError::WorkerPanicked.into());
    }
    if let Some(e) = failure {
        return Err(e);
    }

    summary.elapsed = start.elapsed();
    trace!("Parallel sampling finished: {:?}", summary);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashAlgorithm;
    use crate::pow::{verify, Difficulty};
    use crate::sampler::tests::FirstNonceByte;
    use std::collections::HashSet;

    fn config(threads: usize, mode: SampleMode) -> WorkerConfig {
        WorkerConfig {
            threads,
            seed: Some(42),
            mode,
            keep_thread_priority: true,
        }
    }

    #[test]
    fn test_host_info_lists_algorithms() {
        let info = get_host_info().to_string();
        assert!(info.contains("sha256 (32 bytes)"));
        assert!(info.contains("sha512/256 (32 bytes)"));
        assert!(info.contains("sha512 (64 bytes)"));
    }

    #[test]
    fn test_shares_cover_all_attempts() {
        for &(attempts, threads) in &[(1000, 3), (7, 8), (0, 4), (16, 16)] {
            let total: usize = (0..threads).map(|i| share(attempts, threads, i)).sum();
            assert_eq!(total, attempts);
        }
    }

    #[test]
    fn test_parallel_attempt_count_and_consistency() {
        let hasher = HashAlgorithm::Sha256.hasher();
        let challenge = hasher.digest(&[b"text"]);
        let evaluator = Evaluator::new(&Difficulty::with_zero_bits(4, 32).unwrap());

        let mut attempts = vec![];
        let summary = sample_parallel(
            &hasher,
            &challenge,
            evaluator,
            1000,
            10,
            config(4, SampleMode::Exhaustive),
            |a| {
                attempts.push(a);
                Ok::<_, SampleError>(())
            },
        )
        .unwrap();

        assert_eq!(attempts.len(), 1000);
        assert_eq!(summary.attempts, 1000);
        assert_eq!(
            summary.passed,
            attempts.iter().filter(|a| a.passed).count()
        );
        for attempt in &attempts {
            assert_eq!(
                attempt.passed,
                verify(&hasher, &challenge, &attempt.nonce, &evaluator)
            );
        }

        // workers draw from independently seeded sources
        let unique: HashSet<_> = attempts.iter().map(|a| a.nonce.clone()).collect();
        assert_eq!(unique.len(), 1000);
    }

    #[test]
    fn test_parallel_until_pass() {
        let evaluator = Evaluator::new(&Difficulty::with_zero_bits(2, 4).unwrap());

        let mut attempts = vec![];
        let summary = sample_parallel(
            &FirstNonceByte,
            b"",
            evaluator,
            10_000,
            10,
            config(4, SampleMode::UntilPass),
            |a| {
                attempts.push(a);
                Ok::<_, SampleError>(())
            },
        )
        .unwrap();

        assert_eq!(summary.passed, 1);
        assert!(attempts.last().unwrap().passed);
        assert!(attempts.len() < 10_000);
    }

    #[test]
    fn test_sink_error_stops_run() {
        #[derive(Debug)]
        enum SinkError {
            Full,
            Sample,
        }

        impl From<SampleError> for SinkError {
            fn from(_: SampleError) -> Self {
                SinkError::Sample
            }
        }

        let hasher = HashAlgorithm::Sha256.hasher();
        let evaluator = Evaluator::new(&Difficulty::with_zero_bits(4, 32).unwrap());

        let mut seen = 0;
        let result = sample_parallel(
            &hasher,
            b"",
            evaluator,
            100_000,
            10,
            config(2, SampleMode::Exhaustive),
            |_| {
                seen += 1;
                if seen == 10 {
                    Err(SinkError::Full)
                } else {
                    Ok(())
                }
            },
        );

        assert!(matches!(result, Err(SinkError::Full)));
        assert_eq!(seen, 10);
    }

    #[test]
    fn test_invalid_nonce_length() {
        let hasher = HashAlgorithm::Sha256.hasher();
        let evaluator = Evaluator::new(&Difficulty::with_zero_bits(4, 32).unwrap());
        let result = sample_parallel(
            &hasher,
            b"",
            evaluator,
            10,
            0,
            config(2, SampleMode::Exhaustive),
            |_| Ok::<_, SampleError>(()),
        );

        assert!(matches!(
            result,
            Err(SampleError::InvalidLength { nonce_length: 0 })
        ));
    }
}
