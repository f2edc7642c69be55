use super::HashRate;
use crate::sampler::Attempt;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// A progress bar over a sampling run, showing the live hash rate.
pub struct Progress {
    pb: ProgressBar,
    passed: usize,
    cycle_start: Instant,
    cycle_hashes: usize,
}

impl Progress {
    const REFRESH: Duration = Duration::from_millis(500);

    pub fn new(attempts: usize) -> Self {
        let pb = ProgressBar::new(attempts as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
                .progress_chars("=> "),
        );

        Self::with_bar(pb)
    }

    /// A progress tracker that draws nothing.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(pb: ProgressBar) -> Self {
        Self {
            pb,
            passed: 0,
            cycle_start: Instant::now(),
            cycle_hashes: 0,
        }
    }

    pub fn record(&mut self, attempt: &Attempt) {
        self.pb.inc(1);
        self.cycle_hashes += 1;
        if attempt.passed {
            self.passed += 1;
        }

        if self.cycle_start.elapsed() >= Self::REFRESH {
            let rate = HashRate {
                hashes: std::mem::replace(&mut self.cycle_hashes, 0),
                elapsed: std::mem::replace(&mut self.cycle_start, Instant::now()).elapsed(),
            };

            self.pb
                .set_message(&format!("{} passed, sampling at {:.1}", self.passed, rate));
        }
    }

    pub fn passed(&self) -> usize {
        self.passed
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_counts_passes() {
        let mut progress = Progress::hidden();
        for i in 0..10u8 {
            progress.record(&Attempt {
                nonce: vec![i],
                leading_zeros: 0,
                passed: i % 3 == 0,
            });
        }

        assert_eq!(progress.passed(), 4);
    }
}
