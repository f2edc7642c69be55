//! Command line configuration

use crate::hash::{HashAlgorithm, Hasher, RingHasher};
use crate::pow::difficulty::InvalidDifficulty;
use crate::pow::Difficulty;
use crate::prelude::*;
use crate::report::ReportFormat;
use crate::sampler::parallel::WorkerConfig;
use crate::sampler::{SampleMode, DEFAULT_ATTEMPTS, DEFAULT_NONCE_LENGTH};
use std::path::PathBuf;
use structopt::StructOpt;

/// The text hashed to produce the challenge when none is given
pub const DEFAULT_CHALLENGE_TEXT: &str = "text";

/// The leading zero bits required when no difficulty is given
pub const DEFAULT_ZERO_BITS: u32 = 4;

/// Arbitrary bytes given on the command line in hex
#[derive(Clone, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

impl FromStr for HexBytes {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        hex::decode(s.strip_prefix("0x").unwrap_or(s)).map(HexBytes)
    }
}

impl Debug for HexBytes {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "HexBytes({})", hex::encode(&self.0))
    }
}

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} and {1} can't be used together")]
    Conflict(&'static str, &'static str),

    #[error(transparent)]
    Difficulty(#[from] InvalidDifficulty),
}

#[derive(Debug, Clone, StructOpt)]
pub struct LogConfig {
    /// Log more detail, repeat for even more
    #[structopt(short, long, parse(from_occurrences), global = true)]
    pub verbose: u8,

    /// Write the log here instead of the user data directory
    #[structopt(long, name = "path", global = true)]
    pub log_file: Option<PathBuf>,
}

impl LogConfig {
    pub fn level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, StructOpt)]
pub struct SampleConfig {
    /// The challenge each nonce is appended to, in hex. Defaults to the
    /// digest of "text"
    #[structopt(short, long, name = "hex")]
    pub challenge: Option<HexBytes>,

    /// Text to hash with the selected algorithm to form the challenge
    #[structopt(long, name = "text")]
    pub challenge_text: Option<String>,

    /// The difficulty encoding in hex, as long as a digest. Its own leading
    /// zero bit count is what each digest must reach
    #[structopt(short, long, name = "encoding")]
    pub difficulty: Option<Difficulty>,

    /// Required leading zero bits, as an alternative to an explicit encoding
    #[structopt(short, long, name = "bits")]
    pub zero_bits: Option<u32>,

    /// Number of nonces to try
    #[structopt(short = "n", long, default_value = "1000")]
    pub attempts: usize,

    /// Length of each random nonce in bytes
    #[structopt(short = "l", long, default_value = "10")]
    pub nonce_length: usize,

    /// Hash algorithm: sha256, sha384, sha512 or sha512/256
    #[structopt(long = "hash", name = "algorithm", default_value = "sha256")]
    pub algorithm: HashAlgorithm,

    /// Seed the random source for reproducible runs
    #[structopt(long)]
    pub seed: Option<u64>,

    /// Number of sampling threads, 0 to use every CPU
    #[structopt(short, long, default_value = "1")]
    pub threads: usize,

    /// Output format: text or json
    #[structopt(short, long, default_value = "text")]
    pub format: ReportFormat,

    /// Stop after the first passing nonce
    #[structopt(long)]
    pub until_pass: bool,

    /// Show a progress bar on stderr
    #[structopt(long)]
    pub progress: bool,

    /// Don't lower sampling thread priority
    #[structopt(long)]
    pub keep_thread_priority: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            challenge: None,
            challenge_text: None,
            difficulty: None,
            zero_bits: None,
            attempts: DEFAULT_ATTEMPTS,
            nonce_length: DEFAULT_NONCE_LENGTH,
            algorithm: HashAlgorithm::default(),
            seed: None,
            threads: 1,
            format: ReportFormat::default(),
            until_pass: false,
            progress: false,
            keep_thread_priority: false,
        }
    }
}

impl SampleConfig {
    pub fn hasher(&self) -> RingHasher {
        self.algorithm.hasher()
    }

    /// Resolve the challenge bytes.
    pub fn challenge(&self) -> Result<Vec<u8>, ConfigError> {
        match (&self.challenge, &self.challenge_text) {
            (Some(_), Some(_)) => Err(ConfigError::Conflict("--challenge", "--challenge-text")),
            (Some(hex), None) => Ok(hex.0.clone()),
            (None, Some(text)) => Ok(self.hasher().digest(&[text.as_bytes()])),
            (None, None) => Ok(self
                .hasher()
                .digest(&[DEFAULT_CHALLENGE_TEXT.as_bytes()])),
        }
    }

    /// Resolve the difficulty, sized to the selected algorithm's digests when
    /// built from a bit count.
    pub fn difficulty(&self) -> Result<Difficulty, ConfigError> {
        let len = self.algorithm.output_len();

        match (&self.difficulty, self.zero_bits) {
            (Some(_), Some(_)) => Err(ConfigError::Conflict("--difficulty", "--zero-bits")),
            (Some(difficulty), None) => Ok(difficulty.clone()),
            (None, Some(bits)) => Ok(Difficulty::with_zero_bits(bits, len)?),
            (None, None) => Ok(Difficulty::with_zero_bits(DEFAULT_ZERO_BITS, len)?),
        }
    }

    pub fn mode(&self) -> SampleMode {
        if self.until_pass {
            SampleMode::UntilPass
        } else {
            SampleMode::Exhaustive
        }
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            threads: if self.threads == 0 {
                num_cpus::get()
            } else {
                self.threads
            },
            seed: self.seed,
            mode: self.mode(),
            keep_thread_priority: self.keep_thread_priority,
        }
    }
}
