use log::{debug, info};
use simplelog::{Config, WriteLogger};
use std::fs::{create_dir_all, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use structopt::StructOpt;
use zeroforge::config::{ConfigError, HexBytes, LogConfig, SampleConfig};
use zeroforge::hash::HashAlgorithm;
use zeroforge::pow::difficulty::Evaluator;
use zeroforge::pow::retarget::retarget;
use zeroforge::pow::{verify_checked, Difficulty, LengthMismatch};
use zeroforge::report::{Progress, Report, ReportError, ReportFormat};
use zeroforge::sampler::parallel::{get_host_info, sample_parallel};
use zeroforge::sampler::{drain, rng_for, sample, Attempt, SampleError};

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Hash random nonces after a challenge and report which ones meet the
    /// difficulty.
    Sample {
        #[structopt(flatten)]
        cfg: SampleConfig,
    },

    /// Check a single nonce against a challenge and difficulty.
    Verify {
        /// The challenge, in hex
        #[structopt(short, long, name = "challenge-hex")]
        challenge: HexBytes,

        /// The nonce, in hex
        #[structopt(short, long, name = "nonce-hex")]
        nonce: HexBytes,

        /// The difficulty encoding, in hex
        #[structopt(short, long, name = "encoding")]
        difficulty: Difficulty,

        /// Hash algorithm: sha256, sha384, sha512 or sha512/256
        #[structopt(long = "hash", name = "algorithm", default_value = "sha256")]
        algorithm: HashAlgorithm,
    },

    /// Adjust a difficulty encoding for the time taken between two solutions.
    Retarget {
        /// The current difficulty encoding, in hex
        #[structopt(short, long, name = "encoding")]
        difficulty: Difficulty,

        /// Timestamp of the previous solution, in seconds
        #[structopt(long)]
        previous: u64,

        /// Timestamp of the current solution, in seconds
        #[structopt(long)]
        current: u64,

        /// Intended seconds between solutions
        #[structopt(long, name = "seconds", default_value = "600")]
        target_interval: u64,
    },

    /// Show the hash algorithms and threads available for sampling.
    Info,
}

#[derive(Debug, StructOpt)]
#[structopt(about, author)]
pub struct Options {
    #[structopt(flatten)]
    log: LogConfig,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("couldn't determine data directory")]
    NoDataDir,

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("couldn't initialize logging: {0}")]
    LoggerError(#[from] log::SetLoggerError),

    #[error(transparent)]
    ConfigError(#[from] ConfigError),

    #[error(transparent)]
    SampleError(#[from] SampleError),

    #[error(transparent)]
    ReportError(#[from] ReportError),

    #[error(transparent)]
    LengthMismatch(#[from] LengthMismatch),
}

fn log_file_path(cfg: &LogConfig) -> Result<PathBuf, AppError> {
    if let Some(path) = &cfg.log_file {
        return Ok(path.clone());
    }

    let data_dir = dirs::data_dir()
        .ok_or(AppError::NoDataDir)?
        .join(env!("CARGO_PKG_NAME"));
    create_dir_all(&data_dir)?;
    Ok(data_dir.join(concat!(env!("CARGO_PKG_NAME"), ".log")))
}

fn init_logging(cfg: &LogConfig) -> Result<(), AppError> {
    let file = File::create(log_file_path(cfg)?)?;
    WriteLogger::init(cfg.level(), Config::default(), file)?;
    Ok(())
}

fn run_sample(cfg: SampleConfig) -> Result<(), AppError> {
    let hasher = cfg.hasher();
    let challenge = cfg.challenge()?;
    let difficulty = cfg.difficulty()?;
    let evaluator = Evaluator::new(&difficulty);
    let workers = cfg.worker_config();

    info!(
        "Sampling {} nonces of {} bytes with {} against {:?}",
        cfg.attempts, cfg.nonce_length, cfg.algorithm, difficulty
    );
    debug!("Challenge: {}", hex::encode(&challenge));

    let stdout = io::stdout();
    let mut report = Report::new(BufWriter::new(stdout.lock()), cfg.format);
    if cfg.format == ReportFormat::Json {
        report = report.with_challenge(&challenge);
    }
    let mut progress = if cfg.progress {
        Progress::new(cfg.attempts)
    } else {
        Progress::hidden()
    };

    let sink = |attempt: Attempt| -> Result<(), AppError> {
        progress.record(&attempt);
        report.write_attempt(&attempt)?;
        Ok(())
    };

    let summary = if workers.threads <= 1 {
        let samples = sample(
            &hasher,
            &challenge,
            evaluator,
            cfg.attempts,
            cfg.nonce_length,
            rng_for(cfg.seed, 0)?,
        )?
        .with_mode(cfg.mode());
        drain(samples, sink)?
    } else {
        sample_parallel(
            &hasher,
            &challenge,
            evaluator,
            cfg.attempts,
            cfg.nonce_length,
            workers,
            sink,
        )?
    };

    report.flush()?;
    drop(progress);

    info!("Finished sampling: {:?}", summary);
    eprintln!(
        "{} of {} attempts met {} leading zero bits ({})",
        summary.passed,
        summary.attempts,
        evaluator.required_zero_bits(),
        summary.hash_rate()
    );

    Ok(())
}

fn run(opts: Options) -> Result<(), AppError> {
    match opts.command {
        Command::Sample { cfg } => run_sample(cfg)?,

        Command::Verify {
            challenge,
            nonce,
            difficulty,
            algorithm,
        } => {
            let evaluator = Evaluator::new(&difficulty);
            let hasher = algorithm.hasher();
            let passed = verify_checked(&hasher, &challenge.0, &nonce.0, &evaluator)?;
            info!("Verified nonce {:?} against {:?}: {}", nonce, difficulty, passed);
            println!("{}", passed);
        }

        Command::Retarget {
            mut difficulty,
            previous,
            current,
            target_interval,
        } => {
            let before = difficulty.required_zero_bits();
            let adjustment = retarget(&mut difficulty, previous, current, target_interval);
            info!(
                "Retarget {} -> {} bits ({}), interval {}s",
                before,
                difficulty.required_zero_bits(),
                adjustment,
                target_interval
            );
            println!("{}", difficulty);
            eprintln!(
                "{} -> {} leading zero bits ({})",
                before,
                difficulty.required_zero_bits(),
                adjustment
            );
        }

        Command::Info => println!("{}", get_host_info()),
    }

    io::stdout().flush()?;
    Ok(())
}

fn main() {
    let opts = Options::from_args();

    if let Err(e) = init_logging(&opts.log) {
        eprintln!("Logging disabled: {}", e);
    }

    info!(
        "Starting {} v{} with {:?}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        opts
    );

    if let Err(e) = run(opts) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
