//! Rendering attempts for people and machines

mod progress;

use crate::prelude::*;
use crate::sampler::Attempt;
use std::io::{self, Write};
use std::time::Duration;

pub use progress::Progress;

/// Hashes computed over a span of time, displayed in the largest unit that
/// keeps the value at or above one.
#[derive(Debug, Clone, Copy)]
pub struct HashRate {
    pub hashes: usize,
    pub elapsed: Duration,
}

impl HashRate {
    const UNITS: [&'static str; 5] = ["H/s", "kH/s", "MH/s", "GH/s", "TH/s"];

    /// Hashes per second, or zero when no time has been measured
    pub fn per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0. {
            self.hashes as f64 / secs
        } else {
            0.
        }
    }
}

impl Display for HashRate {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut value = self.per_second();
        let mut unit = 0;
        while value >= 1000. && unit + 1 < Self::UNITS.len() {
            value /= 1000.;
            unit += 1;
        }

        write!(f, "{:.*} {}", f.precision().unwrap_or(2), value, Self::UNITS[unit])
    }
}

/// The line format attempts are written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// `<nonce hex> <true|false>`
    Text,

    /// One JSON object per line.
    Json,
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid report format: {0}")]
pub struct InvalidReportFormat(String);

impl FromStr for ReportFormat {
    type Err = InvalidReportFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_ref() {
            "text" => Self::Text,
            "json" => Self::Json,
            s => return Err(InvalidReportFormat(s.to_string())),
        })
    }
}

impl Default for ReportFormat {
    fn default() -> Self {
        ReportFormat::Text
    }
}

impl Display for ReportFormat {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct AttemptRecord<'a> {
    nonce: String,
    leading_zeros: u32,
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    challenge: Option<&'a str>,
}

/// Writes attempts to an output stream, one per line.
pub struct Report<W> {
    out: W,
    format: ReportFormat,
    challenge: Option<String>,
}

impl<W: Write> Report<W> {
    pub fn new(out: W, format: ReportFormat) -> Self {
        Self {
            out,
            format,
            challenge: None,
        }
    }

    /// Include the challenge in every JSON record.
    pub fn with_challenge(mut self, challenge: &[u8]) -> Self {
        self.challenge = Some(hex::encode(challenge));
        self
    }

    pub fn write_attempt(&mut self, attempt: &Attempt) -> Result<(), ReportError> {
        let nonce = hex::encode(&attempt.nonce);

        match self.format {
            ReportFormat::Text => writeln!(self.out, "{} {}", nonce, attempt.passed)?,
            ReportFormat::Json => {
                let record = AttemptRecord {
                    nonce,
                    leading_zeros: attempt.leading_zeros,
                    passed: attempt.passed,
                    challenge: self.challenge.as_deref(),
                };
                serde_json::to_writer(&mut self.out, &record)?;
                self.out.write_all(b"\n")?;
            }
        }

        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), ReportError> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
