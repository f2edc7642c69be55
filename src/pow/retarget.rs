//! Difficulty adjustment between consecutive solutions.

use super::difficulty::Difficulty;
use crate::prelude::*;

/// The intended number of seconds between two solutions
pub const TARGET_INTERVAL: u64 = 600;

/// The direction a difficulty was moved in by [`retarget`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Harder,
    Easier,
    Unchanged,
}

impl Display for Adjustment {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Adjustment::Harder => "harder",
            Adjustment::Easier => "easier",
            Adjustment::Unchanged => "unchanged",
        })
    }
}

/// Adjust `difficulty` in place given the timestamps (in seconds) of the
/// previous and current solutions.
///
/// Solutions arriving faster than `target_interval` require one more leading
/// zero bit, slower ones one fewer. A moved encoding is rewritten in its
/// canonical form, which for canonical input is the first non-zero byte
/// shifted by one bit. An encoding never becomes all-zero, and never drops
/// below a single required bit.
pub fn retarget(
    difficulty: &mut Difficulty,
    previous: u64,
    current: u64,
    target_interval: u64,
) -> Adjustment {
    let elapsed = current.saturating_sub(previous);
    let bits = difficulty.required_zero_bits();
    let ceiling = (difficulty.len() * 8).min(u32::MAX as usize) as u32;

    let adjustment = match elapsed.cmp(&target_interval) {
        std::cmp::Ordering::Equal => Adjustment::Unchanged,

        // one more bit would leave nothing but zeros
        std::cmp::Ordering::Less if bits.saturating_add(1) >= ceiling => Adjustment::Unchanged,
        std::cmp::Ordering::Less => {
            difficulty.set_zero_bits(bits + 1);
            Adjustment::Harder
        }

        std::cmp::Ordering::Greater if bits <= 1 => Adjustment::Unchanged,
        std::cmp::Ordering::Greater => {
            difficulty.set_zero_bits(bits - 1);
            Adjustment::Easier
        }
    };

    trace!(
        "Retargeted after {}s (target {}s): {} bits, {} -> {:?}",
        elapsed,
        target_interval,
        bits,
        adjustment,
        difficulty
    );

    adjustment
}
