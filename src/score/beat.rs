//! Musical time in integer ticks.
//!
//! Timing uses 960 PPQN so that sequential placement, triplet rescaling and
//! event ordering all compare exact integers. Conversion to wall-clock time
//! happens only in the play engine.

use std::cmp::Ordering;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::time::Duration;

use serde::{Serialize, Serializer};

/// Ticks per quarter note (beat). 960 divides cleanly by 2, 3, 4, 5, 6, 8,
/// 10, 12, 15, 16, 20, 24 and 32.
pub const TICKS_PER_BEAT: u64 = 960;

/// A point or span in musical time, measured in ticks at [`TICKS_PER_BEAT`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct Beat {
    ticks: u64,
}

impl Beat {
    pub const ZERO: Beat = Beat { ticks: 0 };

    pub fn from_ticks(ticks: u64) -> Self {
        Self { ticks }
    }

    /// Whole beats (quarter notes).
    pub fn from_beats(beats: u32) -> Self {
        Self {
            ticks: beats as u64 * TICKS_PER_BEAT,
        }
    }

    /// Fractional beats, rounded to the nearest tick. Negative input clamps to zero.
    pub fn from_beats_f64(beats: f64) -> Self {
        Self {
            ticks: (beats.max(0.0) * TICKS_PER_BEAT as f64).round() as u64,
        }
    }

    pub fn ticks(self) -> u64 {
        self.ticks
    }

    pub fn as_beats_f64(self) -> f64 {
        self.ticks as f64 / TICKS_PER_BEAT as f64
    }

    pub fn is_zero(self) -> bool {
        self.ticks == 0
    }

    /// Wall-clock offset of this position at the given tempo.
    ///
    /// One beat lasts `60000 / bpm` milliseconds.
    /// A tempo that is not a positive number gives zero; one too slow to
    /// represent saturates at [`Duration::MAX`].
    pub fn to_duration(self, bpm: f64) -> Duration {
        if !is_valid_tempo(bpm) {
            return Duration::ZERO;
        }
        let ms_per_beat = 60_000.0 / bpm;
        Duration::try_from_secs_f64(self.as_beats_f64() * ms_per_beat / 1000.0)
            .unwrap_or(Duration::MAX)
    }

    /// `self * numerator / denominator`, rounded to the nearest tick.
    pub fn scale(self, numerator: Beat, denominator: Beat) -> Beat {
        if denominator.ticks == 0 {
            return Beat::ZERO;
        }
        let scaled = (self.ticks as u128 * numerator.ticks as u128
            + denominator.ticks as u128 / 2)
            / denominator.ticks as u128;
        Beat {
            ticks: scaled as u64,
        }
    }
}

/// Whether `bpm` is a usable tempo: finite and above zero.
pub fn is_valid_tempo(bpm: f64) -> bool {
    bpm.is_finite() && bpm > 0.0
}

impl Ord for Beat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ticks.cmp(&other.ticks)
    }
}

impl PartialOrd for Beat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Beat {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            ticks: self.ticks + rhs.ticks,
        }
    }
}

impl Sub for Beat {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            ticks: self.ticks.saturating_sub(rhs.ticks),
        }
    }
}

impl Sum for Beat {
    fn sum<I: Iterator<Item = Beat>>(iter: I) -> Self {
        iter.fold(Beat::ZERO, |acc, b| acc + b)
    }
}

impl std::fmt::Display for Beat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.as_beats_f64())
    }
}

// Serialized as fractional beats so event dumps stay readable.
impl Serialize for Beat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_beats_f64())
    }
}
