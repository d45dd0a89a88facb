//! Leitner box / interval model.
//!
//! Seven boxes with a fixed base interval table. A successful recall promotes
//! the word one box (box 7 is terminal), a failed recall sends it back to box 1.
//! The difficulty rating scales the base interval of the box the word lands in.
//!
//! Everything here is pure: the caller supplies "today".

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LeitnerError {
    #[error("leitner box must be in 1..=7, got {0}")]
    BoxOutOfRange(i64),
    #[error("unknown difficulty: {0:?}")]
    UnknownDifficulty(String),
}

//
// ─── BOXES ─────────────────────────────────────────────────────────────────────
//

/// Base review interval in days, indexed by box 1..=7.
pub const BASE_INTERVAL_DAYS: [u32; 7] = [1, 2, 4, 7, 14, 30, 60];

/// Shortest interval the model ever schedules.
pub const MIN_INTERVAL_DAYS: u32 = 1;

/// One of the seven recall-strength tiers. Always within `1..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LeitnerBox(u8);

impl LeitnerBox {
    pub const FIRST: Self = Self(1);
    pub const MASTERED: Self = Self(7);

    /// Builds a box from its number.
    ///
    /// # Errors
    ///
    /// Returns `LeitnerError::BoxOutOfRange` outside `1..=7`.
    pub fn new(value: u8) -> Result<Self, LeitnerError> {
        if (Self::FIRST.0..=Self::MASTERED.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(LeitnerError::BoxOutOfRange(i64::from(value)))
        }
    }

    /// Builds a box from any integer, clamping into `1..=7`.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        let clamped = value.clamp(i64::from(Self::FIRST.0), i64::from(Self::MASTERED.0));
        Self(u8::try_from(clamped).unwrap_or(Self::FIRST.0))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Zero-based position, handy for per-box tallies.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// Next box up; box 7 stays put.
    #[must_use]
    pub fn promoted(self) -> Self {
        Self((self.0 + 1).min(Self::MASTERED.0))
    }

    #[must_use]
    pub fn is_mastered(self) -> bool {
        self == Self::MASTERED
    }

    #[must_use]
    pub fn base_interval_days(self) -> u32 {
        BASE_INTERVAL_DAYS[self.index()]
    }

    /// All boxes in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (Self::FIRST.0..=Self::MASTERED.0).map(Self)
    }
}

impl Default for LeitnerBox {
    fn default() -> Self {
        Self::FIRST
    }
}

impl TryFrom<u8> for LeitnerBox {
    type Error = LeitnerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LeitnerBox> for u8 {
    fn from(value: LeitnerBox) -> Self {
        value.0
    }
}

impl fmt::Display for LeitnerBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Self-reported difficulty of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    /// Factor applied to the base interval of the box a word lands in.
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            Difficulty::Easy => 1.5,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 0.7,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = LeitnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(LeitnerError::UnknownDifficulty(s.to_owned())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── TRANSITION ────────────────────────────────────────────────────────────────
//

/// Box and interval produced by one rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextState {
    pub new_box: LeitnerBox,
    pub interval_days: u32,
}

impl NextState {
    /// Due date for a rating recorded on `today`.
    #[must_use]
    pub fn due_date(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_days(Days::new(u64::from(self.interval_days)))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Computes the box and interval that follow a rating.
///
/// A failed recall always lands in box 1 with the shortest interval; the
/// difficulty only scales intervals of successful recalls.
///
/// # Examples
///
/// ```
/// # use vocab_core::leitner::{next_state, Difficulty, LeitnerBox};
/// let next = next_state(LeitnerBox::new(3)?, true, Difficulty::Easy);
/// assert_eq!(next.new_box.value(), 4);
/// assert_eq!(next.interval_days, 11);
/// # Ok::<(), vocab_core::leitner::LeitnerError>(())
/// ```
#[must_use]
pub fn next_state(current: LeitnerBox, knew_it: bool, difficulty: Difficulty) -> NextState {
    if !knew_it {
        return NextState {
            new_box: LeitnerBox::FIRST,
            interval_days: LeitnerBox::FIRST.base_interval_days(),
        };
    }

    let new_box = current.promoted();
    NextState {
        new_box,
        interval_days: scaled_interval(new_box.base_interval_days(), difficulty),
    }
}

// Half-up rounding: every product here is non-negative, so `f64::round` is exact enough.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled_interval(base_days: u32, difficulty: Difficulty) -> u32 {
    let scaled = (f64::from(base_days) * difficulty.multiplier()).round();
    (scaled as u32).max(MIN_INTERVAL_DAYS)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
