//! Dice source and dice-notation parsing.
//!
//! Supports formulas like "1d20+5", "2d6-1" and "d8", plus a bare integer
//! for a d20 the player rolled by hand.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use talewright_core::error::DomainError;
use talewright_core::rng::DeterministicRng;
use thiserror::Error;

/// Most dice a single formula may roll.
pub const MAX_DICE: u32 = 100;

/// Largest die a formula may name.
pub const MAX_DIE_SIZE: u32 = 1_000;

/// Largest modifier, in either direction, a roll may carry.
pub const MAX_MODIFIER: i32 = 100;

static FORMULA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d*)d(\d+)\s*(?:([+-])\s*(\d+))?$").expect("valid regex")
});

/// Error when parsing dice notation or a manual roll.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    /// The input is blank.
    #[error("empty dice notation")]
    Empty,

    /// The input is neither `XdY[±Z]` nor an integer.
    #[error("malformed dice notation '{0}'")]
    Malformed(String),

    /// `0dY`.
    #[error("dice count must be at least 1")]
    ZeroDice,

    /// `XdY` with `Y < 2`.
    #[error("die size must be at least 2, got {0}")]
    DieTooSmall(u32),

    /// More than `MAX_DICE` dice.
    #[error("at most {MAX_DICE} dice may be rolled, got {0}")]
    TooManyDice(u32),

    /// A die with more than `MAX_DIE_SIZE` faces.
    #[error("die size must be at most {MAX_DIE_SIZE}, got {0}")]
    DieTooLarge(u32),

    /// A modifier or bonus beyond `±MAX_MODIFIER`.
    #[error("modifier must be within ±{MAX_MODIFIER}, got {0}")]
    ModifierOutOfRange(i64),

    /// A manual d20 outside `1..=20`.
    #[error("a d20 shows 1 to 20, got {0}")]
    ManualOutOfRange(i64),

    /// A check was answered with something other than a single d20.
    #[error("checks are rolled on a single d20, got '{0}'")]
    NotCheckDie(String),
}

impl From<DiceError> for DomainError {
    fn from(err: DiceError) -> Self {
        Self::InvalidDiceNotation(err.to_string())
    }
}

/// Rolls one die with `faces` sides, uniform in `[1, faces]`.
pub fn roll_die(rng: &mut dyn DeterministicRng, faces: u32) -> u32 {
    rng.next_u32_range(1, faces.max(1))
}

/// Rolls a d20.
pub fn roll_d20(rng: &mut dyn DeterministicRng) -> u32 {
    roll_die(rng, 20)
}

fn check_modifier(modifier: i64) -> Result<i32, DiceError> {
    i32::try_from(modifier)
        .ok()
        .filter(|m| (-MAX_MODIFIER..=MAX_MODIFIER).contains(m))
        .ok_or(DiceError::ModifierOutOfRange(modifier))
}

/// A d20 check roll: the natural die, the bonus added to it and the total.
///
/// Deserialized rolls go through `RollResult::manual`, so the die is range
/// checked and the total is recomputed from the die and bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "WireRoll")]
pub struct RollResult {
    pub d20: u32,
    pub bonus: i32,
    pub total: i32,
}

/// A roll as a caller sends it. Any `total` is ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRoll {
    d20: i64,
    #[serde(default)]
    bonus: i64,
}

impl TryFrom<WireRoll> for RollResult {
    type Error = DiceError;

    fn try_from(wire: WireRoll) -> Result<Self, Self::Error> {
        let d20 = u32::try_from(wire.d20).map_err(|_| DiceError::ManualOutOfRange(wire.d20))?;
        Self::manual(d20, check_modifier(wire.bonus)?)
    }
}

impl RollResult {
    /// Rolls a d20 and adds `bonus`. The total saturates at the `i32` bounds.
    #[allow(clippy::cast_possible_wrap)]
    pub fn roll(rng: &mut dyn DeterministicRng, bonus: i32) -> Self {
        let d20 = roll_d20(rng);
        Self {
            d20,
            bonus,
            total: (d20 as i32).saturating_add(bonus),
        }
    }

    /// A d20 rolled at the table.
    ///
    /// # Errors
    ///
    /// Returns `DiceError::ManualOutOfRange` unless `1 <= d20 <= 20`, or
    /// `DiceError::ModifierOutOfRange` if the bonus exceeds `±MAX_MODIFIER`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn manual(d20: u32, bonus: i32) -> Result<Self, DiceError> {
        if !(1..=20).contains(&d20) {
            return Err(DiceError::ManualOutOfRange(i64::from(d20)));
        }
        let bonus = check_modifier(i64::from(bonus))?;
        Ok(Self {
            d20,
            bonus,
            total: d20 as i32 + bonus,
        })
    }

    /// Answers a check from player input: a bare integer is a manual d20,
    /// otherwise the input must be `d20`/`1d20` with an optional modifier.
    ///
    /// # Errors
    ///
    /// Returns a `DiceError` if the input is not valid notation, is out of
    /// range, or does not describe a single d20.
    pub fn from_input(input: &str, rng: &mut dyn DeterministicRng) -> Result<Self, DiceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DiceError::Empty);
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            let d20 = u32::try_from(value).map_err(|_| DiceError::ManualOutOfRange(value))?;
            return Self::manual(d20, 0);
        }

        let formula = DiceFormula::parse(trimmed)?;
        if formula.dice_count != 1 || formula.die_size != 20 {
            return Err(DiceError::NotCheckDie(formula.to_string()));
        }
        Ok(Self::roll(rng, formula.modifier))
    }

    /// The die shows 20.
    #[must_use]
    pub fn is_natural_twenty(&self) -> bool {
        self.d20 == 20
    }

    /// The die shows 1.
    #[must_use]
    pub fn is_natural_one(&self) -> bool {
        self.d20 == 1
    }
}

/// A parsed dice formula like "2d6+3".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceFormula {
    pub dice_count: u32,
    pub die_size: u32,
    pub modifier: i32,
}

impl DiceFormula {
    /// Builds a formula.
    ///
    /// # Errors
    ///
    /// Returns a `DiceError` for zero dice, too many dice, a die outside
    /// `2..=MAX_DIE_SIZE` or a modifier beyond `±MAX_MODIFIER`.
    pub fn new(dice_count: u32, die_size: u32, modifier: i32) -> Result<Self, DiceError> {
        if dice_count == 0 {
            return Err(DiceError::ZeroDice);
        }
        if dice_count > MAX_DICE {
            return Err(DiceError::TooManyDice(dice_count));
        }
        if die_size < 2 {
            return Err(DiceError::DieTooSmall(die_size));
        }
        if die_size > MAX_DIE_SIZE {
            return Err(DiceError::DieTooLarge(die_size));
        }
        let modifier = check_modifier(i64::from(modifier))?;
        Ok(Self {
            dice_count,
            die_size,
            modifier,
        })
    }

    /// Parses `XdY`, `XdY+Z`, `XdY-Z` or `dY` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns a `DiceError` describing why the notation was rejected.
    pub fn parse(input: &str) -> Result<Self, DiceError> {
        let input = input.trim().to_lowercase();
        if input.is_empty() {
            return Err(DiceError::Empty);
        }
        let caps = FORMULA
            .captures(&input)
            .ok_or_else(|| DiceError::Malformed(input.clone()))?;

        let count = match caps.get(1).map_or("", |m| m.as_str()) {
            "" => 1,
            digits => digits
                .parse::<u32>()
                .map_err(|_| DiceError::TooManyDice(u32::MAX))?,
        };
        let size = caps[2]
            .parse::<u32>()
            .map_err(|_| DiceError::DieTooLarge(u32::MAX))?;
        let modifier = match (caps.get(3), caps.get(4)) {
            (Some(sign), Some(value)) => {
                let value = value
                    .as_str()
                    .parse::<i64>()
                    .map_err(|_| DiceError::ModifierOutOfRange(i64::MAX))?;
                let value = if sign.as_str() == "-" { -value } else { value };
                check_modifier(value)?
            }
            _ => 0,
        };

        Self::new(count, size, modifier)
    }

    /// Rolls every die and applies the modifier. The total saturates at the
    /// `i32` bounds.
    pub fn roll(&self, rng: &mut dyn DeterministicRng) -> DiceRoll {
        let rolls: Vec<u32> = (0..self.dice_count)
            .map(|_| roll_die(rng, self.die_size))
            .collect();
        let total = rolls.iter().map(|&r| i64::from(r)).sum::<i64>() + i64::from(self.modifier);
        DiceRoll {
            formula: *self,
            total: i32::try_from(total).unwrap_or(if total < 0 { i32::MIN } else { i32::MAX }),
            rolls,
        }
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.dice_count, self.die_size)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

/// The outcome of rolling a `DiceFormula`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub formula: DiceFormula,
    pub rolls: Vec<u32>,
    pub total: i32,
}
