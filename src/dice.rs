//! Dice formula parsing and evaluation.
//!
//! Supports the `NdM+K` notation the action interpreter emits:
//! "1d20", "2d6+3", "1d8-1". Randomness is injected through `rand::Rng`
//! so resolution can be replayed from a seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice parsing and rolling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Invalid dice formula: {0}")]
    InvalidFormula(String),
}

/// Standard die types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            100 => Some(DieType::D100),
            _ => None,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// Upper bound on dice per formula; interpreter output above this is noise.
const MAX_DICE: u32 = 100;

/// A parsed `NdM+K` formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceFormula {
    pub count: u32,
    pub die: DieType,
    pub modifier: i32,
}

impl DiceFormula {
    /// Parse a formula like "1d20+5". A missing count defaults to 1 ("d8").
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let cleaned: String = notation
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        let invalid = || DiceError::InvalidFormula(notation.to_string());

        let d_pos = cleaned.find('d').ok_or_else(invalid)?;
        let count_str = &cleaned[..d_pos];
        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str.parse().map_err(|_| invalid())?
        };
        if count == 0 || count > MAX_DICE {
            return Err(invalid());
        }

        let rest = &cleaned[d_pos + 1..];
        let (sides_str, modifier) = match rest.find(['+', '-']) {
            Some(pos) => {
                let modifier: i32 = rest[pos..].parse().map_err(|_| invalid())?;
                (&rest[..pos], modifier)
            }
            None => (rest, 0),
        };

        let sides: u32 = sides_str.parse().map_err(|_| invalid())?;
        let die = DieType::from_sides(sides).ok_or_else(invalid)?;

        Ok(DiceFormula {
            count,
            die,
            modifier,
        })
    }

    /// Roll the formula once: sum `count` uniform draws plus the modifier.
    pub fn roll<R: Rng>(&self, rng: &mut R) -> i32 {
        let dice: i32 = (0..self.count)
            .map(|_| rng.gen_range(1..=self.die.sides()) as i32)
            .sum();
        dice + self.modifier
    }
}

impl FromStr for DiceFormula {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceFormula::parse(s)
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.die)?;
        if self.modifier != 0 {
            write!(f, "{:+}", self.modifier)?;
        }
        Ok(())
    }
}

/// Seeded dice source used by the resolution engine.
pub struct Dice {
    rng: ChaCha8Rng,
}

impl Dice {
    /// Deterministic source; the same seed replays the same rolls.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// OS-entropy source for live play.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Roll a parsed formula.
    pub fn evaluate(&mut self, formula: &DiceFormula) -> i32 {
        formula.roll(&mut self.rng)
    }

    /// Parse and roll a formula string.
    pub fn evaluate_str(&mut self, notation: &str) -> Result<i32, DiceError> {
        Ok(DiceFormula::parse(notation)?.roll(&mut self.rng))
    }
}
