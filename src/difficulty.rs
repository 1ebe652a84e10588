use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EarError;

/// Ordered catalog-filtering level. Every tier includes everything below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultySettings {
    pub option_count: usize,
    pub include_inversions: bool,
    pub include_directions: bool,
    /// Seconds per question, `None` means untimed.
    pub time_per_question: Option<u32>,
    pub points_per_correct: u32,
    pub streak_bonus: u32,
}

const EASY: DifficultySettings = DifficultySettings {
    option_count: 3,
    include_inversions: false,
    include_directions: false,
    time_per_question: None,
    points_per_correct: 10,
    streak_bonus: 5,
};

const MEDIUM: DifficultySettings = DifficultySettings {
    option_count: 4,
    include_inversions: true,
    include_directions: true,
    time_per_question: None,
    points_per_correct: 15,
    streak_bonus: 10,
};

const HARD: DifficultySettings = DifficultySettings {
    option_count: 6,
    include_inversions: true,
    include_directions: true,
    time_per_question: Some(30),
    points_per_correct: 20,
    streak_bonus: 15,
};

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn settings(self) -> &'static DifficultySettings {
        match self {
            Difficulty::Easy => &EASY,
            Difficulty::Medium => &MEDIUM,
            Difficulty::Hard => &HARD,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// True when an item tagged `item` is available at this tier.
    pub fn includes(self, item: Difficulty) -> bool {
        item <= self
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = EarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(EarError::ParseError(format!("Unknown difficulty: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_order_is_cumulative() {
        assert!(Difficulty::Easy < Difficulty::Medium);
        assert!(Difficulty::Medium < Difficulty::Hard);
        assert!(Difficulty::Hard.includes(Difficulty::Easy));
        assert!(Difficulty::Medium.includes(Difficulty::Medium));
        assert!(!Difficulty::Easy.includes(Difficulty::Medium));
    }

    #[test]
    fn test_settings_table() {
        assert_eq!(Difficulty::Easy.settings().option_count, 3);
        assert!(!Difficulty::Easy.settings().include_directions);
        assert_eq!(Difficulty::Medium.settings().points_per_correct, 15);
        assert_eq!(Difficulty::Medium.settings().streak_bonus, 10);
        assert_eq!(Difficulty::Hard.settings().option_count, 6);
        assert_eq!(Difficulty::Hard.settings().time_per_question, Some(30));
    }

    #[test]
    fn test_parse() {
        assert_eq!("Medium".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert!("expert".parse::<Difficulty>().is_err());
    }
}
