//! Lifetime statistics, their update rule and the JSON file they persist to.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EarError;

use crate::question::GameMode;
use crate::scoring::calculate_accuracy;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModeStats {
    pub total_questions: u32,
    pub correct_answers: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsByMode {
    pub intervals: ModeStats,
    pub chords: ModeStats,
    pub progressions: ModeStats,
    pub pitches: ModeStats,
    pub scales: ModeStats,
}

impl StatsByMode {
    pub fn get(&self, mode: GameMode) -> &ModeStats {
        match mode {
            GameMode::Intervals => &self.intervals,
            GameMode::Chords => &self.chords,
            GameMode::Progressions => &self.progressions,
            GameMode::Pitches => &self.pitches,
            GameMode::Scales => &self.scales,
        }
    }

    pub fn get_mut(&mut self, mode: GameMode) -> &mut ModeStats {
        match mode {
            GameMode::Intervals => &mut self.intervals,
            GameMode::Chords => &mut self.chords,
            GameMode::Progressions => &mut self.progressions,
            GameMode::Pitches => &mut self.pitches,
            GameMode::Scales => &mut self.scales,
        }
    }
}

/// Emitted once per answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatUpdate {
    pub mode: GameMode,
    pub was_correct: bool,
    /// Streak after this answer.
    pub new_streak: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameStats {
    pub total_games_played: u32,
    pub total_questions_answered: u32,
    pub total_correct_answers: u32,
    pub best_streak: u32,
    pub accuracy_percentage: u32,
    pub stats_by_mode: StatsByMode,
}

impl GameStats {
    pub fn apply(&mut self, update: &StatUpdate) {
        let mode = self.stats_by_mode.get_mut(update.mode);
        mode.total_questions += 1;
        self.total_questions_answered += 1;

        if update.was_correct {
            mode.correct_answers += 1;
            self.total_correct_answers += 1;
        }

        self.best_streak = self.best_streak.max(update.new_streak);
        self.accuracy_percentage = calculate_accuracy(self.total_correct_answers, self.total_questions_answered);
    }

    /// Copy with `update` applied.
    pub fn updated(&self, update: &StatUpdate) -> GameStats {
        let mut stats = self.clone();
        stats.apply(update);
        stats
    }

    pub fn record_game_played(&mut self) {
        self.total_games_played += 1;
    }

    pub fn load(path: &Path) -> Result<GameStats, EarError> {
        let content = std::fs::read_to_string(path).map_err(|e| EarError::FileError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| EarError::ParseError(e.to_string()))
    }

    /// Missing or unreadable stats start over from zero.
    pub fn load_or_default(path: &Path) -> GameStats {
        if !path.exists() {
            return GameStats::default();
        }
        GameStats::load(path).unwrap_or_else(|e| {
            warn!("Ignoring stats in {}: {}", path.display(), e);
            GameStats::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), EarError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| EarError::ParseError(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| EarError::FileError(e.to_string()))
    }
}
