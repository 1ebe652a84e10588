//! Quiz question generation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{
    CatalogEntry, ChordType, OctaveRange, Progression, ScaleType, chords_by_difficulty, intervals_by_difficulty,
    octave_range, pitches_by_difficulty, progressions_by_difficulty, scales_by_difficulty,
};
use crate::construct::{
    Inversion, IntervalDirection, ScaleDirection, chord_notes, interval_notes, pitch_notes, progression_chords,
    scale_run,
};
use crate::difficulty::Difficulty;
use crate::error::EarError;
use crate::note::{Key, NoteOctave};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Intervals,
    Chords,
    Progressions,
    Pitches,
    Scales,
}

impl GameMode {
    pub const ALL: [GameMode; 5] = [
        GameMode::Intervals,
        GameMode::Chords,
        GameMode::Progressions,
        GameMode::Pitches,
        GameMode::Scales,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GameMode::Intervals => "intervals",
            GameMode::Chords => "chords",
            GameMode::Progressions => "progressions",
            GameMode::Pitches => "pitches",
            GameMode::Scales => "scales",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GameMode {
    type Err = EarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "intervals" | "interval" => Ok(GameMode::Intervals),
            "chords" | "chord" => Ok(GameMode::Chords),
            "progressions" | "progression" => Ok(GameMode::Progressions),
            "pitches" | "pitch" => Ok(GameMode::Pitches),
            "scales" | "scale" => Ok(GameMode::Scales),
            other => Err(EarError::ParseError(format!("Unknown game mode: {}", other))),
        }
    }
}

/// Everything needed to reproduce the sound of a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum AudioData {
    Interval {
        root: NoteOctave,
        semitones: u8,
        direction: IntervalDirection,
    },
    Chord {
        root: NoteOctave,
        chord: ChordType,
        inversion: Inversion,
    },
    Progression {
        key: Key,
        progression: Progression,
        tempo: u32,
    },
    Pitch {
        note: NoteOctave,
    },
    Scale {
        root: NoteOctave,
        scale: ScaleType,
        direction: ScaleDirection,
    },
}

impl AudioData {
    pub fn mode(&self) -> GameMode {
        match self {
            AudioData::Interval { .. } => GameMode::Intervals,
            AudioData::Chord { .. } => GameMode::Chords,
            AudioData::Progression { .. } => GameMode::Progressions,
            AudioData::Pitch { .. } => GameMode::Pitches,
            AudioData::Scale { .. } => GameMode::Scales,
        }
    }

    /// Every pitch the payload sounds, in playing order.
    pub fn notes(&self) -> Result<Vec<NoteOctave>, EarError> {
        Ok(match self {
            AudioData::Interval { root, semitones, direction } => interval_notes(*root, *semitones, *direction),
            AudioData::Chord { root, chord, inversion } => chord_notes(*root, chord, *inversion),
            AudioData::Progression { key, progression, .. } => progression_chords(*key, progression)?
                .iter()
                .flat_map(|c| c.notes())
                .collect(),
            AudioData::Pitch { note } => pitch_notes(*note),
            AudioData::Scale { root, scale, direction } => scale_run(*root, scale, *direction),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub mode: GameMode,
    pub correct_answer: String,
    pub options: Vec<String>,
    pub audio_data: AudioData,
}

impl QuizQuestion {
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

/// What to do when a tier's catalog is smaller than its option count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionPolicy {
    /// Offer every entry there is.
    #[default]
    Clamp,
    /// Fail with `EarError::NotEnoughOptions`.
    Strict,
}

/// Root pitch class for interval, chord and scale questions.
pub const ROOT_NOTE: Key = Key::C;

pub const PROGRESSION_KEYS: [Key; 6] = [Key::C, Key::D, Key::E, Key::F, Key::G, Key::A];

const INTERVAL_OCTAVES: OctaveRange = OctaveRange { min: 3, max: 5 };
const CHORD_OCTAVES: OctaveRange = OctaveRange { min: 3, max: 4 };
const SCALE_OCTAVES: OctaveRange = OctaveRange { min: 3, max: 4 };
const TEMPO_BPM: std::ops::Range<u32> = 100..140;

pub struct QuizEngine {
    rng: fastrand::Rng,
    policy: OptionPolicy,
    sequence: u64,
}

impl QuizEngine {
    pub fn new(rng: fastrand::Rng) -> Self {
        QuizEngine {
            rng,
            policy: OptionPolicy::default(),
            sequence: 0,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        QuizEngine::new(fastrand::Rng::with_seed(seed))
    }

    pub fn with_policy(mut self, policy: OptionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> OptionPolicy {
        self.policy
    }

    pub fn generate_question(&mut self, mode: GameMode, difficulty: Difficulty) -> Result<QuizQuestion, EarError> {
        self.generate_question_in_range(mode, difficulty, None)
    }

    /// `pitch_octaves` overrides the tier's octave band in pitch mode and is ignored elsewhere.
    pub fn generate_question_in_range(
        &mut self,
        mode: GameMode,
        difficulty: Difficulty,
        pitch_octaves: Option<OctaveRange>,
    ) -> Result<QuizQuestion, EarError> {
        let settings = difficulty.settings();
        let count = settings.option_count;

        let (correct_answer, options, audio_data) = match mode {
            GameMode::Intervals => {
                let (interval, options) = self.pick(mode, &intervals_by_difficulty(difficulty), count)?;
                let direction = if settings.include_directions {
                    self.choose(&IntervalDirection::ALL)
                } else {
                    IntervalDirection::Ascending
                };
                let audio = AudioData::Interval {
                    root: self.root_in(INTERVAL_OCTAVES),
                    semitones: interval.semitones,
                    direction,
                };
                (interval.label(), options, audio)
            }
            GameMode::Chords => {
                let (chord, options) = self.pick(mode, &chords_by_difficulty(difficulty), count)?;
                let inversion = if settings.include_inversions {
                    self.choose(&Inversion::ALL)
                } else {
                    Inversion::Root
                };
                let audio = AudioData::Chord {
                    root: self.root_in(CHORD_OCTAVES),
                    chord: *chord,
                    inversion,
                };
                (chord.label(), options, audio)
            }
            GameMode::Progressions => {
                let (progression, options) = self.pick(mode, &progressions_by_difficulty(difficulty), count)?;
                let audio = AudioData::Progression {
                    key: self.choose(&PROGRESSION_KEYS),
                    progression: *progression,
                    tempo: self.rng.u32(TEMPO_BPM),
                };
                (progression.label(), options, audio)
            }
            GameMode::Pitches => {
                let (pitch, options) = self.pick(mode, &pitches_by_difficulty(difficulty), count)?;
                let range = pitch_octaves.unwrap_or_else(|| octave_range(difficulty));
                let audio = AudioData::Pitch {
                    note: NoteOctave::new(pitch.note, self.rng.i32(range.min..=range.max)),
                };
                (pitch.label(), options, audio)
            }
            GameMode::Scales => {
                let (scale, options) = self.pick(mode, &scales_by_difficulty(difficulty), count)?;
                let direction = if settings.include_directions {
                    self.choose(&ScaleDirection::ALL)
                } else {
                    ScaleDirection::Ascending
                };
                let audio = AudioData::Scale {
                    root: self.root_in(SCALE_OCTAVES),
                    scale: *scale,
                    direction,
                };
                (scale.label(), options, audio)
            }
        };

        self.sequence += 1;
        let id = format!("{}-{}-{:08x}", mode, self.sequence, self.rng.u32(..));

        Ok(QuizQuestion {
            id,
            mode,
            correct_answer: correct_answer.to_string(),
            options,
            audio_data,
        })
    }

    /// Picks the answer, then distinct distractors, then shuffles the labels.
    fn pick<T: CatalogEntry>(
        &mut self,
        mode: GameMode,
        pool: &[&'static T],
        requested: usize,
    ) -> Result<(&'static T, Vec<String>), EarError> {
        let available = pool.len();
        if available == 0 || (requested > available && self.policy == OptionPolicy::Strict) {
            return Err(EarError::NotEnoughOptions { mode, requested, available });
        }
        let count = if requested > available {
            debug!("{} offers {} options instead of {}", mode, available, requested);
            available
        } else {
            requested.max(1)
        };

        let correct_index = self.rng.usize(..available);
        let correct = pool[correct_index];

        let mut distractors: Vec<&'static T> = pool
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != correct_index)
            .map(|(_, &entry)| entry)
            .collect();
        self.rng.shuffle(&mut distractors);
        distractors.truncate(count - 1);

        let mut options: Vec<String> = std::iter::once(correct)
            .chain(distractors)
            .map(|entry| entry.label().to_string())
            .collect();
        self.rng.shuffle(&mut options);

        Ok((correct, options))
    }

    fn choose<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.rng.usize(..items.len())]
    }

    fn root_in(&mut self, octaves: OctaveRange) -> NoteOctave {
        NoteOctave::new(ROOT_NOTE, self.rng.i32(octaves.min..=octaves.max))
    }
}
