//! Anchors abstract constructs to concrete pitches.

use serde::{Deserialize, Serialize};

use crate::catalog::{ChordType, Progression, ScaleType, chord_by_id};
use crate::error::EarError;
use crate::note::{Key, NoteOctave, transpose};

/// Major-scale semitone offsets, indexed by degree - 1.
pub const MAJOR_SCALE_STEPS: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Progression chords are voiced from the key's root in this octave.
pub const PROGRESSION_OCTAVE: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalDirection {
    Ascending,
    Descending,
    Harmonic,
}

impl IntervalDirection {
    pub const ALL: [IntervalDirection; 3] = [
        IntervalDirection::Ascending,
        IntervalDirection::Descending,
        IntervalDirection::Harmonic,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleDirection {
    Ascending,
    Descending,
    Both,
}

impl ScaleDirection {
    pub const ALL: [ScaleDirection; 3] = [ScaleDirection::Ascending, ScaleDirection::Descending, ScaleDirection::Both];
}

/// Chord inversion, 0 (root position) to 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Inversion {
    Root,
    First,
    Second,
}

impl Inversion {
    pub const ALL: [Inversion; 3] = [Inversion::Root, Inversion::First, Inversion::Second];

    pub fn count(self) -> usize {
        match self {
            Inversion::Root => 0,
            Inversion::First => 1,
            Inversion::Second => 2,
        }
    }
}

impl From<Inversion> for u8 {
    fn from(inversion: Inversion) -> u8 {
        inversion.count() as u8
    }
}

impl TryFrom<u8> for Inversion {
    type Error = EarError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Inversion::Root),
            1 => Ok(Inversion::First),
            2 => Ok(Inversion::Second),
            other => Err(EarError::ParseError(format!("Invalid inversion: {}", other))),
        }
    }
}

/// One chord of an expanded progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionChord {
    pub root: NoteOctave,
    pub chord: &'static ChordType,
}

impl ProgressionChord {
    pub fn notes(&self) -> Vec<NoteOctave> {
        chord_notes(self.root, self.chord, Inversion::Root)
    }
}

/// Stacks the chord on `root`, then raises the lowest note an octave `inversion` times.
pub fn chord_notes(root: NoteOctave, chord: &ChordType, inversion: Inversion) -> Vec<NoteOctave> {
    let mut notes: Vec<NoteOctave> = chord
        .intervals
        .iter()
        .map(|&semitones| transpose(root, semitones as i32))
        .collect();

    for _ in 0..inversion.count() {
        if notes.is_empty() {
            break;
        }
        let lowest = notes.remove(0);
        notes.push(transpose(lowest, 12));
    }

    notes
}

/// Ascending scale including the closing octave.
pub fn scale_notes(root: NoteOctave, scale: &ScaleType) -> Vec<NoteOctave> {
    scale
        .intervals
        .iter()
        .map(|&semitones| transpose(root, semitones as i32))
        .collect()
}

/// Scale in playing order for a direction. `Both` does not repeat the top note.
pub fn scale_run(root: NoteOctave, scale: &ScaleType, direction: ScaleDirection) -> Vec<NoteOctave> {
    let ascending = scale_notes(root, scale);
    match direction {
        ScaleDirection::Ascending => ascending,
        ScaleDirection::Descending => ascending.into_iter().rev().collect(),
        ScaleDirection::Both => {
            let descending: Vec<NoteOctave> = ascending.iter().rev().skip(1).copied().collect();
            ascending.into_iter().chain(descending).collect()
        }
    }
}

/// Notes in playing order. Harmonic intervals return both notes to be sounded together.
pub fn interval_notes(root: NoteOctave, semitones: u8, direction: IntervalDirection) -> Vec<NoteOctave> {
    let semitones = semitones as i32;
    match direction {
        IntervalDirection::Ascending | IntervalDirection::Harmonic => vec![root, transpose(root, semitones)],
        IntervalDirection::Descending => vec![root, transpose(root, -semitones)],
    }
}

pub fn pitch_notes(note: NoteOctave) -> Vec<NoteOctave> {
    vec![note]
}

/// Diatonic triad quality of a major-key degree (I ii iii IV V vi vii°).
pub fn degree_chord(degree: u8) -> Result<&'static ChordType, EarError> {
    let id = match degree {
        1 | 4 | 5 => "maj",
        2 | 3 | 6 => "min",
        7 => "dim",
        other => return Err(EarError::InvalidDegree(other)),
    };
    chord_by_id(id).ok_or_else(|| EarError::ParseError(format!("Missing chord type: {}", id)))
}

pub fn degree_root(key: Key, degree: u8) -> Result<NoteOctave, EarError> {
    if !(1..=7).contains(&degree) {
        return Err(EarError::InvalidDegree(degree));
    }
    let tonic = NoteOctave::new(key, PROGRESSION_OCTAVE);
    Ok(transpose(tonic, MAJOR_SCALE_STEPS[degree as usize - 1]))
}

pub fn progression_chords(key: Key, progression: &Progression) -> Result<Vec<ProgressionChord>, EarError> {
    progression
        .chord_degrees
        .iter()
        .map(|&degree| {
            Ok(ProgressionChord {
                root: degree_root(key, degree)?,
                chord: degree_chord(degree)?,
            })
        })
        .collect()
}
