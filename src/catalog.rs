//! Immutable music-theory catalogs.
//!
//! Every table is declared easiest tier first, so filtering by tier keeps
//! declaration order. That order is what seeded question generation relies on.

use serde::Serialize;

use crate::difficulty::Difficulty;
use crate::note::Key;

/// Shared view over catalog rows for sampling questions.
pub trait CatalogEntry: 'static {
    fn id(&self) -> &'static str;
    /// The string shown as an answer option.
    fn label(&self) -> &'static str;
    fn difficulty(&self) -> Difficulty;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub id: &'static str,
    pub name: &'static str,
    pub abbreviation: &'static str,
    pub semitones: u8,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordType {
    pub id: &'static str,
    pub name: &'static str,
    pub abbreviation: &'static str,
    /// Semitone offsets from the root, lowest first
    pub intervals: &'static [u8],
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleType {
    pub id: &'static str,
    pub name: &'static str,
    /// Offsets from the root including the closing octave
    pub intervals: &'static [u8],
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progression {
    pub id: &'static str,
    pub name: &'static str,
    pub roman_numerals: &'static [&'static str],
    /// 1-indexed major-scale degrees
    pub chord_degrees: &'static [u8],
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchDefinition {
    pub id: &'static str,
    pub note: Key,
    /// May carry an enharmonic pair, e.g. `C#/Db`
    pub display_name: &'static str,
    pub difficulty: Difficulty,
}

/// Inclusive octave band for absolute-pitch questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OctaveRange {
    pub min: i32,
    pub max: i32,
}

impl OctaveRange {
    /// Bounds are swapped if given in the wrong order.
    pub fn new(a: i32, b: i32) -> Self {
        OctaveRange { min: a.min(b), max: a.max(b) }
    }
}

macro_rules! impl_entry {
    ($ty:ty, $label:ident) => {
        impl CatalogEntry for $ty {
            fn id(&self) -> &'static str { self.id }
            fn label(&self) -> &'static str { self.$label }
            fn difficulty(&self) -> Difficulty { self.difficulty }
        }
    };
}

impl_entry!(Interval, name);
impl_entry!(ChordType, name);
impl_entry!(ScaleType, name);
impl_entry!(Progression, name);
impl_entry!(PitchDefinition, display_name);

use Difficulty::{Easy, Hard, Medium};

const fn interval(id: &'static str, name: &'static str, semitones: u8, difficulty: Difficulty) -> Interval {
    Interval { id, name, abbreviation: id, semitones, difficulty }
}

pub static INTERVALS: [Interval; 13] = [
    interval("P1", "Perfect Unison", 0, Easy),
    interval("M2", "Major 2nd", 2, Easy),
    interval("M3", "Major 3rd", 4, Easy),
    interval("P4", "Perfect 4th", 5, Easy),
    interval("P5", "Perfect 5th", 7, Easy),
    interval("P8", "Perfect Octave", 12, Easy),
    interval("m2", "Minor 2nd", 1, Medium),
    interval("m3", "Minor 3rd", 3, Medium),
    interval("M6", "Major 6th", 9, Medium),
    interval("M7", "Major 7th", 11, Medium),
    interval("TT", "Tritone", 6, Hard),
    interval("m6", "Minor 6th", 8, Hard),
    interval("m7", "Minor 7th", 10, Hard),
];

pub static CHORD_TYPES: [ChordType; 9] = [
    ChordType { id: "maj", name: "Major", abbreviation: "maj", intervals: &[0, 4, 7], difficulty: Easy },
    ChordType { id: "min", name: "Minor", abbreviation: "min", intervals: &[0, 3, 7], difficulty: Easy },
    ChordType { id: "dim", name: "Diminished", abbreviation: "dim", intervals: &[0, 3, 6], difficulty: Medium },
    ChordType { id: "aug", name: "Augmented", abbreviation: "aug", intervals: &[0, 4, 8], difficulty: Medium },
    ChordType { id: "maj7", name: "Major 7th", abbreviation: "maj7", intervals: &[0, 4, 7, 11], difficulty: Hard },
    ChordType { id: "min7", name: "Minor 7th", abbreviation: "min7", intervals: &[0, 3, 7, 10], difficulty: Hard },
    ChordType { id: "dom7", name: "Dominant 7th", abbreviation: "7", intervals: &[0, 4, 7, 10], difficulty: Hard },
    ChordType { id: "sus2", name: "Suspended 2nd", abbreviation: "sus2", intervals: &[0, 2, 7], difficulty: Hard },
    ChordType { id: "sus4", name: "Suspended 4th", abbreviation: "sus4", intervals: &[0, 5, 7], difficulty: Hard },
];

pub static SCALE_TYPES: [ScaleType; 14] = [
    ScaleType { id: "major", name: "Major", intervals: &[0, 2, 4, 5, 7, 9, 11, 12], difficulty: Easy },
    ScaleType { id: "natural-minor", name: "Natural Minor", intervals: &[0, 2, 3, 5, 7, 8, 10, 12], difficulty: Easy },
    ScaleType { id: "pentatonic-major", name: "Major Pentatonic", intervals: &[0, 2, 4, 7, 9, 12], difficulty: Easy },
    ScaleType { id: "pentatonic-minor", name: "Minor Pentatonic", intervals: &[0, 3, 5, 7, 10, 12], difficulty: Easy },
    ScaleType { id: "harmonic-minor", name: "Harmonic Minor", intervals: &[0, 2, 3, 5, 7, 8, 11, 12], difficulty: Medium },
    ScaleType { id: "melodic-minor", name: "Melodic Minor", intervals: &[0, 2, 3, 5, 7, 9, 11, 12], difficulty: Medium },
    ScaleType { id: "dorian", name: "Dorian", intervals: &[0, 2, 3, 5, 7, 9, 10, 12], difficulty: Medium },
    ScaleType { id: "mixolydian", name: "Mixolydian", intervals: &[0, 2, 4, 5, 7, 9, 10, 12], difficulty: Medium },
    ScaleType { id: "phrygian", name: "Phrygian", intervals: &[0, 1, 3, 5, 7, 8, 10, 12], difficulty: Hard },
    ScaleType { id: "lydian", name: "Lydian", intervals: &[0, 2, 4, 6, 7, 9, 11, 12], difficulty: Hard },
    ScaleType { id: "locrian", name: "Locrian", intervals: &[0, 1, 3, 5, 6, 8, 10, 12], difficulty: Hard },
    ScaleType { id: "blues", name: "Blues", intervals: &[0, 3, 5, 6, 7, 10, 12], difficulty: Hard },
    ScaleType { id: "whole-tone", name: "Whole Tone", intervals: &[0, 2, 4, 6, 8, 10, 12], difficulty: Hard },
    ScaleType {
        id: "chromatic",
        name: "Chromatic",
        intervals: &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
        difficulty: Hard,
    },
];

pub static PROGRESSIONS: [Progression; 8] = [
    Progression { id: "I-IV-V", name: "I–IV–V", roman_numerals: &["I", "IV", "V"], chord_degrees: &[1, 4, 5], difficulty: Easy },
    Progression { id: "I-V-vi-IV", name: "I–V–vi–IV", roman_numerals: &["I", "V", "vi", "IV"], chord_degrees: &[1, 5, 6, 4], difficulty: Easy },
    Progression { id: "vi-IV-I-V", name: "vi–IV–I–V", roman_numerals: &["vi", "IV", "I", "V"], chord_degrees: &[6, 4, 1, 5], difficulty: Easy },
    Progression { id: "I-vi-IV-V", name: "I–vi–IV–V", roman_numerals: &["I", "vi", "IV", "V"], chord_degrees: &[1, 6, 4, 5], difficulty: Medium },
    Progression { id: "IV-V-I-vi", name: "IV–V–I–vi", roman_numerals: &["IV", "V", "I", "vi"], chord_degrees: &[4, 5, 1, 6], difficulty: Medium },
    Progression { id: "I-IV-vi-V", name: "I–IV–vi–V", roman_numerals: &["I", "IV", "vi", "V"], chord_degrees: &[1, 4, 6, 5], difficulty: Medium },
    Progression { id: "ii-V-I", name: "ii–V–I", roman_numerals: &["ii", "V", "I"], chord_degrees: &[2, 5, 1], difficulty: Hard },
    Progression { id: "I-iii-vi-IV", name: "I–iii–vi–IV", roman_numerals: &["I", "iii", "vi", "IV"], chord_degrees: &[1, 3, 6, 4], difficulty: Hard },
];

pub static PITCH_DEFINITIONS: [PitchDefinition; 12] = [
    // Naturals
    PitchDefinition { id: "C", note: Key::C, display_name: "C", difficulty: Easy },
    PitchDefinition { id: "D", note: Key::D, display_name: "D", difficulty: Easy },
    PitchDefinition { id: "E", note: Key::E, display_name: "E", difficulty: Easy },
    PitchDefinition { id: "F", note: Key::F, display_name: "F", difficulty: Easy },
    PitchDefinition { id: "G", note: Key::G, display_name: "G", difficulty: Easy },
    PitchDefinition { id: "A", note: Key::A, display_name: "A", difficulty: Easy },
    PitchDefinition { id: "B", note: Key::B, display_name: "B", difficulty: Easy },
    // Common accidentals
    PitchDefinition { id: "Bb", note: Key::ASharp, display_name: "Bb", difficulty: Medium },
    PitchDefinition { id: "Eb", note: Key::DSharp, display_name: "Eb", difficulty: Medium },
    PitchDefinition { id: "F#", note: Key::FSharp, display_name: "F#", difficulty: Medium },
    // The rest
    PitchDefinition { id: "C#", note: Key::CSharp, display_name: "C#/Db", difficulty: Hard },
    PitchDefinition { id: "G#", note: Key::GSharp, display_name: "G#/Ab", difficulty: Hard },
];

/// Rows available at `tier`, in declaration order.
pub fn by_difficulty<T: CatalogEntry>(items: &'static [T], tier: Difficulty) -> Vec<&'static T> {
    items.iter().filter(|item| tier.includes(item.difficulty())).collect()
}

pub fn intervals_by_difficulty(tier: Difficulty) -> Vec<&'static Interval> {
    by_difficulty(&INTERVALS, tier)
}

pub fn chords_by_difficulty(tier: Difficulty) -> Vec<&'static ChordType> {
    by_difficulty(&CHORD_TYPES, tier)
}

pub fn scales_by_difficulty(tier: Difficulty) -> Vec<&'static ScaleType> {
    by_difficulty(&SCALE_TYPES, tier)
}

pub fn progressions_by_difficulty(tier: Difficulty) -> Vec<&'static Progression> {
    by_difficulty(&PROGRESSIONS, tier)
}

pub fn pitches_by_difficulty(tier: Difficulty) -> Vec<&'static PitchDefinition> {
    by_difficulty(&PITCH_DEFINITIONS, tier)
}

pub fn interval_by_id(id: &str) -> Option<&'static Interval> {
    INTERVALS.iter().find(|i| i.id == id)
}

pub fn interval_by_semitones(semitones: u8) -> Option<&'static Interval> {
    INTERVALS.iter().find(|i| i.semitones == semitones)
}

pub fn chord_by_id(id: &str) -> Option<&'static ChordType> {
    CHORD_TYPES.iter().find(|c| c.id == id)
}

pub fn scale_by_id(id: &str) -> Option<&'static ScaleType> {
    SCALE_TYPES.iter().find(|s| s.id == id)
}

pub fn progression_by_id(id: &str) -> Option<&'static Progression> {
    PROGRESSIONS.iter().find(|p| p.id == id)
}

/// Default octave band for absolute-pitch questions.
pub fn octave_range(tier: Difficulty) -> OctaveRange {
    match tier {
        Difficulty::Easy => OctaveRange { min: 4, max: 4 },
        Difficulty::Medium => OctaveRange { min: 3, max: 5 },
        Difficulty::Hard => OctaveRange { min: 2, max: 6 },
    }
}
