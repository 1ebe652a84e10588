use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EarError;

pub const A4_FREQUENCY: f64 = 440.0;
pub const A4_KEY_NUMBER: i32 = 49;

/// Pitch class, stored with sharp spelling. Flats only exist as display names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    C,
    #[serde(rename = "C#")]
    CSharp,
    D,
    #[serde(rename = "D#")]
    DSharp,
    E,
    F,
    #[serde(rename = "F#")]
    FSharp,
    G,
    #[serde(rename = "G#")]
    GSharp,
    A,
    #[serde(rename = "A#")]
    ASharp,
    B,
}

impl Key {
    pub const ALL: [Key; 12] = [
        Key::C, Key::CSharp, Key::D, Key::DSharp, Key::E, Key::F,
        Key::FSharp, Key::G, Key::GSharp, Key::A, Key::ASharp, Key::B,
    ];

    /// Semitones above C (C=0, B=11)
    pub fn chromatic_index(self) -> i32 {
        match self {
            Key::C => 0,
            Key::CSharp => 1,
            Key::D => 2,
            Key::DSharp => 3,
            Key::E => 4,
            Key::F => 5,
            Key::FSharp => 6,
            Key::G => 7,
            Key::GSharp => 8,
            Key::A => 9,
            Key::ASharp => 10,
            Key::B => 11,
        }
    }

    /// Any integer wraps around the octave.
    pub fn from_index(index: i32) -> Key {
        Key::ALL[index.rem_euclid(12) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            Key::C => "C",
            Key::CSharp => "C#",
            Key::D => "D",
            Key::DSharp => "D#",
            Key::E => "E",
            Key::F => "F",
            Key::FSharp => "F#",
            Key::G => "G",
            Key::GSharp => "G#",
            Key::A => "A",
            Key::ASharp => "A#",
            Key::B => "B",
        }
    }

    pub fn flat_name(self) -> &'static str {
        match self {
            Key::CSharp => "Db",
            Key::DSharp => "Eb",
            Key::FSharp => "Gb",
            Key::GSharp => "Ab",
            Key::ASharp => "Bb",
            natural => natural.name(),
        }
    }

    pub fn display_name(self, prefer_flat: bool) -> &'static str {
        if prefer_flat { self.flat_name() } else { self.name() }
    }

    pub fn is_natural(self) -> bool {
        self.name() == self.flat_name()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Key {
    type Err = EarError;

    /// Accepts sharps (`C#`, `Cs`) and flats (`Db`), case-insensitive letter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_pitch_class(s).map(Key::from_index)
    }
}

/// Letter plus accidental as an unwrapped offset from C, so `Cb` is -1 and `B#` is 12.
fn parse_pitch_class(s: &str) -> Result<i32, EarError> {
    let mut chars = s.trim().chars();
    let base = match chars.next().map(|c| c.to_ascii_uppercase()) {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => return Err(EarError::ParseError(format!("Invalid note: {}", s))),
    };
    let offset = match chars.as_str() {
        "" => 0,
        "#" | "s" | "S" => 1,
        "b" => -1,
        _ => return Err(EarError::ParseError(format!("Invalid accidental: {}", s))),
    };
    Ok(base + offset)
}

/// An absolute pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteOctave {
    pub note: Key,
    pub octave: i32,
}

impl NoteOctave {
    pub const fn new(note: Key, octave: i32) -> Self {
        NoteOctave { note, octave }
    }

    /// Semitones above C0. Monotonic in pitch.
    pub fn semitone_index(self) -> i32 {
        self.octave * 12 + self.note.chromatic_index()
    }

    /// Standard piano key number (A0 = 1, C4 = 40, A4 = 49)
    pub fn piano_key(self) -> i32 {
        self.semitone_index() - 8
    }

    pub fn from_piano_key(key: i32) -> Self {
        let index = key + 8;
        NoteOctave {
            note: Key::from_index(index),
            octave: index.div_euclid(12),
        }
    }

    pub fn transpose(self, semitones: i32) -> Self {
        transpose(self, semitones)
    }

    pub fn frequency(self) -> f64 {
        frequency(self.note, self.octave)
    }
}

impl fmt::Display for NoteOctave {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.note, self.octave)
    }
}

impl FromStr for NoteOctave {
    type Err = EarError;

    /// Parses scientific pitch notation such as `C4`, `F#3`, `Bb-1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .char_indices()
            .skip(1)
            .find(|(_, c)| c.is_ascii_digit() || *c == '-')
            .map(|(i, _)| i)
            .ok_or_else(|| EarError::ParseError(format!("Missing octave: {}", s)))?;
        let pitch = parse_pitch_class(&s[..split])?;
        let octave: i32 = s[split..]
            .parse()
            .map_err(|_| EarError::ParseError(format!("Invalid octave: {}", s)))?;
        Ok(NoteOctave::new(Key::from_index(pitch), octave + pitch.div_euclid(12)))
    }
}

/// Floor-mod pitch class, floor-div octave carry. Exact for any offset.
pub fn transpose(note: NoteOctave, semitones: i32) -> NoteOctave {
    let total = i64::from(note.note.chromatic_index()) + i64::from(semitones);
    let octave = i64::from(note.octave) + total.div_euclid(12);
    NoteOctave {
        note: Key::from_index(total.rem_euclid(12) as i32),
        octave: octave.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
    }
}

/// Equal temperament, `440 * 2^((n - 49) / 12)` where `n` is the piano key number.
pub fn frequency(note: Key, octave: i32) -> f64 {
    let key_number = NoteOctave::new(note, octave).piano_key();
    A4_FREQUENCY * 2.0_f64.powf((key_number - A4_KEY_NUMBER) as f64 / 12.0)
}

/// Nearest piano key number for a frequency.
pub fn piano_key_for_frequency(hz: f64) -> i32 {
    (12.0 * (hz / A4_FREQUENCY).log2()).round() as i32 + A4_KEY_NUMBER
}

/// Nearest sharp-spelled note for a frequency, e.g. `440.0 -> A4`.
pub fn frequency_to_note(hz: f64) -> NoteOctave {
    NoteOctave::from_piano_key(piano_key_for_frequency(hz))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_is_exact() {
        assert_eq!(frequency(Key::A, 4), 440.0);
        assert!((frequency(Key::A, 5) - 880.0).abs() < 1e-9);
        assert!((frequency(Key::C, 4) - 261.625_565_300_598_6).abs() < 1e-9);
    }

    #[test]
    fn test_piano_key_numbers() {
        assert_eq!(NoteOctave::new(Key::A, 0).piano_key(), 1);
        assert_eq!(NoteOctave::new(Key::C, 4).piano_key(), 40);
        assert_eq!(NoteOctave::new(Key::C, 8).piano_key(), 88);
        assert_eq!(NoteOctave::from_piano_key(49), NoteOctave::new(Key::A, 4));
    }

    #[test]
    fn test_transpose_round_trip() {
        for key in Key::ALL {
            for octave in -2..9 {
                let note = NoteOctave::new(key, octave);
                for semitones in -40..=40 {
                    assert_eq!(transpose(transpose(note, semitones), -semitones), note);
                }
            }
        }
    }

    #[test]
    fn test_transpose_octave_carry_and_borrow() {
        let c4 = NoteOctave::new(Key::C, 4);
        assert_eq!(transpose(c4, 12), NoteOctave::new(Key::C, 5));
        assert_eq!(transpose(c4, -1), NoteOctave::new(Key::B, 3));
        assert_eq!(transpose(c4, -12), NoteOctave::new(Key::C, 3));
        assert_eq!(transpose(c4, -13), NoteOctave::new(Key::B, 2));
        assert_eq!(transpose(NoteOctave::new(Key::B, 3), 1), c4);
        assert_eq!(transpose(c4, 0), c4);
        for key in Key::ALL {
            let note = NoteOctave::new(key, 2);
            let up = transpose(note, 12);
            assert_eq!(up.note, key);
            assert_eq!(up.octave, 3);
            assert_eq!(transpose(note, 7).semitone_index(), note.semitone_index() + 7);
        }

        let d4 = NoteOctave::new(Key::D, 4);
        let far_up = transpose(d4, i32::MAX);
        assert_eq!(far_up, NoteOctave::new(Key::A, 4 + 178_956_970));
        assert_eq!(transpose(far_up, -i32::MAX), d4);

        let far_down = transpose(d4, i32::MIN);
        assert_eq!(far_down, NoteOctave::new(Key::FSharp, 4 - 178_956_971));
        assert_eq!(transpose(transpose(far_down, i32::MAX), 1), d4);
    }

    #[test]
    fn test_frequency_to_note() {
        assert_eq!(frequency_to_note(440.0), NoteOctave::new(Key::A, 4));
        assert_eq!(frequency_to_note(frequency(Key::DSharp, 2)), NoteOctave::new(Key::DSharp, 2));
        assert_eq!(frequency_to_note(262.0), NoteOctave::new(Key::C, 4));
    }

    #[test]
    fn test_parse_notes() {
        assert_eq!("C4".parse::<NoteOctave>().unwrap(), NoteOctave::new(Key::C, 4));
        assert_eq!("f#3".parse::<NoteOctave>().unwrap(), NoteOctave::new(Key::FSharp, 3));
        assert_eq!("Ds4".parse::<NoteOctave>().unwrap(), NoteOctave::new(Key::DSharp, 4));
        assert_eq!("Bb2".parse::<NoteOctave>().unwrap(), NoteOctave::new(Key::ASharp, 2));
        assert_eq!("A-1".parse::<NoteOctave>().unwrap(), NoteOctave::new(Key::A, -1));
        assert_eq!("Cb4".parse::<NoteOctave>().unwrap(), NoteOctave::new(Key::B, 3));
        assert!("H4".parse::<NoteOctave>().is_err());
        assert!("C".parse::<NoteOctave>().is_err());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Key::ASharp.display_name(true), "Bb");
        assert_eq!(Key::ASharp.display_name(false), "A#");
        assert_eq!(Key::E.display_name(true), "E");
        assert!(Key::G.is_natural());
        assert!(!Key::GSharp.is_natural());
        assert_eq!(NoteOctave::new(Key::GSharp, 5).to_string(), "G#5");
    }
}
