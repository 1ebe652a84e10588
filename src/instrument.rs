use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::EarError;
use crate::note::{Key, NoteOctave, piano_key_for_frequency};
use crate::waveform::WaveformType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    Piano,
    Guitar,
    Violin,
    Flute,
    Trumpet,
}

use Key::*;

const PIANO_NOTES: &[(Key, i32)] = &[
    (A, 1), (C, 2), (DSharp, 2), (FSharp, 2), (A, 2), (C, 3), (DSharp, 3), (FSharp, 3), (A, 3),
    (C, 4), (DSharp, 4), (FSharp, 4), (A, 4), (C, 5), (DSharp, 5), (FSharp, 5), (A, 5),
    (C, 6), (DSharp, 6), (FSharp, 6), (A, 6), (C, 7), (DSharp, 7), (FSharp, 7), (A, 7), (C, 8),
];

const GUITAR_NOTES: &[(Key, i32)] = &[
    (E, 2), (A, 2), (C, 3), (D, 3), (DSharp, 3), (FSharp, 3), (G, 3), (A, 3),
    (C, 4), (DSharp, 4), (FSharp, 4), (A, 4), (C, 5),
];

// Naturals only (A, C, E, G)
const VIOLIN_NOTES: &[(Key, i32)] = &[
    (G, 3), (A, 3), (C, 4), (E, 4), (G, 4), (A, 4), (C, 5), (E, 5),
    (G, 5), (A, 5), (C, 6), (E, 6), (G, 6), (A, 6), (C, 7),
];

const FLUTE_NOTES: &[(Key, i32)] = &[
    (C, 4), (E, 4), (A, 4), (C, 5), (E, 5), (A, 5), (C, 6), (E, 6), (A, 6), (C, 7),
];

const TRUMPET_NOTES: &[(Key, i32)] = &[
    (F, 3), (A, 3), (C, 4), (DSharp, 4), (F, 4), (G, 4), (ASharp, 4), (D, 5), (F, 5), (A, 5), (C, 6),
];

impl InstrumentKind {
    pub const ALL: [InstrumentKind; 5] = [
        InstrumentKind::Piano,
        InstrumentKind::Guitar,
        InstrumentKind::Violin,
        InstrumentKind::Flute,
        InstrumentKind::Trumpet,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InstrumentKind::Piano => "piano",
            InstrumentKind::Guitar => "guitar",
            InstrumentKind::Violin => "violin",
            InstrumentKind::Flute => "flute",
            InstrumentKind::Trumpet => "trumpet",
        }
    }

    /// Directory holding this instrument's samples.
    pub fn folder(self) -> &'static str {
        match self {
            InstrumentKind::Guitar => "guitar-acoustic",
            other => other.name(),
        }
    }

    /// Pitches that have a recorded sample; everything else is repitched from the nearest one.
    pub fn sample_notes(self) -> impl Iterator<Item = NoteOctave> {
        let table = match self {
            InstrumentKind::Piano => PIANO_NOTES,
            InstrumentKind::Guitar => GUITAR_NOTES,
            InstrumentKind::Violin => VIOLIN_NOTES,
            InstrumentKind::Flute => FLUTE_NOTES,
            InstrumentKind::Trumpet => TRUMPET_NOTES,
        };
        table.iter().map(|&(note, octave)| NoteOctave::new(note, octave))
    }
}

/// Sample file stem, `#` spelled as `s` (`D#4` -> `Ds4`).
pub fn sample_file_stem(note: NoteOctave) -> String {
    format!("{}{}", note.note.name().replace('#', "s"), note.octave)
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InstrumentKind {
    type Err = EarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "piano" => Ok(InstrumentKind::Piano),
            "guitar" | "guitar-acoustic" => Ok(InstrumentKind::Guitar),
            "violin" => Ok(InstrumentKind::Violin),
            "flute" => Ok(InstrumentKind::Flute),
            "trumpet" => Ok(InstrumentKind::Trumpet),
            other => Err(EarError::ParseError(format!("Unknown instrument: {}", other))),
        }
    }
}

/// What the engine plays a note with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundSource {
    Waveform(WaveformType),
    Sampled(InstrumentKind),
}

impl Default for SoundSource {
    fn default() -> Self {
        SoundSource::Waveform(WaveformType::Sine)
    }
}

impl fmt::Display for SoundSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SoundSource::Waveform(w) => write!(f, "{}", w),
            SoundSource::Sampled(i) => write!(f, "{}", i),
        }
    }
}

impl FromStr for SoundSource {
    type Err = EarError;

    /// Waveform names first, then instrument names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(waveform) = s.parse::<WaveformType>() {
            return Ok(SoundSource::Waveform(waveform));
        }
        s.parse::<InstrumentKind>()
            .map(SoundSource::Sampled)
            .map_err(|_| EarError::ParseError(format!("Unknown sound type: {}", s.trim())))
    }
}

/// Mono PCM, normalized to [-1, 1].
#[derive(Debug, Clone)]
pub struct SampleData {
    pub samples: Arc<Vec<f32>>,
    pub sample_rate: u32,
}

impl SampleData {
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Linear interpolation at `time` seconds into the note, played `rate` times faster.
    pub fn sample_at(&self, time: f64, rate: f64) -> f32 {
        let src_pos = time * self.sample_rate as f64 * rate;
        if src_pos < 0.0 {
            return 0.0;
        }
        let src_idx = src_pos as usize;

        if src_idx >= self.samples.len() {
            return 0.0;
        }

        if src_idx < self.samples.len() - 1 {
            let frac = (src_pos - src_idx as f64) as f32;
            let s1 = self.samples[src_idx];
            let s2 = self.samples[src_idx + 1];
            s1 * (1.0 - frac) + s2 * frac
        } else {
            self.samples[src_idx]
        }
    }
}

#[derive(Debug, Clone)]
pub struct SampledNote {
    pub note: NoteOctave,
    pub data: SampleData,
}

/// Every loaded sample of one instrument.
#[derive(Debug, Clone)]
pub struct SampleSet {
    pub instrument: InstrumentKind,
    pub notes: Vec<SampledNote>,
}

impl SampleSet {
    pub fn new(instrument: InstrumentKind, notes: Vec<SampledNote>) -> Self {
        SampleSet { instrument, notes }
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Closest recorded sample to `frequency` and the playback rate that repitches it.
    pub fn nearest(&self, frequency: f64) -> Option<(&SampledNote, f64)> {
        let target = piano_key_for_frequency(frequency);
        self.notes
            .iter()
            .min_by_key(|s| (s.note.piano_key() - target).abs())
            .map(|s| (s, frequency / s.note.frequency()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(len: usize) -> SampleData {
        SampleData {
            samples: Arc::new((0..len).map(|i| i as f32).collect()),
            sample_rate: 10,
        }
    }

    #[test]
    fn test_sound_source_parse() {
        assert_eq!("triangle".parse::<SoundSource>().unwrap(), SoundSource::Waveform(WaveformType::Triangle));
        assert_eq!("Piano".parse::<SoundSource>().unwrap(), SoundSource::Sampled(InstrumentKind::Piano));
        assert!("kazoo".parse::<SoundSource>().is_err());
    }

    #[test]
    fn test_sample_file_names() {
        assert_eq!(sample_file_stem(NoteOctave::new(Key::DSharp, 4)), "Ds4");
        assert_eq!(sample_file_stem(NoteOctave::new(Key::A, 1)), "A1");
        assert_eq!(InstrumentKind::Guitar.folder(), "guitar-acoustic");
        assert_eq!(InstrumentKind::Piano.sample_notes().count(), 26);
        assert!(InstrumentKind::Flute.sample_notes().all(|n| n.note.is_natural()));
    }

    #[test]
    fn test_interpolation() {
        let data = tone(4);
        assert_eq!(data.sample_at(0.0, 1.0), 0.0);
        assert!((data.sample_at(0.15, 1.0) - 1.5).abs() < 1e-6);
        assert!((data.sample_at(0.1, 2.0) - 2.0).abs() < 1e-6);
        assert_eq!(data.sample_at(0.3, 1.0), 3.0);
        assert_eq!(data.sample_at(1.0, 1.0), 0.0);
        assert_eq!(data.duration(), 0.4);
    }

    #[test]
    fn test_nearest_sample() {
        let set = SampleSet::new(
            InstrumentKind::Violin,
            vec![
                SampledNote { note: NoteOctave::new(Key::A, 4), data: tone(2) },
                SampledNote { note: NoteOctave::new(Key::C, 5), data: tone(2) },
            ],
        );
        let (sample, rate) = set.nearest(440.0).unwrap();
        assert_eq!(sample.note, NoteOctave::new(Key::A, 4));
        assert!((rate - 1.0).abs() < 1e-12);

        let a_sharp = NoteOctave::new(Key::ASharp, 4).frequency();
        let (sample, rate) = set.nearest(a_sharp).unwrap();
        assert_eq!(sample.note, NoteOctave::new(Key::A, 4));
        assert!(rate > 1.0);

        let b4 = NoteOctave::new(Key::B, 4).frequency();
        let (sample, rate) = set.nearest(b4).unwrap();
        assert_eq!(sample.note, NoteOctave::new(Key::C, 5));
        assert!(rate < 1.0);

        assert!(SampleSet::new(InstrumentKind::Flute, Vec::new()).nearest(440.0).is_none());
    }
}
