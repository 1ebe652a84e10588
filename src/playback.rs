//! Timing rules that turn a question payload into scheduled notes.

use crate::construct::{IntervalDirection, chord_notes, interval_notes, progression_chords, scale_run};
use crate::engine::{AudioEngine, NoteEvent, Scheduled};
use crate::error::EarError;
use crate::note::NoteOctave;
use crate::question::AudioData;

pub const HARMONIC_INTERVAL_SECONDS: f64 = 2.0;
pub const MELODIC_INTERVAL_SECONDS: f64 = 1.0;
pub const MELODIC_INTERVAL_GAP: f64 = 0.1;
pub const CHORD_SECONDS: f64 = 2.5;
pub const ARPEGGIO_NOTE_SECONDS: f64 = 0.5;
pub const ARPEGGIO_GAP: f64 = 0.05;
/// Each progression chord lasts this many beats.
pub const PROGRESSION_BEATS_PER_CHORD: f64 = 4.0;
pub const PROGRESSION_GAP: f64 = 0.1;
pub const PITCH_SECONDS: f64 = 2.0;
pub const SCALE_NOTE_SECONDS: f64 = 0.4;
pub const SCALE_GAP: f64 = 0.05;

fn together(notes: &[NoteOctave], duration: f64, offset: f64) -> impl Iterator<Item = NoteEvent> + '_ {
    notes.iter().map(move |n| NoteEvent::new(n.frequency(), duration, offset))
}

fn in_sequence(notes: &[NoteOctave], duration: f64, gap: f64) -> Vec<NoteEvent> {
    notes
        .iter()
        .enumerate()
        .map(|(i, n)| NoteEvent::new(n.frequency(), duration, i as f64 * (duration + gap)))
        .collect()
}

/// Notes and offsets for a payload, relative to the moment playback starts.
pub fn plan(audio: &AudioData) -> Result<Vec<NoteEvent>, EarError> {
    let events = match audio {
        AudioData::Interval { root, semitones, direction } => {
            let notes = interval_notes(*root, *semitones, *direction);
            match direction {
                IntervalDirection::Harmonic => together(&notes, HARMONIC_INTERVAL_SECONDS, 0.0).collect(),
                IntervalDirection::Ascending | IntervalDirection::Descending => {
                    in_sequence(&notes, MELODIC_INTERVAL_SECONDS, MELODIC_INTERVAL_GAP)
                }
            }
        }
        AudioData::Chord { root, chord, inversion } => {
            together(&chord_notes(*root, chord, *inversion), CHORD_SECONDS, 0.0).collect()
        }
        AudioData::Progression { key, progression, tempo } => {
            let chord_seconds = 60.0 / (*tempo).max(1) as f64 * PROGRESSION_BEATS_PER_CHORD;
            let mut events = Vec::new();
            for (i, chord) in progression_chords(*key, progression)?.iter().enumerate() {
                let offset = i as f64 * (chord_seconds + PROGRESSION_GAP);
                events.extend(together(&chord.notes(), chord_seconds, offset));
            }
            events
        }
        AudioData::Pitch { note } => vec![NoteEvent::new(note.frequency(), PITCH_SECONDS, 0.0)],
        AudioData::Scale { root, scale, direction } => {
            in_sequence(&scale_run(*root, scale, *direction), SCALE_NOTE_SECONDS, SCALE_GAP)
        }
    };
    Ok(events)
}

/// Broken-chord rendition of a chord payload. Other payloads plan as usual.
pub fn arpeggio_plan(audio: &AudioData) -> Result<Vec<NoteEvent>, EarError> {
    match audio {
        AudioData::Chord { root, chord, inversion } => Ok(in_sequence(
            &chord_notes(*root, chord, *inversion),
            ARPEGGIO_NOTE_SECONDS,
            ARPEGGIO_GAP,
        )),
        other => plan(other),
    }
}

/// Seconds from the first onset to the last release.
pub fn plan_length(events: &[NoteEvent]) -> f64 {
    events.iter().map(|e| e.offset + e.duration).fold(0.0, f64::max)
}

pub fn play_audio_for(engine: &mut AudioEngine, audio: &AudioData) -> Result<Scheduled, EarError> {
    let events = plan(audio)?;
    engine.schedule(&events)
}

pub fn play_arpeggio_for(engine: &mut AudioEngine, audio: &AudioData) -> Result<Scheduled, EarError> {
    let events = arpeggio_plan(audio)?;
    engine.schedule(&events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{chord_by_id, progression_by_id, scale_by_id};
    use crate::construct::{Inversion, ScaleDirection};
    use crate::note::Key;

    const EPS: f64 = 1e-9;

    fn c(octave: i32) -> NoteOctave {
        NoteOctave::new(Key::C, octave)
    }

    #[test]
    fn test_melodic_intervals() {
        let up = plan(&AudioData::Interval { root: c(4), semitones: 7, direction: IntervalDirection::Ascending }).unwrap();
        assert_eq!(up.len(), 2);
        assert_eq!(up[0].offset, 0.0);
        assert!((up[1].offset - 1.1).abs() < EPS);
        assert!(up[1].frequency > up[0].frequency);

        let down = plan(&AudioData::Interval { root: c(4), semitones: 7, direction: IntervalDirection::Descending }).unwrap();
        assert!(down[0].frequency > down[1].frequency, "higher note first");
        assert!((down[0].frequency - c(4).frequency()).abs() < EPS);
    }

    #[test]
    fn test_harmonic_interval() {
        let events = plan(&AudioData::Interval { root: c(3), semitones: 4, direction: IntervalDirection::Harmonic }).unwrap();
        assert!(events.iter().all(|e| e.offset == 0.0 && e.duration == HARMONIC_INTERVAL_SECONDS));
    }

    #[test]
    fn test_chord_and_arpeggio() {
        let audio = AudioData::Chord {
            root: c(3),
            chord: *chord_by_id("maj7").unwrap(),
            inversion: Inversion::Second,
        };
        let block = plan(&audio).unwrap();
        assert_eq!(block.len(), 4);
        assert!(block.iter().all(|e| e.offset == 0.0 && e.duration == CHORD_SECONDS));

        let broken = arpeggio_plan(&audio).unwrap();
        assert!((broken[3].offset - 1.65).abs() < EPS);
        assert!((plan_length(&broken) - 2.15).abs() < EPS);
    }

    #[test]
    fn test_progression_timing_follows_tempo() {
        let audio = AudioData::Progression {
            key: Key::C,
            progression: *progression_by_id("I-V-vi-IV").unwrap(),
            tempo: 120,
        };
        let events = plan(&audio).unwrap();
        assert_eq!(events.len(), 12);
        assert!(events.iter().all(|e| (e.duration - 2.0).abs() < EPS));
        let onsets: Vec<f64> = events.iter().step_by(3).map(|e| e.offset).collect();
        for (i, onset) in onsets.iter().enumerate() {
            assert!((onset - i as f64 * 2.1).abs() < EPS);
        }
        assert!((events[3].frequency - NoteOctave::new(Key::G, 4).frequency()).abs() < EPS);
    }

    #[test]
    fn test_scale_both_ways() {
        let audio = AudioData::Scale {
            root: c(3),
            scale: *scale_by_id("pentatonic-major").unwrap(),
            direction: ScaleDirection::Both,
        };
        let events = plan(&audio).unwrap();
        assert_eq!(events.len(), 11);
        assert!((events[10].offset - 4.5).abs() < EPS);
        assert!((events[10].frequency - c(3).frequency()).abs() < EPS);
    }

    #[test]
    fn test_pitch() {
        let events = plan(&AudioData::Pitch { note: NoteOctave::new(Key::A, 4) }).unwrap();
        assert_eq!(events, vec![NoteEvent::new(440.0, PITCH_SECONDS, 0.0)]);
    }
}
