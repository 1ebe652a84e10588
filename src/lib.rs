//  _______  _______  _______ _________ _______  _______ _________ _
// (  ____ \(  ___  )(  ____ )\__   __/(  ____ )(  ___  )\__   __/( (    /|
// | (    \/| (   ) || (    )|   ) (   | (    )|| (   ) |   ) (   |  \  ( |
// | (__    | (___) || (____)|   | |   | (____)|| (___) |   | |   |   \ | |
// |  __)   |  ___  ||     __)   | |   |     __)|  ___  |   | |   | (\ \) |
// | (      | (   ) || (\ (      | |   | (\ (   | (   ) |   | |   | | \   |
// | (____/\| )   ( || ) \ \__   | |   | ) \ \__| )   ( |___) (___| )  \  |
// (_______/|/     \||/   \__/   )_(   |/   \__/|/     \|\_______/|/    )_)

pub mod error;
pub mod note;
pub mod difficulty;
pub mod catalog;
pub mod construct;
pub mod question;
pub mod waveform;
pub mod instrument;
pub mod envelope;
pub mod clock;
pub mod mixer;
pub mod output;
pub mod loader;
pub mod config;
pub mod engine;
pub mod playback;
pub mod scoring;
pub mod stats;
pub mod session;

pub use error::EarError;
pub use note::{Key, NoteOctave, frequency, frequency_to_note, transpose};
pub use difficulty::{Difficulty, DifficultySettings};
pub use catalog::{CatalogEntry, ChordType, Interval, OctaveRange, PitchDefinition, Progression, ScaleType};
pub use construct::{Inversion, IntervalDirection, ScaleDirection, chord_notes, interval_notes, progression_chords, scale_notes};
pub use question::{AudioData, GameMode, OptionPolicy, QuizEngine, QuizQuestion};
pub use waveform::WaveformType;
pub use instrument::{InstrumentKind, SampleData, SampleSet, SampledNote, SoundSource};
pub use envelope::Envelope;
pub use clock::{AudioClock, ManualClock, StreamClock};
pub use output::{AudioOutput, CpalOutput, SilentOutput};
pub use loader::{InstrumentLoader, SampleSource, WavSampleSource};
pub use config::EngineConfig;
pub use engine::{AudioEngine, EngineState, NoteEvent, Scheduled};
pub use playback::{plan, plan_length, play_arpeggio_for, play_audio_for};
pub use scoring::{calculate_accuracy, calculate_score};
pub use stats::{GameStats, ModeStats, StatUpdate, StatsByMode};
pub use session::{AnswerOutcome, QuizSession, SessionStep, SessionSummary};
