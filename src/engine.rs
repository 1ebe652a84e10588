use std::sync::Arc;

use tracing::{debug, warn};

use crate::clock::AudioClock;
use crate::config::EngineConfig;
use crate::envelope::Envelope;
use crate::error::EarError;
use crate::instrument::{InstrumentKind, SampleSet, SoundSource};
use crate::loader::InstrumentLoader;
use crate::mixer::{Mixer, SharedMixer, VoiceId, VoiceSource, lock_mixer};
use crate::output::{AudioOutput, CpalOutput};
use crate::waveform::WaveformType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Created, output not started yet.
    Uninitialized,
    /// Output running, nothing scheduled so far.
    Ready,
    Playing,
    Idle,
    Closed,
}

/// One note of a batch, `offset` seconds after the batch's start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub frequency: f64,
    pub duration: f64,
    pub offset: f64,
}

impl NoteEvent {
    pub fn new(frequency: f64, duration: f64, offset: f64) -> Self {
        NoteEvent { frequency, duration, offset }
    }
}

/// Handle to a scheduled batch, times absolute on the engine clock.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheduled {
    pub voice_ids: Vec<VoiceId>,
    pub start: f64,
    pub end: f64,
}

impl Scheduled {
    pub fn len(&self) -> usize {
        self.voice_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voice_ids.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

enum Phase {
    Uninitialized,
    Running { clock: Arc<dyn AudioClock>, played: bool },
    Closed,
}

/// Schedules notes against an output clock.
///
/// The caller owns the engine. `initialize` starts the output, every play
/// call snapshots the clock once and places its voices relative to it, and
/// `close` tears everything down for good.
pub struct AudioEngine {
    config: EngineConfig,
    phase: Phase,
    output: Box<dyn AudioOutput>,
    mixer: SharedMixer,
    loader: Arc<InstrumentLoader>,
}

impl AudioEngine {
    /// Default output device, samples read from the configured directory.
    pub fn new(config: EngineConfig) -> Self {
        let loader = Arc::new(InstrumentLoader::from_dir(config.sample_root()));
        AudioEngine::with_output(config, Box::new(CpalOutput::new()), loader)
    }

    pub fn with_output(config: EngineConfig, output: Box<dyn AudioOutput>, loader: Arc<InstrumentLoader>) -> Self {
        let mixer = Mixer::shared(config.volume);
        AudioEngine {
            config,
            phase: Phase::Uninitialized,
            output,
            mixer,
            loader,
        }
    }

    /// Starts the output and preloads the selected instrument. A failed
    /// preload is logged and playback falls back to a sine voice.
    pub async fn initialize(&mut self) -> Result<(), EarError> {
        match self.phase {
            Phase::Closed => return Err(EarError::Closed),
            Phase::Running { .. } => return Ok(()),
            Phase::Uninitialized => {}
        }

        let clock = self.output.start(Arc::clone(&self.mixer))?;
        self.phase = Phase::Running { clock, played: false };
        debug!("Audio engine initialized, sound {}", self.config.sound);

        if let SoundSource::Sampled(instrument) = self.config.sound {
            if let Err(e) = self.loader.load(instrument).await {
                warn!("Preloading {} failed, using sine fallback: {}", instrument, e);
            }
        }
        Ok(())
    }

    pub fn state(&self) -> EngineState {
        match &self.phase {
            Phase::Uninitialized => EngineState::Uninitialized,
            Phase::Closed => EngineState::Closed,
            Phase::Running { played: false, .. } => EngineState::Ready,
            Phase::Running { clock, .. } => {
                let mut mixer = lock_mixer(&self.mixer);
                mixer.prune(clock.now());
                if mixer.is_empty() { EngineState::Idle } else { EngineState::Playing }
            }
        }
    }

    /// Seconds on the output clock, 0 before initialization.
    pub fn now(&self) -> f64 {
        match &self.phase {
            Phase::Running { clock, .. } => clock.now(),
            _ => 0.0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn loader(&self) -> &Arc<InstrumentLoader> {
        &self.loader
    }

    pub fn sound_type(&self) -> SoundSource {
        self.config.sound
    }

    pub fn volume(&self) -> f32 {
        self.config.volume
    }

    pub fn play_note(&mut self, frequency: f64, duration: f64, start_offset: f64) -> Result<Scheduled, EarError> {
        self.schedule(&[NoteEvent::new(frequency, duration, start_offset)])
    }

    /// All notes start together.
    pub fn play_chord(&mut self, frequencies: &[f64], duration: f64) -> Result<Scheduled, EarError> {
        let events: Vec<NoteEvent> = frequencies
            .iter()
            .map(|&frequency| NoteEvent::new(frequency, duration, 0.0))
            .collect();
        self.schedule(&events)
    }

    /// Note `i` starts `i * (note_duration + gap)` after the first.
    pub fn play_sequence(&mut self, frequencies: &[f64], note_duration: f64, gap: f64) -> Result<Scheduled, EarError> {
        let step = note_duration + gap;
        let events: Vec<NoteEvent> = frequencies
            .iter()
            .enumerate()
            .map(|(i, &frequency)| NoteEvent::new(frequency, note_duration, i as f64 * step))
            .collect();
        self.schedule(&events)
    }

    /// Schedules a batch against a single clock reading.
    pub fn schedule(&mut self, events: &[NoteEvent]) -> Result<Scheduled, EarError> {
        let (clock, played) = match &mut self.phase {
            Phase::Uninitialized => return Err(EarError::NotInitialized),
            Phase::Closed => return Err(EarError::Closed),
            Phase::Running { clock, played } => (Arc::clone(clock), played),
        };
        *played = true;

        let now = clock.now();
        let voicing = Voicing::resolve(&self.config, &self.loader);
        if let Voicing::Fallback(instrument) = &voicing {
            warn!("Instrument {} not loaded, using sine wave fallback", instrument);
        }

        let mut mixer = lock_mixer(&self.mixer);
        mixer.prune(now);

        let mut scheduled = Scheduled {
            voice_ids: Vec::with_capacity(events.len()),
            start: f64::INFINITY,
            end: now,
        };

        for event in events {
            if !(event.frequency.is_finite() && event.frequency > 0.0) {
                warn!("Skipping note with invalid frequency {}", event.frequency);
                continue;
            }
            let start = now + event.offset.max(0.0);
            let duration = event.duration.max(0.0);
            let (source, envelope) = voicing.voice_for(event.frequency);

            scheduled.voice_ids.push(mixer.add(event.frequency, start, duration, envelope, source));
            scheduled.start = scheduled.start.min(start);
            scheduled.end = scheduled.end.max(start + duration);
        }

        if scheduled.voice_ids.is_empty() {
            scheduled.start = now;
        }
        debug!(
            "Scheduled {} voices from {:.3}s to {:.3}s",
            scheduled.voice_ids.len(),
            scheduled.start,
            scheduled.end
        );
        Ok(scheduled)
    }

    /// True once every voice of the batch has ended or was stopped.
    pub fn is_finished(&self, scheduled: &Scheduled) -> bool {
        let Phase::Running { clock, .. } = &self.phase else {
            return true;
        };
        let now = clock.now();
        let mut mixer = lock_mixer(&self.mixer);
        mixer.prune(now);
        !mixer.contains_any(&scheduled.voice_ids)
    }

    pub fn active_voice_count(&self) -> usize {
        let Phase::Running { clock, .. } = &self.phase else {
            return 0;
        };
        let mut mixer = lock_mixer(&self.mixer);
        mixer.prune(clock.now());
        mixer.len()
    }

    /// Silences everything scheduled, started or not.
    pub fn stop_all_playback(&mut self) -> Result<(), EarError> {
        if let Phase::Closed = self.phase {
            return Err(EarError::Closed);
        }
        let stopped = lock_mixer(&self.mixer).clear();
        if stopped > 0 {
            debug!("Stopped {} voices", stopped);
        }
        Ok(())
    }

    /// Clamped to 0-1 and applied to voices already sounding.
    pub fn set_volume(&mut self, volume: f32) -> Result<(), EarError> {
        self.ensure_open()?;
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.config.volume = volume;
        lock_mixer(&self.mixer).set_master_volume(volume);
        Ok(())
    }

    /// Takes effect from the next scheduled note. A newly selected instrument
    /// is loaded right away once the engine runs; a failed load is logged and
    /// notes keep the sine fallback until a later load succeeds.
    pub async fn set_sound_type(&mut self, sound: SoundSource) -> Result<(), EarError> {
        self.ensure_open()?;
        if self.config.sound != sound {
            debug!("Sound type {} -> {}", self.config.sound, sound);
            self.config.sound = sound;
        }

        if let (Phase::Running { .. }, SoundSource::Sampled(instrument)) = (&self.phase, sound) {
            if let Err(e) = self.loader.load(instrument).await {
                warn!("Loading {} failed, using sine fallback: {}", instrument, e);
            }
        }
        Ok(())
    }

    pub async fn preload_instrument(&self, instrument: InstrumentKind) -> Result<(), EarError> {
        self.ensure_open()?;
        self.loader.load(instrument).await.map(|_| ())
    }

    /// Waveforms are always ready; instruments once their samples are cached.
    pub fn is_instrument_ready(&self) -> bool {
        match self.config.sound {
            SoundSource::Waveform(_) => true,
            SoundSource::Sampled(instrument) => self.loader.is_loaded(instrument),
        }
    }

    /// Stops output, drops all voices and cached samples. Further calls are no-ops.
    pub fn close(&mut self) {
        if let Phase::Closed = self.phase {
            return;
        }
        self.output.stop();
        lock_mixer(&self.mixer).clear();
        self.loader.dispose_all();
        self.phase = Phase::Closed;
        debug!("Audio engine closed");
    }

    fn ensure_open(&self) -> Result<(), EarError> {
        match self.phase {
            Phase::Closed => Err(EarError::Closed),
            _ => Ok(()),
        }
    }
}

/// How every note of one batch is voiced.
enum Voicing {
    Oscillator(WaveformType, Envelope),
    Sampled(Arc<SampleSet>, Envelope),
    Fallback(InstrumentKind),
}

impl Voicing {
    fn resolve(config: &EngineConfig, loader: &InstrumentLoader) -> Self {
        match config.sound {
            SoundSource::Waveform(waveform) => Voicing::Oscillator(waveform, config.envelope),
            SoundSource::Sampled(instrument) => match loader.get_loaded(instrument) {
                Some(set) if !set.is_empty() => Voicing::Sampled(set, Envelope::sampled(config.envelope.release)),
                _ => Voicing::Fallback(instrument),
            },
        }
    }

    fn voice_for(&self, frequency: f64) -> (VoiceSource, Envelope) {
        match self {
            Voicing::Oscillator(waveform, envelope) => (VoiceSource::Oscillator(*waveform), *envelope),
            Voicing::Sampled(set, envelope) => match set.nearest(frequency) {
                Some((sample, rate)) => (
                    VoiceSource::Sampled {
                        data: sample.data.clone(),
                        rate,
                    },
                    *envelope,
                ),
                None => (VoiceSource::Oscillator(WaveformType::Sine), Envelope::FALLBACK),
            },
            Voicing::Fallback(_) => (VoiceSource::Oscillator(WaveformType::Sine), Envelope::FALLBACK),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::instrument::{SampleData, SampledNote};
    use crate::loader::SampleSource;
    use crate::note::{Key, NoteOctave};
    use crate::output::SilentOutput;

    struct OneNote;

    impl SampleSource for OneNote {
        fn load(&self, instrument: InstrumentKind) -> Result<SampleSet, EarError> {
            let data = SampleData {
                samples: Arc::new(vec![0.1; 64]),
                sample_rate: 44100,
            };
            Ok(SampleSet::new(instrument, vec![SampledNote { note: NoteOctave::new(Key::A, 4), data }]))
        }
    }

    struct Broken;

    impl SampleSource for Broken {
        fn load(&self, instrument: InstrumentKind) -> Result<SampleSet, EarError> {
            Err(EarError::SampleLoad { instrument, message: "offline".to_string() })
        }
    }

    fn engine_with(source: Arc<dyn SampleSource>, sound: SoundSource) -> (AudioEngine, Arc<ManualClock>) {
        let output = SilentOutput::new();
        let clock = output.clock();
        let config = EngineConfig { sound, ..EngineConfig::default() };
        let engine = AudioEngine::with_output(config, Box::new(output), Arc::new(InstrumentLoader::new(source)));
        (engine, clock)
    }

    fn engine() -> (AudioEngine, Arc<ManualClock>) {
        engine_with(Arc::new(OneNote), SoundSource::default())
    }

    fn sources(engine: &AudioEngine) -> Vec<VoiceSource> {
        lock_mixer(&engine.mixer).voices().iter().map(|v| v.source.clone()).collect()
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let (mut engine, clock) = engine();
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert_eq!(engine.play_note(440.0, 1.0, 0.0), Err(EarError::NotInitialized));
        assert!(engine.stop_all_playback().is_ok());

        engine.initialize().await.unwrap();
        engine.initialize().await.unwrap();
        assert_eq!(engine.state(), EngineState::Ready);

        engine.play_note(440.0, 1.0, 0.0).unwrap();
        assert_eq!(engine.state(), EngineState::Playing);
        clock.advance(1.0);
        assert_eq!(engine.state(), EngineState::Idle);

        engine.close();
        engine.close();
        assert_eq!(engine.state(), EngineState::Closed);
        assert_eq!(engine.initialize().await, Err(EarError::Closed));
        assert_eq!(engine.play_chord(&[440.0], 1.0), Err(EarError::Closed));
        assert_eq!(engine.set_volume(0.5), Err(EarError::Closed));
    }

    #[tokio::test]
    async fn test_sequence_offsets_share_one_snapshot() {
        let (mut engine, clock) = engine();
        engine.initialize().await.unwrap();
        clock.set(3.0);

        let scheduled = engine.play_sequence(&[261.63, 329.63, 392.0], 0.4, 0.05).unwrap();
        let starts: Vec<f64> = lock_mixer(&engine.mixer).voices().iter().map(|v| v.start).collect();

        assert_eq!(scheduled.len(), 3);
        assert_eq!(starts[0], 3.0);
        assert!((starts[1] - 3.45).abs() < 1e-9);
        assert!((starts[2] - 3.9).abs() < 1e-9);
        assert!((scheduled.end - 4.3).abs() < 1e-9);
        assert!((scheduled.duration() - 1.3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_stop_all_playback() {
        let (mut engine, clock) = engine();
        engine.initialize().await.unwrap();
        assert!(engine.stop_all_playback().is_ok());
        assert_eq!(engine.active_voice_count(), 0);

        let chord = engine.play_chord(&[261.63, 329.63, 392.0], 2.5).unwrap();
        let later = engine.play_note(440.0, 1.0, 5.0).unwrap();
        assert_eq!(engine.active_voice_count(), 4);
        assert!(!engine.is_finished(&chord));

        clock.advance(0.5);
        engine.stop_all_playback().unwrap();
        assert_eq!(engine.active_voice_count(), 0);
        assert!(engine.is_finished(&chord));
        assert!(engine.is_finished(&later));

        clock.advance(10.0);
        assert!(engine.stop_all_playback().is_ok());
    }

    #[tokio::test]
    async fn test_voices_finish_naturally() {
        let (mut engine, clock) = engine();
        engine.initialize().await.unwrap();
        let note = engine.play_note(440.0, 0.5, 0.25).unwrap();
        assert_eq!(note.start, 0.25);
        assert_eq!(note.end, 0.75);

        clock.advance(0.7);
        assert!(!engine.is_finished(&note));
        clock.advance(0.1);
        assert!(engine.is_finished(&note));
        assert_eq!(engine.active_voice_count(), 0);
    }

    #[tokio::test]
    async fn test_unloaded_instrument_falls_back_to_sine() {
        let (mut engine, _clock) = engine_with(Arc::new(Broken), SoundSource::Sampled(InstrumentKind::Piano));
        engine.initialize().await.unwrap();
        assert!(!engine.is_instrument_ready());

        engine.play_note(440.0, 1.0, 0.0).unwrap();
        let voices = lock_mixer(&engine.mixer).voices().to_vec();
        assert!(matches!(voices[0].source, VoiceSource::Oscillator(WaveformType::Sine)));
        assert_eq!(voices[0].envelope, Envelope::FALLBACK);

        let err = engine.preload_instrument(InstrumentKind::Piano).await.unwrap_err();
        assert!(matches!(err, EarError::SampleLoad { .. }));
    }

    #[tokio::test]
    async fn test_loaded_instrument_uses_samples() {
        let (mut engine, _clock) = engine_with(Arc::new(OneNote), SoundSource::Sampled(InstrumentKind::Flute));
        engine.initialize().await.unwrap();
        assert!(engine.is_instrument_ready());

        engine.play_note(880.0, 1.0, 0.0).unwrap();
        match &sources(&engine)[0] {
            VoiceSource::Sampled { rate, .. } => assert!((rate - 2.0).abs() < 1e-9),
            other => panic!("expected a sampled voice, got {:?}", other),
        }

        engine.set_sound_type(SoundSource::Waveform(WaveformType::Triangle)).await.unwrap();
        engine.play_note(440.0, 1.0, 0.0).unwrap();
        assert!(matches!(sources(&engine)[1], VoiceSource::Oscillator(WaveformType::Triangle)));
    }

    #[tokio::test]
    async fn test_selecting_instrument_after_init_loads_it() {
        let (mut engine, _clock) = engine();
        engine.initialize().await.unwrap();
        assert!(!engine.loader().is_loaded(InstrumentKind::Piano));

        engine.set_sound_type(SoundSource::Sampled(InstrumentKind::Piano)).await.unwrap();
        assert!(engine.is_instrument_ready());

        engine.play_note(440.0, 1.0, 0.0).unwrap();
        assert!(matches!(sources(&engine)[0], VoiceSource::Sampled { .. }));
    }

    #[tokio::test]
    async fn test_selecting_broken_instrument_keeps_fallback() {
        let (mut engine, _clock) = engine_with(Arc::new(Broken), SoundSource::default());
        engine.initialize().await.unwrap();

        engine.set_sound_type(SoundSource::Sampled(InstrumentKind::Violin)).await.unwrap();
        assert!(!engine.is_instrument_ready());
        assert_eq!(engine.sound_type(), SoundSource::Sampled(InstrumentKind::Violin));

        engine.play_note(440.0, 1.0, 0.0).unwrap();
        assert!(matches!(sources(&engine)[0], VoiceSource::Oscillator(WaveformType::Sine)));
    }

    #[tokio::test]
    async fn test_volume_is_clamped_and_live() {
        let (mut engine, _clock) = engine();
        engine.set_volume(1.7).unwrap();
        assert_eq!(engine.volume(), 1.0);
        engine.set_volume(-2.0).unwrap();
        assert_eq!(lock_mixer(&engine.mixer).master_volume(), 0.0);
    }

    #[tokio::test]
    async fn test_invalid_frequencies_are_skipped() {
        let (mut engine, clock) = engine();
        engine.initialize().await.unwrap();
        clock.set(2.0);
        let scheduled = engine.play_chord(&[f64::NAN, 0.0, -5.0], 1.0).unwrap();
        assert!(scheduled.is_empty());
        assert_eq!(scheduled.start, 2.0);
        assert_eq!(scheduled.end, 2.0);
        assert!(engine.is_finished(&scheduled));
    }
}
