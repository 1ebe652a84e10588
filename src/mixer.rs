use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::envelope::Envelope;
use crate::instrument::SampleData;
use crate::waveform::WaveformType;

pub type VoiceId = u64;

pub type SharedMixer = Arc<Mutex<Mixer>>;

/// Locks the mixer, recovering the guard if a render callback panicked while holding it.
pub fn lock_mixer(mixer: &SharedMixer) -> MutexGuard<'_, Mixer> {
    mixer.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
pub enum VoiceSource {
    Oscillator(WaveformType),
    /// Recorded note played back `rate` times faster than recorded.
    Sampled { data: SampleData, rate: f64 },
}

/// One scheduled note, all times absolute on the engine clock.
#[derive(Debug, Clone)]
pub struct Voice {
    pub id: VoiceId,
    pub frequency: f64,
    pub start: f64,
    pub duration: f64,
    pub envelope: Envelope,
    pub source: VoiceSource,
}

impl Voice {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    fn sample(&self, time: f64) -> f32 {
        let time_in_note = time - self.start;
        let level = self.envelope.level_at(time_in_note, self.duration);
        if level <= 0.0 {
            return 0.0;
        }

        let sample = match &self.source {
            VoiceSource::Oscillator(waveform) => {
                let phase = (time_in_note * self.frequency).fract() as f32;
                waveform.generate_sample(phase)
            }
            VoiceSource::Sampled { data, rate } => data.sample_at(time_in_note, *rate),
        };

        sample * level as f32
    }
}

/// Voices waiting to start or still sounding. Shared between the engine,
/// which schedules and cancels, and the output callback, which renders.
#[derive(Debug)]
pub struct Mixer {
    voices: Vec<Voice>,
    next_id: VoiceId,
    master_volume: f32,
}

impl Mixer {
    pub fn new(master_volume: f32) -> Self {
        Mixer {
            voices: Vec::new(),
            next_id: 1,
            master_volume: master_volume.clamp(0.0, 1.0),
        }
    }

    pub fn shared(master_volume: f32) -> SharedMixer {
        Arc::new(Mutex::new(Mixer::new(master_volume)))
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    pub fn add(&mut self, frequency: f64, start: f64, duration: f64, envelope: Envelope, source: VoiceSource) -> VoiceId {
        let id = self.next_id;
        self.next_id += 1;
        self.voices.push(Voice {
            id,
            frequency,
            start,
            duration: duration.max(0.0),
            envelope,
            source,
        });
        id
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn contains_any(&self, ids: &[VoiceId]) -> bool {
        self.voices.iter().any(|v| ids.contains(&v.id))
    }

    /// Drops every voice that has finished sounding by `now`.
    pub fn prune(&mut self, now: f64) {
        self.voices.retain(|v| v.end() > now);
    }

    /// Returns the number of voices removed.
    pub fn clear(&mut self) -> usize {
        let count = self.voices.len();
        self.voices.clear();
        count
    }

    /// Mixes into an interleaved buffer starting at absolute frame `start_frame`.
    pub fn render(&mut self, data: &mut [f32], channels: usize, sample_rate: u32, start_frame: u64) {
        let channels = channels.max(1);
        let sample_rate = sample_rate.max(1) as f64;
        let mut frame_index = start_frame;

        for frame in data.chunks_mut(channels) {
            let time = frame_index as f64 / sample_rate;
            let mut output = 0.0;
            for voice in &self.voices {
                if time >= voice.start && time < voice.end() {
                    output += voice.sample(time);
                }
            }

            let final_output = (output * self.master_volume).clamp(-1.0, 1.0);
            frame.fill(final_output);
            frame_index += 1;
        }

        self.prune(frame_index as f64 / sample_rate);
    }
}
