//! Audio devices the mixer renders into.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use tracing::{debug, error};

use crate::clock::{AudioClock, ManualClock, StreamClock};
use crate::error::EarError;
use crate::mixer::{SharedMixer, lock_mixer};

pub trait AudioOutput {
    /// Starts pulling audio from `mixer` and returns the clock scheduling must use.
    fn start(&mut self, mixer: SharedMixer) -> Result<Arc<dyn AudioClock>, EarError>;

    /// Stops rendering. Safe to call when not started.
    fn stop(&mut self);
}

/// The system's default output device.
#[derive(Default)]
pub struct CpalOutput {
    stream: Option<cpal::Stream>,
}

impl CpalOutput {
    pub fn new() -> Self {
        CpalOutput { stream: None }
    }
}

impl AudioOutput for CpalOutput {
    fn start(&mut self, mixer: SharedMixer) -> Result<Arc<dyn AudioClock>, EarError> {
        self.stop();

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EarError::AudioError("No audio output device available".to_string()))?;
        let supported = device
            .default_output_config()
            .map_err(|e| EarError::AudioError(format!("Failed to get default output config: {}", e)))?;

        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.config();
        let clock = StreamClock::new(config.sample_rate.0);

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer, clock.clone())?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer, clock.clone())?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer, clock.clone())?,
            other => {
                return Err(EarError::AudioError(format!("Unsupported sample format: {:?}", other)));
            }
        };

        stream
            .play()
            .map_err(|e| EarError::AudioError(format!("Failed to play audio stream: {}", e)))?;

        debug!(
            "Audio stream started: {} Hz, {} channels, {:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        self.stream = Some(stream);
        let clock: Arc<dyn AudioClock> = Arc::new(clock);
        Ok(clock)
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                debug!("Pausing audio stream failed: {}", e);
            }
            drop(stream);
            debug!("Audio stream stopped");
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: SharedMixer,
    clock: StreamClock,
) -> Result<cpal::Stream, EarError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels.max(1) as usize;
    let sample_rate = config.sample_rate.0;
    let mut scratch: Vec<f32> = vec![0.0; 4096];

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if scratch.len() < data.len() {
                    scratch.resize(data.len(), 0.0);
                }
                let block = &mut scratch[..data.len()];
                let start_frame = clock.advance((data.len() / channels) as u64);

                lock_mixer(&mixer).render(block, channels, sample_rate, start_frame);

                for (out, &sample) in data.iter_mut().zip(block.iter()) {
                    *out = T::from_sample(sample);
                }
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| EarError::AudioError(format!("Failed to build audio stream: {}", e)))
}

/// Renders nothing. Time only moves when the caller advances the clock.
pub struct SilentOutput {
    clock: Arc<ManualClock>,
    running: bool,
}

impl SilentOutput {
    pub fn new() -> Self {
        SilentOutput::with_clock(Arc::new(ManualClock::new(0.0)))
    }

    pub fn with_clock(clock: Arc<ManualClock>) -> Self {
        SilentOutput { clock, running: false }
    }

    pub fn clock(&self) -> Arc<ManualClock> {
        Arc::clone(&self.clock)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for SilentOutput {
    fn default() -> Self {
        SilentOutput::new()
    }
}

impl AudioOutput for SilentOutput {
    fn start(&mut self, _mixer: SharedMixer) -> Result<Arc<dyn AudioClock>, EarError> {
        self.running = true;
        let clock: Arc<dyn AudioClock> = self.clock.clone();
        Ok(clock)
    }

    fn stop(&mut self) {
        self.running = false;
    }
}
