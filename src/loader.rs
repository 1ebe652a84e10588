//! Sampled-instrument loading with a shared per-instrument cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::EarError;
use crate::instrument::{InstrumentKind, SampleData, SampleSet, SampledNote, sample_file_stem};

/// Where an instrument's recordings come from. `load` blocks.
pub trait SampleSource: Send + Sync + 'static {
    fn load(&self, instrument: InstrumentKind) -> Result<SampleSet, EarError>;
}

/// Reads `<root>/<folder>/<note>.wav`, e.g. `samples/guitar-acoustic/Ds4.wav`.
#[derive(Debug, Clone)]
pub struct WavSampleSource {
    root: PathBuf,
}

impl WavSampleSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        WavSampleSource { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SampleSource for WavSampleSource {
    fn load(&self, instrument: InstrumentKind) -> Result<SampleSet, EarError> {
        let dir = self.root.join(instrument.folder());
        let mut notes = Vec::new();

        for note in instrument.sample_notes() {
            let path = dir.join(format!("{}.wav", sample_file_stem(note)));
            if !path.is_file() {
                debug!("No sample for {} at {}", note, path.display());
                continue;
            }
            let data = read_wav(&path).map_err(|message| EarError::SampleLoad { instrument, message })?;
            notes.push(SampledNote { note, data });
        }

        if notes.is_empty() {
            return Err(EarError::SampleLoad {
                instrument,
                message: format!("no samples found in {}", dir.display()),
            });
        }

        debug!("Loaded {} samples for {}", notes.len(), instrument);
        Ok(SampleSet::new(instrument, notes))
    }
}

/// Decodes a WAV file to mono f32.
pub fn read_wav(path: &Path) -> Result<SampleData, String> {
    let mut reader = hound::WavReader::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| format!("{}: {}", path.display(), e))?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|r| r.map(|s| s as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| format!("{}: {}", path.display(), e))?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok(SampleData {
        samples: Arc::new(samples),
        sample_rate: spec.sample_rate,
    })
}

type Slot = Arc<OnceCell<Arc<SampleSet>>>;

/// Shared cache of loaded instruments. Concurrent loads of one instrument
/// share a single in-flight load; a failed load leaves the slot empty.
pub struct InstrumentLoader {
    source: Arc<dyn SampleSource>,
    slots: Mutex<HashMap<InstrumentKind, Slot>>,
}

impl InstrumentLoader {
    pub fn new(source: Arc<dyn SampleSource>) -> Self {
        InstrumentLoader {
            source,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_dir(root: impl Into<PathBuf>) -> Self {
        InstrumentLoader::new(Arc::new(WavSampleSource::new(root)))
    }

    fn slot(&self, instrument: InstrumentKind) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(instrument).or_default())
    }

    pub async fn load(&self, instrument: InstrumentKind) -> Result<Arc<SampleSet>, EarError> {
        let slot = self.slot(instrument);
        let source = Arc::clone(&self.source);

        let set = slot
            .get_or_try_init(|| async move {
                debug!("Loading instrument {}", instrument);
                let set = tokio::task::spawn_blocking(move || source.load(instrument))
                    .await
                    .map_err(|e| EarError::SampleLoad {
                        instrument,
                        message: e.to_string(),
                    })??;
                Ok::<_, EarError>(Arc::new(set))
            })
            .await
            .inspect_err(|e| warn!("{}", e))?;

        Ok(Arc::clone(set))
    }

    /// The cached set, without waiting on an in-flight load.
    pub fn get_loaded(&self, instrument: InstrumentKind) -> Option<Arc<SampleSet>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(&instrument).and_then(|slot| slot.get().cloned())
    }

    pub fn is_loaded(&self, instrument: InstrumentKind) -> bool {
        self.get_loaded(instrument).is_some()
    }

    /// Forgets every cached instrument.
    pub fn dispose_all(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if !slots.is_empty() {
            debug!("Disposing {} instrument slots", slots.len());
        }
        slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{Key, NoteOctave};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingSource {
        calls: AtomicUsize,
        failures: usize,
    }

    impl CountingSource {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(CountingSource {
                calls: AtomicUsize::new(0),
                failures,
            })
        }
    }

    impl SampleSource for CountingSource {
        fn load(&self, instrument: InstrumentKind) -> Result<SampleSet, EarError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            if call < self.failures {
                return Err(EarError::SampleLoad {
                    instrument,
                    message: "network down".to_string(),
                });
            }
            let data = SampleData {
                samples: Arc::new(vec![0.0; 8]),
                sample_rate: 8000,
            };
            Ok(SampleSet::new(
                instrument,
                vec![SampledNote {
                    note: NoteOctave::new(Key::A, 4),
                    data,
                }],
            ))
        }
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let source = CountingSource::new(0);
        let loader = InstrumentLoader::new(source.clone());

        let (a, b, c) = tokio::join!(
            loader.load(InstrumentKind::Piano),
            loader.load(InstrumentKind::Piano),
            loader.load(InstrumentKind::Piano),
        );

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));

        loader.load(InstrumentKind::Piano).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(loader.is_loaded(InstrumentKind::Piano));
        assert!(!loader.is_loaded(InstrumentKind::Violin));
    }

    #[tokio::test]
    async fn test_failed_load_can_be_retried() {
        let source = CountingSource::new(1);
        let loader = InstrumentLoader::new(source.clone());

        let err = loader.load(InstrumentKind::Trumpet).await.unwrap_err();
        assert!(matches!(err, EarError::SampleLoad { instrument: InstrumentKind::Trumpet, .. }));
        assert!(!loader.is_loaded(InstrumentKind::Trumpet));

        loader.load(InstrumentKind::Trumpet).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(loader.is_loaded(InstrumentKind::Trumpet));

        loader.dispose_all();
        assert!(loader.get_loaded(InstrumentKind::Trumpet).is_none());
    }

    fn write_wav(path: &Path, spec: hound::WavSpec, write: impl FnOnce(&mut hound::WavWriter<std::io::BufWriter<std::fs::File>>)) {
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        write(&mut writer);
        writer.finalize().unwrap();
    }

    #[test]
    fn test_wav_source_reads_available_notes() {
        let dir = tempfile::tempdir().unwrap();
        let flute = dir.path().join("flute");
        std::fs::create_dir_all(&flute).unwrap();

        let int_spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&flute.join("A4.wav"), int_spec, |w| {
            for _ in 0..4 {
                w.write_sample(16384_i16).unwrap();
            }
        });

        let float_spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        write_wav(&flute.join("C5.wav"), float_spec, |w| {
            for _ in 0..3 {
                w.write_sample(0.25_f32).unwrap();
                w.write_sample(0.75_f32).unwrap();
            }
        });

        let set = WavSampleSource::new(dir.path()).load(InstrumentKind::Flute).unwrap();
        assert_eq!(set.notes.len(), 2);

        let a4 = &set.notes[0];
        assert_eq!(a4.note, NoteOctave::new(Key::A, 4));
        assert_eq!(a4.data.sample_rate, 8000);
        assert!(a4.data.samples.iter().all(|&s| s == 0.5));

        let c5 = &set.notes[1];
        assert_eq!(c5.data.samples.len(), 3);
        assert!(c5.data.samples.iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_wav_source_without_files_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = WavSampleSource::new(dir.path()).load(InstrumentKind::Guitar).unwrap_err();
        match err {
            EarError::SampleLoad { instrument, message } => {
                assert_eq!(instrument, InstrumentKind::Guitar);
                assert!(message.contains("guitar-acoustic"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
