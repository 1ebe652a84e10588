use std::path::{Path, PathBuf};

use crate::envelope::Envelope;
use crate::error::EarError;
use crate::instrument::SoundSource;

/// Directory searched for instrument samples when none is configured.
pub const DEFAULT_SAMPLE_ROOT: &str = "samples";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Master gain, 0.0 to 1.0.
    pub volume: f32,
    pub envelope: Envelope,
    pub sound: SoundSource,
    pub sample_root: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            volume: 0.3,
            envelope: Envelope::default(),
            sound: SoundSource::default(),
            sample_root: None,
        }
    }
}

impl EngineConfig {
    /// Reads `key: value` lines. Blank lines and `//` comments are skipped.
    ///
    /// ```text
    /// // softer pad
    /// volume: 0.5
    /// attack: 0.05
    /// release: 0.6
    /// sound: piano
    /// samples: assets/samples
    /// ```
    pub fn parse(content: &str) -> Result<Self, EarError> {
        let mut config = EngineConfig::default();

        macro_rules! parse_field {
            ($line:expr, $prefix:expr, $field:expr) => {
                if let Some(v) = $line.strip_prefix($prefix) {
                    $field = v.trim().parse()
                        .map_err(|_| EarError::ConfigError(format!("Invalid {} {}", $prefix, v.trim())))?;
                    continue;
                }
            };
        }

        for line in content.lines() {
            let line = line.split("//").next().unwrap_or("").trim();
            if line.is_empty() { continue; }

            parse_field!(line, "volume:", config.volume);
            parse_field!(line, "attack:", config.envelope.attack);
            parse_field!(line, "decay:", config.envelope.decay);
            parse_field!(line, "sustain:", config.envelope.sustain);
            parse_field!(line, "release:", config.envelope.release);

            if let Some(v) = line.strip_prefix("waveform:") {
                let waveform = v.trim().parse().map_err(|e: EarError| EarError::ConfigError(e.to_string()))?;
                config.sound = SoundSource::Waveform(waveform);
            } else if let Some(v) = line.strip_prefix("sound:") {
                config.sound = v.trim().parse().map_err(|e: EarError| EarError::ConfigError(e.to_string()))?;
            } else if let Some(v) = line.strip_prefix("samples:") {
                config.sample_root = Some(PathBuf::from(v.trim()));
            } else {
                return Err(EarError::ConfigError(format!("Unknown setting: {}", line)));
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, EarError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EarError::FileError(format!("{}: {}", path.display(), e)))?;
        EngineConfig::parse(&content)
    }

    pub fn validate(&self) -> Result<(), EarError> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(EarError::ConfigError(format!("volume must be within 0-1, got {}", self.volume)));
        }
        if !(0.0..=1.0).contains(&self.envelope.sustain) {
            return Err(EarError::ConfigError(format!("sustain must be within 0-1, got {}", self.envelope.sustain)));
        }
        let times = [
            ("attack", self.envelope.attack),
            ("decay", self.envelope.decay),
            ("release", self.envelope.release),
        ];
        for (name, value) in times {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(EarError::ConfigError(format!("{} must be a non-negative time, got {}", name, value)));
            }
        }
        Ok(())
    }

    pub fn sample_root(&self) -> PathBuf {
        self.sample_root.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_SAMPLE_ROOT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::InstrumentKind;
    use crate::waveform::WaveformType;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.volume, 0.3);
        assert_eq!(config.envelope, Envelope { attack: 0.01, decay: 0.1, sustain: 0.7, release: 0.3 });
        assert_eq!(config.sound, SoundSource::Waveform(WaveformType::Sine));
        assert_eq!(config.sample_root(), PathBuf::from("samples"));
    }

    #[test]
    fn test_parse() {
        let config = EngineConfig::parse(
            "// practice room\n\
             volume: 0.5\n\
             \n\
             attack: 0.02 // softer\n\
             release: 0.6\n\
             sound: Violin\n\
             samples: /opt/samples\n",
        )
        .unwrap();
        assert_eq!(config.volume, 0.5);
        assert_eq!(config.envelope.attack, 0.02);
        assert_eq!(config.envelope.decay, 0.1);
        assert_eq!(config.envelope.release, 0.6);
        assert_eq!(config.sound, SoundSource::Sampled(InstrumentKind::Violin));
        assert_eq!(config.sample_root(), PathBuf::from("/opt/samples"));

        let config = EngineConfig::parse("waveform: square").unwrap();
        assert_eq!(config.sound, SoundSource::Waveform(WaveformType::Square));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(EngineConfig::parse("volume: loud"), Err(EarError::ConfigError(_))));
        assert!(matches!(EngineConfig::parse("volume: 1.5"), Err(EarError::ConfigError(_))));
        assert!(matches!(EngineConfig::parse("attack: -0.1"), Err(EarError::ConfigError(_))));
        assert!(matches!(EngineConfig::parse("waveform: noise"), Err(EarError::ConfigError(_))));
        assert!(matches!(EngineConfig::parse("tempo: 120"), Err(EarError::ConfigError(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(&dir.path().join("engine.cfg")).unwrap_err();
        assert!(matches!(err, EarError::FileError(_)));
    }

    #[test]
    fn test_load_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.cfg");

        std::fs::write(&path, "volume: 1.5\n").unwrap();
        assert!(matches!(EngineConfig::load(&path), Err(EarError::ConfigError(_))));

        std::fs::write(&path, "volume: 0.5 // quieter\nsound: flute\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.volume, 0.5);
        assert_eq!(config.sound, SoundSource::Sampled(InstrumentKind::Flute));
    }
}
