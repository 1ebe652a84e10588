use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveformType {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl WaveformType {
    pub const ALL: [WaveformType; 4] = [
        WaveformType::Sine,
        WaveformType::Square,
        WaveformType::Triangle,
        WaveformType::Sawtooth,
    ];

    pub fn generate_sample(&self, phase: f32) -> f32 { // Phase should be in the range [0.0, 1.0)
        match self {
            WaveformType::Sine => (phase * std::f32::consts::TAU).sin(),
            WaveformType::Square => if phase < 0.5 { 1.0 } else { -1.0 },
            WaveformType::Sawtooth => phase * 2.0 - 1.0,
            WaveformType::Triangle => {
                if phase < 0.5 { phase * 4.0 - 1.0 } else { 3.0 - phase * 4.0 }
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WaveformType::Sine => "sine",
            WaveformType::Square => "square",
            WaveformType::Triangle => "triangle",
            WaveformType::Sawtooth => "sawtooth",
        }
    }
}

impl fmt::Display for WaveformType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WaveformType {
    type Err = EarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sine" => Ok(WaveformType::Sine),
            "square" => Ok(WaveformType::Square),
            "triangle" => Ok(WaveformType::Triangle),
            "sawtooth" | "saw" => Ok(WaveformType::Sawtooth),
            _ => Err(EarError::ParseError("Unknown Waveform".to_string())),
        }
    }
}
