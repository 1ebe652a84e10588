/// Linear ADSR with times in seconds and sustain as a gain in [0, 1].
///
/// A note of `duration` ramps 0 -> 1 over `attack`, 1 -> `sustain` over
/// `decay`, holds, then ramps to 0 over the final `release` so that it is
/// silent exactly at `duration`. Notes shorter than `attack + decay + release`
/// get all three ramps scaled down by the same factor and no hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Default for Envelope {
    fn default() -> Self {
        Envelope {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

impl Envelope {
    /// Used when a sampled instrument is requested but not loaded.
    pub const FALLBACK: Envelope = Envelope {
        attack: 0.01,
        decay: 0.0,
        sustain: 1.0,
        release: 0.1,
    };

    /// Samples carry their own attack, only the tail is shaped.
    pub fn sampled(release: f64) -> Self {
        Envelope {
            attack: 0.0,
            decay: 0.0,
            sustain: 1.0,
            release,
        }
    }

    /// Sanitized copy fitted into a note of `duration`.
    pub fn shape(&self, duration: f64) -> Envelope {
        let duration = duration.max(0.0);
        let mut attack = self.attack.max(0.0);
        let mut decay = self.decay.max(0.0);
        let mut release = self.release.max(0.0);
        let total = attack + decay + release;

        if total > duration {
            let scale = duration / total;
            attack *= scale;
            decay *= scale;
            release *= scale;
        }

        Envelope {
            attack,
            decay,
            sustain: self.sustain.clamp(0.0, 1.0),
            release,
        }
    }

    /// Gain at `time` seconds after the note started.
    pub fn level_at(&self, time: f64, duration: f64) -> f64 {
        if time < 0.0 || time >= duration || duration <= 0.0 {
            return 0.0;
        }
        let env = self.shape(duration);
        let attack_end = env.attack;
        let decay_end = attack_end + env.decay;
        let release_start = duration - env.release;

        let level = if time < attack_end {
            time / env.attack
        } else if time < decay_end {
            let decay_progress = (time - attack_end) / env.decay;
            1.0 - decay_progress * (1.0 - env.sustain)
        } else if time < release_start {
            env.sustain
        } else {
            env.sustain * ((duration - time) / env.release).min(1.0)
        };

        level.clamp(0.0, 1.0)
    }

    /// `(time, gain)` breakpoints for a note starting at `start`, ending on `(start + duration, 0)`.
    pub fn breakpoints(&self, start: f64, duration: f64) -> [(f64, f64); 5] {
        let duration = duration.max(0.0);
        let env = self.shape(duration);
        let end = start + duration;
        [
            (start, 0.0),
            (start + env.attack, 1.0),
            (start + env.attack + env.decay, env.sustain),
            (end - env.release, env.sustain),
            (end, 0.0),
        ]
    }
}
