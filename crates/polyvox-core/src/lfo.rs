//! Low Frequency Oscillator for modulation.
//!
//! One bipolar value per sample in [-depth, +depth]. Five waveforms,
//! including a seeded sample-and-hold ([`LfoWaveform::RandomStep`]).

use core::f32::consts::PI;
use libm::{ceilf, sinf};

use crate::noise::Noise;

/// Lowest accepted LFO rate in Hz.
pub const MIN_LFO_RATE_HZ: f32 = 0.01;

/// LFO waveform type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LfoWaveform {
    /// Linear ramp -1 → +1 → -1.
    #[default]
    Triangle,
    /// Rising ramp `2·phase − 1`.
    SawUp,
    /// +1 for the first half cycle, -1 for the second.
    Square,
    /// `sin(2π·phase)`.
    Sine,
    /// Sample-and-hold: a uniform random value held for `⌈SR/rate⌉` samples.
    RandomStep,
}

impl LfoWaveform {
    /// All waveforms in declaration order (matches the integer encoding).
    pub const ALL: [LfoWaveform; 5] = [
        LfoWaveform::Triangle,
        LfoWaveform::SawUp,
        LfoWaveform::Square,
        LfoWaveform::Sine,
        LfoWaveform::RandomStep,
    ];

    /// Decode from the integer parameter encoding.
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Integer parameter encoding.
    pub fn index(self) -> i32 {
        self as i32
    }

    /// Stable lowercase name used in presets.
    pub fn name(self) -> &'static str {
        match self {
            LfoWaveform::Triangle => "triangle",
            LfoWaveform::SawUp => "saw_up",
            LfoWaveform::Square => "square",
            LfoWaveform::Sine => "sine",
            LfoWaveform::RandomStep => "random_step",
        }
    }

    /// Parse a preset name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|w| w.name().eq_ignore_ascii_case(name))
    }
}

/// Low Frequency Oscillator shared by all voices.
///
/// The phase is advanced *before* evaluation, so the first value after a
/// reset is already one increment into the cycle.
///
/// # Example
///
/// ```rust
/// use polyvox_core::{Lfo, LfoWaveform};
///
/// let mut lfo = Lfo::new(44100.0);
/// lfo.set_rate(5.0);
/// lfo.set_waveform(LfoWaveform::Sine);
///
/// let value = lfo.step();
/// assert!((-1.0..=1.0).contains(&value));
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    sample_rate: f32,
    rate: f32,
    depth: f32,
    /// Current phase position [0.0, 1.0)
    phase: f32,
    waveform: LfoWaveform,
    noise: Noise,
    held_value: f32,
    samples_per_step: u32,
    samples_until_step: u32,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Lfo {
    /// Create a triangle LFO at 1 Hz with full depth.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_seed(sample_rate, 0)
    }

    /// Create an LFO whose sample-and-hold stream starts from `seed`.
    pub fn with_seed(sample_rate: f32, seed: u64) -> Self {
        let mut lfo = Self {
            sample_rate,
            rate: 1.0,
            depth: 1.0,
            phase: 0.0,
            waveform: LfoWaveform::Triangle,
            noise: Noise::new(seed),
            held_value: 0.0,
            samples_per_step: 1,
            samples_until_step: 0,
        };
        lfo.update_samples_per_step();
        lfo
    }

    /// Set rate in Hz (clamped to at least 0.01 Hz).
    pub fn set_rate(&mut self, rate_hz: f32) {
        self.rate = rate_hz.max(MIN_LFO_RATE_HZ);
        self.update_samples_per_step();
    }

    /// Current rate in Hz.
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Set output depth (0.0 to 1.0).
    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    /// Current depth.
    pub fn depth(&self) -> f32 {
        self.depth
    }

    /// Select the waveform.
    ///
    /// Switching to [`LfoWaveform::RandomStep`] forces a fresh draw on the
    /// next step; switching to any other shape restarts the cycle at phase 0.
    pub fn set_waveform(&mut self, waveform: LfoWaveform) {
        self.waveform = waveform;
        if waveform == LfoWaveform::RandomStep {
            self.samples_until_step = 0;
        } else {
            self.phase = 0.0;
        }
    }

    /// Current waveform.
    pub fn waveform(&self) -> LfoWaveform {
        self.waveform
    }

    /// Current phase (0.0 - 1.0)
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Restart the cycle and the sample-and-hold countdown.
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
        self.samples_until_step = 0;
    }

    /// Change sample rate, keeping the rate in Hz.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_samples_per_step();
    }

    /// Advance one sample and return the scaled output.
    #[inline]
    pub fn step(&mut self) -> f32 {
        let value = if self.waveform == LfoWaveform::RandomStep {
            if self.samples_until_step == 0 {
                self.held_value = self.noise.next_bipolar();
                self.samples_until_step = self.samples_per_step;
            }
            self.samples_until_step -= 1;
            self.held_value
        } else {
            self.phase += self.rate / self.sample_rate;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
            let p = self.phase;
            match self.waveform {
                LfoWaveform::Sine => sinf(2.0 * PI * p),
                LfoWaveform::Triangle => {
                    if p < 0.5 {
                        -1.0 + 4.0 * p
                    } else {
                        1.0 - 4.0 * (p - 0.5)
                    }
                }
                LfoWaveform::SawUp => 2.0 * p - 1.0,
                LfoWaveform::Square => {
                    if p < 0.5 {
                        1.0
                    } else {
                        -1.0
                    }
                }
                LfoWaveform::RandomStep => self.held_value,
            }
        };
        self.depth * value
    }

    fn update_samples_per_step(&mut self) {
        let samples = ceilf(self.sample_rate / self.rate);
        self.samples_per_step = if samples.is_finite() && samples >= 1.0 {
            samples as u32
        } else {
            1
        };
    }
}
