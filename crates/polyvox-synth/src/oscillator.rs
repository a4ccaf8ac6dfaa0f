//! 2× oversampled phase-accumulator oscillator.
//!
//! Six waveforms evaluated directly from phase, no band-limiting beyond the
//! oversampling. Each output sample is the mean of two sub-samples taken at
//! twice the sample rate, which halves the worst aliasing for cheap.
//!
//! Pulse width is the sum of five contributions, clamped to `0.01..=0.99`:
//!
//! ```text
//! pw = base + pwm_depth · pwm_source + polymod + wheel + drift
//! ```
//!
//! The voice owns all the modulation wiring; this type only stores the
//! latest value of each input.

use core::f32::consts::TAU;
use libm::{floorf, sinf};

/// Harmonic slots available to the additive waveform.
pub const MAX_HARMONICS: usize = 16;

/// Oversampling factor.
const OVERSAMPLE: usize = 2;

/// Oscillator waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Waveform {
    /// `sin(2πp)`.
    #[default]
    Sine,
    /// Rising ramp `2p − 1`.
    Saw,
    /// ±1 at 50% duty.
    Square,
    /// Symmetric triangle.
    Triangle,
    /// ±1 with modulated duty cycle.
    Pulse,
    /// Sum of harmonic sines weighted by the amplitude table.
    Additive,
}

impl Waveform {
    /// Every waveform in index order.
    pub const ALL: [Waveform; 6] = [
        Waveform::Sine,
        Waveform::Saw,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Pulse,
        Waveform::Additive,
    ];

    /// Waveform for a stepped parameter value.
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Stepped parameter value for this waveform.
    pub fn index(self) -> i32 {
        self as i32
    }

    /// Preset name.
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Saw => "saw",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Pulse => "pulse",
            Waveform::Additive => "additive",
        }
    }

    /// Parse a preset name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|w| w.name().eq_ignore_ascii_case(name))
    }
}

/// Phase-accumulator oscillator with hard-sync and PWM inputs.
///
/// # Example
///
/// ```rust
/// use polyvox_synth::{Oscillator, Waveform};
///
/// let mut osc = Oscillator::new(44100.0);
/// osc.set_waveform(Waveform::Saw);
/// osc.set_frequency(220.0);
///
/// let sample = osc.process();
/// assert!((-1.0..=1.0).contains(&sample));
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    sample_rate: f32,
    /// Current phase position [0.0, 1.0)
    phase: f32,
    waveform: Waveform,
    frequency: f32,
    pulse_width: f32,
    pwm_depth: f32,
    pwm_source: f32,
    polymod_pw: f32,
    wheel_pw: f32,
    drift_pw: f32,
    harmonics: [f32; MAX_HARMONICS],
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Oscillator {
    /// Sine at 440 Hz, 50% pulse width, fundamental-only harmonic table.
    pub fn new(sample_rate: f32) -> Self {
        let mut harmonics = [0.0; MAX_HARMONICS];
        harmonics[0] = 1.0;
        Self {
            sample_rate,
            phase: 0.0,
            waveform: Waveform::Sine,
            frequency: 440.0,
            pulse_width: 0.5,
            pwm_depth: 0.0,
            pwm_source: 0.0,
            polymod_pw: 0.0,
            wheel_pw: 0.0,
            drift_pw: 0.0,
            harmonics,
        }
    }

    /// Set the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Set the waveform.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Current waveform.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Set the frequency in Hz. Negative values are treated as 0.
    #[inline]
    pub fn set_frequency(&mut self, freq: f32) {
        self.frequency = freq.max(0.0);
    }

    /// Current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Current phase in `[0, 1)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Hard-sync: restart the cycle.
    #[inline]
    pub fn sync(&mut self) {
        self.phase = 0.0;
    }

    /// Same as [`sync`](Self::sync); called on note-on.
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    /// Jump to `phase`, wrapped into `[0, 1)`.
    pub fn set_phase(&mut self, phase: f32) {
        let p = phase - floorf(phase);
        self.phase = if p.is_finite() && p < 1.0 { p } else { 0.0 };
    }

    /// Base pulse width, clamped to `0.01..=0.99`.
    pub fn set_pulse_width(&mut self, width: f32) {
        self.pulse_width = width.clamp(0.01, 0.99);
    }

    /// Base pulse width.
    pub fn pulse_width(&self) -> f32 {
        self.pulse_width
    }

    /// Depth applied to the PWM source, 0..1.
    pub fn set_pwm_depth(&mut self, depth: f32) {
        self.pwm_depth = depth.clamp(0.0, 1.0);
    }

    /// PWM depth.
    pub fn pwm_depth(&self) -> f32 {
        self.pwm_depth
    }

    /// Latest PWM source value (the LFO contribution).
    #[inline]
    pub fn set_pwm_source(&mut self, value: f32) {
        self.pwm_source = value;
    }

    /// PolyMod pulse-width offset.
    #[inline]
    pub fn set_polymod_pw(&mut self, value: f32) {
        self.polymod_pw = value;
    }

    /// Mod-wheel pulse-width offset.
    #[inline]
    pub fn set_wheel_pw(&mut self, value: f32) {
        self.wheel_pw = value;
    }

    /// Analog-drift pulse-width offset.
    #[inline]
    pub fn set_drift_pw(&mut self, value: f32) {
        self.drift_pw = value;
    }

    /// Pulse width after every modulation input.
    #[inline]
    pub fn effective_pulse_width(&self) -> f32 {
        (self.pulse_width
            + self.pwm_depth * self.pwm_source
            + self.polymod_pw
            + self.wheel_pw
            + self.drift_pw)
            .clamp(0.01, 0.99)
    }

    /// Set harmonic `index` (0 = fundamental) to `amplitude` clamped to 0..1.
    ///
    /// Returns `false` and changes nothing when `index` is out of range.
    pub fn set_harmonic(&mut self, index: usize, amplitude: f32) -> bool {
        match self.harmonics.get_mut(index) {
            Some(slot) => {
                *slot = amplitude.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    /// Amplitude of harmonic `index`.
    pub fn harmonic(&self, index: usize) -> Option<f32> {
        self.harmonics.get(index).copied()
    }

    /// The full harmonic table.
    pub fn harmonics(&self) -> &[f32; MAX_HARMONICS] {
        &self.harmonics
    }

    #[inline]
    fn evaluate(&self, p: f32) -> f32 {
        match self.waveform {
            Waveform::Sine => sinf(TAU * p),
            Waveform::Saw => 2.0 * p - 1.0,
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => {
                if p < 0.5 {
                    -1.0 + 4.0 * p
                } else {
                    1.0 - 4.0 * (p - 0.5)
                }
            }
            Waveform::Pulse => {
                if p < self.effective_pulse_width() {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Additive => {
                let mut sum = 0.0;
                for (h, &amp) in self.harmonics.iter().enumerate() {
                    if amp != 0.0 {
                        sum += amp * sinf(TAU * p * (h + 1) as f32);
                    }
                }
                sum
            }
        }
    }

    /// Render one output sample (mean of two sub-samples) and advance.
    #[inline]
    pub fn process(&mut self) -> f32 {
        let increment = self.frequency / (OVERSAMPLE as f32 * self.sample_rate);
        let mut sum = 0.0;
        for _ in 0..OVERSAMPLE {
            sum += self.evaluate(self.phase);
            self.phase += increment;
            if self.phase >= 1.0 {
                self.phase -= floorf(self.phase);
            }
        }
        sum / OVERSAMPLE as f32
    }
}
