//! Multimode voltage-controlled filter.
//!
//! Two cores behind one interface:
//!
//! - **LPF24**: four cascaded one-pole integrators with global feedback
//!   (a ladder), `fb = resonance · 3.95`.
//! - **LPF12 / HPF12 / BPF12 / Notch**: a Chamberlin state-variable filter with
//!   a `tanh` soft-clipped input.
//!
//! The effective cutoff is recomputed every sample from the base cutoff, key
//! follow, the filter envelope and a direct Hz offset:
//!
//! ```text
//! fc = base · 2^(key_follow · log2(note / 440))
//!           · 2^(env_amount · (env − 0.5) · 2 · 5)
//!    + direct_hz
//! fc = clamp(fc, 20, SR · 0.49)
//! ```

use core::f32::consts::PI;
use libm::{exp2f, log2f, sinf, tanf, tanhf};
use polyvox_core::{flush_denormal, midi_to_freq, sanitize};

/// Lowest effective cutoff in Hz.
pub const MIN_CUTOFF_HZ: f32 = 20.0;
/// Envelope sweep range in octaves at full env amount.
pub const ENV_OCTAVES: f32 = 5.0;
/// Ladder feedback at resonance 1.
const MAX_LADDER_FEEDBACK: f32 = 3.95;
/// Ladder input clamp.
const LADDER_INPUT_LIMIT: f32 = 10.0;

/// Filter mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FilterType {
    /// 24 dB/oct ladder low-pass.
    #[default]
    Lpf24,
    /// 12 dB/oct state-variable low-pass.
    Lpf12,
    /// 12 dB/oct state-variable high-pass.
    Hpf12,
    /// 12 dB/oct state-variable band-pass.
    Bpf12,
    /// State-variable notch.
    Notch,
}

impl FilterType {
    /// Every mode in index order.
    pub const ALL: [FilterType; 5] = [
        FilterType::Lpf24,
        FilterType::Lpf12,
        FilterType::Hpf12,
        FilterType::Bpf12,
        FilterType::Notch,
    ];

    /// Mode for a stepped parameter value.
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Stepped parameter value for this mode.
    pub fn index(self) -> i32 {
        self as i32
    }

    /// Preset name.
    pub fn name(self) -> &'static str {
        match self {
            FilterType::Lpf24 => "lpf24",
            FilterType::Lpf12 => "lpf12",
            FilterType::Hpf12 => "hpf12",
            FilterType::Bpf12 => "bpf12",
            FilterType::Notch => "notch",
        }
    }

    /// Parse a preset name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

/// Multimode filter with key follow and envelope modulation.
///
/// # Example
///
/// ```rust
/// use polyvox_synth::{FilterType, Vcf};
///
/// let mut vcf = Vcf::new(44100.0);
/// vcf.set_filter_type(FilterType::Lpf12);
/// vcf.set_cutoff(800.0);
/// vcf.set_resonance(0.4);
///
/// let y = vcf.process(0.5, 0.0);
/// assert!(y.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct Vcf {
    sample_rate: f32,
    filter_type: FilterType,
    cutoff: f32,
    resonance: f32,
    key_follow: f32,
    env_amount: f32,
    env_value: f32,
    note_freq: f32,

    // Ladder
    z: [f32; 4],
    // SVF
    s1: f32,
    s2: f32,
    f: f32,
    q: f32,
}

impl Default for Vcf {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Vcf {
    /// LPF24 at 1 kHz, no resonance, no key follow, no envelope.
    pub fn new(sample_rate: f32) -> Self {
        let mut vcf = Self {
            sample_rate,
            filter_type: FilterType::Lpf24,
            cutoff: 1000.0,
            resonance: 0.0,
            key_follow: 0.0,
            env_amount: 0.0,
            env_value: 0.0,
            note_freq: 440.0,
            z: [0.0; 4],
            s1: 0.0,
            s2: 0.0,
            f: 0.0,
            q: 1.0,
        };
        vcf.update_coefficients(vcf.cutoff);
        vcf
    }

    /// Change the sample rate. State is kept.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.cutoff = self.cutoff.min(self.max_cutoff());
    }

    fn max_cutoff(&self) -> f32 {
        self.sample_rate * 0.49
    }

    /// Switch mode. Switching to a different mode clears all state.
    pub fn set_filter_type(&mut self, filter_type: FilterType) {
        if filter_type != self.filter_type {
            self.filter_type = filter_type;
            self.reset();
        }
    }

    /// Current mode.
    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Base cutoff in Hz, clamped to `20..=SR·0.49`.
    pub fn set_cutoff(&mut self, hz: f32) {
        self.cutoff = sanitize(hz, 1000.0).clamp(MIN_CUTOFF_HZ, self.max_cutoff());
    }

    /// Base cutoff in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Resonance, 0..1.
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = sanitize(resonance, 0.0).clamp(0.0, 1.0);
    }

    /// Resonance.
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Key follow amount, 0..1.
    pub fn set_key_follow(&mut self, amount: f32) {
        self.key_follow = sanitize(amount, 0.0).clamp(0.0, 1.0);
    }

    /// Key follow amount.
    pub fn key_follow(&self) -> f32 {
        self.key_follow
    }

    /// Envelope amount, −1..1.
    pub fn set_env_amount(&mut self, amount: f32) {
        self.env_amount = sanitize(amount, 0.0).clamp(-1.0, 1.0);
    }

    /// Envelope amount.
    pub fn env_amount(&self) -> f32 {
        self.env_amount
    }

    /// Latest filter-envelope level, 0..1.
    #[inline]
    pub fn set_envelope_value(&mut self, value: f32) {
        self.env_value = value.clamp(0.0, 1.0);
    }

    /// Reference note for key follow.
    pub fn set_note(&mut self, midi_note: u8) {
        self.note_freq = midi_to_freq(f32::from(midi_note));
    }

    /// Clear integrator state and recompute coefficients.
    pub fn reset(&mut self) {
        self.z = [0.0; 4];
        self.s1 = 0.0;
        self.s2 = 0.0;
        self.update_coefficients(self.cutoff);
    }

    /// Cutoff in Hz after key follow, envelope and `direct_hz`.
    #[inline]
    pub fn effective_cutoff(&self, direct_hz: f32) -> f32 {
        let key = exp2f(self.key_follow * log2f(self.note_freq / 440.0));
        let env = exp2f(self.env_amount * (self.env_value - 0.5) * 2.0 * ENV_OCTAVES);
        let fc = self.cutoff * key * env + direct_hz;
        sanitize(fc, self.cutoff).clamp(MIN_CUTOFF_HZ, self.max_cutoff())
    }

    #[inline]
    fn update_coefficients(&mut self, fc: f32) {
        match self.filter_type {
            FilterType::Lpf24 => {
                self.f = (2.0 * sinf(PI * fc / self.sample_rate)).clamp(0.0, 1.0);
            }
            _ => {
                self.f = tanf(PI * fc / self.sample_rate).clamp(1e-4, 1.0);
                let q_factor = 0.5 + self.resonance * 24.5;
                self.q = (1.0 / (2.0 * q_factor)).clamp(0.01, 1.0);
            }
        }
    }

    /// Filter one sample with an extra cutoff offset in Hz.
    #[inline]
    pub fn process(&mut self, input: f32, direct_hz: f32) -> f32 {
        let fc = self.effective_cutoff(direct_hz);
        self.update_coefficients(fc);

        match self.filter_type {
            FilterType::Lpf24 => {
                let fb = (self.resonance * MAX_LADDER_FEEDBACK).clamp(0.0, MAX_LADDER_FEEDBACK);
                let x = (input - self.z[3] * fb).clamp(-LADDER_INPUT_LIMIT, LADDER_INPUT_LIMIT);
                let f = self.f;
                self.z[0] = flush_denormal(self.z[0] + f * (x - self.z[0]));
                self.z[1] = flush_denormal(self.z[1] + f * (self.z[0] - self.z[1]));
                self.z[2] = flush_denormal(self.z[2] + f * (self.z[1] - self.z[2]));
                self.z[3] = flush_denormal(self.z[3] + f * (self.z[2] - self.z[3]));
                self.z[3]
            }
            mode => {
                let v0 = tanhf(input);
                let hp = v0 - self.s2 - self.q * self.s1;
                self.s1 = flush_denormal(self.s1 + self.f * hp);
                self.s2 = flush_denormal(self.s2 + self.f * self.s1);
                match mode {
                    FilterType::Lpf12 => self.s2,
                    FilterType::Hpf12 => hp,
                    FilterType::Bpf12 => self.s1,
                    _ => hp + self.s2,
                }
            }
        }
    }
}
